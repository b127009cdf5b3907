// tests/config_env.rs
use insta_relay::config::*;
use std::env;
use std::time::Duration;

const ALL_KEYS: [&str; 13] = [
    ENV_TARGET_ACCOUNT,
    ENV_TARGET_ACCOUNT_LEGACY,
    ENV_TELEGRAM_TOKEN,
    ENV_CHAT_ID,
    ENV_CHAT_ID_LEGACY,
    ENV_USERNAME,
    ENV_PASSWORD,
    ENV_TOTP_SECRET,
    ENV_CHECK_INTERVAL,
    ENV_STATE_PATH,
    ENV_FETCH_LIMIT,
    ENV_COMMENT_LIMIT,
    ENV_METRICS_ADDR,
];

fn clear_env() {
    for k in ALL_KEYS {
        env::remove_var(k);
    }
}

#[serial_test::serial]
#[test]
fn from_env_reads_process_environment() {
    clear_env();
    env::set_var(ENV_TARGET_ACCOUNT, "natgeo");
    env::set_var(ENV_TELEGRAM_TOKEN, "123:abc");
    env::set_var(ENV_CHAT_ID, "-100123");
    env::set_var(ENV_CHECK_INTERVAL, "900");
    env::set_var(ENV_STATE_PATH, "state/wm.txt");

    let cfg = RelayConfig::from_env().unwrap();
    assert_eq!(cfg.target_account, "natgeo");
    assert_eq!(cfg.check_interval, Duration::from_secs(900));
    assert_eq!(cfg.state_path, std::path::PathBuf::from("state/wm.txt"));

    clear_env();
}

#[serial_test::serial]
#[test]
fn from_env_reports_first_missing_key() {
    clear_env();
    assert_eq!(
        RelayConfig::from_env().unwrap_err(),
        ConfigError::Missing(ENV_TARGET_ACCOUNT)
    );

    env::set_var(ENV_TARGET_ACCOUNT, "natgeo");
    assert_eq!(
        RelayConfig::from_env().unwrap_err(),
        ConfigError::Missing(ENV_TELEGRAM_TOKEN)
    );

    clear_env();
}
