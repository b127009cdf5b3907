// tests/instagram_http.rs
// InstagramClient against a local mock server: status mapping, query encoding, 2FA login.

use insta_relay::source::instagram::InstagramClient;
use insta_relay::{Credentials, FetchError, PostSource};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const TOTP_SEED: &str = "JBSWY3DPEHPK3PXP";

fn creds(totp_secret: Option<&str>) -> Credentials {
    Credentials {
        username: "me".into(),
        password: "secret".into(),
        totp_secret: totp_secret.map(str::to_string),
    }
}

fn form_field(req: &Request, key: &str) -> Option<String> {
    let body = String::from_utf8_lossy(&req.body).into_owned();
    body.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| v.to_string())
    })
}

async fn mount_profile_and_feed(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/users/web_profile_info/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(include_str!("fixtures/ig_profile.json")),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feed/user/25025320/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(include_str!("fixtures/ig_feed.json")))
        .mount(server)
        .await;
}

#[tokio::test]
async fn http_statuses_map_to_fetch_errors() {
    for status in [401u16, 403, 429, 404, 500] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/web_profile_info/"))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .mount(&server)
            .await;

        let client = InstagramClient::with_base(server.uri()).unwrap();
        let err = client.fetch_recent_posts("natgeo", 20).await.unwrap_err();

        match status {
            401 | 403 => assert!(matches!(err, FetchError::Auth(_)), "{status}: {err:?}"),
            429 => assert!(matches!(err, FetchError::RateLimited), "{status}: {err:?}"),
            other => assert!(
                matches!(err, FetchError::Platform { status, .. } if status == other),
                "{other}: {err:?}"
            ),
        }
    }
}

#[tokio::test]
async fn account_name_is_query_encoded_and_comments_are_not_fetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/web_profile_info/"))
        .and(query_param("username", "nat geo&x=1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(include_str!("fixtures/ig_profile.json")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feed/user/25025320/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(include_str!("fixtures/ig_feed.json")))
        .mount(&server)
        .await;

    let client = InstagramClient::with_base(server.uri()).unwrap();
    let posts = client.fetch_recent_posts("nat geo&x=1", 20).await.unwrap();

    assert_eq!(posts.len(), 3);
    assert!(posts.iter().all(|p| p.comments.is_empty()));
    // profile + feed, nothing per post
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn two_factor_challenge_submits_totp_code_and_keeps_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts/login/"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"two_factor_required":true,"two_factor_info":{"two_factor_identifier":"tf-123"},"message":"","status":"fail"}"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/accounts/two_factor_login/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ig-set-authorization", "Bearer IGT:2:session")
                .set_body_string(r#"{"logged_in_user":{"pk":1,"username":"me"},"status":"ok"}"#),
        )
        .mount(&server)
        .await;

    let client = InstagramClient::with_base(server.uri()).unwrap();
    client.login(&creds(Some(TOTP_SEED))).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let second = requests
        .iter()
        .find(|r| r.url.path() == "/accounts/two_factor_login/")
        .expect("two-factor step was not attempted");
    let code = form_field(second, "verification_code").unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(form_field(second, "two_factor_identifier").as_deref(), Some("tf-123"));
    assert_eq!(form_field(second, "username").as_deref(), Some("me"));

    // later calls carry the session header handed out by the 2FA step
    Mock::given(method("GET"))
        .and(path("/users/web_profile_info/"))
        .and(header("authorization", "Bearer IGT:2:session"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(include_str!("fixtures/ig_profile.json")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feed/user/25025320/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(include_str!("fixtures/ig_feed.json")))
        .mount(&server)
        .await;
    assert_eq!(client.fetch_recent_posts("natgeo", 20).await.unwrap().len(), 3);
}

#[tokio::test]
async fn two_factor_without_seed_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts/login/"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"two_factor_required":true,"two_factor_info":{"two_factor_identifier":"tf-123"}}"#,
        ))
        .mount(&server)
        .await;

    let client = InstagramClient::with_base(server.uri()).unwrap();
    let err = client.login(&creds(None)).await.unwrap_err();

    assert!(matches!(err, FetchError::Auth(_)), "{err:?}");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn rejected_password_and_rate_limit_on_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts/login/"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"message":"The password you entered is incorrect.","status":"fail"}"#,
        ))
        .mount(&server)
        .await;
    let client = InstagramClient::with_base(server.uri()).unwrap();
    match client.login(&creds(None)).await {
        Err(FetchError::Auth(msg)) => assert!(msg.contains("password")),
        other => panic!("expected auth error, got {other:?}"),
    }

    let limited = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts/login/"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&limited)
        .await;
    let client = InstagramClient::with_base(limited.uri()).unwrap();
    assert!(matches!(
        client.login(&creds(None)).await,
        Err(FetchError::RateLimited)
    ));
}

#[tokio::test]
async fn anonymous_fetch_sends_no_authorization() {
    let server = MockServer::start().await;
    mount_profile_and_feed(&server).await;

    let client = InstagramClient::with_base(server.uri()).unwrap();
    client.fetch_recent_posts("natgeo", 20).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| !r.headers.contains_key("authorization")));
    assert!(requests.iter().all(|r| r.headers.contains_key("x-ig-app-id")));
}
