// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod config;
pub mod format;
pub mod metrics;
pub mod model;
pub mod monitor;
pub mod notify;
pub mod selector;
pub mod source;
pub mod watermark;

// ---- Re-exports for stable public API ----
pub use crate::config::{ConfigError, RelayConfig};
pub use crate::model::{Comment, DestinationMessage, Post};
pub use crate::monitor::{CycleReport, Monitor, MonitorSettings};
pub use crate::notify::{DeliveryError, Notifier};
pub use crate::selector::{select_new_posts, Selection};
pub use crate::source::{Credentials, FetchError, PostSource};
pub use crate::watermark::{FileWatermarkStore, WatermarkStore};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines;
/// the filter comes from `RUST_LOG` and defaults to info for this crate.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("insta_relay=info,monitor=info,watermark=info,instagram=info,telegram=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}
