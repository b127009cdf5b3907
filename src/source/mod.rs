// src/source/mod.rs
pub mod instagram;
pub mod totp;

use thiserror::Error;

use crate::model::{Comment, Post};

/// Failures surfaced by a post source. An empty batch is never used to signal
/// an error, so the monitor can tell "nothing new" from "could not look".
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited by platform")]
    RateLimited,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("platform error (HTTP {status}): {message}")]
    Platform { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Login material. Absent credentials mean anonymous, rate-limited fetching.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Base32 TOTP seed for two-factor login.
    pub totp_secret: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("totp_secret", &self.totp_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[async_trait::async_trait]
pub trait PostSource: Send + Sync {
    /// Recent posts of `account`, newest first, at most `limit`. Comments are left
    /// empty; the monitor asks for them only for posts it is about to deliver.
    async fn fetch_recent_posts(&self, account: &str, limit: usize) -> Result<Vec<Post>, FetchError>;

    async fn fetch_top_comments(&self, post_id: &str, limit: usize) -> Result<Vec<Comment>, FetchError>;

    /// One-time session setup. Sources without authentication accept anything.
    async fn login(&self, _credentials: &Credentials) -> Result<(), FetchError> {
        Ok(())
    }

    fn name(&self) -> &'static str;
}
