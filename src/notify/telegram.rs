use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{DeliveryError, Notifier};
use crate::model::DestinationMessage;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram rejects photo captions above this many characters.
pub const MAX_CAPTION_CHARS: usize = 1024;

/// Same for `sendMessage` text.
pub const MAX_TEXT_CHARS: usize = 4096;

#[derive(Clone)]
pub struct TelegramNotifier {
    base: String,
    token: String,
    client: Client,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(token: String) -> Self {
        Self {
            base: DEFAULT_API_BASE.to_string(),
            token,
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base, self.token, method)
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, msg: &DestinationMessage) -> Result<(), DeliveryError> {
        let req = match TelegramRequest::from_message(msg) {
            TelegramRequest::Photo(body) => self.client.post(self.method_url("sendPhoto")).json(&body),
            TelegramRequest::Text(body) => self.client.post(self.method_url("sendMessage")).json(&body),
        };

        // Bot API reports most failures as `ok: false` with a 4xx, so read the body either way
        let rsp = req.timeout(self.timeout).send().await?;
        let status = rsp.status();
        let api: ApiResponse = rsp.json().await?;

        if api.ok && status.is_success() {
            tracing::info!(target: "telegram", chat_id = %msg.chat_id, "message sent");
            Ok(())
        } else {
            Err(DeliveryError::Api {
                description: api
                    .description
                    .unwrap_or_else(|| format!("HTTP {status}")),
            })
        }
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SendPhoto {
    pub chat_id: String,
    pub photo: String,
    pub caption: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SendMessage {
    pub chat_id: String,
    pub text: String,
}

#[derive(Debug, PartialEq)]
pub enum TelegramRequest {
    Photo(SendPhoto),
    Text(SendMessage),
}

impl TelegramRequest {
    pub fn from_message(msg: &DestinationMessage) -> Self {
        match &msg.image_url {
            Some(photo) => Self::Photo(SendPhoto {
                chat_id: msg.chat_id.clone(),
                photo: photo.clone(),
                caption: truncate_chars(&msg.text, MAX_CAPTION_CHARS),
            }),
            None => Self::Text(SendMessage {
                chat_id: msg.chat_id.clone(),
                text: truncate_chars(&msg.text, MAX_TEXT_CHARS),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('…');
    out
}
