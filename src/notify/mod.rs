pub mod telegram;

use thiserror::Error;

use crate::model::DestinationMessage;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered but refused the message.
    #[error("API rejected message: {description}")]
    Api { description: String },
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, msg: &DestinationMessage) -> Result<(), DeliveryError>;
    fn name(&self) -> &'static str;
}
