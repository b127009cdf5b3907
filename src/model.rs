// src/model.rs
use chrono::{DateTime, Utc};

/// One comment under a post, in platform order.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub author: String, // handle without the leading '@'
    pub created_at: DateTime<Utc>,
}

/// A post as returned by one fetch. Never mutated after construction.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub url: String,
    /// `None` when the platform record had no usable timestamp; such posts are never "new".
    pub created_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub caption: Option<String>,
    pub comments: Vec<Comment>,
}

/// Message handed to the delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationMessage {
    pub chat_id: String,
    pub text: String,
    pub image_url: Option<String>,
}
