// src/format.rs
use std::fmt::Write as _;

use crate::model::{DestinationMessage, Post};

/// Render a post into the chat message sent for it.
///
/// Layout: a header with the permalink, then the caption (if any), then the
/// comments numbered from 1 as `n. @author: text`. The image, when present,
/// travels alongside the text.
pub fn format_post(post: &Post, chat_id: &str) -> DestinationMessage {
    let mut text = format!("New post from {}\n\n", post.url);

    if let Some(caption) = post.caption.as_deref().filter(|c| !c.is_empty()) {
        let _ = write!(text, "Caption: {caption}\n\n");
    }

    if !post.comments.is_empty() {
        text.push_str("Top comments:\n");
        for (i, c) in post.comments.iter().enumerate() {
            let _ = writeln!(text, "{}. @{}: {}", i + 1, c.author, c.text);
        }
    }

    DestinationMessage {
        chat_id: chat_id.to_string(),
        text,
        image_url: post.image_url.clone().filter(|u| !u.is_empty()),
    }
}
