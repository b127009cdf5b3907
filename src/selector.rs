// src/selector.rs
//! New-post selection against the persisted watermark.
//!
//! A post is new iff its `created_at` is strictly greater than the watermark.
//! The candidate watermark is the newest timestamp seen anywhere in the batch,
//! never lower than the watermark passed in.

use chrono::{DateTime, Utc};

use crate::model::Post;

/// Result of classifying one fetched batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// New posts, in the order the source returned them.
    pub new_posts: Vec<Post>,
    /// Value to commit after delivery. `None` means nothing to commit
    /// (empty batch, or no post carried a timestamp).
    pub watermark: Option<DateTime<Utc>>,
}

impl Selection {
    /// Watermark the loop should hold after this batch.
    pub fn next_watermark(&self, current: DateTime<Utc>) -> DateTime<Utc> {
        self.watermark.unwrap_or(current)
    }
}

pub fn select_new_posts(batch: &[Post], watermark: DateTime<Utc>) -> Selection {
    let mut new_posts = Vec::new();
    let mut newest: Option<DateTime<Utc>> = None;

    for post in batch {
        let Some(created_at) = post.created_at else {
            tracing::debug!(target: "selector", post_id = %post.id, "post without timestamp, skipped");
            continue;
        };

        newest = Some(newest.map_or(created_at, |n| n.max(created_at)));

        if created_at > watermark {
            new_posts.push(post.clone());
        } else {
            tracing::debug!(target: "selector", post_id = %post.id, %created_at, "already delivered");
        }
    }

    Selection {
        new_posts,
        watermark: newest.map(|n| n.max(watermark)),
    }
}
