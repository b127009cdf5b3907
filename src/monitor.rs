// src/monitor.rs
//! The relay loop: fetch → select → deliver → persist → sleep, forever.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};

use crate::config::RelayConfig;
use crate::format::format_post;
use crate::model::Comment;
use crate::notify::Notifier;
use crate::selector::select_new_posts;
use crate::source::{Credentials, FetchError, PostSource};
use crate::watermark::WatermarkStore;

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub account: String,
    pub chat_id: String,
    pub fetch_limit: usize,
    pub comment_limit: usize,
    pub interval: Duration,
}

impl From<&RelayConfig> for MonitorSettings {
    fn from(cfg: &RelayConfig) -> Self {
        Self {
            account: cfg.target_account.clone(),
            chat_id: cfg.chat_id.clone(),
            fetch_limit: cfg.fetch_limit,
            comment_limit: cfg.comment_limit,
            interval: cfg.check_interval,
        }
    }
}

/// What one cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub selected: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Watermark held after the cycle.
    pub watermark: DateTime<Utc>,
    /// Whether the store was written this cycle.
    pub persisted: bool,
}

pub struct Monitor {
    settings: MonitorSettings,
    source: Arc<dyn PostSource>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn WatermarkStore>,
    watermark: DateTime<Utc>,
}

impl Monitor {
    /// Build a monitor, reading the watermark from `store` once.
    pub async fn load(
        settings: MonitorSettings,
        source: Arc<dyn PostSource>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn WatermarkStore>,
    ) -> Self {
        crate::metrics::ensure_metrics_described();
        let watermark = store.load().await;
        gauge!("relay_watermark_unix").set(watermark.timestamp() as f64);
        Self {
            settings,
            source,
            notifier,
            store,
            watermark,
        }
    }

    pub fn watermark(&self) -> DateTime<Utc> {
        self.watermark
    }

    /// Log in through the source. Failure leaves the monitor in anonymous mode.
    pub async fn login(&self, credentials: &Credentials) -> bool {
        match self.source.login(credentials).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(target: "monitor", source = self.source.name(), error = %e, "login failed, continuing without login");
                false
            }
        }
    }

    /// One fetch → select → deliver → persist pass.
    ///
    /// A fetch error aborts the cycle before anything is delivered or persisted.
    /// Delivery errors are logged per post and never stop the watermark update.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, FetchError> {
        counter!("relay_cycles_total").increment(1);

        let batch = match self
            .source
            .fetch_recent_posts(&self.settings.account, self.settings.fetch_limit)
            .await
        {
            Ok(b) => b,
            Err(e) => {
                counter!("relay_fetch_errors_total").increment(1);
                return Err(e);
            }
        };
        counter!("relay_posts_fetched_total").increment(batch.len() as u64);

        let selection = select_new_posts(&batch, self.watermark);
        let selected = selection.new_posts.len();
        counter!("relay_posts_new_total").increment(selected as u64);

        let mut delivered = 0;
        let mut failed = 0;
        for mut post in selection.new_posts {
            tracing::info!(target: "monitor", url = %post.url, "new post found");
            post.comments = self.top_comments(&post.id).await;
            let msg = format_post(&post, &self.settings.chat_id);
            match self.notifier.send(&msg).await {
                Ok(()) => {
                    delivered += 1;
                    counter!("relay_deliveries_total", "outcome" => "ok").increment(1);
                    tracing::info!(target: "monitor", url = %post.url, "notification sent");
                }
                Err(e) => {
                    failed += 1;
                    counter!("relay_deliveries_total", "outcome" => "error").increment(1);
                    tracing::error!(target: "monitor", url = %post.url, channel = self.notifier.name(), error = %e, "failed to send notification");
                }
            }
        }

        let mut persisted = false;
        if let Some(candidate) = selection.watermark.filter(|c| *c != self.watermark) {
            match self.store.save(candidate).await {
                Ok(()) => {
                    persisted = true;
                    counter!("relay_watermark_saves_total", "outcome" => "ok").increment(1);
                }
                Err(e) => {
                    // in-memory value still advances; a restart re-sends from the old record
                    counter!("relay_watermark_saves_total", "outcome" => "error").increment(1);
                    tracing::error!(target: "monitor", error = ?e, "could not persist watermark");
                }
            }
            self.watermark = candidate;
            gauge!("relay_watermark_unix").set(candidate.timestamp() as f64);
        }

        Ok(CycleReport {
            fetched: batch.len(),
            selected,
            delivered,
            failed,
            watermark: self.watermark,
            persisted,
        })
    }

    /// Comments for a post about to be delivered. A failure yields no comments.
    async fn top_comments(&self, post_id: &str) -> Vec<Comment> {
        if self.settings.comment_limit == 0 {
            return Vec::new();
        }
        match self
            .source
            .fetch_top_comments(post_id, self.settings.comment_limit)
            .await
        {
            Ok(c) => c,
            Err(e) => {
                counter!("relay_comment_errors_total").increment(1);
                tracing::warn!(target: "monitor", post_id, error = %e, "comments unavailable");
                Vec::new()
            }
        }
    }

    /// Cycle until the process is killed. Cycles never overlap; the sleep is the only suspension between them.
    pub async fn run(mut self) {
        tracing::info!(target: "monitor", account = %self.settings.account, "starting to monitor account");
        loop {
            match self.run_cycle().await {
                Ok(report) if report.selected == 0 => {
                    tracing::info!(target: "monitor", fetched = report.fetched, "no new posts found");
                }
                Ok(report) => {
                    tracing::info!(
                        target: "monitor",
                        fetched = report.fetched,
                        new = report.selected,
                        delivered = report.delivered,
                        failed = report.failed,
                        watermark = %report.watermark,
                        "cycle finished"
                    );
                }
                Err(e) => {
                    tracing::error!(target: "monitor", error = %e, "error fetching posts, watermark unchanged");
                }
            }

            tracing::info!(target: "monitor", secs = self.settings.interval.as_secs(), "sleeping");
            tokio::time::sleep(self.settings.interval).await;
        }
    }
}
