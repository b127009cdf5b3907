// src/source/instagram.rs
//! Instagram private-API client: profile lookup, user feed, media comments,
//! and password (+ TOTP) login.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{totp, Credentials, FetchError, PostSource};
use crate::model::{Comment, Post};

pub const DEFAULT_API_BASE: &str = "https://i.instagram.com/api/v1";

const USER_AGENT: &str =
    "Instagram 269.0.0.18.75 Android (26/8.0.0; 480dpi; 1080x1920; OnePlus; 6T Dev; devitron; qcom; en_US; 314665256)";
const APP_ID: &str = "936619743392459";
// 3 = authenticator app
const TOTP_VERIFICATION_METHOD: &str = "3";

pub struct InstagramClient {
    base: String,
    client: Client,
    auth_header: RwLock<Option<String>>,
    device_id: String,
}

impl InstagramClient {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_base(DEFAULT_API_BASE)
    }

    /// Point the client at another API root (tests, proxies).
    pub fn with_base(base: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            base: base.into().trim_end_matches('/').to_string(),
            client,
            auth_header: RwLock::new(None),
            device_id: format!("android-{:016x}", rand::random::<u64>()),
        })
    }

    async fn get(&self, path: &str) -> RequestBuilder {
        self.decorate(self.client.get(format!("{}{}", self.base, path)))
            .await
    }

    async fn post(&self, path: &str) -> RequestBuilder {
        self.decorate(self.client.post(format!("{}{}", self.base, path)))
            .await
    }

    async fn decorate(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req.header("x-ig-app-id", APP_ID);
        match self.auth_header.read().await.as_deref() {
            Some(auth) => req.header(reqwest::header::AUTHORIZATION, auth),
            None => req,
        }
    }

    async fn user_id(&self, account: &str) -> Result<String, FetchError> {
        let req = self
            .get("/users/web_profile_info/")
            .await
            .query(&[("username", account)]);
        let body = read_body(req.send().await?).await?;
        parse_profile_user_id(&body)
    }

    async fn remember_auth(&self, rsp: &Response) {
        if let Some(v) = rsp
            .headers()
            .get("ig-set-authorization")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
        {
            *self.auth_header.write().await = Some(v.to_string());
        }
    }

    async fn two_factor_login(
        &self,
        credentials: &Credentials,
        identifier: &str,
    ) -> Result<(), FetchError> {
        let Some(seed) = credentials.totp_secret.as_deref() else {
            return Err(FetchError::Auth(
                "two-factor required but no TOTP secret configured".into(),
            ));
        };
        let code = totp::current_code(seed).map_err(|e| FetchError::Auth(e.to_string()))?;
        tracing::info!(target: "instagram", "submitting two-factor code");

        let form = [
            ("username", credentials.username.as_str()),
            ("verification_code", code.as_str()),
            ("two_factor_identifier", identifier),
            ("verification_method", TOTP_VERIFICATION_METHOD),
            ("trust_this_device", "1"),
            ("device_id", self.device_id.as_str()),
        ];
        let rsp = self
            .post("/accounts/two_factor_login/")
            .await
            .form(&form)
            .send()
            .await?;
        self.remember_auth(&rsp).await;

        let body: LoginResponse = decode(&rsp.text().await?)?;
        if body.logged_in_user.is_some() {
            Ok(())
        } else {
            Err(FetchError::Auth(
                body.message.unwrap_or_else(|| "two-factor login rejected".into()),
            ))
        }
    }
}

#[async_trait]
impl PostSource for InstagramClient {
    async fn fetch_recent_posts(&self, account: &str, limit: usize) -> Result<Vec<Post>, FetchError> {
        let user_id = self.user_id(account).await?;
        let path = format!("/feed/user/{user_id}/?count={limit}");
        let body = read_body(self.get(&path).await.send().await?).await?;
        parse_feed(&body, limit)
    }

    async fn fetch_top_comments(&self, post_id: &str, limit: usize) -> Result<Vec<Comment>, FetchError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let path = format!("/media/{post_id}/comments/?can_support_threading=true");
        let body = read_body(self.get(&path).await.send().await?).await?;
        parse_comments(&body, limit)
    }

    async fn login(&self, credentials: &Credentials) -> Result<(), FetchError> {
        tracing::info!(target: "instagram", username = %credentials.username, "trying to log in");
        let ts = Utc::now().timestamp().to_string();
        let enc_password = format!("#PWD_INSTAGRAM:0:{ts}:{}", credentials.password);
        let form = [
            ("username", credentials.username.as_str()),
            ("enc_password", enc_password.as_str()),
            ("device_id", self.device_id.as_str()),
            ("login_attempt_count", "0"),
        ];

        let rsp = self.post("/accounts/login/").await.form(&form).send().await?;
        if rsp.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        self.remember_auth(&rsp).await;

        // login endpoints answer 400 with a JSON body for "bad password" and "needs 2FA"
        let body: LoginResponse = decode(&rsp.text().await?)?;
        if body.logged_in_user.is_some() {
            tracing::info!(target: "instagram", "logged in");
            return Ok(());
        }
        if body.two_factor_required.unwrap_or(false) {
            let identifier = body
                .two_factor_info
                .map(|i| i.two_factor_identifier)
                .ok_or_else(|| FetchError::Decode("two_factor_info missing".into()))?;
            self.two_factor_login(credentials, &identifier).await?;
            tracing::info!(target: "instagram", "logged in with two-factor code");
            return Ok(());
        }

        Err(FetchError::Auth(
            body.message.unwrap_or_else(|| "login rejected".into()),
        ))
    }

    fn name(&self) -> &'static str {
        "instagram"
    }
}

/// Map non-2xx statuses onto [`FetchError`] and return the body text.
async fn read_body(rsp: Response) -> Result<String, FetchError> {
    let status = rsp.status();
    if status.is_success() {
        return Ok(rsp.text().await?);
    }
    let message = rsp.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::Auth(truncate(&message, 200)),
        StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited,
        _ => FetchError::Platform {
            status: status.as_u16(),
            message: truncate(&message, 200),
        },
    })
}

fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn unix_to_utc(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

// ---- wire types ----

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    data: ProfileData,
}
#[derive(Debug, Deserialize)]
struct ProfileData {
    user: Option<ProfileUser>,
}
#[derive(Debug, Deserialize)]
struct ProfileUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    id: String,
    code: String,
    taken_at: Option<i64>,
    caption: Option<CaptionField>,
    image_versions2: Option<ImageVersions>,
    #[serde(default)]
    carousel_media: Vec<CarouselItem>,
    thumbnail_url: Option<String>,
}
#[derive(Debug, Deserialize)]
struct CaptionField {
    text: Option<String>,
}
#[derive(Debug, Deserialize)]
struct ImageVersions {
    #[serde(default)]
    candidates: Vec<ImageCandidate>,
}
#[derive(Debug, Deserialize)]
struct ImageCandidate {
    url: String,
}
#[derive(Debug, Deserialize)]
struct CarouselItem {
    image_versions2: Option<ImageVersions>,
}

#[derive(Debug, Deserialize)]
struct CommentsResponse {
    #[serde(default)]
    comments: Vec<serde_json::Value>,
}
#[derive(Debug, Deserialize)]
struct CommentItem {
    pk: serde_json::Value,
    text: String,
    created_at: i64,
    user: CommentUser,
}
#[derive(Debug, Deserialize)]
struct CommentUser {
    username: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    logged_in_user: Option<serde_json::Value>,
    two_factor_required: Option<bool>,
    two_factor_info: Option<TwoFactorInfo>,
    message: Option<String>,
}
#[derive(Debug, Deserialize)]
struct TwoFactorInfo {
    two_factor_identifier: String,
}

// ---- decoders ----

pub fn parse_profile_user_id(body: &str) -> Result<String, FetchError> {
    let rsp: ProfileResponse = decode(body)?;
    rsp.data
        .user
        .map(|u| u.id)
        .ok_or_else(|| FetchError::Platform {
            status: 404,
            message: "account not found".into(),
        })
}

/// Decode the user feed. Items that do not look like posts are dropped and logged.
pub fn parse_feed(body: &str, limit: usize) -> Result<Vec<Post>, FetchError> {
    let rsp: FeedResponse = decode(body)?;
    let mut out = Vec::with_capacity(rsp.items.len().min(limit));

    for raw in rsp.items.into_iter().take(limit) {
        let item: FeedItem = match serde_json::from_value(raw) {
            Ok(i) => i,
            Err(e) => {
                tracing::warn!(target: "instagram", error = %e, "skipping malformed feed item");
                continue;
            }
        };

        let image_url = first_candidate(item.image_versions2.as_ref())
            .or_else(|| {
                item.carousel_media
                    .first()
                    .and_then(|c| first_candidate(c.image_versions2.as_ref()))
            })
            .or(item.thumbnail_url);

        out.push(Post {
            url: format!("https://www.instagram.com/p/{}/", item.code),
            id: item.id,
            created_at: item.taken_at.and_then(unix_to_utc),
            image_url,
            caption: item.caption.and_then(|c| c.text).filter(|t| !t.is_empty()),
            comments: Vec::new(),
        });
    }

    Ok(out)
}

fn first_candidate(v: Option<&ImageVersions>) -> Option<String> {
    v.and_then(|v| v.candidates.first()).map(|c| c.url.clone())
}

pub fn parse_comments(body: &str, limit: usize) -> Result<Vec<Comment>, FetchError> {
    let rsp: CommentsResponse = decode(body)?;
    let mut out = Vec::with_capacity(rsp.comments.len().min(limit));

    for raw in rsp.comments {
        if out.len() >= limit {
            break;
        }
        let item: CommentItem = match serde_json::from_value(raw) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(target: "instagram", error = %e, "skipping malformed comment");
                continue;
            }
        };
        let Some(created_at) = unix_to_utc(item.created_at) else {
            tracing::debug!(target: "instagram", "skipping comment with bad timestamp");
            continue;
        };
        let id = match item.pk {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        out.push(Comment {
            id,
            text: item.text,
            author: item.user.username,
            created_at,
        });
    }

    Ok(out)
}
