use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serenity::prelude::TypeMapKey;
use tracing::error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Wire format of the like API's JSON body. Everything is optional; the
/// upstream omits fields freely depending on the status code it returns.
#[derive(Debug, Default, Deserialize)]
pub struct LikeResponse {
    pub status: Option<i64>,
    pub player: Option<String>,
    pub likes_added: Option<i64>,
    pub likes_before: Option<i64>,
    pub likes_after: Option<i64>,
    pub remain: Option<i64>,
    pub daily_limit: Option<i64>,
    pub message: Option<String>,
    pub expires_at: Option<String>
}

/// What one like request came to, independent of how it gets rendered.
#[derive(Debug, PartialEq, Eq)]
pub enum LikeOutcome {
    Success {
        player: String,
        likes_added: i64,
        likes_before: Option<i64>,
        likes_after: Option<i64>,
        remain: Option<i64>,
        daily_limit: Option<i64>
    },
    /// The upstream already delivered likes to this UID today.
    AlreadyClaimed { message: Option<String>, expires_at: Option<String> },
    /// HTTP 200 but an upstream status we don't recognize.
    Rejected,
    NotFound,
    /// Rate-limited by the upstream itself, distinct from our own cooldown.
    RateLimited,
    UpstreamError { status: u16 },
    Timeout,
    /// Transport failures and undecodable bodies; detail goes to the log.
    Unexpected
}

/// Maps an HTTP status and decoded body to an outcome. `body` is `None`
/// whenever there was no decodable JSON to work with.
pub fn classify(status: StatusCode, body: Option<LikeResponse>) -> LikeOutcome {
    match status {
        StatusCode::NOT_FOUND => LikeOutcome::NotFound,
        StatusCode::TOO_MANY_REQUESTS => LikeOutcome::RateLimited,
        StatusCode::OK => match body {
            Some(body) => match body.status {
                Some(1) => LikeOutcome::Success {
                    player: body.player.unwrap_or_else(|| "Unknown".to_string()),
                    likes_added: body.likes_added.unwrap_or(0),
                    likes_before: body.likes_before,
                    likes_after: body.likes_after,
                    remain: body.remain,
                    daily_limit: body.daily_limit
                },
                Some(3) => LikeOutcome::AlreadyClaimed {
                    message: body.message,
                    expires_at: body.expires_at
                },
                _ => LikeOutcome::Rejected
            },
            None => LikeOutcome::Unexpected
        },
        other => LikeOutcome::UpstreamError { status: other.as_u16() }
    }
}

/// Client for the like API. One instance, and one underlying connection
/// pool, lives for the whole process.
pub struct LikeApi {
    http: reqwest::Client,
    host: String,
    key: String
}

impl TypeMapKey for LikeApi {
    type Value = Arc<LikeApi>;
}

impl LikeApi {
    pub fn new(host: &str, key: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(LikeApi {
            http,
            host: host.trim_end_matches('/').to_string(),
            key: key.to_string()
        })
    }

    /// Sends one like request for the given player. Never retries; every
    /// failure mode collapses into a `LikeOutcome`. The request URL carries
    /// the API key, so errors are logged without it.
    pub async fn fetch_likes(&self, region: &str, uid: &str) -> LikeOutcome {
        let url = format!("{}/api/{}/{}", self.host, region, uid);

        let response = match self.http.get(&url).query(&[("key", &self.key)]).send().await {
            Ok(response) => response,
            Err(ex) if ex.is_timeout() => {
                error!("Like API timed out for UID {}", uid);
                return LikeOutcome::Timeout;
            }
            Err(ex) => {
                error!("Failed to reach the like API: {}", ex.without_url());
                return LikeOutcome::Unexpected;
            }
        };

        let status = response.status();

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!("Like API error: {} - {}", status, body);
            return classify(status, None);
        }

        match response.json::<LikeResponse>().await {
            Ok(body) => classify(status, Some(body)),
            Err(ex) => {
                error!("Like API returned an undecodable body: {}", ex.without_url());
                LikeOutcome::Unexpected
            }
        }
    }
}
