//! Cookie and crumb handling for Yahoo's authenticated JSON endpoints.

use crate::error::{DataError, Result};
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde_json::Value;
use std::future::Future;
use tokio::sync::Mutex;
use tracing::debug;

/// Browser-like user agent; Yahoo rejects the default reqwest one.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko)";

const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const DEFAULT_RETRY_AFTER_MS: u64 = 60_000;

/// HTTP session holding Yahoo's consent cookie and crumb token.
#[derive(Debug)]
pub struct YahooSession {
    client: reqwest::Client,
    crumb: Mutex<Option<String>>,
}

impl YahooSession {
    /// Create a session with a cookie-storing client.
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            crumb: Mutex::new(None),
        })
    }

    /// Return the cached crumb, fetching cookie and crumb on first use.
    pub async fn crumb(&self) -> Result<String> {
        let mut guard = self.crumb.lock().await;
        if let Some(crumb) = guard.as_ref() {
            return Ok(crumb.clone());
        }

        // Only the Set-Cookie header matters; the page itself is usually a 404.
        let _ = self.client.get(COOKIE_URL).send().await?;

        let response = self.client.get(CRUMB_URL).send().await?;
        let status = response.status();
        let body = response.text().await?;
        let crumb = validate_crumb(status, &body)?;

        debug!("obtained Yahoo crumb");
        *guard = Some(crumb.clone());
        Ok(crumb)
    }

    /// Forget the cached crumb so the next request re-authenticates.
    pub async fn invalidate(&self) {
        self.crumb.lock().await.take();
    }

    /// Authenticated GET returning the JSON body.
    ///
    /// A 401 or 403 invalidates the crumb and retries once.
    pub async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        retry_after_reauth(move || self.get_json_once(url, query), move || self.invalidate()).await
    }

    async fn get_json_once(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        let crumb = self.crumb().await?;
        let response = self
            .client
            .get(url)
            .query(query)
            .query(&[("crumb", crumb.as_str())])
            .send()
            .await?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await?;
        decode_body(status, retry_after.as_deref(), &body)
    }
}

/// Run `request`; on an authentication failure call `reauth` and run it once more.
pub(crate) async fn retry_after_reauth<T, F, Fut, R, RFut>(
    mut request: F,
    reauth: R,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    R: FnOnce() -> RFut,
    RFut: Future<Output = ()>,
{
    match request().await {
        Err(DataError::Authentication(reason)) => {
            debug!(%reason, "crumb rejected, re-authenticating");
            reauth().await;
            request().await
        }
        other => other,
    }
}

/// Decode a response body according to its status.
///
/// Yahoo answers unknown tickers with a 404 carrying a JSON error body, which
/// is passed through for the caller to inspect.
pub(crate) fn decode_body(
    status: StatusCode,
    retry_after: Option<&str>,
    body: &str,
) -> Result<Value> {
    if let Some(err) = status_error(status, retry_after) {
        if status == StatusCode::NOT_FOUND {
            return serde_json::from_str(body)
                .map_err(|e| DataError::Http(format!("unexpected status {status}: {e}")));
        }
        return Err(err);
    }
    Ok(serde_json::from_str(body)?)
}

/// Check the crumb endpoint's answer.
pub(crate) fn validate_crumb(status: StatusCode, body: &str) -> Result<String> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(DataError::RateLimit {
            retry_after_ms: DEFAULT_RETRY_AFTER_MS,
        });
    }
    let crumb = body.trim();
    if !status.is_success() || crumb.is_empty() || crumb.contains('<') || crumb.contains(' ') {
        return Err(DataError::Authentication(format!(
            "crumb request returned {status}"
        )));
    }
    Ok(crumb.to_string())
}

/// Map a non-success status to an error; `None` for success.
pub(crate) fn status_error(status: StatusCode, retry_after: Option<&str>) -> Option<DataError> {
    if status.is_success() {
        return None;
    }
    Some(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            DataError::Authentication(format!("request rejected with {status}"))
        }
        StatusCode::TOO_MANY_REQUESTS => DataError::RateLimit {
            retry_after_ms: retry_after
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map_or(DEFAULT_RETRY_AFTER_MS, |secs| secs.saturating_mul(1000)),
        },
        _ => DataError::Http(format!("unexpected status {status}")),
    })
}
