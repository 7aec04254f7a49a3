//! Async HTTP client wrapping reqwest.
//!
//! One GET per call with a hard timeout. No retries: a timeout or a
//! non-success status is reported to the crawl session as an error.

use anyhow::{bail, Result};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Original requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

/// HTTP client shared by all Lodestone crawl sessions.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with a browser user-agent.
    pub fn new(timeout: Duration) -> Self {
        let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                  AppleWebKit/537.36 (KHTML, like Gecko) \
                  Chrome/131.0.0.0 Safari/537.36";

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(ua)
            .build()
            .unwrap_or_default();

        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform a single GET. Statuses outside 2xx are errors.
    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        let r = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = r.status();
        let final_url = r.url().to_string();
        if !status.is_success() {
            bail!("{url}: {status}");
        }

        let body = r.text().await?;
        debug!(url, status = status.as_u16(), bytes = body.len(), "fetched");

        Ok(HttpResponse {
            url: url.to_string(),
            final_url,
            status: status.as_u16(),
            body,
        })
    }
}

/// Spaces out request starts within one crawl session.
///
/// Each session owns its own throttle, so sessions for different
/// characters are not rate limited against each other.
pub struct Throttle {
    delay: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(None),
        }
    }

    /// Wait for this caller's turn. The first call never sleeps.
    pub async fn wait(&self) {
        if self.delay.is_zero() {
            return;
        }
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + self.delay);
            slot
        };
        tokio::time::sleep_until(slot).await;
    }
}

/// A client bound to one session's throttle.
pub struct PoliteClient<'a> {
    http: &'a HttpClient,
    throttle: &'a Throttle,
}

impl<'a> PoliteClient<'a> {
    pub fn new(http: &'a HttpClient, throttle: &'a Throttle) -> Self {
        Self { http, throttle }
    }

    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.throttle.wait().await;
        self.http.get(url).await
    }
}
