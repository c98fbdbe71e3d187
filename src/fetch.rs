use crate::error::ScrapeError;
use serde::de::DeserializeOwned;
use tokio::{
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{debug, warn};

pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    /// Minimum gap between two consecutive requests.
    pub politeness_delay: Duration,
    /// Total attempts per request, `1` means no retry.
    pub attempts: u32,
    /// Wait before the second attempt, doubled for every following one.
    pub backoff: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            timeout: Duration::from_secs(30),
            politeness_delay: Duration::from_millis(300),
            attempts: 1,
            backoff: Duration::from_millis(500),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// Shared HTTP client for every extractor.
pub struct Fetcher {
    client: reqwest::Client,
    config: FetchConfig,
    last_request: Mutex<Option<Instant>>,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|source| ScrapeError::Http {
                url: String::new(),
                source,
            })?;
        Ok(Fetcher {
            client,
            config,
            last_request: Mutex::new(None),
        })
    }

    pub async fn get_text(&self, url: &str) -> Result<String, ScrapeError> {
        self.with_retry(url, || self.get_once(url)).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ScrapeError> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|source| ScrapeError::Json {
            url: url.to_string(),
            source,
        })
    }

    async fn get_once(&self, url: &str) -> Result<String, ScrapeError> {
        self.pace().await;

        debug!("Visit {}", url);
        let http_err = |source| ScrapeError::Http {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(http_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status,
            });
        }
        response.text().await.map_err(http_err)
    }

    async fn with_retry<F, Fut>(&self, url: &str, mut op: F) -> Result<String, ScrapeError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<String, ScrapeError>>,
    {
        let attempts = self.config.attempts.max(1);
        let mut backoff = self.config.backoff;
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(body) => return Ok(body),
                Err(err) if attempt < attempts && err.is_transient() => {
                    warn!(
                        "Attempt {}/{} for {} failed: {}, retrying in {:?}",
                        attempt, attempts, url, err, backoff
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Sleeps until the politeness delay since the previous request has passed.
    async fn pace(&self) {
        let mut last_request = self.last_request.lock().await;
        if let Some(last) = last_request.take() {
            let elapsed = Instant::now().duration_since(last);
            if elapsed < self.config.politeness_delay {
                tokio::time::sleep(self.config.politeness_delay - elapsed).await;
            }
        }
        last_request.replace(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fetcher(attempts: u32) -> Fetcher {
        Fetcher::new(FetchConfig {
            attempts,
            backoff: Duration::from_millis(1),
            politeness_delay: Duration::ZERO,
            ..FetchConfig::default()
        })
        .expect("client")
    }

    fn server_error() -> ScrapeError {
        ScrapeError::Status {
            url: "https://example.com".to_string(),
            status: reqwest::StatusCode::BAD_GATEWAY,
        }
    }

    #[tokio::test]
    async fn single_attempt_by_default() {
        let f = fetcher(1);
        let calls = Cell::new(0);
        let res = f
            .with_retry("https://example.com", || {
                calls.set(calls.get() + 1);
                async { Err(server_error()) }
            })
            .await;
        assert!(res.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn transient_errors_are_retried() {
        let f = fetcher(3);
        let calls = Cell::new(0);
        let res = f
            .with_retry("https://example.com", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 3 {
                        Err(server_error())
                    } else {
                        Ok("body".to_string())
                    }
                }
            })
            .await;
        assert_eq!(res.expect("third attempt succeeds"), "body");
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let f = fetcher(3);
        let calls = Cell::new(0);
        let res = f
            .with_retry("https://example.com", || {
                calls.set(calls.get() + 1);
                async {
                    Err(ScrapeError::Status {
                        url: "https://example.com".to_string(),
                        status: reqwest::StatusCode::NOT_FOUND,
                    })
                }
            })
            .await;
        assert!(res.is_err());
        assert_eq!(calls.get(), 1);
    }
}
