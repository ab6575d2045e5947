use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

/// What to do with a non-2xx response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusPolicy {
    /// Treat it as a transport failure.
    #[default]
    Reject,
    /// Hand the error page to the extractor, as the legacy scraper did.
    Parse,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {status}")]
    Status { status: u16 },
}

/// Source of raw page bytes.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Sleeps a fixed delay before every call to the wrapped fetcher.
pub struct Paced<F> {
    inner: F,
    delay: Duration,
}

impl<F> Paced<F> {
    pub fn new(inner: F, delay: Duration) -> Self {
        Paced { inner, delay }
    }
}

impl<F: Fetch> Fetch for Paced<F> {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch(url).await
    }
}

/// Plain HTTP fetcher; wrap it in [`Paced`] for rate limiting.
pub struct HttpFetcher {
    client: reqwest::Client,
    policy: StatusPolicy,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str, policy: StatusPolicy) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(HttpFetcher { client, policy })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        debug!("GET {} -> {}", url, status);
        check_status(self.policy, status.as_u16())?;

        Ok(response.bytes().await?.to_vec())
    }
}

fn check_status(policy: StatusPolicy, status: u16) -> Result<(), FetchError> {
    let success = (200..300).contains(&status);
    match policy {
        StatusPolicy::Reject if !success => Err(FetchError::Status { status }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_policy_fails_non_success() {
        assert!(check_status(StatusPolicy::Reject, 200).is_ok());
        assert!(matches!(
            check_status(StatusPolicy::Reject, 404),
            Err(FetchError::Status { status: 404 })
        ));
        assert!(check_status(StatusPolicy::Reject, 503).is_err());
    }

    #[test]
    fn parse_policy_accepts_everything() {
        assert!(check_status(StatusPolicy::Parse, 404).is_ok());
        assert!(check_status(StatusPolicy::Parse, 500).is_ok());
    }

    #[test]
    fn policy_names_deserialize() {
        let p: StatusPolicy = serde_json::from_str("\"parse\"").unwrap();
        assert_eq!(p, StatusPolicy::Parse);
        assert_eq!(StatusPolicy::default(), StatusPolicy::Reject);
    }

    #[tokio::test]
    async fn connection_errors_surface_as_http() {
        let fetcher = HttpFetcher::new(
            Duration::from_secs(2),
            "product_scraper-test",
            StatusPolicy::Reject,
        )
        .unwrap();
        let err = fetcher.fetch("http://127.0.0.1:9/product/1").await.unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
    }

    /// Records the virtual time of every call it receives.
    struct ClockFetcher {
        calls: std::sync::Mutex<Vec<tokio::time::Instant>>,
    }

    impl Fetch for ClockFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.lock().unwrap().push(tokio::time::Instant::now());
            Ok(b"<html></html>".to_vec())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn paced_fetcher_waits_before_every_request() {
        let delay = Duration::from_secs(5);
        let paced = Paced::new(ClockFetcher { calls: Default::default() }, delay);
        let start = tokio::time::Instant::now();

        paced.fetch("https://www.rei.com/product/1").await.unwrap();
        paced.fetch("https://www.rei.com/product/2").await.unwrap();

        let calls = paced.inner.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);
        assert!(calls[0] - start >= delay);
        assert!(calls[1] - calls[0] >= delay);
        assert!(start.elapsed() >= delay * 2);
    }
}
