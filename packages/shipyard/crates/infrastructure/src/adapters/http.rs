use async_trait::async_trait;
use domain::ports::network::{HttpClient, NetworkError};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::time::sleep;

const USER_AGENT: &str = concat!("shipyard/", env!("CARGO_PKG_VERSION"));

/// Plain `reqwest` client. One attempt per call; wrap it in
/// [`RetryingHttpClient`] for backoff.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, NetworkError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NetworkError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        let response = self.send(url).await?;

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| NetworkError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(url, bytes = body.len(), "Downloaded");
        Ok(body)
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, NetworkError> {
        let response = self.send(url).await?;
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| NetworkError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    fn next_backoff(&self, current: Duration) -> Duration {
        std::cmp::min(current.saturating_mul(2), self.max_backoff)
    }
}

/// Retries transient failures of the wrapped client.
pub struct RetryingHttpClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: HttpClient> RetryingHttpClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn with_retry<T, F, Fut>(&self, url: &str, mut call: F) -> Result<T, NetworkError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, NetworkError>> + Send,
        T: Send,
    {
        let attempts = self.policy.max_attempts.max(1);
        let mut backoff = self.policy.initial_backoff;
        let mut attempt = 1;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() || attempt >= attempts => return Err(err),
                Err(err) => {
                    tracing::warn!(
                        url,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "Request failed, retrying"
                    );
                    sleep(backoff).await;
                    backoff = self.policy.next_backoff(backoff);
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for RetryingHttpClient<C> {
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        self.with_retry(url, || self.inner.get_bytes(url)).await
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, NetworkError> {
        self.with_retry(url, || self.inner.get_json(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with `error` for the first `failures` calls.
    struct Flaky {
        failures: u32,
        error: NetworkError,
        calls: AtomicU32,
    }

    #[async_trait]
    impl HttpClient for Flaky {
        async fn get_bytes(&self, _url: &str) -> Result<Vec<u8>, NetworkError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(self.error.clone())
            } else {
                Ok(vec![1, 2, 3])
            }
        }

        async fn get_json(&self, url: &str) -> Result<serde_json::Value, NetworkError> {
            self.get_bytes(url).await.map(|_| serde_json::json!({}))
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        }
    }

    fn transient() -> NetworkError {
        NetworkError::Request {
            url: "u".into(),
            reason: "reset".into(),
        }
    }

    #[tokio::test]
    async fn recovers_from_transient_failures() {
        let client = RetryingHttpClient::new(
            Flaky {
                failures: 2,
                error: transient(),
                calls: AtomicU32::new(0),
            },
            fast_policy(3),
        );

        assert_eq!(client.get_bytes("u").await.unwrap(), vec![1, 2, 3]);
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let client = RetryingHttpClient::new(
            Flaky {
                failures: 10,
                error: transient(),
                calls: AtomicU32::new(0),
            },
            fast_policy(3),
        );

        assert!(client.get_bytes("u").await.is_err());
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_not_found() {
        let client = RetryingHttpClient::new(
            Flaky {
                failures: 10,
                error: NetworkError::Status {
                    url: "u".into(),
                    status: 404,
                },
                calls: AtomicU32::new(0),
            },
            fast_policy(5),
        );

        assert!(client.get_json("u").await.is_err());
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(400),
            max_backoff: Duration::from_millis(500),
        };
        assert_eq!(
            policy.next_backoff(Duration::from_millis(400)),
            Duration::from_millis(500)
        );
    }
}
