//! Byte fetching and progress reporting.
//!
//! The [`Fetcher`] trait abstracts over where bytes come from so sources can
//! be exercised against in-memory fixtures. [`HttpFetcher`] is the real
//! implementation: a blocking GET with an optional bounded retry.

use crate::config::HttpConfig;
use crate::error::DatasetError;
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on the pause between two attempts.
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Source of raw bytes addressed by URL.
pub trait Fetcher: Send + Sync {
    /// Human-readable name of this fetcher.
    fn name(&self) -> &str;

    /// Download the full body behind `url`.
    fn get(&self, url: &str) -> Result<Vec<u8>, DatasetError>;
}

/// Blocking HTTP fetcher.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, DatasetError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| DatasetError::NetworkUnreachable(format!("failed to build client: {e}")))?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(500),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Pause before retry number `attempt` (1-based): doubling, capped.
    fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt.saturating_sub(1))
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(MAX_DELAY, |delay| delay.min(MAX_DELAY))
    }

    fn get_once(&self, url: &str) -> Result<Vec<u8>, Attempt> {
        let resp = self.client.get(url).send().map_err(|e| {
            let err = DatasetError::NetworkUnreachable(format!("{url}: {e}"));
            if e.is_connect() || e.is_timeout() {
                Attempt::Retry(err)
            } else {
                Attempt::Fatal(err)
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let err = DatasetError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            };
            return Err(
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    Attempt::Retry(err)
                } else {
                    Attempt::Fatal(err)
                },
            );
        }

        resp.bytes()
            .map(|b| b.to_vec())
            .map_err(|e| Attempt::Retry(DatasetError::NetworkUnreachable(format!("{url}: {e}"))))
    }
}

/// Outcome of a failed attempt.
enum Attempt {
    Retry(DatasetError),
    Fatal(DatasetError),
}

impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    fn get(&self, url: &str) -> Result<Vec<u8>, DatasetError> {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                std::thread::sleep(self.delay_for(attempt));
            }

            match self.get_once(url) {
                Ok(bytes) => {
                    debug!(url, bytes = bytes.len(), "fetched");
                    return Ok(bytes);
                }
                Err(Attempt::Fatal(e)) => return Err(e),
                Err(Attempt::Retry(e)) if attempt < self.max_retries => {
                    warn!(url, attempt, error = %e, "retrying");
                    attempt += 1;
                }
                Err(Attempt::Retry(e)) => return Err(e),
            }
        }
    }
}

/// Progress callback for a collection download.
pub trait FetchProgress {
    /// Called when starting to fetch a dataset.
    fn on_start(&self, name: &str, index: usize, total: usize);

    /// Called with the `(rows, columns)` shape once a dataset is normalized.
    fn on_complete(&self, name: &str, index: usize, total: usize, shape: (usize, usize));

    /// Called when every dataset, including derived ones, is ready.
    fn on_batch_complete(&self, originals: usize, derived: usize);
}

/// Progress reporter that prints to stdout.
pub struct StdoutProgress;

impl FetchProgress for StdoutProgress {
    fn on_start(&self, name: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {name}...", index + 1, total);
    }

    fn on_complete(&self, name: &str, _index: usize, _total: usize, shape: (usize, usize)) {
        println!("  OK: {name} ({} rows, {} columns)", shape.0, shape.1);
    }

    fn on_batch_complete(&self, originals: usize, derived: usize) {
        println!("\nDatasets ready: {originals} fetched, {derived} derived");
    }
}

/// Progress reporter that reports nothing.
pub struct SilentProgress;

impl FetchProgress for SilentProgress {
    fn on_start(&self, _name: &str, _index: usize, _total: usize) {}
    fn on_complete(&self, _name: &str, _index: usize, _total: usize, _shape: (usize, usize)) {}
    fn on_batch_complete(&self, _originals: usize, _derived: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    /// Serve one canned `(status, body)` response per connection, in order.
    /// Joining the handle yields the number of requests answered.
    fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<usize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/data", listener.local_addr().unwrap());

        let handle = std::thread::spawn(move || {
            let mut served = 0;
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = stream.read(&mut buf).unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                }
                let response = format!(
                    "HTTP/1.1 {status} Canned\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).unwrap();
                served += 1;
            }
            served
        });

        (url, handle)
    }

    fn fetcher(max_retries: u32) -> HttpFetcher {
        let config = HttpConfig {
            timeout_secs: 5,
            max_retries,
            ..HttpConfig::default()
        };
        HttpFetcher::new(&config)
            .unwrap()
            .with_base_delay(Duration::from_millis(1))
    }

    #[test]
    fn success_returns_body() {
        let (url, server) = serve(vec![(200, "abc")]);
        assert_eq!(fetcher(0).get(&url).unwrap(), b"abc");
        assert_eq!(server.join().unwrap(), 1);
    }

    #[test]
    fn client_errors_fail_without_retry() {
        let (url, server) = serve(vec![(404, "")]);
        let err = fetcher(2).get(&url).unwrap_err();
        assert!(matches!(err, DatasetError::HttpStatus { status: 404, .. }));
        assert_eq!(server.join().unwrap(), 1);
    }

    #[test]
    fn server_errors_are_retried() {
        let (url, server) = serve(vec![(503, ""), (200, "abc")]);
        assert_eq!(fetcher(1).get(&url).unwrap(), b"abc");
        assert_eq!(server.join().unwrap(), 2);
    }

    #[test]
    fn too_many_requests_is_retried() {
        let (url, server) = serve(vec![(429, ""), (200, "ok")]);
        assert_eq!(fetcher(1).get(&url).unwrap(), b"ok");
        assert_eq!(server.join().unwrap(), 2);
    }

    #[test]
    fn default_config_makes_one_attempt() {
        let (url, server) = serve(vec![(503, "")]);
        let fetcher = HttpFetcher::new(&HttpConfig::default()).unwrap();
        let err = fetcher.get(&url).unwrap_err();
        assert!(matches!(err, DatasetError::HttpStatus { status: 503, .. }));
        assert_eq!(server.join().unwrap(), 1);
    }

    #[test]
    fn retries_stop_at_the_limit() {
        let (url, server) = serve(vec![(500, ""), (502, ""), (503, "")]);
        let err = fetcher(2).get(&url).unwrap_err();
        assert!(matches!(err, DatasetError::HttpStatus { status: 503, .. }));
        assert_eq!(server.join().unwrap(), 3);
    }

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let f = HttpFetcher::new(&HttpConfig::default()).unwrap();
        assert_eq!(f.delay_for(1), Duration::from_millis(500));
        assert_eq!(f.delay_for(2), Duration::from_millis(1000));
        assert_eq!(f.delay_for(4), Duration::from_millis(4000));
        assert_eq!(f.delay_for(10), MAX_DELAY);
        assert_eq!(f.delay_for(40), MAX_DELAY);
        assert_eq!(f.delay_for(u32::MAX), MAX_DELAY);
    }
}
