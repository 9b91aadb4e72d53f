use std::time::Duration;

use reqwest::{
    header::{self, HeaderMap},
    Method, StatusCode, Url,
};
use serde::{de::DeserializeOwned, Serialize};

// tokio::time::sleep is only available on non-WASM targets.
#[cfg(not(target_arch = "wasm32"))]
use tokio::time::sleep;

use crate::{
    options::{merge_headers, RequestOptions},
    Error, RequestOption, ResolvedOptions, Result,
};

/// Upper bound for a single retry delay, including `Retry-After` values.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Construction parameters for [`Caller`].
#[derive(Clone, Debug)]
pub struct CallerParams {
    pub client: reqwest::Client,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
    pub timeout: Option<Duration>,
}

impl From<&ResolvedOptions> for CallerParams {
    fn from(options: &ResolvedOptions) -> Self {
        Self {
            client: options.http_client.clone(),
            max_attempts: options.max_attempts,
            retry_backoff: options.retry_backoff,
            timeout: options.timeout,
        }
    }
}

/// A single request handed to [`Caller::call`].
///
/// The `Option` fields override the caller's own configuration for this
/// request only.
#[derive(Clone, Debug)]
pub struct CallParams {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
    pub max_attempts: Option<u32>,
    pub client: Option<reqwest::Client>,
    pub timeout: Option<Duration>,
    pub retry_backoff: Option<Duration>,
}

impl CallParams {
    /// Resolves request-level options against a client's base URL and headers.
    ///
    /// The per-call base URL replaces the client's; per-call headers are
    /// merged by name over `header`.
    pub(crate) fn prepare(
        base_url: &str,
        header: &HeaderMap,
        method: Method,
        segments: &[&str],
        opts: &[RequestOption],
    ) -> Result<Self> {
        let options = RequestOptions::new(opts.iter().cloned());
        let url = encode_url(options.base_url.as_deref().unwrap_or(base_url), segments)?;

        let mut headers = header.clone();
        merge_headers(&mut headers, &options.to_header());

        Ok(Self {
            method,
            url,
            headers,
            body: None,
            max_attempts: options.max_attempts,
            client: options.http_client,
            timeout: options.timeout,
            retry_backoff: options.retry_backoff,
        })
    }

    /// Attaches a JSON request body.
    pub(crate) fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|err| Error::Encode(format!("invalid request body: {err}")))?;
        self.body = Some(value);
        Ok(self)
    }
}

/// Executes requests with retry on transient failures.
#[derive(Clone, Debug)]
pub struct Caller {
    client: reqwest::Client,
    max_attempts: u32,
    retry_backoff: Duration,
    timeout: Option<Duration>,
}

impl Caller {
    pub fn new(params: CallerParams) -> Self {
        Self {
            client: params.client,
            max_attempts: params.max_attempts,
            retry_backoff: params.retry_backoff,
            timeout: params.timeout,
        }
    }

    /// Total attempts per request, as configured.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn retry_backoff(&self) -> Duration {
        self.retry_backoff
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Sends the request and returns the body of the first successful response.
    ///
    /// At least one attempt is always made, even when `max_attempts` is zero.
    pub async fn call(&self, params: CallParams) -> Result<String> {
        let client = params.client.as_ref().unwrap_or(&self.client);
        let max_attempts = params.max_attempts.unwrap_or(self.max_attempts).max(1);
        let timeout = params.timeout.or(self.timeout);
        let backoff = params.retry_backoff.unwrap_or(self.retry_backoff);

        let mut attempt = 0u32;
        loop {
            let mut request = client
                .request(params.method.clone(), params.url.clone())
                .headers(params.headers.clone());
            if let Some(timeout) = timeout {
                request = request.timeout(timeout);
            }
            if let Some(body) = &params.body {
                request = request.json(body);
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(
                method = %params.method,
                url = %params.url,
                attempt = attempt + 1,
                max_attempts,
                "sending request"
            );

            let can_retry = attempt + 1 < max_attempts;
            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    let retry_after = parse_retry_after(response.headers());
                    let body = match response.text().await {
                        Ok(body) => body,
                        Err(err) if should_retry_transport(&err) && can_retry => {
                            wait_before_retry(retry_delay(backoff, attempt, None)).await;
                            attempt += 1;
                            continue;
                        }
                        Err(err) => return Err(Error::Transport(err)),
                    };

                    if status.is_success() {
                        return Ok(body);
                    }
                    if should_retry_status(status) && can_retry {
                        wait_before_retry(retry_delay(backoff, attempt, retry_after)).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(Error::Http {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(err) => {
                    if should_retry_transport(&err) && can_retry {
                        wait_before_retry(retry_delay(backoff, attempt, None)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(Error::Transport(err));
                }
            }
        }
    }
}

/// Appends percent-encoded path segments to `base_url`.
pub(crate) fn encode_url(base_url: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|err| Error::InvalidUrl(format!("'{base_url}': {err}")))?;
    url.path_segments_mut()
        .map_err(|()| Error::InvalidUrl(format!("'{base_url}' cannot be a base url")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|err| Error::Decode(format!("invalid response JSON: {err}; body: {body}")))
}

fn should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

fn should_retry_transport(err: &reqwest::Error) -> bool {
    err.is_timeout()
        || err.is_request()
        || err.is_body()
        // a truncated or undecodable response body
        || err.is_decode()
        // is_connect() is not available on wasm32 targets (no TCP)
        || {
            #[cfg(not(target_arch = "wasm32"))]
            { err.is_connect() }
            #[cfg(target_arch = "wasm32")]
            { false }
        }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Exponential backoff from `backoff`, unless the server asked for a delay.
fn retry_delay(backoff: Duration, attempt: u32, retry_after: Option<Duration>) -> Duration {
    retry_after
        .unwrap_or_else(|| backoff.saturating_mul(1u32 << attempt.min(16)))
        .min(MAX_RETRY_DELAY)
}

/// Waits before the next retry attempt.
///
/// On WASM targets this is a no-op: edge runtimes prefer fast failure over
/// sleeping, and `tokio::time::sleep` is not available.
async fn wait_before_retry(delay: Duration) {
    #[cfg(feature = "tracing")]
    tracing::debug!("retrying request after {} ms", delay.as_millis());

    #[cfg(not(target_arch = "wasm32"))]
    sleep(delay).await;

    #[cfg(target_arch = "wasm32")]
    let _ = delay;
}
