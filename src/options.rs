use std::{fmt, sync::OnceLock, time::Duration};

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::{environment::DEFAULT_BASE_URL, Environment};

/// Attempt count used when no option overrides it (initial try plus one retry).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Base retry backoff used when no option overrides it.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

const SDK_NAME: &str = env!("CARGO_PKG_NAME");
const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A single configuration modifier.
///
/// Options are applied in the order given; a later option overrides an
/// earlier one for the same field. Header options merge by name: each name
/// present in a later option replaces that name's earlier values.
#[derive(Clone)]
#[non_exhaustive]
pub enum RequestOption {
    BaseUrl(String),
    HttpClient(reqwest::Client),
    MaxAttempts(u32),
    Headers(HeaderMap),
    Token(String),
    Timeout(Duration),
    RetryBackoff(Duration),
}

impl RequestOption {
    /// Overrides the API base URL.
    pub fn base_url(url: impl Into<String>) -> Self {
        Self::BaseUrl(url.into())
    }

    /// Points the client at a named environment.
    pub fn environment(environment: Environment) -> Self {
        Self::BaseUrl(environment.url().to_owned())
    }

    /// Overrides the HTTP transport.
    pub fn http_client(client: reqwest::Client) -> Self {
        Self::HttpClient(client)
    }

    /// Overrides the total number of attempts per request.
    pub fn max_attempts(attempts: u32) -> Self {
        Self::MaxAttempts(attempts)
    }

    /// Sets one header, replacing earlier values for the same name.
    ///
    /// A name or value that is not a valid HTTP header is ignored.
    pub fn header(name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let mut headers = HeaderMap::new();
        match (
            HeaderName::from_bytes(name.as_ref().as_bytes()),
            HeaderValue::from_str(value.as_ref()),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => {
                #[cfg(feature = "tracing")]
                tracing::warn!(header = name.as_ref(), "ignoring invalid header option");
            }
        }
        Self::Headers(headers)
    }

    /// Merges a header map; every name it contains replaces earlier values.
    pub fn headers(headers: HeaderMap) -> Self {
        Self::Headers(headers)
    }

    /// Authenticates with a bearer token.
    ///
    /// If the token is missing the `Bearer ` prefix, it is added automatically.
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    /// Sets a timeout for each individual attempt.
    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout(timeout)
    }

    /// Sets the base delay of the exponential retry backoff.
    pub fn retry_backoff(backoff: Duration) -> Self {
        Self::RetryBackoff(backoff)
    }

    fn apply(self, options: &mut RequestOptions) {
        match self {
            Self::BaseUrl(url) => options.base_url = Some(url),
            Self::HttpClient(client) => options.http_client = Some(client),
            Self::MaxAttempts(attempts) => options.max_attempts = Some(attempts),
            Self::Headers(headers) => merge_headers(&mut options.headers, &headers),
            Self::Token(token) => options.token = Some(token),
            Self::Timeout(timeout) => options.timeout = Some(timeout),
            Self::RetryBackoff(backoff) => options.retry_backoff = Some(backoff),
        }
    }
}

impl fmt::Debug for RequestOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BaseUrl(url) => f.debug_tuple("BaseUrl").field(url).finish(),
            Self::HttpClient(_) => f.write_str("HttpClient(..)"),
            Self::MaxAttempts(attempts) => f.debug_tuple("MaxAttempts").field(attempts).finish(),
            Self::Headers(headers) => f.debug_tuple("Headers").field(headers).finish(),
            Self::Token(_) => f.write_str("Token(<redacted>)"),
            Self::Timeout(timeout) => f.debug_tuple("Timeout").field(timeout).finish(),
            Self::RetryBackoff(backoff) => f.debug_tuple("RetryBackoff").field(backoff).finish(),
        }
    }
}

/// Options exactly as supplied, with unset fields left empty.
///
/// Request-level options are folded into this record so that only the
/// fields a call actually sets override the client configuration.
#[derive(Clone, Default)]
pub(crate) struct RequestOptions {
    pub(crate) base_url: Option<String>,
    pub(crate) http_client: Option<reqwest::Client>,
    pub(crate) max_attempts: Option<u32>,
    pub(crate) headers: HeaderMap,
    pub(crate) token: Option<String>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) retry_backoff: Option<Duration>,
}

impl RequestOptions {
    pub(crate) fn new<I>(opts: I) -> Self
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let mut options = Self::default();
        for opt in opts {
            opt.apply(&mut options);
        }
        options
    }

    /// Headers contributed by these options alone, without SDK headers.
    pub(crate) fn to_header(&self) -> HeaderMap {
        let mut header = HeaderMap::new();
        if let Some(token) = &self.token {
            insert_bearer(&mut header, token);
        }
        merge_headers(&mut header, &self.headers);
        header
    }

    pub(crate) fn resolve(self) -> ResolvedOptions {
        ResolvedOptions {
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            http_client: self.http_client.unwrap_or_else(default_http_client),
            max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            headers: self.headers,
            token: self.token,
            timeout: self.timeout,
            retry_backoff: self.retry_backoff.unwrap_or(DEFAULT_RETRY_BACKOFF),
        }
    }
}

/// Fully populated configuration after applying options over defaults.
#[derive(Clone)]
pub struct ResolvedOptions {
    pub base_url: String,
    pub http_client: reqwest::Client,
    pub max_attempts: u32,
    pub headers: HeaderMap,
    pub token: Option<String>,
    pub timeout: Option<Duration>,
    pub retry_backoff: Duration,
}

impl ResolvedOptions {
    /// Folds `opts` in order over the defaults.
    pub fn new<I>(opts: I) -> Self
    where
        I: IntoIterator<Item = RequestOption>,
    {
        RequestOptions::new(opts).resolve()
    }

    /// Builds the default header set sent with every request.
    ///
    /// SDK identification headers come first, then the bearer token, then
    /// user headers, so user headers win on conflicts.
    pub fn to_header(&self) -> HeaderMap {
        let mut header = HeaderMap::new();
        header.insert(
            HeaderName::from_static("x-sdk-name"),
            HeaderValue::from_static(SDK_NAME),
        );
        header.insert(
            HeaderName::from_static("x-sdk-version"),
            HeaderValue::from_static(SDK_VERSION),
        );
        if let Some(token) = &self.token {
            insert_bearer(&mut header, token);
        }
        merge_headers(&mut header, &self.headers);
        header
    }
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        RequestOptions::default().resolve()
    }
}

impl fmt::Debug for ResolvedOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedOptions")
            .field("base_url", &self.base_url)
            .field("max_attempts", &self.max_attempts)
            .field("headers", &self.headers)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("retry_backoff", &self.retry_backoff)
            .finish_non_exhaustive()
    }
}

/// Replaces every header name present in `overlay`, keeping all of its values.
///
/// Credential headers are marked sensitive so `Debug` output redacts them.
pub(crate) fn merge_headers(base: &mut HeaderMap, overlay: &HeaderMap) {
    for name in overlay.keys() {
        base.remove(name);
        let sensitive = is_credential_header(name);
        for value in overlay.get_all(name) {
            let mut value = value.clone();
            if sensitive {
                value.set_sensitive(true);
            }
            base.append(name.clone(), value);
        }
    }
}

fn is_credential_header(name: &HeaderName) -> bool {
    *name == header::AUTHORIZATION
        || *name == header::PROXY_AUTHORIZATION
        || *name == header::COOKIE
}

fn insert_bearer(header: &mut HeaderMap, token: &str) {
    match HeaderValue::from_str(&normalize_bearer_authorization(token)) {
        Ok(mut value) => {
            value.set_sensitive(true);
            header.insert(header::AUTHORIZATION, value);
        }
        Err(_) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("ignoring bearer token that is not a valid header value");
        }
    }
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}

// One connection pool for every client built without an explicit transport.
fn default_http_client() -> reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(reqwest::Client::new).clone()
}

/// Builds options from `SEED_EXAMPLES_*` environment variables.
///
/// Reads:
/// - `SEED_EXAMPLES_BASE_URL` — overrides the base URL
/// - `SEED_EXAMPLES_TOKEN` — bearer token
/// - `SEED_EXAMPLES_MAX_ATTEMPTS` — total attempts per request
///
/// Unset or empty variables are skipped. Returns an error only when
/// `SEED_EXAMPLES_MAX_ATTEMPTS` is set but not a non-negative integer.
///
/// **Not available on `wasm32` targets** — environment variables do not
/// exist in browser runtimes.
#[cfg(not(target_arch = "wasm32"))]
pub fn options_from_env() -> std::result::Result<Vec<RequestOption>, String> {
    options_from_lookup(|key| std::env::var(key).ok())
}

#[cfg_attr(target_arch = "wasm32", allow(dead_code))]
pub(crate) fn options_from_lookup<F>(lookup: F) -> std::result::Result<Vec<RequestOption>, String>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
    let mut opts = Vec::new();

    if let Some(url) = read("SEED_EXAMPLES_BASE_URL") {
        opts.push(RequestOption::base_url(url.trim()));
    }
    if let Some(token) = read("SEED_EXAMPLES_TOKEN") {
        opts.push(RequestOption::token(token));
    }
    if let Some(raw) = read("SEED_EXAMPLES_MAX_ATTEMPTS") {
        let attempts = raw
            .trim()
            .parse::<u32>()
            .map_err(|err| format!("invalid SEED_EXAMPLES_MAX_ATTEMPTS '{raw}': {err}"))?;
        opts.push(RequestOption::max_attempts(attempts));
    }

    Ok(opts)
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

    use super::{
        normalize_bearer_authorization, options_from_lookup, RequestOption, RequestOptions,
        ResolvedOptions, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BACKOFF,
    };
    use crate::{Environment, DEFAULT_BASE_URL};

    fn values(headers: &HeaderMap, name: &str) -> Vec<String> {
        headers
            .get_all(name)
            .iter()
            .map(|value| value.to_str().expect("ascii header").to_owned())
            .collect()
    }

    #[test]
    fn no_options_resolve_to_defaults() {
        let options = ResolvedOptions::new([]);
        assert_eq!(options.base_url, DEFAULT_BASE_URL);
        assert_eq!(options.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(options.retry_backoff, DEFAULT_RETRY_BACKOFF);
        assert!(options.headers.is_empty());
        assert!(options.token.is_none());
        assert!(options.timeout.is_none());
    }

    #[test]
    fn later_base_url_wins() {
        let options = ResolvedOptions::new([
            RequestOption::base_url("https://x.test"),
            RequestOption::base_url("https://y.test"),
        ]);
        assert_eq!(options.base_url, "https://y.test");

        let options = ResolvedOptions::new([
            RequestOption::base_url("https://x.test"),
            RequestOption::environment(Environment::Staging),
        ]);
        assert_eq!(options.base_url, "https://staging.com/api");
    }

    #[test]
    fn scalar_options_are_last_write_wins() {
        let options = ResolvedOptions::new([
            RequestOption::max_attempts(5),
            RequestOption::timeout(Duration::from_secs(1)),
            RequestOption::max_attempts(3),
            RequestOption::retry_backoff(Duration::from_millis(5)),
        ]);
        assert_eq!(options.max_attempts, 3);
        assert_eq!(options.timeout, Some(Duration::from_secs(1)));
        assert_eq!(options.retry_backoff, Duration::from_millis(5));
    }

    #[test]
    fn distinct_headers_accumulate_and_same_name_is_overwritten() {
        let options = ResolvedOptions::new([
            RequestOption::header("x-a", "1"),
            RequestOption::header("x-b", "2"),
            RequestOption::header("X-A", "3"),
        ]);
        assert_eq!(values(&options.headers, "x-a"), vec!["3"]);
        assert_eq!(values(&options.headers, "x-b"), vec!["2"]);
    }

    #[test]
    fn header_map_option_keeps_its_multi_values() {
        let mut map = HeaderMap::new();
        map.append("x-tag", HeaderValue::from_static("one"));
        map.append("x-tag", HeaderValue::from_static("two"));

        let options = ResolvedOptions::new([
            RequestOption::header("x-tag", "zero"),
            RequestOption::header("x-other", "kept"),
            RequestOption::headers(map),
        ]);
        assert_eq!(values(&options.headers, "x-tag"), vec!["one", "two"]);
        assert_eq!(values(&options.headers, "x-other"), vec!["kept"]);
    }

    #[test]
    fn invalid_header_option_is_ignored() {
        let options = ResolvedOptions::new([
            RequestOption::header("x-ok", "1"),
            RequestOption::header("bad header", "2"),
            RequestOption::header("x-bad-value", "line\nbreak"),
        ]);
        assert_eq!(options.headers.len(), 1);
        assert_eq!(values(&options.headers, "x-ok"), vec!["1"]);
    }

    #[test]
    fn to_header_adds_sdk_headers_and_bearer_token() {
        let options = ResolvedOptions::new([
            RequestOption::token("abc123"),
            RequestOption::header("x-custom", "yes"),
        ]);
        let header = options.to_header();
        assert_eq!(values(&header, "x-sdk-name"), vec![env!("CARGO_PKG_NAME")]);
        assert_eq!(
            values(&header, "x-sdk-version"),
            vec![env!("CARGO_PKG_VERSION")]
        );
        assert_eq!(values(&header, "authorization"), vec!["Bearer abc123"]);
        assert!(header
            .get(AUTHORIZATION)
            .is_some_and(|value| value.is_sensitive()));
        assert_eq!(values(&header, "x-custom"), vec!["yes"]);
    }

    #[test]
    fn user_headers_override_sdk_headers() {
        let options = ResolvedOptions::new([
            RequestOption::token("abc123"),
            RequestOption::header("x-sdk-name", "wrapper"),
            RequestOption::header("authorization", "Basic Zm9v"),
        ]);
        let header = options.to_header();
        assert_eq!(values(&header, "x-sdk-name"), vec!["wrapper"]);
        assert_eq!(values(&header, "authorization"), vec!["Basic Zm9v"]);
    }

    #[test]
    fn request_level_header_omits_sdk_headers() {
        let header = RequestOptions::new([RequestOption::header("x-a", "1")]).to_header();
        assert_eq!(header.len(), 1);
    }

    #[test]
    fn normalize_bearer_adds_prefix_when_missing() {
        assert_eq!(
            normalize_bearer_authorization(" abc123 "),
            "Bearer abc123".to_owned()
        );
        assert_eq!(
            normalize_bearer_authorization("bEaReR abc123"),
            "bEaReR abc123".to_owned()
        );
    }

    #[test]
    fn debug_redacts_token() {
        let option = RequestOption::token("secret-token");
        assert!(!format!("{option:?}").contains("secret-token"));

        let options = ResolvedOptions::new([option]);
        let debug = format!("{options:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn user_credential_headers_are_sensitive() {
        let mut map = HeaderMap::new();
        map.insert(
            "proxy-authorization",
            HeaderValue::from_static("Basic cHJveHk="),
        );
        let options = ResolvedOptions::new([
            RequestOption::header("authorization", "Basic c2VjcmV0"),
            RequestOption::headers(map),
            RequestOption::header("x-plain", "visible"),
        ]);
        let header = options.to_header();

        assert!(header["authorization"].is_sensitive());
        assert!(header["proxy-authorization"].is_sensitive());
        assert!(!header["x-plain"].is_sensitive());
        let debug = format!("{header:?}");
        assert!(!debug.contains("c2VjcmV0"));
        assert!(!debug.contains("cHJveHk="));
        assert!(debug.contains("visible"));
    }

    #[test]
    fn options_from_lookup_reads_known_variables() {
        let env = HashMap::from([
            ("SEED_EXAMPLES_BASE_URL", " https://env.test "),
            ("SEED_EXAMPLES_TOKEN", "tok"),
            ("SEED_EXAMPLES_MAX_ATTEMPTS", "4"),
        ]);
        let opts = options_from_lookup(|key| env.get(key).map(|value| (*value).to_owned()))
            .expect("must parse");
        let options = ResolvedOptions::new(opts);
        assert_eq!(options.base_url, "https://env.test");
        assert_eq!(options.token.as_deref(), Some("tok"));
        assert_eq!(options.max_attempts, 4);
    }

    #[test]
    fn options_from_lookup_skips_missing_and_rejects_bad_attempts() {
        let opts = options_from_lookup(|_| None).expect("empty env is fine");
        assert!(opts.is_empty());

        let err = options_from_lookup(|key| {
            (key == "SEED_EXAMPLES_MAX_ATTEMPTS").then(|| "many".to_owned())
        })
        .expect_err("must reject");
        assert!(err.contains("SEED_EXAMPLES_MAX_ATTEMPTS"));
    }
}
