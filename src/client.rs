use reqwest::header::HeaderMap;

use crate::{
    caller::{Caller, CallerParams},
    HealthClient, RequestOption, ResolvedOptions, ServiceClient,
};

/// Top-level client for the Seed Examples API.
///
/// Holds the resolved base URL, default headers and retrying caller, plus
/// one sub-client per API resource. Every sub-client is built from the same
/// option sequence as the parent, so all of them share one configuration.
#[derive(Clone, Debug)]
pub struct Client {
    base_url: String,
    caller: Caller,
    header: HeaderMap,
    service: ServiceClient,
    health: HealthClient,
}

impl Client {
    /// Builds a client from options applied in order over the defaults.
    ///
    /// Construction never fails and performs no I/O. Invalid values surface
    /// as request errors later.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use seed_examples_http::{Client, RequestOption};
    ///
    /// let client = Client::new([
    ///     RequestOption::base_url("https://x.test"),
    ///     RequestOption::max_attempts(3),
    /// ]);
    /// assert_eq!(client.base_url(), "https://x.test");
    /// ```
    pub fn new<I>(opts: I) -> Self
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let opts: Vec<RequestOption> = opts.into_iter().collect();
        let options = ResolvedOptions::new(opts.iter().cloned());

        #[cfg(feature = "tracing")]
        tracing::debug!(
            base_url = %options.base_url,
            max_attempts = options.max_attempts,
            "constructed client"
        );

        Self {
            caller: Caller::new(CallerParams::from(&options)),
            header: options.to_header(),
            base_url: options.base_url,
            service: ServiceClient::new(opts.iter().cloned()),
            health: HealthClient::new(opts),
        }
    }

    /// Creates a client from `SEED_EXAMPLES_*` environment variables.
    ///
    /// See [`options_from_env`](crate::options_from_env) for the variables
    /// read. Unset variables fall back to defaults.
    ///
    /// **Not available on `wasm32` targets.**
    ///
    /// # Example
    ///
    /// ```no_run
    /// use seed_examples_http::Client;
    ///
    /// let client = Client::from_env().expect("invalid SEED_EXAMPLES_* env vars");
    /// ```
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> std::result::Result<Self, String> {
        crate::options::options_from_env().map(Self::new)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Default headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.header
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    /// Movie resource.
    pub fn service(&self) -> &ServiceClient {
        &self.service
    }

    /// Health-check resource.
    pub fn health(&self) -> &HealthClient {
        &self.health
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(std::iter::empty())
    }
}
