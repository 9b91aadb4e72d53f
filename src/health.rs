use reqwest::{header::HeaderMap, Method};

use crate::{
    caller::{decode_json, CallParams, Caller, CallerParams},
    RequestOption, ResolvedOptions, Result,
};

/// Client for the health-check resource.
#[derive(Clone, Debug)]
pub struct HealthClient {
    base_url: String,
    caller: Caller,
    header: HeaderMap,
}

impl HealthClient {
    pub fn new<I>(opts: I) -> Self
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let options = ResolvedOptions::new(opts);
        Self {
            caller: Caller::new(CallerParams::from(&options)),
            header: options.to_header(),
            base_url: options.base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.header
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    /// Checks a single dependency: `GET /check/{id}`.
    ///
    /// Any success status counts as healthy; the body is ignored.
    pub async fn check(&self, id: &str, opts: &[RequestOption]) -> Result<()> {
        let params = CallParams::prepare(
            &self.base_url,
            &self.header,
            Method::GET,
            &["check", id],
            opts,
        )?;
        self.caller.call(params).await?;
        Ok(())
    }

    /// Pings the service: `GET /ping`.
    pub async fn ping(&self, opts: &[RequestOption]) -> Result<bool> {
        let params =
            CallParams::prepare(&self.base_url, &self.header, Method::GET, &["ping"], opts)?;
        let body = self.caller.call(params).await?;
        decode_json(&body)
    }
}
