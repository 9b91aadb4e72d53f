use reqwest::{header::HeaderMap, Method};

use crate::{
    caller::{decode_json, CallParams, Caller, CallerParams},
    Movie, MovieId, RequestOption, ResolvedOptions, Result,
};

/// Client for the movie resource.
#[derive(Clone, Debug)]
pub struct ServiceClient {
    base_url: String,
    caller: Caller,
    header: HeaderMap,
}

impl ServiceClient {
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

    /// Fetches a movie by ID: `GET /movie/{movieId}`.
    pub async fn get_movie(&self, movie_id: &str, opts: &[RequestOption]) -> Result<Movie> {
        let params = CallParams::prepare(
            &self.base_url,
            &self.header,
            Method::GET,
            &["movie", movie_id],
            opts,
        )?;
        let body = self.caller.call(params).await?;
        decode_json(&body)
    }

    /// Creates a movie and returns its ID: `POST /movie`.
    pub async fn create_movie(&self, movie: &Movie, opts: &[RequestOption]) -> Result<MovieId> {
        let params = CallParams::prepare(
            &self.base_url,
            &self.header,
            Method::POST,
            &["movie"],
            opts,
        )?
        .with_json(movie)?;
        let body = self.caller.call(params).await?;
        decode_json(&body)
    }
}
