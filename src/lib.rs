//! `seed-examples-http` is an async HTTP client for the Seed Examples API.
//!
//! A [`Client`] is assembled from a sequence of [`RequestOption`]s applied
//! over defaults (last write wins). It owns one sub-client per resource:
//! - [`Client::service`] — movies
//! - [`Client::health`] — liveness checks
//!
//! Every endpoint method also accepts request-level options that override
//! the client configuration for that call only.

mod caller;
mod client;
mod environment;
mod error;
mod health;
mod options;
mod service;
mod types;

pub use caller::{CallParams, Caller, CallerParams};
pub use client::Client;
pub use environment::{Environment, DEFAULT_BASE_URL};
pub use error::Error;
pub use health::HealthClient;
#[cfg(not(target_arch = "wasm32"))]
pub use options::options_from_env;
pub use options::{RequestOption, ResolvedOptions, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BACKOFF};
pub use service::ServiceClient;
pub use types::{Movie, MovieId};

pub type Result<T> = std::result::Result<T, Error>;
