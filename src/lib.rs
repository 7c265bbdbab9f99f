//! Client for the Plantra event-planning API.
//!
//! [`ApiClient::send`] attaches the stored access token to every request.
//! When the API answers 401 the client runs one token refresh per expiry,
//! parks concurrent callers until it settles, and replays each original
//! request once. A failed refresh clears the session and publishes
//! [`AuthSignal::LoggedOut`].

mod api;
pub mod auth;
pub mod cli;
mod client;
pub mod config;
pub mod error;
mod redact;
mod refresh;
pub mod request;
pub mod session;
pub mod signal;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::ApiClient;
pub use config::{ClientConfig, ConfigError, SessionBackend};
pub use error::{ApiError, RefreshError};
pub use request::{ApiRequest, ApiResponse};
pub use session::{Profile, Session, SessionStorage, SessionStore};
pub use signal::AuthSignal;
