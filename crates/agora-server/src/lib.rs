//! HTTP boundary for the Agora simulator.
//!
//! Wires the trading service behind an axum router: caller identity from
//! the `x-caller-identity` header, JSON bodies in and out, service errors
//! mapped to status codes, CORS open for browser frontends.

pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod logging;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use handlers::{create_router, AppState};
pub use identity::{Identity, IDENTITY_HEADER};
pub use logging::init_logging;
