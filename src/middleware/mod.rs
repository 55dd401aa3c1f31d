//! Middleware module
//!
//! Request logging, mock session extraction and rate limiting.

pub mod auth;
pub mod logging;
pub mod rate_limit;

pub use auth::{AuthContext, authenticate, resolve_user_id};
pub use rate_limit::RateLimitService;
