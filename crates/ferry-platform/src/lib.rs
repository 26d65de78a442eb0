//! Deployment platform client for Ferry.
//!
//! Submits source archives as builds and exposes the handful of app
//! management calls (restart, config vars) the operator surface needs.

mod heroku;
mod types;

pub use heroku::{HerokuClient, PlatformConfig};
pub use types::{BuildHandle, BuildPlatform, ConfigVarChanges, ConfigVars, PlatformError};

pub const DEFAULT_PLATFORM_API_BASE: &str = "https://api.heroku.com";
pub const PLATFORM_ACCEPT_HEADER: &str = "application/vnd.heroku+json; version=3";
pub const PLATFORM_USER_AGENT: &str = "ferry/platform";
pub const PLATFORM_REQUEST_TIMEOUT_MS: u64 = 15_000;
