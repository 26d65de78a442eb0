use std::collections::BTreeMap;

use async_trait::async_trait;
use ferry_source::ResolvedTarget;
use thiserror::Error;

pub type ConfigVars = BTreeMap<String, String>;
/// `None` removes the key.
pub type ConfigVarChanges = BTreeMap<String, Option<String>>;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("missing platform API token")]
    MissingCredential,
    #[error("invalid platform configuration: {0}")]
    InvalidConfig(String),
    #[error("build submission failed with status {status}")]
    BuildSubmissionFailed { status: u16 },
    #[error("platform {operation} failed with status {status}")]
    RequestFailed { operation: &'static str, status: u16 },
    #[error("platform request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid platform response for {operation}: {detail}")]
    InvalidResponse {
        operation: &'static str,
        detail: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Handle to a submitted build. A missing stream URL is not an error here.
pub struct BuildHandle {
    pub build_id: Option<String>,
    pub status: Option<String>,
    pub log_stream_url: Option<String>,
}

#[async_trait]
/// Trait contract for submitting builds.
pub trait BuildPlatform: Send + Sync {
    async fn create_build(&self, archive_url: &str) -> Result<BuildHandle, PlatformError>;

    /// Consumes the target so one resolution feeds exactly one build.
    async fn submit(&self, target: ResolvedTarget) -> Result<BuildHandle, PlatformError> {
        tracing::info!(
            kind = target.kind.as_str(),
            identifier = %target.identifier,
            "submitting build"
        );
        self.create_build(&target.archive_url).await
    }
}
