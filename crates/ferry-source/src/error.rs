use thiserror::Error;

#[derive(Debug, Error)]
/// Failures raised while classifying or resolving a version token.
pub enum ResolveError {
    #[error("'{token}' is not a semantic version, a commit hash, or 'latest'")]
    InvalidVersionSpec { token: String },
    #[error("version {tag} does not exist in the source repository")]
    VersionNotFound { tag: String },
    #[error("source repository has no {what}")]
    NothingPublished { what: &'static str },
    #[error("invalid source host configuration: {0}")]
    InvalidConfig(String),
    #[error("tag listing still had more tags after {pages} pages; raise the tag page limit")]
    TagListTruncated { pages: usize },
    #[error("source host request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("source host returned status {status} for {operation}")]
    HostStatus { operation: &'static str, status: u16 },
    #[error("invalid source host response for {operation}: {detail}")]
    InvalidResponse {
        operation: &'static str,
        detail: String,
    },
}
