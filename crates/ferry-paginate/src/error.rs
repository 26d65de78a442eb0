use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaginateError {
    #[error("build log stream read failed: {detail}")]
    StreamReadFailed { detail: String },
    /// Only ever rendered as the content of a terminal page.
    #[error("{stream_url}: build log stream closed without output")]
    StreamEmpty { stream_url: String },
    #[error("failed to create log stream client: {0}")]
    Client(#[from] reqwest::Error),
}
