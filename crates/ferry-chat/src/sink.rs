use async_trait::async_trait;
use ferry_paginate::{truncate_to_page, PageEvent, PaginateError};
use futures_util::{Stream, StreamExt};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("missing chat bot token")]
    MissingCredential,
    #[error("invalid page sink configuration: {0}")]
    InvalidConfig(String),
    #[error("message {operation} failed with status {status}")]
    RequestFailed { operation: &'static str, status: u16 },
    #[error("message request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("message response did not include an id")]
    MissingMessageId,
    #[error("page output failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Opaque reference to a rendered page, e.g. a chat message id.
pub struct PageHandle(pub String);

impl PageHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
/// Destination that can post a page and later replace its content.
pub trait PageSink: Send + Sync {
    async fn send_page(&self, content: &str) -> Result<PageHandle, SinkError>;

    async fn edit_page(&self, handle: &PageHandle, content: &str) -> Result<(), SinkError>;

    /// Longest content this sink accepts in one page.
    fn max_content_chars(&self) -> usize;

    /// When false, placeholder pages reach the sink as empty content.
    fn shows_placeholder(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub pages: usize,
    pub sends: usize,
    pub edits: usize,
    pub skipped_edits: usize,
    /// The last page rendered was the empty-stream terminal page.
    pub ended_empty: bool,
}

struct LivePage {
    index: usize,
    handle: PageHandle,
    content: String,
}

/// Renders page events in order: the first event for a page index sends a
/// message, later ones edit it, and a frozen page is never touched again.
///
/// A stream error stops rendering and is returned after the pages already
/// rendered stay in place.
pub async fn drive_pages<S>(events: S, sink: &dyn PageSink) -> Result<RenderSummary, DriveError>
where
    S: Stream<Item = Result<PageEvent, PaginateError>>,
{
    let mut events = std::pin::pin!(events);
    let mut summary = RenderSummary::default();
    let mut live: Option<LivePage> = None;

    while let Some(event) = events.next().await {
        let event = event.map_err(DriveError::Stream)?;
        let freezes = event.freezes_page();
        let mut page = event.into_page();
        summary.ended_empty = page.is_final;
        if page.is_placeholder && !sink.shows_placeholder() {
            page.content.clear();
        }

        match live.as_mut() {
            Some(current) if current.index == page.index => {
                if current.content == page.content {
                    summary.skipped_edits += 1;
                } else {
                    sink.edit_page(&current.handle, &page.content)
                        .await
                        .map_err(DriveError::Sink)?;
                    current.content = page.content;
                    summary.edits += 1;
                }
            }
            _ => {
                let handle = sink
                    .send_page(&page.content)
                    .await
                    .map_err(DriveError::Sink)?;
                summary.sends += 1;
                summary.pages += 1;
                live = Some(LivePage {
                    index: page.index,
                    handle,
                    content: page.content,
                });
            }
        }

        if freezes {
            live = None;
        }
    }
    Ok(summary)
}

#[derive(Debug, Error)]
/// Why [`drive_pages`] stopped early.
pub enum DriveError {
    #[error(transparent)]
    Stream(PaginateError),
    #[error(transparent)]
    Sink(SinkError),
}

/// Posts an error message verbatim as its own page.
pub async fn report_error(
    sink: &dyn PageSink,
    error: &(dyn std::error::Error + Send + Sync),
) -> Result<PageHandle, SinkError> {
    let message = truncate_to_page(&error.to_string(), sink.max_content_chars());
    sink.send_page(&message).await
}
