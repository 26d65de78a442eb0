//! Async adapters that drive [`Paginator`] from network byte streams.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use futures_util::stream::{self, BoxStream, Stream, StreamExt};

use crate::utf8::Utf8Decoder;
use crate::{
    PageEvent, PaginateError, Paginator, DEFAULT_MAX_PAGE_LEN, STREAM_CONNECT_TIMEOUT_MS,
};

pub type PageStream = BoxStream<'static, Result<PageEvent, PaginateError>>;

const MISSING_STREAM_URL: &str = "<none>";

struct PageStreamState<S> {
    chunks: Pin<Box<S>>,
    paginator: Paginator,
    decoder: Utf8Decoder,
    pending: VecDeque<PageEvent>,
    stream_url: String,
    done: bool,
}

/// Paginates any fallible chunk stream.
///
/// Each chunk is applied to the paginator in full before the next one is
/// polled. The first read error is yielded as
/// [`PaginateError::StreamReadFailed`] and ends the sequence.
pub fn paginate_chunks<S, B, E>(
    chunks: S,
    stream_url: impl Into<String>,
    max_page_len: usize,
) -> impl Stream<Item = Result<PageEvent, PaginateError>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let state = PageStreamState {
        chunks: Box::pin(chunks),
        paginator: Paginator::new(max_page_len),
        decoder: Utf8Decoder::default(),
        pending: VecDeque::new(),
        stream_url: stream_url.into(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                tracing::debug!(
                    page = event.page().index,
                    freezes = event.freezes_page(),
                    "page event"
                );
                return Some((Ok(event), state));
            }
            if state.done {
                return None;
            }
            match state.chunks.next().await {
                Some(Ok(chunk)) => {
                    let text = state.decoder.decode(chunk.as_ref());
                    let events = state.paginator.push(&text);
                    state.pending.extend(events);
                }
                Some(Err(error)) => {
                    state.done = true;
                    tracing::warn!(stream_url = %state.stream_url, %error, "log stream read failed");
                    return Some((
                        Err(PaginateError::StreamReadFailed {
                            detail: error.to_string(),
                        }),
                        state,
                    ));
                }
                None => {
                    state.done = true;
                    let tail = state.decoder.finish();
                    let events = state.paginator.push(&tail);
                    state.pending.extend(events);
                    if let Some(terminal) = state.paginator.finish(&state.stream_url) {
                        tracing::warn!(stream_url = %state.stream_url, "log stream closed without output");
                        state.pending.push_back(terminal);
                    }
                }
            }
        }
    })
}

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub max_page_len: usize,
    /// Applies to connecting only; reading has no deadline.
    pub connect_timeout_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_page_len: DEFAULT_MAX_PAGE_LEN,
            connect_timeout_ms: STREAM_CONNECT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone)]
/// Opens build log streams and paginates them.
pub struct LogStreamClient {
    http: reqwest::Client,
    max_page_len: usize,
}

impl LogStreamClient {
    pub fn new(config: StreamConfig) -> Result<Self, PaginateError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms.max(1)))
            .build()?;
        Ok(Self {
            http,
            max_page_len: config.max_page_len,
        })
    }

    pub fn max_page_len(&self) -> usize {
        self.max_page_len
    }

    /// Opens `stream_url` and returns its page events.
    ///
    /// A missing URL yields the empty-stream terminal page without touching
    /// the network. Dropping the returned stream closes the connection.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn paginate(&self, stream_url: Option<&str>) -> PageStream {
        let Some(url) = stream_url.map(str::trim).filter(|url| !url.is_empty()) else {
            return paginate_chunks(
                stream::empty::<Result<Vec<u8>, PaginateError>>(),
                MISSING_STREAM_URL,
                self.max_page_len,
            )
            .boxed();
        };

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(error) => return failed_stream(error.to_string()),
        };
        let status = response.status();
        if !status.is_success() {
            return failed_stream(format!("stream endpoint returned status {}", status.as_u16()));
        }
        tracing::info!("log stream opened");
        paginate_chunks(response.bytes_stream(), url.to_string(), self.max_page_len).boxed()
    }
}

fn failed_stream(detail: String) -> PageStream {
    tracing::warn!(%detail, "log stream could not be opened");
    stream::iter([Err(PaginateError::StreamReadFailed { detail })]).boxed()
}
