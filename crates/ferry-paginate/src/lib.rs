//! Live pagination of build log streams for Ferry.
//!
//! Turns an arbitrarily chunked byte stream into an ordered sequence of
//! bounded display pages. The newest page is re-rendered in place as bytes
//! arrive and frozen once the next chunk would overflow it. Rendering the
//! pages is left to the consumer of [`PageEvent`]s.

mod error;
mod page;
mod paginator;
mod stream;
mod utf8;

pub use error::PaginateError;
pub use page::{DisplayPage, PageEvent};
pub use paginator::{truncate_to_page, Paginator};
pub use stream::{paginate_chunks, LogStreamClient, PageStream, StreamConfig};

/// Rendered instead of a page whose text is empty or whitespace only.
pub const PAGE_PLACEHOLDER: &str = "...";
pub const MIN_PAGE_LEN: usize = 16;
pub const DEFAULT_MAX_PAGE_LEN: usize = 1_990;
pub const STREAM_CONNECT_TIMEOUT_MS: u64 = 10_000;
