//! Page rendering and checkout orchestration for Ferry.
//!
//! Connects the resolver, the build platform, and the log paginator into a
//! single checkout run, and renders the resulting page events through a
//! [`PageSink`] such as a Discord channel.

mod checkout;
mod discord;
mod sink;

pub use checkout::{CheckoutError, CheckoutReport, CheckoutRunner};
pub use discord::{DiscordPageSink, DiscordSinkConfig};
pub use sink::{
    drive_pages, report_error, DriveError, PageHandle, PageSink, RenderSummary, SinkError,
};

pub const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/v10";
pub const DISCORD_MAX_MESSAGE_CHARS: usize = 2_000;
pub const DISCORD_REQUEST_TIMEOUT_MS: u64 = 5_000;
