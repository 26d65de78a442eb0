//! Version-token resolution against a source host for Ferry.
//!
//! Classifies operator-supplied version tokens, fetches the source host's
//! tag index, and resolves the token into exactly one archive URL that the
//! deployment platform can build from.

mod error;
mod github;
mod resolver;
mod tag_index;
mod version_spec;

pub use error::ResolveError;
pub use github::{GitHubSourceClient, SourceHost, SourceHostConfig};
pub use resolver::{resolve, ResolvedTarget, TargetKind, VersionResolver};
pub use tag_index::TagIndex;
pub use version_spec::{is_commit_sha, normalize_semver, LatestAlias, VersionSpec};

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_TARBALL_URL_TEMPLATE: &str = "https://github.com/{repo}/archive/{sha}.tar.gz";
pub const SOURCE_LOOKUP_USER_AGENT: &str = "ferry/source-lookup";
pub const SOURCE_LOOKUP_TIMEOUT_MS: u64 = 8_000;
pub const TAG_PAGE_SIZE: usize = 100;
pub const DEFAULT_MAX_TAG_PAGES: usize = 10;
