use crate::{normalize_semver, LatestAlias, ResolveError, SourceHost, TagIndex, VersionSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Release,
    Commit,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Release => "release",
            TargetKind::Commit => "commit",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
/// One unambiguous build source.
pub struct ResolvedTarget {
    pub kind: TargetKind,
    /// Canonical tag name for releases, the sha for commits.
    pub identifier: String,
    pub archive_url: String,
}

/// Resolves an already classified spec against a freshly fetched tag index.
///
/// `LatestRelease` and `LatestCommit` make one extra read through `host`;
/// the other variants make none.
pub async fn resolve(
    spec: VersionSpec,
    tags: &TagIndex,
    host: &dyn SourceHost,
) -> Result<ResolvedTarget, ResolveError> {
    match spec {
        VersionSpec::SemVer(tag) => release_target(tag, tags),
        VersionSpec::CommitSha(sha) => Ok(commit_target(sha, host)),
        VersionSpec::LatestRelease => {
            let raw = host.latest_release_tag().await?;
            let tag = normalize_semver(&raw).unwrap_or(raw);
            release_target(tag, tags)
        }
        VersionSpec::LatestCommit => {
            let sha = host.latest_commit_sha().await?;
            Ok(commit_target(sha, host))
        }
    }
}

fn release_target(tag: String, tags: &TagIndex) -> Result<ResolvedTarget, ResolveError> {
    match tags.get(&tag) {
        Some(url) => Ok(ResolvedTarget {
            kind: TargetKind::Release,
            archive_url: url.to_string(),
            identifier: tag,
        }),
        None => Err(ResolveError::VersionNotFound { tag }),
    }
}

fn commit_target(sha: String, host: &dyn SourceHost) -> ResolvedTarget {
    ResolvedTarget {
        kind: TargetKind::Commit,
        archive_url: host.tarball_url(&sha),
        identifier: sha,
    }
}

/// Token-level entry point: classify, fetch tags, resolve.
pub struct VersionResolver<H> {
    host: H,
    latest_alias: LatestAlias,
}

impl<H: SourceHost> VersionResolver<H> {
    pub fn new(host: H, latest_alias: LatestAlias) -> Self {
        Self { host, latest_alias }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn latest_alias(&self) -> LatestAlias {
        self.latest_alias
    }

    /// Malformed tokens fail before any request is made.
    #[tracing::instrument(level = "info", skip(self), fields(latest_alias = %self.latest_alias))]
    pub async fn resolve_token(&self, token: &str) -> Result<ResolvedTarget, ResolveError> {
        let spec = VersionSpec::classify(token, self.latest_alias)?;
        tracing::debug!(spec = spec.label(), "classified version token");
        let tags = self.host.list_tags().await?;
        let target = resolve(spec, &tags, &self.host).await?;
        tracing::info!(
            kind = target.kind.as_str(),
            identifier = %target.identifier,
            "resolved build source"
        );
        Ok(target)
    }
}
