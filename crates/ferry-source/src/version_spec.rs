use std::sync::OnceLock;

use regex::Regex;

use crate::ResolveError;

const SEMVER_PATTERN: &str = concat!(
    r"^v?(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)",
    r"(?:-((?:0|[1-9][0-9]*|[0-9]*[a-zA-Z-][0-9a-zA-Z-]*)",
    r"(?:\.(?:0|[1-9][0-9]*|[0-9]*[a-zA-Z-][0-9a-zA-Z-]*))*))?",
    r"(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
);
const COMMIT_SHA_PATTERN: &str = r"^[a-z0-9]{7,}$";

fn semver_regex() -> &'static Regex {
    static SEMVER: OnceLock<Regex> = OnceLock::new();
    SEMVER.get_or_init(|| Regex::new(SEMVER_PATTERN).expect("semver pattern compiles"))
}

fn commit_sha_regex() -> &'static Regex {
    static COMMIT_SHA: OnceLock<Regex> = OnceLock::new();
    COMMIT_SHA.get_or_init(|| Regex::new(COMMIT_SHA_PATTERN).expect("commit pattern compiles"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// What a bare `latest` token stands for.
pub enum LatestAlias {
    #[default]
    Commit,
    Release,
}

impl LatestAlias {
    pub fn as_str(self) -> &'static str {
        match self {
            LatestAlias::Commit => "commit",
            LatestAlias::Release => "release",
        }
    }
}

impl std::fmt::Display for LatestAlias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LatestAlias {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "commit" => Ok(Self::Commit),
            "release" => Ok(Self::Release),
            other => Err(format!(
                "invalid latest alias '{other}'; expected commit|release"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A classified version token. `SemVer` always carries the `v`-prefixed form.
pub enum VersionSpec {
    LatestRelease,
    LatestCommit,
    SemVer(String),
    CommitSha(String),
}

impl VersionSpec {
    /// Classifies a raw token. Keywords win over patterns, and a semver-shaped
    /// token never falls through to commit matching.
    pub fn classify(token: &str, latest_alias: LatestAlias) -> Result<Self, ResolveError> {
        let trimmed = token.trim();
        match trimmed {
            "latest release" => return Ok(Self::LatestRelease),
            "latest commit" => return Ok(Self::LatestCommit),
            "latest" => {
                return Ok(match latest_alias {
                    LatestAlias::Commit => Self::LatestCommit,
                    LatestAlias::Release => Self::LatestRelease,
                })
            }
            _ => {}
        }

        if let Some(tag) = normalize_semver(trimmed) {
            return Ok(Self::SemVer(tag));
        }
        if is_commit_sha(trimmed) {
            return Ok(Self::CommitSha(trimmed.to_string()));
        }
        Err(ResolveError::InvalidVersionSpec {
            token: trimmed.to_string(),
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            VersionSpec::LatestRelease => "latest_release",
            VersionSpec::LatestCommit => "latest_commit",
            VersionSpec::SemVer(_) => "semver",
            VersionSpec::CommitSha(_) => "commit_sha",
        }
    }
}

/// Returns the canonical `v<semver>` tag name when `raw` is a full SemVer
/// 2.0.0 version, optionally prefixed with `v`.
pub fn normalize_semver(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !semver_regex().is_match(trimmed) {
        return None;
    }
    Some(match trimmed.strip_prefix('v') {
        Some(_) => trimmed.to_string(),
        None => format!("v{trimmed}"),
    })
}

pub fn is_commit_sha(raw: &str) -> bool {
    commit_sha_regex().is_match(raw)
}
