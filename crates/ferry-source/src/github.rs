//! GitHub REST client for the read-only lookups version resolution needs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{
    ResolveError, TagIndex, DEFAULT_GITHUB_API_BASE, DEFAULT_MAX_TAG_PAGES,
    DEFAULT_TARBALL_URL_TEMPLATE, SOURCE_LOOKUP_TIMEOUT_MS, SOURCE_LOOKUP_USER_AGENT,
    TAG_PAGE_SIZE,
};

#[async_trait]
/// Read-only view of the repository that builds are made from.
pub trait SourceHost: Send + Sync {
    async fn list_tags(&self) -> Result<TagIndex, ResolveError>;

    async fn latest_release_tag(&self) -> Result<String, ResolveError>;

    async fn latest_commit_sha(&self) -> Result<String, ResolveError>;

    /// Archive URL for an arbitrary commit. Never checks that the commit exists.
    fn tarball_url(&self, sha: &str) -> String;
}

#[derive(Debug, Clone)]
/// Connection settings for [`GitHubSourceClient`].
pub struct SourceHostConfig {
    pub api_base: String,
    /// Repository in `owner/name` form.
    pub repo: String,
    pub token: Option<String>,
    /// Template with `{repo}` and `{sha}` placeholders.
    pub tarball_url_template: String,
    pub request_timeout_ms: u64,
    pub max_tag_pages: usize,
}

impl Default for SourceHostConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GITHUB_API_BASE.to_string(),
            repo: String::new(),
            token: None,
            tarball_url_template: DEFAULT_TARBALL_URL_TEMPLATE.to_string(),
            request_timeout_ms: SOURCE_LOOKUP_TIMEOUT_MS,
            max_tag_pages: DEFAULT_MAX_TAG_PAGES,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GitHubTagRecord {
    name: String,
    tarball_url: String,
}

#[derive(Debug, Deserialize)]
struct GitHubReleaseRecord {
    tag_name: String,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitRecord {
    sha: String,
}

#[derive(Debug, Clone)]
pub struct GitHubSourceClient {
    http: reqwest::Client,
    config: SourceHostConfig,
}

impl GitHubSourceClient {
    pub fn new(config: SourceHostConfig) -> Result<Self, ResolveError> {
        let repo = config.repo.trim().trim_matches('/').to_string();
        if repo.split('/').filter(|part| !part.is_empty()).count() != 2 {
            return Err(ResolveError::InvalidConfig(format!(
                "repository '{}' must be in owner/name form",
                config.repo
            )));
        }
        if !config.tarball_url_template.contains("{sha}") {
            return Err(ResolveError::InvalidConfig(format!(
                "tarball url template '{}' is missing the {{sha}} placeholder",
                config.tarball_url_template
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(SOURCE_LOOKUP_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()?;

        Ok(Self {
            http,
            config: SourceHostConfig {
                api_base: config.api_base.trim_end_matches('/').to_string(),
                repo,
                token: config
                    .token
                    .map(|token| token.trim().to_string())
                    .filter(|token| !token.is_empty()),
                max_tag_pages: config.max_tag_pages.max(1),
                ..config
            },
        })
    }

    pub fn repo(&self) -> &str {
        &self.config.repo
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ResolveError> {
        let url = format!(
            "{}/repos/{}/{}",
            self.config.api_base, self.config.repo, path
        );
        let mut request = self.http.get(&url).query(query);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND && operation == "latest_release" {
            return Err(ResolveError::NothingPublished { what: "releases" });
        }
        if !status.is_success() {
            return Err(ResolveError::HostStatus {
                operation,
                status: status.as_u16(),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|error| ResolveError::InvalidResponse {
                operation,
                detail: error.to_string(),
            })
    }
}

#[async_trait]
impl SourceHost for GitHubSourceClient {
    #[tracing::instrument(level = "debug", skip(self), fields(repo = %self.config.repo))]
    async fn list_tags(&self) -> Result<TagIndex, ResolveError> {
        let mut index = TagIndex::new();
        for page in 1..=self.config.max_tag_pages {
            let records: Vec<GitHubTagRecord> = self
                .get_json(
                    "list_tags",
                    "tags",
                    &[
                        ("per_page", TAG_PAGE_SIZE.to_string()),
                        ("page", page.to_string()),
                    ],
                )
                .await?;
            let fetched = records.len();
            for record in records {
                index.insert(&record.name, record.tarball_url);
            }
            if fetched < TAG_PAGE_SIZE {
                tracing::debug!(tags = index.len(), "fetched tag index");
                return Ok(index);
            }
        }
        // The last allowed page was full, so the index may be missing tags.
        tracing::warn!(
            pages = self.config.max_tag_pages,
            tags = index.len(),
            "tag listing reached the page limit"
        );
        Err(ResolveError::TagListTruncated {
            pages: self.config.max_tag_pages,
        })
    }

    #[tracing::instrument(level = "debug", skip(self), fields(repo = %self.config.repo))]
    async fn latest_release_tag(&self) -> Result<String, ResolveError> {
        let release: GitHubReleaseRecord =
            self.get_json("latest_release", "releases/latest", &[]).await?;
        let tag = release.tag_name.trim();
        if tag.is_empty() {
            return Err(ResolveError::InvalidResponse {
                operation: "latest_release",
                detail: "release has an empty tag_name".to_string(),
            });
        }
        Ok(tag.to_string())
    }

    #[tracing::instrument(level = "debug", skip(self), fields(repo = %self.config.repo))]
    async fn latest_commit_sha(&self) -> Result<String, ResolveError> {
        let commits: Vec<GitHubCommitRecord> = self
            .get_json("latest_commit", "commits", &[("per_page", "1".to_string())])
            .await?;
        commits
            .into_iter()
            .next()
            .map(|commit| commit.sha.trim().to_string())
            .filter(|sha| !sha.is_empty())
            .ok_or(ResolveError::NothingPublished { what: "commits" })
    }

    fn tarball_url(&self, sha: &str) -> String {
        self.config
            .tarball_url_template
            .replace("{repo}", &self.config.repo)
            .replace("{sha}", sha)
    }
}
