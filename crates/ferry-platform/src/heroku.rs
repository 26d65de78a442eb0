use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::{
    BuildHandle, BuildPlatform, ConfigVarChanges, ConfigVars, PlatformError,
    DEFAULT_PLATFORM_API_BASE, PLATFORM_ACCEPT_HEADER, PLATFORM_REQUEST_TIMEOUT_MS,
    PLATFORM_USER_AGENT,
};

#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub api_base: String,
    pub app_name: String,
    pub api_token: String,
    pub request_timeout_ms: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_PLATFORM_API_BASE.to_string(),
            app_name: String::new(),
            api_token: String::new(),
            request_timeout_ms: PLATFORM_REQUEST_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BuildResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    output_stream_url: Option<String>,
}

#[derive(Debug, Clone)]
/// Heroku Platform API v3 client scoped to one app.
pub struct HerokuClient {
    http: reqwest::Client,
    api_base: String,
    app_name: String,
}

impl HerokuClient {
    pub fn new(config: PlatformConfig) -> Result<Self, PlatformError> {
        let token = config.api_token.trim();
        if token.is_empty() {
            return Err(PlatformError::MissingCredential);
        }
        let app_name = config.app_name.trim();
        if app_name.is_empty() || app_name.contains('/') {
            return Err(PlatformError::InvalidConfig(format!(
                "app name '{}' is empty or contains '/'",
                config.app_name
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(PLATFORM_ACCEPT_HEADER));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(PLATFORM_USER_AGENT));
        let mut bearer = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|error| {
            PlatformError::InvalidConfig(format!("invalid API token header: {error}"))
        })?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            app_name: app_name.to_string(),
        })
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    fn app_url(&self, path: &str) -> String {
        format!("{}/apps/{}/{}", self.api_base, self.app_name, path)
    }

    async fn send(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, PlatformError> {
        let mut request = self.http.request(method, self.app_url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(operation, status = status.as_u16(), "platform request failed");
            return Err(PlatformError::RequestFailed {
                operation,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// Deletes every running dyno so the platform starts fresh ones.
    #[tracing::instrument(level = "info", skip(self), fields(app = %self.app_name))]
    pub async fn restart(&self) -> Result<(), PlatformError> {
        self.send("restart", Method::DELETE, "dynos", None).await?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self), fields(app = %self.app_name))]
    pub async fn config_vars(&self) -> Result<ConfigVars, PlatformError> {
        let response = self
            .send("config_vars", Method::GET, "config-vars", None)
            .await?;
        parse_config_vars("config_vars", response).await
    }

    /// Applies `changes` and returns the resulting variables.
    #[tracing::instrument(level = "info", skip(self, changes), fields(app = %self.app_name, keys = changes.len()))]
    pub async fn patch_config_vars(
        &self,
        changes: &ConfigVarChanges,
    ) -> Result<ConfigVars, PlatformError> {
        let body = serde_json::to_value(changes).map_err(|error| {
            PlatformError::InvalidResponse {
                operation: "patch_config_vars",
                detail: error.to_string(),
            }
        })?;
        let response = self
            .send(
                "patch_config_vars",
                Method::PATCH,
                "config-vars",
                Some(body),
            )
            .await?;
        parse_config_vars("patch_config_vars", response).await
    }
}

async fn parse_config_vars(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<ConfigVars, PlatformError> {
    let raw = response
        .json::<serde_json::Map<String, serde_json::Value>>()
        .await
        .map_err(|error| PlatformError::InvalidResponse {
            operation,
            detail: error.to_string(),
        })?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::String(text) => Some((key, text)),
            serde_json::Value::Null => None,
            other => Some((key, other.to_string())),
        })
        .collect())
}

#[async_trait]
impl BuildPlatform for HerokuClient {
    #[tracing::instrument(level = "info", skip(self), fields(app = %self.app_name))]
    async fn create_build(&self, archive_url: &str) -> Result<BuildHandle, PlatformError> {
        let payload = json!({ "source_blob": { "url": archive_url } });
        let response = self
            .http
            .post(self.app_url("builds"))
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "build submission rejected");
            return Err(PlatformError::BuildSubmissionFailed {
                status: status.as_u16(),
            });
        }
        let build = response
            .json::<BuildResponse>()
            .await
            .map_err(|error| PlatformError::InvalidResponse {
                operation: "create_build",
                detail: error.to_string(),
            })?;
        let handle = BuildHandle {
            build_id: build.id,
            status: build.status,
            log_stream_url: build
                .output_stream_url
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
        };
        tracing::info!(
            build_id = handle.build_id.as_deref().unwrap_or("unknown"),
            has_stream = handle.log_stream_url.is_some(),
            "build created"
        );
        Ok(handle)
    }
}
