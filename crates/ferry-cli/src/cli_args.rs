use clap::{Parser, Subcommand};
use ferry_chat::DEFAULT_DISCORD_API_BASE;
use ferry_paginate::DEFAULT_MAX_PAGE_LEN;
use ferry_platform::{DEFAULT_PLATFORM_API_BASE, PLATFORM_REQUEST_TIMEOUT_MS};
use ferry_source::{
    LatestAlias, DEFAULT_GITHUB_API_BASE, DEFAULT_MAX_TAG_PAGES, DEFAULT_TARBALL_URL_TEMPLATE,
};

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_latest_alias(value: &str) -> Result<LatestAlias, String> {
    value.parse::<LatestAlias>()
}

fn parse_config_assignment(value: &str) -> Result<(String, String), String> {
    let Some((key, assigned)) = value.split_once('=') else {
        return Err(format!("expected KEY=VALUE, got '{value}'"));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("config var name is empty in '{value}'"));
    }
    Ok((key.to_string(), assigned.to_string()))
}

#[derive(Debug, Parser)]
#[command(
    name = "ferry",
    about = "Deploy a tagged release or commit and follow its build log",
    version
)]
pub struct Cli {
    #[arg(
        long = "source-repo",
        env = "FERRY_SOURCE_REPO",
        help = "Source repository in owner/name form"
    )]
    pub source_repo: Option<String>,

    #[arg(
        long = "github-api-base",
        env = "FERRY_GITHUB_API_BASE",
        default_value = DEFAULT_GITHUB_API_BASE,
        help = "Base URL for the GitHub REST API"
    )]
    pub github_api_base: String,

    #[arg(
        long = "github-token",
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        help = "Optional token for GitHub API lookups"
    )]
    pub github_token: Option<String>,

    #[arg(
        long = "tarball-url-template",
        env = "FERRY_TARBALL_URL_TEMPLATE",
        default_value = DEFAULT_TARBALL_URL_TEMPLATE,
        help = "Archive URL template for commits; {repo} and {sha} are substituted"
    )]
    pub tarball_url_template: String,

    #[arg(
        long = "max-tag-pages",
        env = "FERRY_MAX_TAG_PAGES",
        default_value_t = DEFAULT_MAX_TAG_PAGES,
        value_parser = parse_positive_usize,
        help = "Upper bound on tag listing pages fetched per resolution"
    )]
    pub max_tag_pages: usize,

    #[arg(
        long = "latest-alias",
        env = "FERRY_LATEST_ALIAS",
        default_value = "commit",
        value_parser = parse_latest_alias,
        help = "What a bare 'latest' token resolves to: commit|release"
    )]
    pub latest_alias: LatestAlias,

    #[arg(
        long = "platform-api-base",
        env = "FERRY_PLATFORM_API_BASE",
        default_value = DEFAULT_PLATFORM_API_BASE,
        help = "Base URL for the deployment platform API"
    )]
    pub platform_api_base: String,

    #[arg(long, env = "FERRY_APP", help = "Platform app that builds are submitted to")]
    pub app: Option<String>,

    #[arg(
        long = "platform-token",
        env = "HEROKU_API_KEY",
        hide_env_values = true,
        help = "API token for the deployment platform"
    )]
    pub platform_token: Option<String>,

    #[arg(
        long = "request-timeout-ms",
        env = "FERRY_REQUEST_TIMEOUT_MS",
        default_value_t = PLATFORM_REQUEST_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        help = "Timeout for source host and platform API requests"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "max-page-len",
        env = "FERRY_MAX_PAGE_LEN",
        default_value_t = DEFAULT_MAX_PAGE_LEN,
        value_parser = parse_positive_usize,
        help = "Maximum characters per log page (values below 16 are raised to 16)"
    )]
    pub max_page_len: usize,

    #[arg(
        long = "discord-api-base",
        env = "FERRY_DISCORD_API_BASE",
        default_value = DEFAULT_DISCORD_API_BASE,
        help = "Base URL for the Discord REST API"
    )]
    pub discord_api_base: String,

    #[arg(
        long = "discord-token",
        env = "DISCORD_BOT_TOKEN",
        hide_env_values = true,
        help = "Bot token used when rendering pages into a Discord channel"
    )]
    pub discord_token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a version token without submitting a build.
    Resolve {
        /// Semantic version, commit hash, or 'latest' / 'latest release' / 'latest commit'.
        #[arg(num_args = 1.., required = true)]
        version: Vec<String>,
    },
    /// Resolve, submit a build, and follow its log.
    Checkout {
        #[arg(num_args = 1.., required = true)]
        version: Vec<String>,

        #[arg(
            long = "discord-channel",
            env = "FERRY_DISCORD_CHANNEL",
            help = "Render pages into this Discord channel instead of the terminal"
        )]
        discord_channel: Option<String>,
    },
    /// Restart every dyno of the app.
    Restart,
    /// Read or change the app's config vars.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

/// Version tokens may be passed as several words, e.g. `latest release`.
pub fn version_token(words: &[String]) -> String {
    words.join(" ")
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    Get {
        key: Option<String>,
    },
    Set {
        #[arg(required = true, value_parser = parse_config_assignment)]
        assignments: Vec<(String, String)>,
    },
    Unset {
        #[arg(required = true)]
        keys: Vec<String>,
    },
}
