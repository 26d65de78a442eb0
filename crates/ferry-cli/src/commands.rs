use anyhow::{anyhow, bail, Context, Result};
use ferry_chat::{
    report_error, CheckoutReport, CheckoutRunner, DiscordPageSink, DiscordSinkConfig, PageSink,
};
use ferry_paginate::{LogStreamClient, StreamConfig};
use ferry_platform::{ConfigVarChanges, ConfigVars, HerokuClient, PlatformConfig};
use ferry_source::{GitHubSourceClient, ResolvedTarget, SourceHostConfig, VersionResolver};

use crate::cli_args::{version_token, Cli, Command, ConfigCommand};
use crate::terminal_sink::TerminalPageSink;

pub async fn run_cli(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Resolve { version } => {
            let resolver = build_resolver(&cli)?;
            let target = resolver
                .resolve_token(&version_token(version))
                .await
                .context("failed to resolve version")?;
            println!("{}", render_target(&target));
            Ok(())
        }
        Command::Checkout {
            version,
            discord_channel,
        } => {
            let token = version_token(version);
            match discord_channel {
                Some(channel_id) => {
                    let sink = build_discord_sink(&cli, channel_id)?;
                    run_checkout(&cli, &token, &sink).await
                }
                None => run_checkout(&cli, &token, &TerminalPageSink::stdout()).await,
            }
        }
        Command::Restart => {
            let platform = build_platform(&cli)?;
            platform.restart().await.context("failed to restart app")?;
            println!("restarted {}", platform.app_name());
            Ok(())
        }
        Command::Config { action } => run_config(&cli, action).await,
    }
}

async fn run_checkout(cli: &Cli, token: &str, sink: &dyn PageSink) -> Result<()> {
    let runner = CheckoutRunner::new(
        build_resolver(cli)?,
        build_platform(cli)?,
        LogStreamClient::new(StreamConfig {
            max_page_len: cli.max_page_len,
            ..StreamConfig::default()
        })
        .context("failed to build log stream client")?,
    );

    match runner.run(token, sink, ctrl_c()).await {
        Ok(report) => {
            eprintln!("{}", render_report(&report));
            Ok(())
        }
        Err(error) => {
            if let Err(report_failure) = report_error(sink, &error).await {
                tracing::warn!(%report_failure, "failed to render checkout error");
            }
            Err(anyhow::Error::new(error).context(format!("checkout of '{token}' failed")))
        }
    }
}

/// Completes on the first Ctrl-C. If the handler cannot be installed the
/// checkout simply runs uncancellable.
async fn ctrl_c() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}

async fn run_config(cli: &Cli, action: &ConfigCommand) -> Result<()> {
    let platform = build_platform(cli)?;
    match action {
        ConfigCommand::Get { key: Some(key) } => {
            let vars = platform
                .config_vars()
                .await
                .context("failed to read config vars")?;
            let value = vars
                .get(key)
                .ok_or_else(|| anyhow!("config var '{key}' is not set"))?;
            println!("{value}");
        }
        ConfigCommand::Get { key: None } => {
            let vars = platform
                .config_vars()
                .await
                .context("failed to read config vars")?;
            print!("{}", render_config_vars(&vars));
        }
        ConfigCommand::Set { assignments } => {
            let changes: ConfigVarChanges = assignments
                .iter()
                .map(|(key, value)| (key.clone(), Some(value.clone())))
                .collect();
            let vars = platform
                .patch_config_vars(&changes)
                .await
                .context("failed to set config vars")?;
            print!("{}", render_config_vars(&vars));
        }
        ConfigCommand::Unset { keys } => {
            let changes: ConfigVarChanges = keys.iter().map(|key| (key.clone(), None)).collect();
            platform
                .patch_config_vars(&changes)
                .await
                .context("failed to unset config vars")?;
            println!("unset {}", keys.join(", "));
        }
    }
    Ok(())
}

fn build_resolver(cli: &Cli) -> Result<VersionResolver<GitHubSourceClient>> {
    let Some(repo) = cli.source_repo.clone() else {
        bail!("--source-repo (or FERRY_SOURCE_REPO) is required");
    };
    let host = GitHubSourceClient::new(SourceHostConfig {
        api_base: cli.github_api_base.clone(),
        repo,
        token: cli.github_token.clone(),
        tarball_url_template: cli.tarball_url_template.clone(),
        request_timeout_ms: cli.request_timeout_ms,
        max_tag_pages: cli.max_tag_pages,
    })
    .context("invalid source host configuration")?;
    Ok(VersionResolver::new(host, cli.latest_alias))
}

fn build_platform(cli: &Cli) -> Result<HerokuClient> {
    let Some(app_name) = cli.app.clone() else {
        bail!("--app (or FERRY_APP) is required");
    };
    HerokuClient::new(PlatformConfig {
        api_base: cli.platform_api_base.clone(),
        app_name,
        api_token: cli.platform_token.clone().unwrap_or_default(),
        request_timeout_ms: cli.request_timeout_ms,
    })
    .context("invalid platform configuration")
}

fn build_discord_sink(cli: &Cli, channel_id: &str) -> Result<DiscordPageSink> {
    DiscordPageSink::new(DiscordSinkConfig {
        api_base: cli.discord_api_base.clone(),
        bot_token: cli.discord_token.clone().unwrap_or_default(),
        channel_id: channel_id.to_string(),
        ..DiscordSinkConfig::default()
    })
    .context("invalid discord configuration")
}

fn render_target(target: &ResolvedTarget) -> String {
    format!(
        "{} {} {}",
        target.kind.as_str(),
        target.identifier,
        target.archive_url
    )
}

fn render_report(report: &CheckoutReport) -> String {
    let build = report.build_id.as_deref().unwrap_or("unknown");
    match &report.render {
        None => format!(
            "checkout of {} {} cancelled (build {build})",
            report.kind.as_str(),
            report.identifier
        ),
        Some(summary) => format!(
            "checkout of {} {} finished (build {build}): pages={} edits={}{}",
            report.kind.as_str(),
            report.identifier,
            summary.pages,
            summary.edits,
            if summary.ended_empty {
                " (empty log)"
            } else {
                ""
            }
        ),
    }
}

fn render_config_vars(vars: &ConfigVars) -> String {
    vars.iter()
        .map(|(key, value)| format!("{key}={value}\n"))
        .collect()
}
