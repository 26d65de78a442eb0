use std::sync::Mutex;

use async_trait::async_trait;
use ferry_chat::{CheckoutError, CheckoutRunner, PageHandle, PageSink, SinkError};
use ferry_paginate::{LogStreamClient, StreamConfig};
use ferry_platform::{HerokuClient, PlatformConfig, PlatformError};
use ferry_source::{
    GitHubSourceClient, LatestAlias, ResolveError, SourceHostConfig, TargetKind, VersionResolver,
};
use httpmock::prelude::*;
use serde_json::json;

const REPO: &str = "acme/widget";
const APP: &str = "widget-prod";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rendered {
    Send(String),
    Edit(String, String),
}

#[derive(Default)]
struct RecordingSink {
    calls: Mutex<Vec<Rendered>>,
}

impl RecordingSink {
    fn calls(&self) -> Vec<Rendered> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Final content of each page in send order.
    fn pages(&self) -> Vec<String> {
        let mut pages: Vec<(String, String)> = Vec::new();
        for call in self.calls() {
            match call {
                Rendered::Send(content) => {
                    let handle = format!("m{}", pages.len() + 1);
                    pages.push((handle, content));
                }
                Rendered::Edit(handle, content) => {
                    let page = pages
                        .iter_mut()
                        .find(|(existing, _)| *existing == handle)
                        .expect("edit targets a sent page");
                    page.1 = content;
                }
            }
        }
        pages.into_iter().map(|(_, content)| content).collect()
    }
}

#[async_trait]
impl PageSink for RecordingSink {
    async fn send_page(&self, content: &str) -> Result<PageHandle, SinkError> {
        let mut calls = self.calls.lock().expect("calls lock");
        calls.push(Rendered::Send(content.to_string()));
        let sends = calls
            .iter()
            .filter(|call| matches!(call, Rendered::Send(_)))
            .count();
        Ok(PageHandle(format!("m{sends}")))
    }

    async fn edit_page(&self, handle: &PageHandle, content: &str) -> Result<(), SinkError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(Rendered::Edit(handle.as_str().to_string(), content.to_string()));
        Ok(())
    }

    fn max_content_chars(&self) -> usize {
        2_000
    }
}

fn runner(
    server: &MockServer,
    max_page_len: usize,
) -> CheckoutRunner<GitHubSourceClient, HerokuClient> {
    let host = GitHubSourceClient::new(SourceHostConfig {
        api_base: server.base_url(),
        repo: REPO.to_string(),
        ..SourceHostConfig::default()
    })
    .expect("source host");
    let platform = HerokuClient::new(PlatformConfig {
        api_base: server.base_url(),
        app_name: APP.to_string(),
        api_token: "heroku-test".to_string(),
        ..PlatformConfig::default()
    })
    .expect("platform");
    let streams = LogStreamClient::new(StreamConfig {
        max_page_len,
        ..StreamConfig::default()
    })
    .expect("streams");
    CheckoutRunner::new(
        VersionResolver::new(host, LatestAlias::Commit),
        platform,
        streams,
    )
}

fn mock_tags(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/widget/tags");
        then.status(200).json_body(json!([
            {"name": "v1.4.0", "tarball_url": "https://api.github.com/repos/acme/widget/tarball/v1.4.0"},
            {"name": "1.3.2", "tarball_url": "https://api.github.com/repos/acme/widget/tarball/1.3.2"}
        ]));
    });
}

#[tokio::test]
async fn integration_semver_checkout_streams_log_into_pages() {
    let server = MockServer::start();
    mock_tags(&server);
    let build = server.mock(|when, then| {
        when.method(POST)
            .path("/apps/widget-prod/builds")
            .json_body(json!({
                "source_blob": {"url": "https://api.github.com/repos/acme/widget/tarball/v1.4.0"}
            }));
        then.status(201).json_body(json!({
            "id": "build-7",
            "status": "pending",
            "output_stream_url": server.url("/streams/build-7")
        }));
    });
    let log = "-----> Building on the Heroku-22 stack\n-----> Installing dependencies\n-----> Launching... done\n";
    server.mock(|when, then| {
        when.method(GET).path("/streams/build-7");
        then.status(200).body(log);
    });

    let sink = RecordingSink::default();
    let report = runner(&server, 40)
        .run("1.4.0", &sink, std::future::pending())
        .await
        .expect("checkout");

    assert_eq!(build.calls(), 1);
    assert_eq!(report.kind, TargetKind::Release);
    assert_eq!(report.identifier, "v1.4.0");
    assert_eq!(report.build_id.as_deref(), Some("build-7"));
    let summary = report.render.expect("rendered");
    assert!(!summary.ended_empty);

    let pages = sink.pages();
    assert_eq!(pages.len(), summary.pages);
    assert!(pages.len() >= 3);
    assert!(pages.iter().all(|page| page.chars().count() <= 40));
    assert_eq!(pages.concat(), log);
}

#[tokio::test]
async fn integration_bare_semver_tag_is_found_by_canonical_name() {
    let server = MockServer::start();
    mock_tags(&server);

    let target = runner(&server, 64)
        .resolve("v1.3.2")
        .await
        .expect("resolve");
    assert_eq!(target.identifier, "v1.3.2");
    assert_eq!(
        target.archive_url,
        "https://api.github.com/repos/acme/widget/tarball/1.3.2"
    );
}

#[tokio::test]
async fn integration_latest_commit_builds_tarball_and_reports_empty_stream() {
    let server = MockServer::start();
    mock_tags(&server);
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/widget/commits");
        then.status(200)
            .json_body(json!([{"sha": "0123456789abcdef0123456789abcdef01234567"}]));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/apps/widget-prod/builds")
            .json_body(json!({
                "source_blob": {
                    "url": "https://github.com/acme/widget/archive/0123456789abcdef0123456789abcdef01234567.tar.gz"
                }
            }));
        then.status(201).json_body(json!({
            "id": "build-8",
            "output_stream_url": server.url("/streams/build-8")
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/streams/build-8");
        then.status(200).body("");
    });

    let sink = RecordingSink::default();
    let report = runner(&server, 1_990)
        .run("latest", &sink, std::future::pending())
        .await
        .expect("checkout");

    assert_eq!(report.kind, TargetKind::Commit);
    assert!(report.render.expect("rendered").ended_empty);
    match sink.calls().as_slice() {
        [Rendered::Send(content)] => {
            assert!(content.contains("closed without output"));
            assert!(content.contains("/streams/build-8"));
        }
        other => panic!("unexpected render calls: {other:?}"),
    }
}

#[tokio::test]
async fn regression_unknown_version_never_reaches_platform() {
    let server = MockServer::start();
    mock_tags(&server);
    let build = server.mock(|when, then| {
        when.method(POST).path("/apps/widget-prod/builds");
        then.status(201).json_body(json!({"id": "never"}));
    });

    let sink = RecordingSink::default();
    let error = runner(&server, 64)
        .run("9.9.9", &sink, std::future::pending())
        .await
        .expect_err("unknown version");

    assert!(matches!(
        error,
        CheckoutError::Resolve(ResolveError::VersionNotFound { ref tag }) if tag == "v9.9.9"
    ));
    assert_eq!(build.calls(), 0);
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn regression_rejected_build_surfaces_platform_status() {
    let server = MockServer::start();
    mock_tags(&server);
    server.mock(|when, then| {
        when.method(POST).path("/apps/widget-prod/builds");
        then.status(422).json_body(json!({"id": "invalid_params"}));
    });

    let sink = RecordingSink::default();
    let error = runner(&server, 64)
        .run("v1.4.0", &sink, std::future::pending())
        .await
        .expect_err("rejected build");

    assert!(matches!(
        error,
        CheckoutError::Platform(PlatformError::BuildSubmissionFailed { status: 422 })
    ));
    assert!(sink.calls().is_empty());
}
