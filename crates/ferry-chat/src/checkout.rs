//! One checkout: resolve a version token, submit the build, render its log.

use std::future::Future;

use ferry_paginate::{LogStreamClient, PaginateError, MIN_PAGE_LEN};
use ferry_platform::{BuildPlatform, PlatformError};
use ferry_source::{ResolveError, ResolvedTarget, SourceHost, TargetKind, VersionResolver};
use thiserror::Error;

use crate::{drive_pages, DriveError, PageSink, RenderSummary, SinkError};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error(transparent)]
    Stream(#[from] PaginateError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("page length {max_page_len} exceeds the renderer limit of {sink_limit} characters")]
    PageTooLong {
        max_page_len: usize,
        sink_limit: usize,
    },
}

impl From<DriveError> for CheckoutError {
    fn from(error: DriveError) -> Self {
        match error {
            DriveError::Stream(error) => Self::Stream(error),
            DriveError::Sink(error) => Self::Sink(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReport {
    pub kind: TargetKind,
    pub identifier: String,
    pub archive_url: String,
    pub build_id: Option<String>,
    /// `None` when the checkout was cancelled while the log was streaming.
    pub render: Option<RenderSummary>,
}

impl CheckoutReport {
    pub fn cancelled(&self) -> bool {
        self.render.is_none()
    }
}

pub struct CheckoutRunner<H, P> {
    resolver: VersionResolver<H>,
    platform: P,
    streams: LogStreamClient,
}

impl<H: SourceHost, P: BuildPlatform> CheckoutRunner<H, P> {
    pub fn new(resolver: VersionResolver<H>, platform: P, streams: LogStreamClient) -> Self {
        Self {
            resolver,
            platform,
            streams,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Resolution only; nothing is written to the platform.
    pub async fn resolve(&self, token: &str) -> Result<ResolvedTarget, CheckoutError> {
        Ok(self.resolver.resolve_token(token).await?)
    }

    /// Runs resolve → submit → paginate, rendering pages through `sink`.
    ///
    /// Pages longer than the sink accepts are rejected before any request.
    ///
    /// When `cancel` completes while the log is streaming, the stream is
    /// dropped, which closes its connection, and the live page is left as
    /// last rendered.
    #[tracing::instrument(level = "info", skip(self, sink, cancel))]
    pub async fn run<C>(
        &self,
        token: &str,
        sink: &dyn PageSink,
        cancel: C,
    ) -> Result<CheckoutReport, CheckoutError>
    where
        C: Future<Output = ()>,
    {
        let max_page_len = self.streams.max_page_len().max(MIN_PAGE_LEN);
        let sink_limit = sink.max_content_chars();
        if max_page_len > sink_limit {
            return Err(CheckoutError::PageTooLong {
                max_page_len,
                sink_limit,
            });
        }

        let target = self.resolver.resolve_token(token).await?;
        let kind = target.kind;
        let identifier = target.identifier.clone();
        let archive_url = target.archive_url.clone();

        let handle = self.platform.submit(target).await?;
        let stream_url = handle.log_stream_url.as_deref();

        let render = tokio::select! {
            biased;
            _ = cancel => {
                tracing::warn!(%identifier, "checkout cancelled; closing log stream");
                None
            }
            result = async {
                let events = self.streams.paginate(stream_url).await;
                drive_pages(events, sink).await
            } => Some(result?),
        };
        if let Some(summary) = &render {
            tracing::info!(
                %identifier,
                pages = summary.pages,
                edits = summary.edits,
                ended_empty = summary.ended_empty,
                "checkout finished"
            );
        }

        Ok(CheckoutReport {
            kind,
            identifier,
            archive_url,
            build_id: handle.build_id,
            render,
        })
    }
}
