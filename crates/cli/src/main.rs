// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `saiblo-worker`: connects to the coordinator, builds agent code into
//! images, judges matches, and reports results back.
//!
//! This binary only wires things together — fetch/build/judge logic lives
//! in `sbw-engine`, the container/HTTP boundary in `sbw-adapters`, and the
//! coordinator control channel in `sbw-daemon`.

mod config;

use config::Config;
use sbw_adapters::{BollardRuntime, HttpDownloader, HttpReporter};
use sbw_core::Image;
use sbw_daemon::{CoordinatorSession, WebSocketConnector};
use sbw_engine::{ArtifactCache, BuildEngine, JudgeConfig, JudgeEngine, PathManager, TaskContext, TaskScheduler};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();

    let config = Config::load()?;
    tracing::info!(name = %config.name, websocket_url = %config.websocket_url, "starting saiblo-worker");

    let paths = PathManager::new(config.data_dir.clone());
    paths.ensure_dirs().await?;

    let client = reqwest::Client::new();
    let downloader = HttpDownloader::new(client.clone());
    let reporter = Arc::new(HttpReporter::new(client));
    let runtime = BollardRuntime::connect()?;

    let cache = Arc::new(ArtifactCache::new(downloader, paths.clone()));
    let build_engine = Arc::new(BuildEngine::new(runtime.clone(), config.build_timeout));
    let judge_engine = Arc::new(JudgeEngine::new(
        runtime,
        paths,
        JudgeConfig {
            agent_cpus: config.agent_cpus,
            agent_mem_limit_bytes: config.agent_mem_limit_bytes,
            game_host_cpus: config.game_host_cpus,
            game_host_mem_limit_bytes: config.game_host_mem_limit_bytes,
            judge_timeout: config.judge_timeout,
        },
    ));

    let task_ctx = Arc::new(TaskContext::new(
        config.http_base_url.clone(),
        cache,
        build_engine,
        judge_engine,
        reporter,
    ));

    let scheduler = TaskScheduler::new();
    let session = CoordinatorSession::new(
        config.name,
        config.websocket_url,
        Image::new(config.game_host_image),
        scheduler,
        task_ctx,
        WebSocketConnector,
    );

    tokio::spawn({
        let scheduler = session.scheduler().clone();
        async move { scheduler.start().await }
    });

    session.run().await
}

/// Stdout-only structured logging: no file rotation, no WAL — this process
/// has no durable state of its own to protect.
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}
