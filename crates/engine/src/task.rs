// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polymorphic unit of work the scheduler executes: either a build or a
//! judge task. Two variants, closed set — see the module doc on
//! [`Task`] for why this isn't a trait object.

use crate::build_engine::BuildEngine;
use crate::cache::ArtifactCache;
use crate::judge_engine::JudgeEngine;
use parking_lot::Mutex;
use sbw_adapters::{ContainerRuntime, Downloader, Reporter};
use sbw_core::{BuildResult, CodeId, Image, MatchId, MatchResult};
use std::sync::Arc;

/// Everything a [`BuildTask`] or [`JudgeTask`] needs to fetch, build and
/// report, shared by `Arc` across every task a factory produces.
pub struct TaskContext<D, C, R> {
    pub http_base_url: String,
    pub cache: Arc<ArtifactCache<D>>,
    pub build_engine: Arc<BuildEngine<C>>,
    pub judge_engine: Arc<JudgeEngine<C>>,
    pub reporter: Arc<R>,
}

impl<D, C, R> TaskContext<D, C, R> {
    pub fn new(
        http_base_url: impl Into<String>,
        cache: Arc<ArtifactCache<D>>,
        build_engine: Arc<BuildEngine<C>>,
        judge_engine: Arc<JudgeEngine<C>>,
        reporter: Arc<R>,
    ) -> Self {
        Self {
            http_base_url: http_base_url.into(),
            cache,
            build_engine,
            judge_engine,
            reporter,
        }
    }
}

fn download_url(base_url: &str, code_id: &CodeId) -> String {
    format!("{base_url}/judger/codes/{code_id}/download")
}

/// Build one agent's code into an image, reporting the outcome to the
/// coordinator. Fetch failures and build failures both collapse into a
/// failed [`BuildResult`] rather than propagating — the task still
/// "succeeds" from the scheduler's point of view.
pub struct BuildTask<D, C, R> {
    code_id: CodeId,
    ctx: Arc<TaskContext<D, C, R>>,
    result: Mutex<Option<BuildResult>>,
}

impl<D: Downloader, C: ContainerRuntime, R: Reporter> BuildTask<D, C, R> {
    pub fn new(code_id: CodeId, ctx: Arc<TaskContext<D, C, R>>) -> Self {
        Self {
            code_id,
            ctx,
            result: Mutex::new(None),
        }
    }

    pub fn code_id(&self) -> &CodeId {
        &self.code_id
    }

    /// Build this task's code, unconditionally reporting the outcome.
    /// Never returns an error: any failure along the way is folded into
    /// the returned [`BuildResult`].
    pub async fn execute(&self) -> BuildResult {
        let result = self.build().await;

        if let Err(e) = self
            .ctx
            .reporter
            .report_build_result(&self.ctx.http_base_url, &result)
            .await
        {
            tracing::error!(code_id = %self.code_id, error = %e, "failed to report build result");
        }

        *self.result.lock() = Some(result.clone());
        result
    }

    async fn build(&self) -> BuildResult {
        let url = download_url(&self.ctx.http_base_url, &self.code_id);
        let tar_path = match self.ctx.cache.fetch(&self.code_id, &url).await {
            Ok(path) => path,
            Err(e) => return BuildResult::failure(self.code_id.clone(), e.to_string()),
        };

        let tar_bytes = match tokio::fs::read(&tar_path).await {
            Ok(bytes) => bytes,
            Err(e) => return BuildResult::failure(self.code_id.clone(), e.to_string()),
        };

        match self.ctx.build_engine.build(&self.code_id, tar_bytes).await {
            Ok(result) => result,
            Err(e) => BuildResult::failure(self.code_id.clone(), e.to_string()),
        }
    }

    pub fn result(&self) -> Option<BuildResult> {
        self.result.lock().clone()
    }
}

/// Judge a single match: build every present agent's code (reporting each
/// build), hand the resulting slots to the judge engine, then report the
/// match result.
pub struct JudgeTask<D, C, R> {
    match_id: MatchId,
    game_host_image: Image,
    agent_code_ids: Vec<Option<CodeId>>,
    ctx: Arc<TaskContext<D, C, R>>,
    result: Mutex<Option<MatchResult>>,
}

impl<D: Downloader, C: ContainerRuntime, R: Reporter> JudgeTask<D, C, R> {
    pub fn new(
        match_id: MatchId,
        game_host_image: Image,
        agent_code_ids: Vec<Option<CodeId>>,
        ctx: Arc<TaskContext<D, C, R>>,
    ) -> Self {
        Self {
            match_id,
            game_host_image,
            agent_code_ids,
            ctx,
            result: Mutex::new(None),
        }
    }

    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    pub async fn execute(&self) -> MatchResult {
        let mut agent_slots = Vec::with_capacity(self.agent_code_ids.len());
        for code_id in &self.agent_code_ids {
            let Some(code_id) = code_id else {
                agent_slots.push(None);
                continue;
            };

            // A cache hit means the image already exists and nothing was
            // actually rebuilt: resolve it locally instead of running (and
            // re-reporting) a `BuildTask` for it.
            let cached = self.ctx.build_engine.cached_image(code_id).await.unwrap_or_else(|e| {
                tracing::warn!(%code_id, error = %e, "failed to check build cache, rebuilding");
                None
            });

            let image = match cached {
                Some(image) => Some(image),
                None => {
                    let build_task = BuildTask::new(code_id.clone(), Arc::clone(&self.ctx));
                    build_task.execute().await.image
                }
            };
            agent_slots.push(image);
        }

        tracing::info!(match_id = %self.match_id, "judging match");
        let result = match self
            .ctx
            .judge_engine
            .judge(&self.match_id, &self.game_host_image, &agent_slots)
            .await
        {
            Ok(result) => result,
            Err(e) => MatchResult {
                match_id: self.match_id.clone(),
                agent_results: agent_slots
                    .iter()
                    .map(|slot| {
                        if slot.is_some() {
                            sbw_core::AgentResult::unknown_error(String::new())
                        } else {
                            sbw_core::AgentResult::cancelled()
                        }
                    })
                    .collect(),
                error_message: e.to_string(),
                replay_path: None,
                host_stderr: String::new(),
            },
        };

        self.report(&result).await;
        *self.result.lock() = Some(result.clone());
        result
    }

    async fn report(&self, result: &MatchResult) {
        let replay = match &result.replay_path {
            Some(path) => tokio::fs::read(path).await.ok(),
            None => None,
        };

        if let Err(e) = self
            .ctx
            .reporter
            .report_match_result(&self.ctx.http_base_url, result, replay)
            .await
        {
            tracing::error!(match_id = %self.match_id, error = %e, "failed to report match result");
        }
    }

    pub fn result(&self) -> Option<MatchResult> {
        self.result.lock().clone()
    }
}

/// Heterogeneous unit of scheduled work. Two variants, closed set: the
/// scheduler stores these by value and the coordinator session downcasts
/// via [`Task::match_id`] to decide whether a finished task needs a
/// `finish_judge_task` notification.
pub enum Task<D, C, R> {
    Build(BuildTask<D, C, R>),
    Judge(JudgeTask<D, C, R>),
}

impl<D: Downloader, C: ContainerRuntime, R: Reporter> Task<D, C, R> {
    /// Run the task once. Execution failures that aren't recoverable inside
    /// the task itself (build/judge failures) are already folded into the
    /// task's result; this only returns when that result has been stored.
    pub async fn execute(&self) {
        match self {
            Task::Build(t) => {
                t.execute().await;
            }
            Task::Judge(t) => {
                t.execute().await;
            }
        }
    }

    /// `Some` iff this is a [`Task::Judge`], for the coordinator session's
    /// `finish_judge_task` notification.
    pub fn match_id(&self) -> Option<&MatchId> {
        match self {
            Task::Judge(t) => Some(t.match_id()),
            Task::Build(_) => None,
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
