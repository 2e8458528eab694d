// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnecting control-channel client. Mirrors `SaibloClient.start` in
//! structure: an outer redial loop that re-sends `init` on every successful
//! connection, then runs four concurrent inner activities until the
//! connection drops, at which point it redials.

use crate::protocol::{decode, InboundFrame, OutboundFrame};
use crate::transport::{Connector, FrameReader, FrameWriter};
use sbw_adapters::{ContainerRuntime, Downloader, Reporter};
use sbw_core::Image;
use sbw_engine::{BuildTask, JudgeTask, Task, TaskContext, TaskScheduler};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

const HEART_BEAT_INTERVAL: Duration = Duration::from_secs(3);
const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(1);
const INITIAL_RECONNECT_BACKOFF: Duration = Duration::from_millis(500);
const MAX_RECONNECT_BACKOFF: Duration = Duration::from_secs(30);

/// Reconnecting coordinator control-channel client.
///
/// Generic over the task's adapter types (`D`/`C`/`R`, threaded through to
/// every `BuildTask`/`JudgeTask` it schedules) and the connector (`X`),
/// which is a `FakeConnector` in tests and [`crate::transport::WebSocketConnector`]
/// in production.
pub struct CoordinatorSession<D, C, R, X> {
    name: String,
    websocket_url: String,
    game_host_image: Image,
    scheduler: TaskScheduler<D, C, R>,
    task_ctx: Arc<TaskContext<D, C, R>>,
    connector: X,
    judge_task_received: Notify,
}

impl<D, C, R, X> CoordinatorSession<D, C, R, X>
where
    D: Downloader,
    C: ContainerRuntime,
    R: Reporter,
    X: Connector,
{
    /// The scheduler this session feeds. Exposed so the binary entrypoint
    /// can run the executor loop alongside [`CoordinatorSession::run`].
    pub fn scheduler(&self) -> &TaskScheduler<D, C, R> {
        &self.scheduler
    }

    pub fn new(
        name: impl Into<String>,
        websocket_url: impl Into<String>,
        game_host_image: Image,
        scheduler: TaskScheduler<D, C, R>,
        task_ctx: Arc<TaskContext<D, C, R>>,
        connector: X,
    ) -> Self {
        Self {
            name: name.into(),
            websocket_url: websocket_url.into(),
            game_host_image,
            scheduler,
            task_ctx,
            connector,
            judge_task_received: Notify::new(),
        }
    }

    /// Run forever: connect, handshake, serve, and on any disconnect redial
    /// with exponential backoff (capped). Never returns.
    pub async fn run(&self) -> ! {
        let mut backoff = INITIAL_RECONNECT_BACKOFF;

        loop {
            match self.connector.connect(&self.websocket_url).await {
                Ok((writer, reader)) => {
                    backoff = INITIAL_RECONNECT_BACKOFF;

                    let init = OutboundFrame::Init { description: self.name.clone() };
                    if let Err(e) = writer.send(init.to_json()).await {
                        tracing::warn!(error = %e, "failed to send init frame");
                    } else {
                        tracing::info!(url = %self.websocket_url, "connected to coordinator");
                        self.serve(writer, reader).await;
                        tracing::warn!("coordinator connection closed, reconnecting");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to connect to coordinator");
                }
            }

            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(MAX_RECONNECT_BACKOFF);
        }
    }

    /// Run the four concurrent loops until any one of them observes the
    /// connection has gone away, then return so the caller can redial.
    async fn serve(&self, writer: Arc<dyn FrameWriter>, mut reader: Box<dyn FrameReader>) {
        tokio::select! {
            _ = self.receive_loop(reader.as_mut()) => {}
            _ = self.heart_beat_loop(Arc::clone(&writer)) => {}
            _ = self.request_judge_task_loop(Arc::clone(&writer)) => {}
            _ = self.finish_judge_task_loop(Arc::clone(&writer)) => {}
        }
    }

    /// Decode every inbound frame and schedule the task it implies. Returns
    /// once the reader reports the connection closed.
    async fn receive_loop(&self, reader: &mut dyn FrameReader) {
        loop {
            let raw = match reader.recv().await {
                Ok(Some(raw)) => raw,
                Ok(None) => return,
                Err(e) => {
                    tracing::warn!(error = %e, "coordinator transport error");
                    return;
                }
            };

            let frame = match decode(&raw) {
                Ok(Some(frame)) => frame,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, raw = %raw, "malformed coordinator frame");
                    continue;
                }
            };

            match frame {
                InboundFrame::CompilationTask { code_id } => {
                    tracing::info!(code_id = %code_id, "scheduling compilation task");
                    let task = BuildTask::new(code_id, Arc::clone(&self.task_ctx));
                    self.scheduler.schedule(Task::Build(task));
                }
                InboundFrame::JudgeTask { match_id, agent_code_ids } => {
                    tracing::info!(match_id = %match_id, "scheduling judge task");
                    self.judge_task_received.notify_one();
                    let task = JudgeTask::new(
                        match_id,
                        self.game_host_image.clone(),
                        agent_code_ids,
                        Arc::clone(&self.task_ctx),
                    );
                    self.scheduler.schedule(Task::Judge(task));
                }
            }
        }
    }

    /// Send `heart_beat` every [`HEART_BEAT_INTERVAL`], forever (until the
    /// connection breaks, observed as a send failure).
    async fn heart_beat_loop(&self, writer: Arc<dyn FrameWriter>) {
        loop {
            if writer.send(OutboundFrame::HeartBeat.to_json()).await.is_err() {
                return;
            }
            tokio::time::sleep(HEART_BEAT_INTERVAL).await;
        }
    }

    /// While the scheduler is idle, request a judge task and wait for the
    /// receive loop to signal one arrived before requesting again — at most
    /// one outstanding request at a time.
    async fn request_judge_task_loop(&self, writer: Arc<dyn FrameWriter>) {
        loop {
            if !self.scheduler.idle() {
                tokio::time::sleep(IDLE_CHECK_INTERVAL).await;
                continue;
            }

            let notified = self.judge_task_received.notified();
            if writer.send(OutboundFrame::RequestJudgeTask.to_json()).await.is_err() {
                return;
            }
            notified.await;
        }
    }

    /// Drain the scheduler's done stream; notify the coordinator for every
    /// finished judge task (builds need no such notification).
    async fn finish_judge_task_loop(&self, writer: Arc<dyn FrameWriter>) {
        loop {
            let task = self.scheduler.pop_done_task().await;
            let Some(match_id) = task.match_id().cloned() else {
                continue;
            };

            let frame = OutboundFrame::FinishJudgeTask { match_id };
            if writer.send(frame.to_json()).await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
