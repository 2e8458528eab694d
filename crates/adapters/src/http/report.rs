// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::HttpError;
use async_trait::async_trait;
use base64::Engine;
use sbw_core::{BuildResult, MatchResult};
use serde::Serialize;
use serde_json::json;

const COMPILE_SUCCESS: &str = "编译成功";
const COMPILE_FAILURE: &str = "编译失败";
const JUDGE_SUCCESS: &str = "评测成功";
const JUDGE_FAILURE: &str = "评测失败";

/// Reports build and match outcomes back to the coordinator's REST API.
#[async_trait]
pub trait Reporter: Clone + Send + Sync + 'static {
    async fn report_build_result(
        &self,
        base_url: &str,
        result: &BuildResult,
    ) -> Result<(), HttpError>;

    async fn report_match_result(
        &self,
        base_url: &str,
        result: &MatchResult,
        replay: Option<Vec<u8>>,
    ) -> Result<(), HttpError>;
}

#[derive(Clone)]
pub struct HttpReporter {
    client: reqwest::Client,
}

impl HttpReporter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

async fn check_status(response: reqwest::Response) -> Result<(), HttpError> {
    if response.status().is_success() {
        return Ok(());
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(HttpError::Status { status, body })
}

fn build_result_body(result: &BuildResult) -> serde_json::Value {
    json!({
        "compile_status": if result.is_success() { COMPILE_SUCCESS } else { COMPILE_FAILURE },
        "compile_message": result.message,
    })
}

/// One entry of the `states` array in the match-report multipart body.
#[derive(Serialize)]
struct AgentStateEntry {
    position: usize,
    status: String,
    code: i32,
    stderr: String,
}

fn match_result_states(result: &MatchResult) -> Vec<AgentStateEntry> {
    result
        .agent_results
        .iter()
        .enumerate()
        .map(|(position, a)| AgentStateEntry {
            position,
            status: a.status.to_string(),
            code: a.exit_code,
            stderr: base64::engine::general_purpose::STANDARD.encode(&a.stderr),
        })
        .collect()
}

fn match_result_scores(result: &MatchResult) -> Vec<f64> {
    result.agent_results.iter().map(|a| a.score).collect()
}

#[async_trait]
impl Reporter for HttpReporter {
    async fn report_build_result(
        &self,
        base_url: &str,
        result: &BuildResult,
    ) -> Result<(), HttpError> {
        let url = format!("{base_url}/judger/codes/{}/", result.code_id);
        let body = build_result_body(result);

        let response = self.client.put(&url).json(&body).send().await?;
        check_status(response).await
    }

    async fn report_match_result(
        &self,
        base_url: &str,
        result: &MatchResult,
        replay: Option<Vec<u8>>,
    ) -> Result<(), HttpError> {
        let url = format!("{base_url}/judger/matches/{}/", result.match_id);

        let states = match_result_states(result);

        let mut form = reqwest::multipart::Form::new()
            .text(
                "state",
                if result.is_success() { JUDGE_SUCCESS } else { JUDGE_FAILURE },
            )
            .text(
                "states",
                serde_json::to_string(&states).unwrap_or_default(),
            );

        if result.is_success() {
            let scores = match_result_scores(result);
            form = form.text("scores", serde_json::to_string(&scores).unwrap_or_default());
        } else {
            let host_stderr_b64 =
                base64::engine::general_purpose::STANDARD.encode(&result.host_stderr);
            form = form
                .text("err", host_stderr_b64)
                .text("error", result.error_message.clone());
        }

        let filename = format!("saiblo-worker-replay-{}.dat", result.match_id);
        let replay_bytes = replay.unwrap_or_default();
        form = form.part(
            "file",
            reqwest::multipart::Part::bytes(replay_bytes).file_name(filename),
        );

        let response = self.client.put(&url).multipart(form).send().await?;
        check_status(response).await
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
