// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrates a single match: starts the game host and agent containers
//! in their own per-slot networks, waits for the host to finish, harvests
//! the replay and scores, and persists the result.

use crate::error::EngineError;
use crate::paths::PathManager;
use rand::Rng;
use sbw_adapters::{ContainerRuntime, RunSpec};
use sbw_core::{AgentResult, AgentSlot, Image, MatchId, MatchResult};
use std::collections::HashMap;
use std::time::Duration;

const AGENT_CONTAINER_NAME_PREFIX: &str = "saiblo-worker-agent";
const GAME_HOST_CONTAINER_NAME_PREFIX: &str = "saiblo-worker-game-host";
const NETWORK_NAME_PREFIX: &str = "saiblo-worker-network";
const GAME_HOST_PORT: u16 = 14514;
const RESULT_FILE_PATH: &str = "/app/data/result.json";
const REPLAY_FILE_PATH: &str = "/app/data/replay.dat";
/// An already-exited container's status is available immediately; this just
/// bounds the wait against a container that reports "not running" and then
/// hangs retrieving its status anyway.
const AGENT_SETTLE_TIMEOUT: Duration = Duration::from_secs(1);

/// Per-role resource caps and the host-wait deadline, sourced from
/// configuration.
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    pub agent_cpus: f64,
    pub agent_mem_limit_bytes: i64,
    pub game_host_cpus: f64,
    pub game_host_mem_limit_bytes: i64,
    pub judge_timeout: Duration,
}

#[derive(serde::Deserialize)]
struct HostResultFile {
    #[serde(default)]
    scores: HashMap<String, f64>,
}

struct MatchNames {
    host: String,
    agents: Vec<Option<(String, String)>>, // (container name, network name) per present slot
}

impl MatchNames {
    fn new(match_id: &MatchId, slots: &[AgentSlot]) -> Self {
        let host = format!("{GAME_HOST_CONTAINER_NAME_PREFIX}-{match_id}");
        let agents = slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.as_ref().map(|_| {
                    (
                        format!("{AGENT_CONTAINER_NAME_PREFIX}-{match_id}-{i}"),
                        format!("{NETWORK_NAME_PREFIX}-{match_id}-{i}"),
                    )
                })
            })
            .collect();
        Self { host, agents }
    }
}

fn random_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub struct JudgeEngine<C> {
    runtime: C,
    paths: PathManager,
    config: JudgeConfig,
}

impl<C: ContainerRuntime> JudgeEngine<C> {
    pub fn new(runtime: C, paths: PathManager, config: JudgeConfig) -> Self {
        Self { runtime, paths, config }
    }

    /// Judge a single match. Idempotent: if a persisted result already
    /// exists for `match_id`, it is returned without touching the
    /// container runtime.
    pub async fn judge(
        &self,
        match_id: &MatchId,
        game_host_image: &Image,
        agent_slots: &[AgentSlot],
    ) -> Result<MatchResult, EngineError> {
        if let Some(cached) = self.load_persisted(match_id).await? {
            return Ok(cached);
        }

        let names = MatchNames::new(match_id, agent_slots);

        let outcome = self.run_protocol(match_id, game_host_image, agent_slots, &names).await;

        self.cleanup(&names).await;

        let result = match outcome {
            Ok(result) => result,
            Err((message, host_stderr)) => MatchResult {
                match_id: match_id.clone(),
                agent_results: agent_slots
                    .iter()
                    .map(|slot| {
                        if slot.is_some() {
                            AgentResult::unknown_error(String::new())
                        } else {
                            AgentResult::cancelled()
                        }
                    })
                    .collect(),
                error_message: message,
                replay_path: None,
                host_stderr,
            },
        };

        self.persist(match_id, &result).await?;
        Ok(result)
    }

    /// Best-effort capture of the host's stderr alongside an error that
    /// aborted the protocol, for inclusion in the failure result.
    async fn host_error(
        &self,
        host_id: &str,
        err: sbw_adapters::ContainerError,
    ) -> (String, String) {
        let stderr = self.runtime.logs_stderr(host_id).await.unwrap_or_default();
        (err.to_string(), stderr)
    }

    async fn run_protocol(
        &self,
        match_id: &MatchId,
        game_host_image: &Image,
        agent_slots: &[AgentSlot],
        names: &MatchNames,
    ) -> Result<MatchResult, (String, String)> {
        let tokens: Vec<Option<String>> = agent_slots
            .iter()
            .map(|slot| slot.as_ref().map(|_| random_token()))
            .collect();

        let tokens_env = tokens
            .iter()
            .filter_map(|t| t.clone())
            .collect::<Vec<_>>()
            .join(",");

        // Step 1: start the game host, disconnected from any network.
        let host_spec = RunSpec::new(names.host.as_str(), game_host_image.as_str())
            .with_env("TOKENS", tokens_env)
            .with_limits(self.config.game_host_cpus, self.config.game_host_mem_limit_bytes);

        let host_id = self
            .runtime
            .run(host_spec)
            .await
            .map_err(|e| (e.to_string(), String::new()))?;

        // Step 2: start each present agent, create its dedicated network,
        // and connect both the agent and the host to it.
        let mut agent_ids: Vec<Option<String>> = Vec::with_capacity(agent_slots.len());
        for (i, slot) in agent_slots.iter().enumerate() {
            let Some(image) = slot else {
                agent_ids.push(None);
                continue;
            };
            let (agent_name, net_name) = names.agents[i].as_ref().expect("present slot has a name");
            let token = tokens[i].as_ref().expect("present slot has a token");

            if let Err(e) = self.runtime.create_network(net_name).await {
                return Err(self.host_error(&host_id, e).await);
            }

            let agent_spec = RunSpec::new(agent_name.as_str(), image.as_str())
                .with_env("TOKEN", token.clone())
                .with_env("GAME_HOST", format!("ws://{}:{GAME_HOST_PORT}", names.host))
                .with_network(net_name.clone())
                .with_limits(self.config.agent_cpus, self.config.agent_mem_limit_bytes);

            let agent_id = match self.runtime.run(agent_spec).await {
                Ok(id) => id,
                Err(e) => return Err(self.host_error(&host_id, e).await),
            };

            // The host joins every slot's network so each agent can reach it.
            if let Err(e) = self.runtime.connect_network(&host_id, net_name).await {
                return Err(self.host_error(&host_id, e).await);
            }

            agent_ids.push(Some(agent_id));
        }

        // Step 3: wait for the host, bounded by the judge timeout.
        if let Err(e) = self.runtime.wait(&host_id, self.config.judge_timeout).await {
            return Err(self.host_error(&host_id, e).await);
        }

        // Step 4: stop the host, then settle every agent's exit code.
        if let Err(e) = self.runtime.stop(&host_id).await {
            return Err(self.host_error(&host_id, e).await);
        }

        let mut agent_exit_codes: Vec<i32> = Vec::with_capacity(agent_slots.len());
        for agent_id in &agent_ids {
            let Some(id) = agent_id else {
                agent_exit_codes.push(0);
                continue;
            };
            // Only a container that is genuinely still running is force-stopped
            // and treated as a normal (0) exit; one that has already exited on
            // its own keeps its real exit code.
            let code = if self.runtime.is_running(id).await.unwrap_or(false) {
                let _ = self.runtime.stop(id).await;
                0
            } else {
                match self.runtime.wait(id, AGENT_SETTLE_TIMEOUT).await {
                    Ok(code) => code as i32,
                    Err(_) => {
                        let _ = self.runtime.stop(id).await;
                        0
                    }
                }
            };
            agent_exit_codes.push(code);
        }

        // Step 5: harvest result.json and replay.dat from the host.
        let result_bytes = self
            .runtime
            .read_file(&host_id, RESULT_FILE_PATH)
            .await
            .unwrap_or(None);
        let replay_bytes = self
            .runtime
            .read_file(&host_id, REPLAY_FILE_PATH)
            .await
            .unwrap_or(None)
            .unwrap_or_default();

        let scores: HashMap<String, f64> = result_bytes
            .and_then(|bytes| serde_json::from_slice::<HostResultFile>(&bytes).ok())
            .map(|f| f.scores)
            .unwrap_or_default();

        let replay_path = self.paths.match_replay_path(match_id);
        if let Some(parent) = replay_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| (e.to_string(), String::new()))?;
        }
        tokio::fs::write(&replay_path, &replay_bytes)
            .await
            .map_err(|e| (e.to_string(), String::new()))?;

        // Step 6: build per-slot agent results.
        let mut agent_results = Vec::with_capacity(agent_slots.len());
        for (i, slot) in agent_slots.iter().enumerate() {
            if slot.is_none() {
                agent_results.push(AgentResult::cancelled());
                continue;
            }
            let exit_code = agent_exit_codes[i];
            let token = tokens[i].as_ref().expect("present slot has a token");
            let score = scores.get(token).copied().unwrap_or(0.0);
            let stderr = match &agent_ids[i] {
                Some(id) => self.runtime.logs_stderr(id).await.unwrap_or_default(),
                None => String::new(),
            };
            agent_results.push(AgentResult::present(exit_code, score, stderr));
        }

        Ok(MatchResult {
            match_id: match_id.clone(),
            agent_results,
            error_message: String::new(),
            replay_path: Some(replay_path),
            host_stderr: String::new(),
        })
    }

    /// Stop and remove every container and network from this call,
    /// regardless of the protocol's outcome. Best-effort: one failing step
    /// does not stop the rest from being attempted.
    async fn cleanup(&self, names: &MatchNames) {
        let log_err = |op: &str, name: &str, e: sbw_adapters::ContainerError| {
            tracing::warn!(op, name, error = %e, "judge cleanup step failed");
        };

        if let Err(e) = self.runtime.stop(&names.host).await {
            log_err("stop", &names.host, e);
        }
        if let Err(e) = self.runtime.remove(&names.host).await {
            log_err("remove", &names.host, e);
        }

        for (agent_name, net_name) in names.agents.iter().flatten() {
            if let Err(e) = self.runtime.stop(agent_name).await {
                log_err("stop", agent_name, e);
            }
            if let Err(e) = self.runtime.remove(agent_name).await {
                log_err("remove", agent_name, e);
            }
            if let Err(e) = self.runtime.remove_network(net_name).await {
                log_err("remove_network", net_name, e);
            }
        }
    }

    async fn load_persisted(&self, match_id: &MatchId) -> Result<Option<MatchResult>, EngineError> {
        let result_path = self.paths.match_result_path(match_id);
        let replay_path = self.paths.match_replay_path(match_id);

        if !tokio::fs::try_exists(&result_path).await? || !tokio::fs::try_exists(&replay_path).await? {
            return Ok(None);
        }

        let bytes = tokio::fs::read(&result_path).await?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn persist(&self, match_id: &MatchId, result: &MatchResult) -> Result<(), EngineError> {
        let path = self.paths.match_result_path(match_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(result)?;
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    /// List every persisted match result.
    pub async fn list(&self) -> Result<HashMap<MatchId, MatchResult>, EngineError> {
        let dir = self.paths.match_results_dir();
        if !tokio::fs::try_exists(&dir).await? {
            return Ok(HashMap::new());
        }

        let mut entries = tokio::fs::read_dir(&dir).await?;
        let mut results = HashMap::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let Some(stem) = name.strip_suffix(".json") else {
                continue;
            };
            let bytes = tokio::fs::read(entry.path()).await?;
            let result: MatchResult = serde_json::from_slice(&bytes)?;
            results.insert(MatchId::new(stem), result);
        }
        Ok(results)
    }

    /// Reap every container/network/replay/result this worker owns,
    /// including leftovers from a crash that skipped per-call cleanup.
    pub async fn clean(&self) -> Result<(), EngineError> {
        for dir in [self.paths.match_replays_dir(), self.paths.match_results_dir()] {
            if tokio::fs::try_exists(&dir).await? {
                tokio::fs::remove_dir_all(&dir).await?;
            }
            tokio::fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "judge_engine_tests.rs"]
mod tests;
