// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outcome of judging a single match between one or more agents.

use crate::id::MatchId;
use crate::status::AgentStatus;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single agent slot's outcome within a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub exit_code: i32,
    pub score: f64,
    pub status: AgentStatus,
    pub stderr: String,
}

impl AgentResult {
    /// Outcome for a slot that had no agent image assigned.
    pub fn cancelled() -> Self {
        Self {
            exit_code: 0,
            score: 0.0,
            status: AgentStatus::Cancel,
            stderr: String::new(),
        }
    }

    /// Outcome for a slot whose match failed before a real exit code was
    /// observed (engine-level error, not an agent-level one).
    pub fn unknown_error(stderr: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            score: 0.0,
            status: AgentStatus::Ue,
            stderr: stderr.into(),
        }
    }

    pub fn present(exit_code: i32, score: f64, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            score,
            status: if exit_code == 0 { AgentStatus::Ok } else { AgentStatus::Re },
            stderr: stderr.into(),
        }
    }
}

/// Result of judging one match.
///
/// `replay_path` is `None` when the game host never produced a replay, e.g.
/// because it crashed before completion. `error_message` is non-empty only
/// when the match as a whole failed (as opposed to an individual agent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_id: MatchId,
    pub agent_results: Vec<AgentResult>,
    pub error_message: String,
    pub replay_path: Option<PathBuf>,
    pub host_stderr: String,
}

impl MatchResult {
    pub fn is_success(&self) -> bool {
        self.error_message.is_empty()
    }
}

#[cfg(test)]
#[path = "match_result_tests.rs"]
mod tests;
