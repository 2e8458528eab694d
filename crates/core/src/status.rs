// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent exit classification reported back to the coordinator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a single agent's outcome in a match.
///
/// Only `Ok`, `Re`, `Cancel` and `Ue` are ever produced by this worker (see
/// [`crate::AgentResult`] construction in the judge engine). The remaining
/// variants are declared so the wire format stays compatible with whatever
/// the coordinator and other judger implementations in the fleet emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    /// Agent exited normally (exit code 0).
    #[serde(rename = "OK")]
    Ok,
    /// Agent exited with a non-zero exit code (runtime error).
    #[serde(rename = "RE")]
    Re,
    /// Time limit exceeded. Not emitted by this worker; reserved for
    /// coordinator/game-host-side classification.
    #[serde(rename = "TLE")]
    Tle,
    /// Memory limit exceeded. Not emitted by this worker.
    #[serde(rename = "MLE")]
    Mle,
    /// Output limit exceeded. Not emitted by this worker.
    #[serde(rename = "OLE")]
    Ole,
    /// Single-step time limit exceeded. Not emitted by this worker.
    #[serde(rename = "STLE")]
    Stle,
    /// Agent exited on its own initiative. Not emitted by this worker.
    #[serde(rename = "EXIT")]
    Exit,
    /// Unknown/engine-level error: the judge call failed before a live
    /// per-agent outcome could be observed.
    #[serde(rename = "UE")]
    Ue,
    /// Slot had no agent image; no container was started for it.
    #[serde(rename = "CANCEL")]
    Cancel,
    /// Invalid action taken by the agent. Not emitted by this worker.
    #[serde(rename = "IA")]
    Ia,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentStatus::Ok => "OK",
            AgentStatus::Re => "RE",
            AgentStatus::Tle => "TLE",
            AgentStatus::Mle => "MLE",
            AgentStatus::Ole => "OLE",
            AgentStatus::Stle => "STLE",
            AgentStatus::Exit => "EXIT",
            AgentStatus::Ue => "UE",
            AgentStatus::Cancel => "CANCEL",
            AgentStatus::Ia => "IA",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
