// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outcome of building an agent's submitted code into a runnable image.

use crate::id::CodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A Docker image reference, e.g. `saiblo-worker-image:abc123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Image(pub String);

impl Image {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single match player slot: `Some(image)` for an assigned agent, `None`
/// for a slot with no agent (reported back as `AgentStatus::Cancel`).
pub type AgentSlot = Option<Image>;

/// Result of building a single agent's code.
///
/// `image` is `None` when the build failed; `message` then carries the
/// compiler/build output to relay back to the submitter. On success,
/// `message` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResult {
    pub code_id: CodeId,
    pub image: Option<Image>,
    pub message: String,
}

impl BuildResult {
    pub fn success(code_id: CodeId, image: Image, message: impl Into<String>) -> Self {
        Self {
            code_id,
            image: Some(image),
            message: message.into(),
        }
    }

    pub fn failure(code_id: CodeId, message: impl Into<String>) -> Self {
        Self {
            code_id,
            image: None,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.image.is_some()
    }
}

#[cfg(test)]
#[path = "build_result_tests.rs"]
mod tests;
