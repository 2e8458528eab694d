// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layout of the worker's on-disk data directory.

use sbw_core::{CodeId, MatchId};
use std::path::{Path, PathBuf};

const AGENT_CODE_DIR: &str = "agent_code";
const MATCH_REPLAYS_DIR: &str = "match_replays";
const MATCH_RESULTS_DIR: &str = "match_results";

/// Resolves file paths under the worker's data directory.
///
/// Every path returned here is deterministic given the id alone, which is
/// what lets the cache layers treat the filesystem as the source of truth
/// for "have I already built/judged this?" across restarts.
#[derive(Debug, Clone)]
pub struct PathManager {
    data_dir: PathBuf,
}

impl PathManager {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn agent_code_dir(&self) -> PathBuf {
        self.data_dir.join(AGENT_CODE_DIR)
    }

    pub fn match_replays_dir(&self) -> PathBuf {
        self.data_dir.join(MATCH_REPLAYS_DIR)
    }

    pub fn match_results_dir(&self) -> PathBuf {
        self.data_dir.join(MATCH_RESULTS_DIR)
    }

    /// Path of the tar build context cached for `code_id`.
    pub fn agent_code_tar_path(&self, code_id: &CodeId) -> PathBuf {
        self.agent_code_dir().join(format!("{code_id}.tar"))
    }

    /// Path of a replay file for `match_id`.
    pub fn match_replay_path(&self, match_id: &MatchId) -> PathBuf {
        self.match_replays_dir().join(format!("{match_id}.dat"))
    }

    /// Path of the persisted [`sbw_core::MatchResult`] for `match_id`.
    pub fn match_result_path(&self, match_id: &MatchId) -> PathBuf {
        self.match_results_dir().join(format!("{match_id}.json"))
    }

    /// Create all data subdirectories if they don't already exist.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [
            self.agent_code_dir(),
            self.match_replays_dir(),
            self.match_results_dir(),
        ] {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
