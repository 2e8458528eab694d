// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Caches agent source archives fetched from the coordinator, transcoded
//! into tar build contexts keyed by [`CodeId`].

use crate::error::EngineError;
use crate::paths::PathManager;
use sbw_adapters::{zip_to_tar, Downloader};
use sbw_core::CodeId;
use std::path::PathBuf;

pub struct ArtifactCache<D> {
    downloader: D,
    paths: PathManager,
}

impl<D: Downloader> ArtifactCache<D> {
    pub fn new(downloader: D, paths: PathManager) -> Self {
        Self { downloader, paths }
    }

    /// Fetch and cache the tar build context for `code_id` from `url`.
    ///
    /// Idempotent: if the tarball is already cached, the download is
    /// skipped entirely. The tarball is written to a sibling temp file and
    /// renamed into place so a concurrent reader never observes a partial
    /// file at the final path.
    pub async fn fetch(&self, code_id: &CodeId, url: &str) -> Result<PathBuf, EngineError> {
        let final_path = self.paths.agent_code_tar_path(code_id);

        if tokio::fs::try_exists(&final_path).await? {
            return Ok(final_path);
        }

        let zip_bytes = self
            .downloader
            .fetch(url)
            .await?
            .ok_or_else(|| EngineError::CodeNotFound(code_id.to_string()))?;
        let tar_bytes = zip_to_tar(&zip_bytes)?;

        tokio::fs::create_dir_all(self.paths.agent_code_dir()).await?;

        let tmp_path = self
            .paths
            .agent_code_dir()
            .join(format!("{code_id}.tar.{}.tmp", std::process::id()));
        tokio::fs::write(&tmp_path, &tar_bytes).await?;
        tokio::fs::rename(&tmp_path, &final_path).await?;

        Ok(final_path)
    }

    /// List the code ids with a cached tarball.
    pub async fn list(&self) -> Result<Vec<CodeId>, EngineError> {
        let dir = self.paths.agent_code_dir();
        if !tokio::fs::try_exists(&dir).await? {
            return Ok(Vec::new());
        }

        let mut entries = tokio::fs::read_dir(&dir).await?;
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".tar") {
                ids.push(CodeId::new(stem));
            }
        }
        Ok(ids)
    }

    /// Remove every cached tarball.
    pub async fn clean(&self) -> Result<(), EngineError> {
        let dir = self.paths.agent_code_dir();
        if tokio::fs::try_exists(&dir).await? {
            tokio::fs::remove_dir_all(&dir).await?;
        }
        tokio::fs::create_dir_all(&dir).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
