// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds agent code into Docker images, tagged under a single repository.

use crate::error::EngineError;
use sbw_adapters::{ContainerError, ContainerRuntime};
use sbw_core::{BuildResult, CodeId, Image};
use std::time::Duration;

const IMAGE_REPOSITORY: &str = "saiblo-worker-image";

/// Default bound on a single image build, per the open question in the
/// judge engine's resource-defaults note: sane implementation-chosen
/// values, overridable via configuration.
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(60);

pub struct BuildEngine<C> {
    runtime: C,
    build_timeout: Duration,
}

impl<C: ContainerRuntime> BuildEngine<C> {
    pub fn new(runtime: C, build_timeout: Duration) -> Self {
        Self { runtime, build_timeout }
    }

    fn image_tag(code_id: &CodeId) -> String {
        format!("{IMAGE_REPOSITORY}:{code_id}")
    }

    /// Build `code_id`'s image from `tar_context`. If an image already
    /// exists for this code id, the cached image is reused without
    /// rebuilding.
    pub async fn build(
        &self,
        code_id: &CodeId,
        tar_context: Vec<u8>,
    ) -> Result<BuildResult, EngineError> {
        let tag = Self::image_tag(code_id);

        if let Some(image) = self.cached_image(code_id).await? {
            return Ok(BuildResult::success(code_id.clone(), image, ""));
        }

        match tokio::time::timeout(self.build_timeout, self.runtime.build_image(tar_context, &tag)).await {
            Ok(Ok(())) => Ok(BuildResult::success(code_id.clone(), Image::new(tag), "")),
            Ok(Err(ContainerError::BuildFailed(message))) => {
                Ok(BuildResult::failure(code_id.clone(), message))
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Ok(BuildResult::failure(
                code_id.clone(),
                format!("build timed out after {:?}", self.build_timeout),
            )),
        }
    }

    /// The already-built image for `code_id`, if one exists, without
    /// attempting a build. Lets a caller resolve a cache hit locally instead
    /// of running (and reporting) a build for it.
    pub async fn cached_image(&self, code_id: &CodeId) -> Result<Option<Image>, EngineError> {
        let tag = Self::image_tag(code_id);
        let existing = self.runtime.list_images(IMAGE_REPOSITORY).await?;
        Ok(existing.iter().any(|t| t == &tag).then(|| Image::new(tag)))
    }

    /// List the code ids with an image currently built.
    pub async fn list(&self) -> Result<Vec<CodeId>, EngineError> {
        let prefix = format!("{IMAGE_REPOSITORY}:");
        let tags = self.runtime.list_images(IMAGE_REPOSITORY).await?;
        Ok(tags
            .into_iter()
            .filter_map(|t| t.strip_prefix(&prefix).map(CodeId::new))
            .collect())
    }

    /// Remove every image built by this worker.
    pub async fn clean(&self) -> Result<(), EngineError> {
        for tag in self.runtime.list_images(IMAGE_REPOSITORY).await? {
            self.runtime.remove_image(&tag).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "build_engine_tests.rs"]
mod tests;
