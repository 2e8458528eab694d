// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container runtime adapter: the boundary between the engine and Docker.

mod bollard_runtime;

pub use bollard_runtime::BollardRuntime;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ContainerCall, FakeContainerRuntime};

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors from container runtime operations.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("container not found: {0}")]
    NotFound(String),
    #[error("image build failed: {0}")]
    BuildFailed(String),
    #[error("container failed to start: {0}")]
    StartFailed(String),
    #[error("timed out waiting for container {0} to exit")]
    WaitTimeout(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Request to run a single container.
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub name: String,
    pub image: String,
    pub network: Option<String>,
    pub env: Vec<(String, String)>,
    pub cpu_limit: Option<f64>,
    pub memory_limit_bytes: Option<i64>,
    pub detach: bool,
}

impl RunSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            network: None,
            env: Vec::new(),
            cpu_limit: None,
            memory_limit_bytes: None,
            detach: true,
        }
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_limits(mut self, cpu: f64, memory_bytes: i64) -> Self {
        self.cpu_limit = Some(cpu);
        self.memory_limit_bytes = Some(memory_bytes);
        self
    }
}

/// Adapter for driving a container engine (Docker).
///
/// Mirrors the shape of a terminal session adapter: spawn, wait, capture
/// output, kill. Container-specific concerns (networks, images, file
/// extraction) are added alongside.
#[async_trait]
pub trait ContainerRuntime: Clone + Send + Sync + 'static {
    /// Build an image from a tar build context, tagging it `tag`.
    async fn build_image(
        &self,
        tar_context: Vec<u8>,
        tag: &str,
    ) -> Result<(), ContainerError>;

    /// List image tags in this runtime carrying the given repository prefix.
    async fn list_images(&self, repository_prefix: &str) -> Result<Vec<String>, ContainerError>;

    /// Remove an image by tag. Idempotent: removing a nonexistent tag is not
    /// an error.
    async fn remove_image(&self, tag: &str) -> Result<(), ContainerError>;

    /// Create an isolated bridge network.
    async fn create_network(&self, name: &str) -> Result<(), ContainerError>;

    /// Remove a network. Idempotent.
    async fn remove_network(&self, name: &str) -> Result<(), ContainerError>;

    /// Run a container per `spec`, returning the container's engine-assigned id.
    async fn run(&self, spec: RunSpec) -> Result<String, ContainerError>;

    /// Attach an already-running container to an additional network.
    ///
    /// Used to put the game host on every per-agent network while each
    /// agent only ever joins its own.
    async fn connect_network(&self, id: &str, network: &str) -> Result<(), ContainerError>;

    /// Block until the container exits or `timeout` elapses.
    async fn wait(&self, id: &str, timeout: Duration) -> Result<i64, ContainerError>;

    /// Check whether the container is still running, without blocking.
    ///
    /// Used to decide whether an exit code can be trusted from a genuine
    /// `wait` versus the container needing to be force-stopped first.
    async fn is_running(&self, id: &str) -> Result<bool, ContainerError>;

    /// Stop a running container. Idempotent: stopping an already-exited
    /// container is not an error.
    async fn stop(&self, id: &str) -> Result<(), ContainerError>;

    /// Remove a container (and its filesystem). Idempotent.
    async fn remove(&self, id: &str) -> Result<(), ContainerError>;

    /// Fetch the combined stderr stream captured from the container so far.
    async fn logs_stderr(&self, id: &str) -> Result<String, ContainerError>;

    /// List the names of every container (running or stopped) whose name
    /// carries the given prefix. Used by crash-recovery cleanup sweeps.
    async fn list_containers(&self, name_prefix: &str) -> Result<Vec<String>, ContainerError>;

    /// List the names of every network carrying the given prefix.
    async fn list_networks(&self, name_prefix: &str) -> Result<Vec<String>, ContainerError>;

    /// Read a single file out of a stopped or running container's
    /// filesystem, given its path inside the container.
    async fn read_file(&self, id: &str, path: &str) -> Result<Option<Vec<u8>>, ContainerError>;
}

/// Labels applied to every container/network/image this worker creates, so a
/// crash-recovery sweep can find and reap them without guessing by name.
pub fn worker_labels() -> HashMap<String, String> {
    let mut labels = HashMap::new();
    labels.insert("managed-by".to_string(), "saiblo-worker".to_string());
    labels
}
