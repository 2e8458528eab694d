// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake container runtime for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ContainerError, ContainerRuntime, RunSpec};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Recorded container runtime call
#[derive(Debug, Clone)]
pub enum ContainerCall {
    BuildImage { tag: String },
    ListImages { repository_prefix: String },
    RemoveImage { tag: String },
    CreateNetwork { name: String },
    RemoveNetwork { name: String },
    Run { spec_name: String, image: String },
    ConnectNetwork { id: String, network: String },
    Wait { id: String },
    IsRunning { id: String },
    Stop { id: String },
    Remove { id: String },
    LogsStderr { id: String },
    ReadFile { id: String, path: String },
    ListContainers { name_prefix: String },
    ListNetworks { name_prefix: String },
}

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub name: String,
    pub image: String,
    pub networks: Vec<String>,
    pub exit_code: Option<i64>,
    pub stderr: String,
    pub files: HashMap<String, Vec<u8>>,
    pub removed: bool,
}

struct FakeState {
    containers: HashMap<String, FakeContainer>,
    images: Vec<String>,
    networks: Vec<String>,
    build_failures: HashMap<String, String>,
    hanging_builds: std::collections::HashSet<String>,
    never_exit_prefixes: Vec<String>,
    preset_exit_codes: Vec<(String, i64)>,
    calls: Vec<ContainerCall>,
    next_id: u64,
}

/// Fake container runtime for testing. Every container starts with exit
/// code `0` and no output; configure via the `set_*` helpers before the
/// code under test calls [`ContainerRuntime::wait`]/[`ContainerRuntime::read_file`].
#[derive(Clone)]
pub struct FakeContainerRuntime {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeContainerRuntime {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                containers: HashMap::new(),
                images: Vec::new(),
                networks: Vec::new(),
                build_failures: HashMap::new(),
                hanging_builds: std::collections::HashSet::new(),
                never_exit_prefixes: Vec::new(),
                preset_exit_codes: Vec::new(),
                calls: Vec::new(),
                next_id: 0,
            })),
        }
    }
}

impl FakeContainerRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ContainerCall> {
        self.inner.lock().calls.clone()
    }

    pub fn fail_build(&self, tag: &str, message: &str) {
        self.inner
            .lock()
            .build_failures
            .insert(tag.to_string(), message.to_string());
    }

    /// Make `build_image` for this tag hang forever, simulating a build
    /// that never completes so the engine's bounded timeout has to kick in.
    pub fn hang_build(&self, tag: &str) {
        self.inner.lock().hanging_builds.insert(tag.to_string());
    }

    /// Set the exit code a subsequent `wait()` on this container (by id or
    /// name) will observe.
    pub fn set_exit_code(&self, id_or_name: &str, code: i64) {
        let mut inner = self.inner.lock();
        if let Some(resolved) = resolve(&inner, id_or_name) {
            if let Some(c) = inner.containers.get_mut(&resolved) {
                c.exit_code = Some(code);
            }
        }
    }

    /// Make `wait()` on this container (by id or name) time out, simulating
    /// a game host that never exits.
    pub fn never_exits(&self, id_or_name: &str) {
        let mut inner = self.inner.lock();
        if let Some(resolved) = resolve(&inner, id_or_name) {
            if let Some(c) = inner.containers.get_mut(&resolved) {
                c.exit_code = None;
            }
        }
    }

    /// Any container whose name carries `name_prefix`, including ones
    /// created after this call, never reports an exit code — `wait()`
    /// fails with [`ContainerError::WaitTimeout`]. Simulates a host that
    /// hangs past the judge timeout without needing to know the
    /// engine-assigned container id in advance.
    pub fn never_exit_containers_matching(&self, name_prefix: &str) {
        self.inner.lock().never_exit_prefixes.push(name_prefix.to_string());
    }

    /// Any container whose name carries `name_prefix`, including ones
    /// created after this call, starts already exited with `code` — as if it
    /// had crashed or finished before the judger ever probed it. Lets a test
    /// exercise the "container is not running" branch of exit-code
    /// settlement without racing a real process.
    pub fn preset_exit_code_for_matching(&self, name_prefix: &str, code: i64) {
        self.inner.lock().preset_exit_codes.push((name_prefix.to_string(), code));
    }

    pub fn set_stderr(&self, id_or_name: &str, stderr: &str) {
        let mut inner = self.inner.lock();
        if let Some(resolved) = resolve(&inner, id_or_name) {
            if let Some(c) = inner.containers.get_mut(&resolved) {
                c.stderr = stderr.to_string();
            }
        }
    }

    pub fn set_file(&self, id_or_name: &str, path: &str, contents: Vec<u8>) {
        let mut inner = self.inner.lock();
        if let Some(resolved) = resolve(&inner, id_or_name) {
            if let Some(c) = inner.containers.get_mut(&resolved) {
                c.files.insert(path.to_string(), contents);
            }
        }
    }

    pub fn has_image(&self, tag: &str) -> bool {
        self.inner.lock().images.iter().any(|t| t == tag)
    }

    pub fn has_network(&self, name: &str) -> bool {
        self.inner.lock().networks.iter().any(|n| n == name)
    }
}

/// Resolve an id-or-name reference to the container's id, mirroring how the
/// real Docker API accepts either for operations like stop/remove.
fn resolve(state: &FakeState, id_or_name: &str) -> Option<String> {
    if state.containers.contains_key(id_or_name) {
        return Some(id_or_name.to_string());
    }
    state
        .containers
        .iter()
        .find(|(_, c)| c.name == id_or_name)
        .map(|(id, _)| id.clone())
}

#[async_trait]
impl ContainerRuntime for FakeContainerRuntime {
    async fn build_image(&self, _tar_context: Vec<u8>, tag: &str) -> Result<(), ContainerError> {
        let hangs = {
            let mut inner = self.inner.lock();
            inner.calls.push(ContainerCall::BuildImage { tag: tag.to_string() });
            inner.hanging_builds.contains(tag)
        };

        if hangs {
            std::future::pending::<()>().await;
        }

        let mut inner = self.inner.lock();
        if let Some(message) = inner.build_failures.get(tag).cloned() {
            return Err(ContainerError::BuildFailed(message));
        }

        inner.images.push(tag.to_string());
        Ok(())
    }

    async fn list_images(&self, repository_prefix: &str) -> Result<Vec<String>, ContainerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ContainerCall::ListImages {
            repository_prefix: repository_prefix.to_string(),
        });

        Ok(inner
            .images
            .iter()
            .filter(|t| t.starts_with(repository_prefix))
            .cloned()
            .collect())
    }

    async fn remove_image(&self, tag: &str) -> Result<(), ContainerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ContainerCall::RemoveImage { tag: tag.to_string() });
        inner.images.retain(|t| t != tag);
        Ok(())
    }

    async fn create_network(&self, name: &str) -> Result<(), ContainerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ContainerCall::CreateNetwork { name: name.to_string() });
        inner.networks.push(name.to_string());
        Ok(())
    }

    async fn remove_network(&self, name: &str) -> Result<(), ContainerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ContainerCall::RemoveNetwork { name: name.to_string() });
        inner.networks.retain(|n| n != name);
        Ok(())
    }

    async fn run(&self, spec: RunSpec) -> Result<String, ContainerError> {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = format!("fake-container-{}", inner.next_id);

        inner.calls.push(ContainerCall::Run {
            spec_name: spec.name.clone(),
            image: spec.image.clone(),
        });

        let never_exits = inner.never_exit_prefixes.iter().any(|p| spec.name.starts_with(p.as_str()));
        let preset = inner
            .preset_exit_codes
            .iter()
            .find(|(prefix, _)| spec.name.starts_with(prefix.as_str()))
            .map(|(_, code)| *code);

        inner.containers.insert(
            id.clone(),
            FakeContainer {
                name: spec.name,
                image: spec.image,
                networks: spec.network.into_iter().collect(),
                exit_code: if never_exits { None } else { Some(preset.unwrap_or(0)) },
                stderr: String::new(),
                files: HashMap::new(),
                removed: false,
            },
        );

        Ok(id)
    }

    async fn connect_network(&self, id: &str, network: &str) -> Result<(), ContainerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ContainerCall::ConnectNetwork {
            id: id.to_string(),
            network: network.to_string(),
        });

        match inner.containers.get_mut(id) {
            Some(c) => {
                c.networks.push(network.to_string());
                Ok(())
            }
            None => Err(ContainerError::NotFound(id.to_string())),
        }
    }

    async fn wait(&self, id: &str, _timeout: Duration) -> Result<i64, ContainerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ContainerCall::Wait { id: id.to_string() });

        match inner.containers.get(id) {
            Some(c) => c.exit_code.ok_or_else(|| ContainerError::WaitTimeout(id.to_string())),
            None => Err(ContainerError::NotFound(id.to_string())),
        }
    }

    async fn is_running(&self, id: &str) -> Result<bool, ContainerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ContainerCall::IsRunning { id: id.to_string() });

        match inner.containers.get(id) {
            Some(c) => Ok(c.exit_code.is_none()),
            None => Err(ContainerError::NotFound(id.to_string())),
        }
    }

    async fn stop(&self, id: &str) -> Result<(), ContainerError> {
        self.inner.lock().calls.push(ContainerCall::Stop { id: id.to_string() });
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), ContainerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ContainerCall::Remove { id: id.to_string() });
        if let Some(resolved) = resolve(&inner, id) {
            if let Some(c) = inner.containers.get_mut(&resolved) {
                c.removed = true;
            }
        }
        Ok(())
    }

    async fn logs_stderr(&self, id: &str) -> Result<String, ContainerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ContainerCall::LogsStderr { id: id.to_string() });

        match inner.containers.get(id) {
            Some(c) => Ok(c.stderr.clone()),
            None => Err(ContainerError::NotFound(id.to_string())),
        }
    }

    async fn read_file(&self, id: &str, path: &str) -> Result<Option<Vec<u8>>, ContainerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ContainerCall::ReadFile {
            id: id.to_string(),
            path: path.to_string(),
        });

        match inner.containers.get(id) {
            Some(c) => Ok(c.files.get(path).cloned()),
            None => Err(ContainerError::NotFound(id.to_string())),
        }
    }

    async fn list_containers(&self, name_prefix: &str) -> Result<Vec<String>, ContainerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ContainerCall::ListContainers {
            name_prefix: name_prefix.to_string(),
        });

        Ok(inner
            .containers
            .values()
            .filter(|c| !c.removed && c.name.starts_with(name_prefix))
            .map(|c| c.name.clone())
            .collect())
    }

    async fn list_networks(&self, name_prefix: &str) -> Result<Vec<String>, ContainerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ContainerCall::ListNetworks {
            name_prefix: name_prefix.to_string(),
        });

        Ok(inner
            .networks
            .iter()
            .filter(|n| n.starts_with(name_prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
