// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real container runtime backed by the local Docker engine.

use super::{ContainerError, ContainerRuntime, RunSpec};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, DownloadFromContainerOptions, InspectContainerOptions,
    ListContainersOptions, LogOutput, LogsOptions, RemoveContainerOptions, StopContainerOptions,
    WaitContainerOptions,
};
use bollard::image::{
    BuildImageOptions, ListImagesOptions, RemoveImageOptions,
};
use bollard::models::{HostConfig, NetworkingConfig};
use bollard::network::{CreateNetworkOptions, ListNetworksOptions};
use bollard::Docker;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::io::Read;
use std::time::Duration;

#[derive(Clone)]
pub struct BollardRuntime {
    docker: Docker,
}

impl BollardRuntime {
    /// Connect to the local Docker daemon using the ambient environment
    /// (`DOCKER_HOST`, TLS certs, etc.), falling back to the platform
    /// default socket.
    pub fn connect() -> Result<Self, ContainerError> {
        let docker =
            Docker::connect_with_local_defaults().map_err(|e| ContainerError::Runtime(e.to_string()))?;
        Ok(Self { docker })
    }
}

fn to_runtime_err(e: bollard::errors::Error) -> ContainerError {
    ContainerError::Runtime(e.to_string())
}

#[async_trait]
impl ContainerRuntime for BollardRuntime {
    async fn build_image(&self, tar_context: Vec<u8>, tag: &str) -> Result<(), ContainerError> {
        let options = BuildImageOptions {
            t: tag.to_string(),
            rm: true,
            forcerm: true,
            ..Default::default()
        };

        let mut stream = self
            .docker
            .build_image(options, None, Some(tar_context.into()));

        let mut last_error: Option<String> = None;
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(info) => {
                    if let Some(err) = info.error {
                        last_error = Some(err);
                    }
                }
                Err(e) => return Err(ContainerError::BuildFailed(e.to_string())),
            }
        }

        match last_error {
            Some(msg) => Err(ContainerError::BuildFailed(msg)),
            None => Ok(()),
        }
    }

    async fn list_images(&self, repository_prefix: &str) -> Result<Vec<String>, ContainerError> {
        let summaries = self
            .docker
            .list_images(Some(ListImagesOptions::<String> {
                all: false,
                ..Default::default()
            }))
            .await
            .map_err(to_runtime_err)?;

        let mut tags = Vec::new();
        for summary in summaries {
            for tag in summary.repo_tags {
                if tag.starts_with(repository_prefix) {
                    tags.push(tag);
                }
            }
        }
        Ok(tags)
    }

    async fn remove_image(&self, tag: &str) -> Result<(), ContainerError> {
        match self
            .docker
            .remove_image(tag, Some(RemoveImageOptions { force: true, ..Default::default() }), None)
            .await
        {
            Ok(_) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => {
                Ok(())
            }
            Err(e) => Err(to_runtime_err(e)),
        }
    }

    async fn create_network(&self, name: &str) -> Result<(), ContainerError> {
        self.docker
            .create_network(CreateNetworkOptions {
                name: name.to_string(),
                driver: "bridge".to_string(),
                labels: super::worker_labels(),
                ..Default::default()
            })
            .await
            .map_err(to_runtime_err)?;
        Ok(())
    }

    async fn remove_network(&self, name: &str) -> Result<(), ContainerError> {
        match self
            .docker
            .remove_network(name)
            .await
        {
            Ok(_) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => {
                Ok(())
            }
            Err(e) => Err(to_runtime_err(e)),
        }
    }

    async fn run(&self, spec: RunSpec) -> Result<String, ContainerError> {
        let host_config = HostConfig {
            nano_cpus: spec.cpu_limit.map(|c| (c * 1_000_000_000.0) as i64),
            memory: spec.memory_limit_bytes,
            // No network is attached at creation time; per-slot networks are
            // joined explicitly afterward via `connect_network`. Docker's own
            // default (the host's default bridge) would give every container
            // unintended connectivity, so network is disabled outright here.
            network_mode: Some(spec.network.clone().unwrap_or_else(|| "none".to_string())),
            ..Default::default()
        };

        let networking_config = spec.network.as_ref().map(|net| NetworkingConfig {
            endpoints_config: HashMap::from([(net.clone(), Default::default())]),
        });

        let config = Config {
            image: Some(spec.image.clone()),
            env: Some(
                spec.env
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect(),
            ),
            host_config: Some(host_config),
            networking_config,
            labels: Some(super::worker_labels()),
            ..Default::default()
        };

        let response = self
            .docker
            .create_container(
                Some(CreateContainerOptions {
                    name: spec.name.clone(),
                    platform: None,
                }),
                config,
            )
            .await
            .map_err(|e| ContainerError::StartFailed(e.to_string()))?;

        self.docker
            .start_container::<String>(&response.id, None)
            .await
            .map_err(|e| ContainerError::StartFailed(e.to_string()))?;

        Ok(response.id)
    }

    async fn connect_network(&self, id: &str, network: &str) -> Result<(), ContainerError> {
        self.docker
            .connect_network(
                network,
                bollard::network::ConnectNetworkOptions {
                    container: id.to_string(),
                    ..Default::default()
                },
            )
            .await
            .map_err(to_runtime_err)
    }

    async fn wait(&self, id: &str, timeout: Duration) -> Result<i64, ContainerError> {
        let mut stream = self
            .docker
            .wait_container(id, None::<WaitContainerOptions<String>>);

        match tokio::time::timeout(timeout, stream.next()).await {
            Ok(Some(Ok(result))) => Ok(result.status_code),
            Ok(Some(Err(e))) => Err(to_runtime_err(e)),
            Ok(None) => Err(ContainerError::Runtime(format!(
                "wait stream for {id} ended without a result"
            ))),
            Err(_) => Err(ContainerError::WaitTimeout(id.to_string())),
        }
    }

    async fn is_running(&self, id: &str) -> Result<bool, ContainerError> {
        let info = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(to_runtime_err)?;

        Ok(info.state.and_then(|s| s.running).unwrap_or(false))
    }

    async fn stop(&self, id: &str) -> Result<(), ContainerError> {
        match self
            .docker
            .stop_container(id, Some(StopContainerOptions { t: 5 }))
            .await
        {
            Ok(_) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => {
                Ok(())
            }
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 304, .. }) => {
                Ok(())
            }
            Err(e) => Err(to_runtime_err(e)),
        }
    }

    async fn remove(&self, id: &str) -> Result<(), ContainerError> {
        match self
            .docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => {
                Ok(())
            }
            Err(e) => Err(to_runtime_err(e)),
        }
    }

    async fn list_containers(&self, name_prefix: &str) -> Result<Vec<String>, ContainerError> {
        let mut filters = HashMap::new();
        filters.insert("name".to_string(), vec![name_prefix.to_string()]);

        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions {
                all: true,
                filters,
                ..Default::default()
            }))
            .await
            .map_err(to_runtime_err)?;

        Ok(containers
            .into_iter()
            .flat_map(|c| c.names.unwrap_or_default())
            .map(|n| n.trim_start_matches('/').to_string())
            .filter(|n| n.starts_with(name_prefix))
            .collect())
    }

    async fn list_networks(&self, name_prefix: &str) -> Result<Vec<String>, ContainerError> {
        let mut filters = HashMap::new();
        filters.insert("name".to_string(), vec![name_prefix.to_string()]);

        let networks = self
            .docker
            .list_networks(Some(ListNetworksOptions { filters }))
            .await
            .map_err(to_runtime_err)?;

        Ok(networks
            .into_iter()
            .filter_map(|n| n.name)
            .filter(|n| n.starts_with(name_prefix))
            .collect())
    }

    async fn logs_stderr(&self, id: &str) -> Result<String, ContainerError> {
        let mut stream = self.docker.logs(
            id,
            Some(LogsOptions::<String> {
                stderr: true,
                stdout: false,
                ..Default::default()
            }),
        );

        let mut out = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk.map_err(to_runtime_err)? {
                LogOutput::StdErr { message } | LogOutput::Console { message } => {
                    out.push_str(&String::from_utf8_lossy(&message));
                }
                _ => {}
            }
        }
        Ok(out)
    }

    async fn read_file(&self, id: &str, path: &str) -> Result<Option<Vec<u8>>, ContainerError> {
        let mut stream = self.docker.download_from_container(
            id,
            Some(DownloadFromContainerOptions { path: path.to_string() }),
        );

        let mut archive_bytes = Vec::new();
        loop {
            match stream.next().await {
                Some(Ok(chunk)) => archive_bytes.extend_from_slice(&chunk),
                Some(Err(bollard::errors::Error::DockerResponseServerError {
                    status_code: 404,
                    ..
                })) => return Ok(None),
                Some(Err(e)) => return Err(to_runtime_err(e)),
                None => break,
            }
        }

        let mut archive = tar::Archive::new(archive_bytes.as_slice());
        for entry in archive.entries().map_err(|e| ContainerError::Runtime(e.to_string()))? {
            let mut entry = entry.map_err(|e| ContainerError::Runtime(e.to_string()))?;
            if entry.header().entry_type().is_file() {
                let mut buf = Vec::new();
                entry
                    .read_to_end(&mut buf)
                    .map_err(|e| ContainerError::Runtime(e.to_string()))?;
                return Ok(Some(buf));
            }
        }
        Ok(None)
    }
}
