// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker configuration, sourced entirely from the environment. There is no
//! config file and no XDG state directory to discover — every recognized
//! option is an env var with a sane default.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_NAME: &str = "saiblo-worker";
const DEFAULT_HTTP_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_WEBSOCKET_URL: &str = "ws://localhost:5000/ws/judger/";
const DEFAULT_AGENT_CPUS: f64 = 1.0;
const DEFAULT_AGENT_MEM_LIMIT_BYTES: i64 = 1024 * 1024 * 1024;
const DEFAULT_GAME_HOST_CPUS: f64 = 1.0;
const DEFAULT_GAME_HOST_MEM_LIMIT_BYTES: i64 = 1024 * 1024 * 1024;
const DEFAULT_JUDGE_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not valid: {1}")]
    InvalidValue(&'static str, String),
    #[error("environment variable {0} must be set")]
    Missing(&'static str),
}

/// Worker configuration. See the `SAIBLO_WORKER_*` env vars read in [`Config::load`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Name this worker reports to the coordinator in its `init` frame.
    pub name: String,
    /// Image the judge engine runs as the game host for every match.
    pub game_host_image: String,
    /// Base URL of the coordinator's REST API (downloads and reports).
    pub http_base_url: String,
    /// URL of the coordinator's control-channel websocket.
    pub websocket_url: String,
    pub agent_cpus: f64,
    pub agent_mem_limit_bytes: i64,
    pub game_host_cpus: f64,
    pub game_host_mem_limit_bytes: i64,
    pub judge_timeout: Duration,
    pub build_timeout: Duration,
    /// Root of the worker's on-disk data directory.
    pub data_dir: PathBuf,
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        Err(_) => Ok(default),
    }
}

fn env_duration_secs(key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => {
            let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue(key, raw))?;
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from the environment, substituting defaults for
    /// anything unset.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            name: env_string("SAIBLO_WORKER_NAME", DEFAULT_NAME),
            game_host_image: std::env::var("SAIBLO_WORKER_GAME_HOST_IMAGE")
                .map_err(|_| ConfigError::Missing("SAIBLO_WORKER_GAME_HOST_IMAGE"))?,
            http_base_url: env_string("SAIBLO_WORKER_HTTP_BASE_URL", DEFAULT_HTTP_BASE_URL),
            websocket_url: env_string("SAIBLO_WORKER_WEBSOCKET_URL", DEFAULT_WEBSOCKET_URL),
            agent_cpus: env_parsed("SAIBLO_WORKER_AGENT_CPUS", DEFAULT_AGENT_CPUS)?,
            agent_mem_limit_bytes: env_parsed(
                "SAIBLO_WORKER_AGENT_MEM_LIMIT_BYTES",
                DEFAULT_AGENT_MEM_LIMIT_BYTES,
            )?,
            game_host_cpus: env_parsed("SAIBLO_WORKER_GAME_HOST_CPUS", DEFAULT_GAME_HOST_CPUS)?,
            game_host_mem_limit_bytes: env_parsed(
                "SAIBLO_WORKER_GAME_HOST_MEM_LIMIT_BYTES",
                DEFAULT_GAME_HOST_MEM_LIMIT_BYTES,
            )?,
            judge_timeout: env_duration_secs(
                "SAIBLO_WORKER_JUDGE_TIMEOUT_SECS",
                Duration::from_secs(DEFAULT_JUDGE_TIMEOUT_SECS),
            )?,
            build_timeout: env_duration_secs(
                "SAIBLO_WORKER_BUILD_TIMEOUT_SECS",
                sbw_engine::DEFAULT_BUILD_TIMEOUT,
            )?,
            data_dir: env_string("SAIBLO_WORKER_DATA_DIR", "./data").into(),
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
