// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use sbw_adapters::{ContainerError, HttpError};
use thiserror::Error;

/// Errors that can occur while fetching, building or judging.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("container runtime error: {0}")]
    Container(#[from] ContainerError),
    #[error("http error: {0}")]
    Http(#[from] HttpError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("code not found: {0}")]
    CodeNotFound(String),
    #[error("image missing for code {0}; build it first")]
    ImageMissing(String),
}
