// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors from the coordinator control channel.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to connect to coordinator: {0}")]
    Connect(String),
    #[error("failed to send frame: {0}")]
    Send(String),
    #[error("transport error: {0}")]
    Transport(String),
}
