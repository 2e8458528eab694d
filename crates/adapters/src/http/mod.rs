// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP adapters: fetching agent code archives and reporting results back.
//!
//! A single [`reqwest::Client`] is constructed once by the caller (see
//! `crates/cli`'s wiring) and cloned into both adapters below — it is never
//! reached for through a global or `OnceCell`.

mod fetch;
mod report;

pub use fetch::{zip_to_tar, Downloader, HttpDownloader};
pub use report::{HttpReporter, Reporter};

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeDownloader, FakeReporter, ReportCall};

use thiserror::Error;

/// Errors from HTTP fetch/report operations.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("archive error: {0}")]
    Archive(String),
}
