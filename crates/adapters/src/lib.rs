// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: the container runtime and the coordinator's
//! HTTP API.

pub mod container;
pub mod http;

pub use container::{BollardRuntime, ContainerError, ContainerRuntime, RunSpec};
pub use http::{zip_to_tar, Downloader, HttpDownloader, HttpError, HttpReporter, Reporter};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use container::{ContainerCall, FakeContainerRuntime};
#[cfg(any(test, feature = "test-support"))]
pub use http::{FakeDownloader, FakeReporter, ReportCall};
