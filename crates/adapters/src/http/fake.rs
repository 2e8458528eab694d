// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake HTTP adapters for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Downloader, HttpError, Reporter};
use async_trait::async_trait;
use parking_lot::Mutex;
use sbw_core::{BuildResult, MatchResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Recorded report call.
#[derive(Debug, Clone)]
pub enum ReportCall {
    Build(BuildResult),
    Match { result: MatchResult, had_replay: bool },
}

struct FakeDownloaderState {
    bodies: HashMap<String, Vec<u8>>,
    failures: HashMap<String, HttpError>,
}

#[derive(Clone)]
pub struct FakeDownloader {
    inner: Arc<Mutex<FakeDownloaderState>>,
}

impl Default for FakeDownloader {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeDownloaderState {
                bodies: HashMap::new(),
                failures: HashMap::new(),
            })),
        }
    }
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_body(&self, url: &str, bytes: Vec<u8>) {
        self.inner.lock().bodies.insert(url.to_string(), bytes);
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, HttpError> {
        let inner = self.inner.lock();
        if let Some(err) = inner.failures.get(url) {
            return Err(HttpError::Status {
                status: 500,
                body: err.to_string(),
            });
        }
        Ok(inner.bodies.get(url).cloned())
    }
}

struct FakeReporterState {
    calls: Vec<ReportCall>,
}

#[derive(Clone)]
pub struct FakeReporter {
    inner: Arc<Mutex<FakeReporterState>>,
}

impl Default for FakeReporter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeReporterState { calls: Vec::new() })),
        }
    }
}

impl FakeReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ReportCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl Reporter for FakeReporter {
    async fn report_build_result(
        &self,
        _base_url: &str,
        result: &BuildResult,
    ) -> Result<(), HttpError> {
        self.inner.lock().calls.push(ReportCall::Build(result.clone()));
        Ok(())
    }

    async fn report_match_result(
        &self,
        _base_url: &str,
        result: &MatchResult,
        replay: Option<Vec<u8>>,
    ) -> Result<(), HttpError> {
        self.inner.lock().calls.push(ReportCall::Match {
            result: result.clone(),
            had_replay: replay.is_some(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
