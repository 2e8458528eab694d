// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::HttpError;
use async_trait::async_trait;
use std::io::{Cursor, Read};

/// Fetches raw bytes from a coordinator-supplied URL.
#[async_trait]
pub trait Downloader: Clone + Send + Sync + 'static {
    /// Download the body at `url`. Returns `Ok(None)` if the server reports
    /// the resource does not exist (404); any other non-2xx status is an
    /// error.
    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, HttpError>;
}

#[derive(Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, HttpError> {
        let response = self.client.get(url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(HttpError::Status { status, body });
        }

        Ok(Some(response.bytes().await?.to_vec()))
    }
}

/// Transcode a zip archive (as downloaded from the coordinator) into a tar
/// archive suitable for use as a Docker build context.
///
/// Directory entries are skipped; the tar entry size is always set
/// explicitly since zip entries don't expose it the way a filesystem read
/// would.
pub fn zip_to_tar(zip_bytes: &[u8]) -> Result<Vec<u8>, HttpError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(zip_bytes))
        .map_err(|e| HttpError::Archive(e.to_string()))?;

    let mut tar_bytes = Vec::new();
    {
        let mut builder = tar::Builder::new(&mut tar_bytes);

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| HttpError::Archive(e.to_string()))?;

            if entry.is_dir() {
                continue;
            }

            let name = entry
                .enclosed_name()
                .ok_or_else(|| HttpError::Archive(format!("unsafe path in zip entry {i}")))?;

            let mut contents = Vec::new();
            entry
                .read_to_end(&mut contents)
                .map_err(|e| HttpError::Archive(e.to_string()))?;

            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();

            builder
                .append_data(&mut header, name, contents.as_slice())
                .map_err(|e| HttpError::Archive(e.to_string()))?;
        }

        builder.finish().map_err(|e| HttpError::Archive(e.to_string()))?;
    }

    Ok(tar_bytes)
}

#[cfg(test)]
#[path = "fetch_tests.rs"]
mod tests;
