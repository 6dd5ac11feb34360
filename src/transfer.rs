//! HTTP transfer client.
//!
//! Two operations back the whole protocol: fetching an artifact to a local
//! file and fetching a manifest document. Both go through one
//! [`reqwest::Client`] constructed with a TLS 1.2 floor, guarding against
//! environments whose transport stack still defaults to a deprecated
//! protocol version.
//!
//! Artifact downloads try a resumable transfer first (streaming to a `.part`
//! sibling, resuming with an HTTP `Range` request if a partial file survives
//! from an interrupted run) and fall back to a plain full-body GET on any
//! failure. Manifest fetches append a cache-defeating timestamp query
//! parameter on every request - a manifest served from a stale cache would
//! silently freeze the installation.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::core::{SlipwayError, TransferFailure};
use crate::manifest::Manifest;

/// HTTP client for manifest and artifact fetches.
pub struct TransferClient {
    client: reqwest::Client,
}

impl TransferClient {
    /// Build the client. Enforces the secure-transport floor (TLS 1.2) before
    /// any request is made.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Fetch `url` into `dest`, creating parent directories as needed.
    ///
    /// Attempts the resumable strategy first; any failure there is downgraded
    /// to a warning and a plain GET fetches the full body instead.
    pub async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        match self.fetch_resumable(url, dest).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!("resumable transfer of {url} failed ({err:#}); retrying with a plain GET");
                // The partial file may be the reason the resume failed (the
                // remote artifact can change between runs, invalidating the
                // byte range). Discard it so the retry starts clean.
                let _ = fs::remove_file(part_path(dest)).await;
                self.fetch_plain(url, dest).await
            }
        }
    }

    /// Fetch and parse a manifest document.
    ///
    /// Failure surfaces as [`SlipwayError::Transfer`], distinguishing an
    /// unreachable endpoint from a malformed response body.
    pub async fn fetch_manifest(&self, url: &str) -> Result<Manifest> {
        let busted = cache_busted(url);
        debug!("fetching manifest {busted}");

        let text = self
            .client
            .get(&busted)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| unreachable_error(url, &err))?
            .text()
            .await
            .map_err(|err| unreachable_error(url, &err))?;

        let manifest: Manifest = serde_json::from_str(&text).map_err(|err| SlipwayError::Transfer {
            url: url.to_string(),
            kind: TransferFailure::Malformed,
            reason: err.to_string(),
        })?;
        Ok(manifest)
    }

    /// Streamed download to a `.part` sibling, resumed via `Range` when a
    /// partial file exists, then renamed onto `dest`.
    async fn fetch_resumable(&self, url: &str, dest: &Path) -> Result<()> {
        let part = part_path(dest);
        let resume_from = match fs::metadata(&part).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };

        let mut request = self.client.get(url);
        if resume_from > 0 {
            debug!("resuming download of {url} from byte {resume_from}");
            request = request.header(reqwest::header::RANGE, format!("bytes={resume_from}-"));
        }

        let mut response = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| unreachable_error(url, &err))?;

        // A server that ignores the Range request answers 200 with the full
        // body; restart the partial file in that case.
        let append = resume_from > 0 && response.status() == StatusCode::PARTIAL_CONTENT;
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&part)
            .await
            .with_context(|| format!("failed to open {}", part.display()))?;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| unreachable_error(url, &err))?
        {
            file.write_all(&chunk)
                .await
                .with_context(|| format!("failed to write {}", part.display()))?;
        }
        file.flush().await?;
        drop(file);

        fs::rename(&part, dest)
            .await
            .with_context(|| format!("failed to move {} into place", part.display()))?;
        debug!("downloaded {url} -> {}", dest.display());
        Ok(())
    }

    /// Plain GET writing the full response body to disk.
    async fn fetch_plain(&self, url: &str, dest: &Path) -> Result<()> {
        let body = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| unreachable_error(url, &err))?
            .bytes()
            .await
            .map_err(|err| unreachable_error(url, &err))?;

        fs::write(dest, &body)
            .await
            .with_context(|| format!("failed to write {}", dest.display()))?;
        debug!("downloaded {url} -> {} (plain)", dest.display());
        Ok(())
    }
}

fn unreachable_error(url: &str, err: &reqwest::Error) -> anyhow::Error {
    SlipwayError::Transfer {
        url: url.to_string(),
        kind: TransferFailure::Unreachable,
        reason: err.to_string(),
    }
    .into()
}

/// The `.part` sibling a streamed download writes to before the final rename.
fn part_path(dest: &Path) -> std::path::PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Append a cache-defeating timestamp query parameter.
fn cache_busted(url: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}_ts={}", chrono::Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/tmp/dl/build.zip")),
            PathBuf::from("/tmp/dl/build.zip.part")
        );
    }

    #[test]
    fn cache_buster_uses_correct_separator() {
        let plain = cache_busted("https://x/manifest.json");
        assert!(plain.starts_with("https://x/manifest.json?_ts="));

        let with_query = cache_busted("https://x/manifest.json?channel=stable");
        assert!(with_query.starts_with("https://x/manifest.json?channel=stable&_ts="));
    }
}
