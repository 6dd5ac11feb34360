//! Self-update: replacing the updater's own persisted code.
//!
//! Self-replacement is the hazard-prone half of the protocol. Two safeguards
//! keep it from bricking or looping:
//!
//! 1. **Loop prevention via encoding normalization.** Every downloaded
//!    candidate is re-encoded into one canonical byte form (UTF-8 without
//!    BOM) before comparison, and only canonical forms are ever installed.
//!    If the publisher's toolchain emits a BOM or UTF-16 while the installed
//!    copy does not, raw byte comparison would disagree forever even for
//!    semantically identical content - every run would "detect a change",
//!    replace the binary, and relaunch endlessly. Comparing canonical digests
//!    makes identical content a stable fixed point: it never triggers a
//!    replacement, regardless of what the manifest field comparison said.
//!
//! 2. **Single-rename replacement.** The normalized candidate is staged
//!    beside the target under a distinct name and moved onto the target with
//!    one filesystem rename, so there is no window where the self-location is
//!    missing or truncated.
//!
//! On a successful replacement the orchestrator terminates immediately with
//! the relaunch exit code; running further logic in the old process after the
//! file on disk changed would operate on inconsistent in-memory assumptions.

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::InstallLayout;
use crate::manifest::Manifest;
use crate::transfer::TransferClient;
use crate::verify::ContentVerifier;

/// Name of the downloaded updater artifact inside the scratch directory.
const DOWNLOAD_NAME: &str = "updater.download";

/// Decides whether the installed updater is stale and replaces it if so.
pub struct SelfUpdater<'a> {
    client: &'a TransferClient,
    layout: &'a InstallLayout,
}

impl<'a> SelfUpdater<'a> {
    pub fn new(client: &'a TransferClient, layout: &'a InstallLayout) -> Self {
        Self { client, layout }
    }

    /// Replace the installed updater if the remote manifest says so.
    ///
    /// Returns `Ok(true)` if the self-location was replaced - the caller must
    /// then exit with the relaunch sentinel without doing anything further.
    /// A missing remote `updater` section returns `Ok(false)` without any
    /// network traffic.
    pub async fn update_if_needed(&self, local: &Manifest, remote: &Manifest) -> Result<bool> {
        let Some(remote_rec) = remote.updater.as_ref() else {
            debug!("remote manifest has no updater section; skipping self-update");
            return Ok(false);
        };

        let local_rec = local.updater_or_blank();
        let mut needs_update = remote_rec.differs_from(&local_rec);

        // Even with matching manifest fields, a tampered or corrupted on-disk
        // copy must be caught: compare the installed file's actual digest
        // against the published one when available.
        if !needs_update {
            if let Some(expected) = remote_rec.expected_sha256() {
                match ContentVerifier::compute_sha256(self.layout.self_path()).await {
                    Ok(actual) if actual.eq_ignore_ascii_case(expected) => {}
                    Ok(_) => {
                        warn!(
                            "installed updater at {} does not match its published digest; forcing self-update",
                            self.layout.self_path().display()
                        );
                        needs_update = true;
                    }
                    Err(err) => {
                        warn!("could not hash installed updater ({err:#}); forcing self-update");
                        needs_update = true;
                    }
                }
            }
        }

        if !needs_update {
            debug!("updater is current (version '{}')", local_rec.version.trim());
            return Ok(false);
        }

        info!(
            "self-update required: '{}' -> '{}'",
            local_rec.version.trim(),
            remote_rec.version.trim()
        );

        let scratch = self.layout.scratch_dir();
        fs::create_dir_all(&scratch)
            .await
            .with_context(|| format!("failed to create {}", scratch.display()))?;
        let downloaded = scratch.join(DOWNLOAD_NAME);

        self.client.fetch_to_file(remote_rec.url.trim(), &downloaded).await?;

        // Raw bytes first: the published digest covers exactly what was
        // served, not our canonical form.
        ContentVerifier::verify(&downloaded, &remote_rec.sha256).await?;

        let raw = fs::read(&downloaded)
            .await
            .with_context(|| format!("failed to read {}", downloaded.display()))?;
        let normalized = normalize_text_encoding(&raw);
        let candidate_digest = ContentVerifier::compute_sha256_bytes(&normalized);

        let installed_digest = match ContentVerifier::compute_sha256(self.layout.self_path()).await
        {
            Ok(digest) => Some(digest),
            Err(err) => {
                warn!("installed updater unreadable ({err:#}); installing fresh copy");
                None
            }
        };

        if installed_digest.as_deref() == Some(candidate_digest.as_str()) {
            // The loop-breaker: identical normalized content never triggers a
            // replacement, no matter what the manifest comparison said.
            info!("downloaded updater is identical after normalization; not replacing");
            return Ok(false);
        }

        self.install(&normalized).await?;
        info!("updater replaced; relaunch required");
        Ok(true)
    }

    /// Stage the normalized bytes beside the target and rename them onto it.
    async fn install(&self, normalized: &[u8]) -> Result<()> {
        let target = self.layout.self_path();
        let staged = staged_path(target);

        fs::write(&staged, normalized)
            .await
            .with_context(|| format!("failed to stage updater at {}", staged.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = match fs::metadata(target).await {
                Ok(meta) => meta.permissions().mode(),
                Err(_) => 0o755,
            };
            fs::set_permissions(&staged, std::fs::Permissions::from_mode(mode))
                .await
                .with_context(|| format!("failed to set permissions on {}", staged.display()))?;
        }

        fs::rename(&staged, target)
            .await
            .with_context(|| format!("failed to move staged updater onto {}", target.display()))?;
        Ok(())
    }
}

/// The staging sibling a new updater is written to before the final rename.
fn staged_path(target: &std::path::Path) -> std::path::PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".new");
    target.with_file_name(name)
}

/// Re-encode downloaded text into the canonical form: UTF-8 without BOM.
///
/// UTF-8 BOMs are stripped; UTF-16 (either endianness, detected by BOM) is
/// transcoded, mapping invalid units to U+FFFD so the outcome is
/// deterministic. Bytes without a recognizable BOM pass through unchanged.
#[must_use]
pub fn normalize_text_encoding(bytes: &[u8]) -> Vec<u8> {
    const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
    const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
    const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return rest.to_vec();
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return decode_utf16_bytes(rest, u16::from_le_bytes).into_bytes();
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return decode_utf16_bytes(rest, u16::from_be_bytes).into_bytes();
    }
    bytes.to_vec()
}

fn decode_utf16_bytes(bytes: &[u8], unit: impl Fn([u8; 2]) -> u16) -> String {
    let mut units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    if bytes.len() % 2 != 0 {
        // A truncated trailing unit decodes deterministically to U+FFFD.
        units.push(0xFFFD);
    }
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
