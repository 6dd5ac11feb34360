//! Manifest resolution with two-phase URL migration.
//!
//! A manifest may declare (via `manifestUrl`) that it has moved to a new
//! canonical location. The resolver only switches once the new location is
//! proven reachable *and* parseable - a dangling or temporarily-broken
//! migration target must never prevent progress using the still-working old
//! URL.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::manifest::Manifest;
use crate::transfer::TransferClient;

/// Determine the effective manifest URL and document for this run.
///
/// Algorithm:
/// 1. Fetch the document at `initial_url` (`m1`).
/// 2. Blank declared URL: `initial_url` is canonical - stamp it into the
///    document and return.
/// 3. Declared URL equals `initial_url` (after trim): no migration.
/// 4. Otherwise fetch the declared candidate. Success: migration accepted,
///    return the candidate URL and its document (stamped if blank).
/// 5. Candidate fetch failed: log and fall back to `(initial_url, m1)`.
///
/// Only step 1 can fail; a broken migration target downgrades to a warning.
pub async fn resolve(client: &TransferClient, initial_url: &str) -> Result<(String, Manifest)> {
    let mut document = client.fetch_manifest(initial_url).await?;

    let declared = document.manifest_url.trim().to_string();
    if declared.is_empty() {
        debug!("manifest declares no canonical URL; treating {initial_url} as canonical");
        document.manifest_url = initial_url.to_string();
        return Ok((initial_url.to_string(), document));
    }

    if declared == initial_url.trim() {
        return Ok((initial_url.to_string(), document));
    }

    info!("manifest has moved: {initial_url} -> {declared}; confirming new location");
    match client.fetch_manifest(&declared).await {
        Ok(mut migrated) => {
            if migrated.manifest_url.trim().is_empty() {
                migrated.manifest_url = declared.clone();
            }
            info!("migration confirmed; using {declared}");
            Ok((declared, migrated))
        }
        Err(err) => {
            warn!("migration target {declared} not usable ({err:#}); staying on {initial_url}");
            Ok((initial_url.to_string(), document))
        }
    }
}
