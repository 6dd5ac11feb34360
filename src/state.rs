//! Local state store: the persisted "last fully-applied" manifest record.
//!
//! The record is written only after every other step of a run has succeeded,
//! so a run that fails partway leaves the previous record untouched and the
//! next run recomputes the same "needs update" decision. Writes are
//! durable-atomic: serialize to a temp sibling in the same directory, then
//! rename onto the final path - a crash mid-write leaves either the old file
//! or the new file fully intact, never a torn one.

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, warn};

use crate::config::InstallLayout;
use crate::core::SlipwayError;
use crate::manifest::Manifest;

/// Read the persisted record.
///
/// A missing or unparsable file yields the empty record (all fields blank) -
/// callers never special-case "no record". Corruption is logged and recovered
/// from; the next successful run rewrites the file.
pub async fn read(layout: &InstallLayout) -> Manifest {
    let path = layout.local_manifest_path();
    let text = match fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(err) => {
            debug!("no local manifest record at {} ({err}); starting from empty", path.display());
            return Manifest::empty();
        }
    };

    match serde_json::from_str(&text) {
        Ok(manifest) => manifest,
        Err(err) => {
            warn!(
                "local manifest record {} is unreadable ({err}); treating as empty",
                path.display()
            );
            Manifest::empty()
        }
    }
}

/// Durably persist the record as the last effectful step of a successful run.
pub async fn write(layout: &InstallLayout, record: &Manifest) -> Result<()> {
    let path = layout.local_manifest_path();
    let tmp = layout.local_manifest_tmp_path();

    let json = serde_json::to_string_pretty(&record.clone().with_full_shape())
        .context("failed to serialize local manifest record")?;

    fs::write(&tmp, json.as_bytes()).await.map_err(|source| SlipwayError::StateIo {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, &path).await.map_err(|source| SlipwayError::StateIo {
        path: path.clone(),
        source,
    })?;

    debug!("persisted local manifest record to {}", path.display());
    Ok(())
}
