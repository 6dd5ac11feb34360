//! Build update: download, verify, extract, and atomically swap the managed
//! application's build directory.
//!
//! The swap is a three-way rename sequence over sibling directories:
//!
//! ```text
//! STABLE(Build)
//!   └─ stage payload at Build_new           STAGING
//!        └─ Build -> Build_old              SWAPPING
//!             └─ Build_new -> Build         STABLE'(new build)
//!                  └─ on failure:
//!                     Build_old -> Build    ROLLED_BACK(old build)
//! ```
//!
//! Renames are the most atomicity-preserving file operation common
//! filesystems offer, which is why no copy-then-delete appears anywhere in
//! the sequence. If the second rename fails after the first succeeded, one
//! best-effort rollback renames the backup onto the active name before the
//! failure propagates - the active directory must never observably vanish
//! without a same-run attempt to restore it. A crash inside the swap window
//! is healed on the next run by the missing-executable rule: no resolvable
//! main executable always forces a refresh.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::config::InstallLayout;
use crate::core::SlipwayError;
use crate::launch;
use crate::manifest::{ComponentRecord, Manifest};
use crate::transfer::TransferClient;
use crate::verify::ContentVerifier;

/// Name of the downloaded archive inside the scratch directory.
const ARCHIVE_NAME: &str = "build.zip";
/// Extraction directory inside the scratch directory.
const EXTRACT_DIR: &str = "extract";

/// Decides whether the installed build is stale and swaps in a new one if so.
pub struct BuildUpdater<'a> {
    client: &'a TransferClient,
    layout: &'a InstallLayout,
    /// Keep `Build_old/` after a successful swap as a manual recovery aid.
    keep_backup: bool,
}

impl<'a> BuildUpdater<'a> {
    pub fn new(client: &'a TransferClient, layout: &'a InstallLayout, keep_backup: bool) -> Self {
        Self { client, layout, keep_backup }
    }

    /// Refresh the active build if the remote record differs from the local
    /// one, or if the current install has no resolvable main executable
    /// (self-heal after corruption or an interrupted swap).
    pub async fn update_if_needed(
        &self,
        local: &Manifest,
        remote_build: &ComponentRecord,
    ) -> Result<bool> {
        let build_dir = self.layout.build_dir();
        let current_exe = launch::find_main_executable(&build_dir);

        let fields_differ = remote_build.differs_from(&local.build_or_blank());
        if !fields_differ && current_exe.is_some() {
            debug!("build is current (version '{}')", remote_build.version.trim());
            return Ok(false);
        }
        if !fields_differ {
            info!("no main executable found under {}; forcing build refresh", build_dir.display());
        } else {
            info!(
                "build update required: '{}' -> '{}'",
                local.build_or_blank().version.trim(),
                remote_build.version.trim()
            );
        }

        // Never replace files backing a live process.
        if let Some(exe) = current_exe {
            ensure_not_running(&exe)?;
        }

        let payload = self.download_and_extract(remote_build).await?;
        self.stage_and_swap(&payload).await?;
        self.cleanup().await;
        Ok(true)
    }

    /// Download the archive, verify it if a digest was published, extract it,
    /// and return the payload root.
    async fn download_and_extract(&self, remote_build: &ComponentRecord) -> Result<PathBuf> {
        let scratch = self.layout.scratch_dir();
        fs::create_dir_all(&scratch)
            .await
            .with_context(|| format!("failed to create {}", scratch.display()))?;

        let archive = scratch.join(ARCHIVE_NAME);
        self.client.fetch_to_file(remote_build.url.trim(), &archive).await?;
        ContentVerifier::verify(&archive, &remote_build.sha256).await?;

        let extract_dir = scratch.join(EXTRACT_DIR);
        if extract_dir.exists() {
            fs::remove_dir_all(&extract_dir)
                .await
                .with_context(|| format!("failed to clear {}", extract_dir.display()))?;
        }
        fs::create_dir_all(&extract_dir).await?;

        extract_zip(&archive, &extract_dir).await?;
        info!("extracted build archive to {}", extract_dir.display());

        normalize_payload_root(&extract_dir)
    }

    /// Move the payload to `Build_new/` and run the rename swap.
    async fn stage_and_swap(&self, payload: &Path) -> Result<()> {
        let staging = self.layout.build_new_dir();
        let active = self.layout.build_dir();
        let backup = self.layout.build_old_dir();

        // Stale leftovers from an interrupted earlier run.
        if staging.exists() {
            warn!("removing stale staging directory {}", staging.display());
            fs::remove_dir_all(&staging).await?;
        }
        fs::rename(payload, &staging)
            .await
            .map_err(|source| SlipwayError::Swap {
                from: payload.to_path_buf(),
                to: staging.clone(),
                source,
            })?;

        if backup.exists() {
            debug!("removing stale backup directory {}", backup.display());
            fs::remove_dir_all(&backup).await?;
        }

        swap_build_dirs(&active, &staging, &backup, |from: &Path, to: &Path| {
            std::fs::rename(from, to)
        })?;
        info!("new build swapped into {}", active.display());

        if !self.keep_backup && backup.exists() {
            if let Err(err) = fs::remove_dir_all(&backup).await {
                warn!("could not discard backup {} ({err})", backup.display());
            }
        }
        Ok(())
    }

    /// Best-effort scratch cleanup; a failure here never fails the run.
    async fn cleanup(&self) {
        let scratch = self.layout.scratch_dir();
        if let Err(err) = fs::remove_dir_all(&scratch).await {
            debug!("scratch cleanup of {} skipped ({err})", scratch.display());
        }
    }
}

/// The three-way rename swap, factored over the rename primitive so the
/// mid-swap failure transition is a tested code path rather than an
/// afterthought.
///
/// `active -> backup`, then `fresh -> active`. If the second rename fails
/// after the first succeeded, the backup is renamed back onto the active name
/// (best effort) and the failure propagates as [`SlipwayError::Swap`].
fn swap_build_dirs<F>(
    active: &Path,
    fresh: &Path,
    backup: &Path,
    rename: F,
) -> Result<(), SlipwayError>
where
    F: Fn(&Path, &Path) -> io::Result<()>,
{
    let had_active = active.exists();
    if had_active {
        rename(active, backup).map_err(|source| SlipwayError::Swap {
            from: active.to_path_buf(),
            to: backup.to_path_buf(),
            source,
        })?;
    }

    if let Err(source) = rename(fresh, active) {
        if had_active {
            match rename(backup, active) {
                Ok(()) => warn!("swap failed; previous build restored at {}", active.display()),
                Err(rollback_err) => error!(
                    "swap failed and rollback of {} also failed ({rollback_err}); manual recovery required",
                    backup.display()
                ),
            }
        }
        return Err(SlipwayError::Swap {
            from: fresh.to_path_buf(),
            to: active.to_path_buf(),
            source,
        });
    }
    Ok(())
}

/// Locate the real payload root after extraction.
///
/// Archives frequently package their payload one level nested: exactly one
/// subdirectory and zero loose files at the top level means that
/// subdirectory is the root; anything else means the extraction root itself
/// is.
fn normalize_payload_root(extract_dir: &Path) -> Result<PathBuf> {
    let mut dirs = Vec::new();
    let mut file_count = 0usize;
    for entry in std::fs::read_dir(extract_dir)
        .with_context(|| format!("failed to list {}", extract_dir.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        } else {
            file_count += 1;
        }
    }

    if file_count == 0 && dirs.len() == 1 {
        let nested = dirs.remove(0);
        debug!("archive payload is nested under {}", nested.display());
        Ok(nested)
    } else {
        Ok(extract_dir.to_path_buf())
    }
}

/// Extract a zip archive. Decompression itself is delegated to the `zip`
/// crate; runs on the blocking pool since it is pure sync I/O.
async fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let file = std::fs::File::open(&archive)
            .with_context(|| format!("failed to open {}", archive.display()))?;
        let mut zip = zip::ZipArchive::new(file)
            .with_context(|| format!("failed to read {} as a zip archive", archive.display()))?;
        zip.extract(&dest)
            .with_context(|| format!("failed to extract {} to {}", archive.display(), dest.display()))?;
        Ok(())
    })
    .await
    .context("archive extraction task failed")?
}

/// Refuse to proceed while the managed application appears to be running.
///
/// Matching is by process name derived from the executable's file name; a
/// match fails with [`SlipwayError::AppRunning`].
fn ensure_not_running(exe: &Path) -> Result<()> {
    let Some(name) = exe.file_name().map(std::ffi::OsStr::to_os_string) else {
        return Ok(());
    };

    let mut system = sysinfo::System::new();
    system.refresh_processes(sysinfo::ProcessesToUpdate::All, true);
    if system.processes_by_name(&name).next().is_some() {
        return Err(SlipwayError::AppRunning {
            process: name.to_string_lossy().into_owned(),
        }
        .into());
    }
    debug!("{} is not running; safe to swap", name.to_string_lossy());
    Ok(())
}
