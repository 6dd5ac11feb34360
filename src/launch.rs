//! Main-executable selection and process start.
//!
//! A build directory typically ships several executables: the application
//! itself plus auxiliary tools (crash handlers, launchers, updater
//! utilities). The selector excludes the known auxiliary roles and picks the
//! largest remaining executable - in practice the application binary dwarfs
//! its helpers, and size needs no metadata file that could itself go stale.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Name fragments (lowercase, matched against the file stem) that mark an
/// executable as auxiliary rather than the application itself.
const EXCLUDED_STEM_FRAGMENTS: &[&str] =
    &["crashhandler", "crash_handler", "launcher", "updater", "slipway"];

/// Pick the application's main executable inside `build_dir`.
///
/// Lists executable files directly under the directory (no recursion),
/// excludes auxiliary names, and returns the largest remaining candidate;
/// ties go to the first one encountered. `None` if the directory is absent,
/// empty, or every candidate was excluded.
#[must_use]
pub fn find_main_executable(build_dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(build_dir).ok()?;

    let mut best: Option<(u64, PathBuf)> = None;
    for entry in entries.flatten() {
        let Ok(meta) = entry.metadata() else { continue };
        let path = entry.path();
        if !meta.is_file() || !is_executable(&path, &meta) {
            continue;
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if EXCLUDED_STEM_FRAGMENTS.iter().any(|fragment| stem.contains(fragment)) {
            debug!("excluding auxiliary executable {}", path.display());
            continue;
        }

        // Strictly-greater keeps the first encountered on ties.
        if best.as_ref().is_none_or(|(size, _)| meta.len() > *size) {
            best = Some((meta.len(), path));
        }
    }

    best.map(|(_, path)| path)
}

/// Start the application detached, with the build directory as its working
/// directory. The updater does not wait for it.
pub fn launch(exe: &Path) -> Result<()> {
    let mut command = std::process::Command::new(exe);
    if let Some(dir) = exe.parent() {
        command.current_dir(dir);
    }
    command
        .spawn()
        .with_context(|| format!("failed to start {}", exe.display()))?;
    info!("launched {}", exe.display());
    Ok(())
}

#[cfg(windows)]
fn is_executable(path: &Path, _meta: &std::fs::Metadata) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref(),
        Some("exe" | "bat" | "cmd" | "com")
    )
}

#[cfg(not(windows))]
fn is_executable(_path: &Path, meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}
