//! Installation layout: every path the updater touches, derived once from the
//! install root and passed explicitly to each component.
//!
//! No component reads ambient global location state; the [`InstallLayout`] is
//! constructed at startup (from the CLI arguments or test fixtures) and
//! threaded through the run. Layout under the root:
//!
//! ```text
//! <root>/
//! ├── Build/                  active build directory
//! ├── Build_new/              staging (transient, swap in progress)
//! ├── Build_old/              previous build (backup after a swap)
//! ├── Log/updater.log         append-only log file
//! ├── manifest.local.json     last fully-applied manifest record
//! ├── manifest.local.json.tmp temp sibling during durable writes
//! ├── _update_tmp/            scratch for downloads and extraction
//! └── <the updater binary>    self-location (replaced on self-update)
//! ```

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Directory name of the active build.
pub const BUILD_DIR: &str = "Build";
/// Staging directory a freshly-extracted build is renamed to before the swap.
pub const BUILD_NEW_DIR: &str = "Build_new";
/// Backup directory the previous build is renamed to during the swap.
pub const BUILD_OLD_DIR: &str = "Build_old";
/// Log directory under the install root.
pub const LOG_DIR: &str = "Log";
/// File name of the persisted local manifest record.
pub const LOCAL_MANIFEST_FILE: &str = "manifest.local.json";
/// Scratch directory for downloads and archive extraction.
pub const SCRATCH_DIR: &str = "_update_tmp";

/// Resolved filesystem layout of one installation.
///
/// Exactly two shared mutable resources exist per installation, and both are
/// reachable only through this type: the self-location file and the active
/// build directory.
#[derive(Debug, Clone)]
pub struct InstallLayout {
    root: PathBuf,
    self_path: PathBuf,
}

impl InstallLayout {
    /// Build a layout from an explicit root and self-location.
    ///
    /// Used directly by tests; production code goes through [`discover`].
    ///
    /// [`discover`]: Self::discover
    #[must_use]
    pub fn new(root: PathBuf, self_path: PathBuf) -> Self {
        Self { root, self_path }
    }

    /// Build the layout for the running process.
    ///
    /// The install root defaults to the directory containing the running
    /// executable; the self-location is the running executable itself.
    pub fn discover(install_root: Option<PathBuf>) -> Result<Self> {
        let self_path =
            env::current_exe().context("failed to determine the running executable path")?;
        let root = match install_root {
            Some(root) => root,
            None => self_path
                .parent()
                .context("running executable has no parent directory")?
                .to_path_buf(),
        };
        Ok(Self::new(root, self_path))
    }

    /// The installation root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The updater's own persisted binary (the self-location).
    #[must_use]
    pub fn self_path(&self) -> &Path {
        &self.self_path
    }

    /// Active build directory the application is launched from.
    #[must_use]
    pub fn build_dir(&self) -> PathBuf {
        self.root.join(BUILD_DIR)
    }

    /// Staging directory used while a new build is being swapped in.
    #[must_use]
    pub fn build_new_dir(&self) -> PathBuf {
        self.root.join(BUILD_NEW_DIR)
    }

    /// Backup directory holding the previous build after a swap.
    #[must_use]
    pub fn build_old_dir(&self) -> PathBuf {
        self.root.join(BUILD_OLD_DIR)
    }

    /// Directory the append-only log file lives in.
    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.root.join(LOG_DIR)
    }

    /// Path of the persisted local manifest record.
    #[must_use]
    pub fn local_manifest_path(&self) -> PathBuf {
        self.root.join(LOCAL_MANIFEST_FILE)
    }

    /// Temp sibling written first during a durable local-record write.
    #[must_use]
    pub fn local_manifest_tmp_path(&self) -> PathBuf {
        self.root.join(format!("{LOCAL_MANIFEST_FILE}.tmp"))
    }

    /// Scratch directory for downloads and extraction. Recreated as needed,
    /// deleted after a successful build update.
    #[must_use]
    pub fn scratch_dir(&self) -> PathBuf {
        self.root.join(SCRATCH_DIR)
    }
}
