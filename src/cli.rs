//! Command-line interface.
//!
//! One required argument (the initial manifest URL), one optional positional
//! argument (the installation root, defaulting to the directory containing
//! the running executable), and a handful of flags. The interesting output of
//! an invocation is its exit code:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0    | Up to date (possibly after updating) and launched |
//! | 1    | Unhandled failure, details logged |
//! | 3010 | Self-update applied; caller must re-invoke this program |

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::config::InstallLayout;
use crate::core::RunOutcome;
use crate::orchestrator::{self, RunOptions};
use crate::logging;

/// Self-updating application launcher.
///
/// Resolves the remote manifest, updates itself and the managed application
/// build as needed, then starts the application.
#[derive(Parser, Debug)]
#[command(name = "slipway", version, about)]
pub struct Cli {
    /// Initial manifest URL. The manifest may declare a migration to a new
    /// canonical URL; the new location is used only once proven reachable.
    #[arg(value_name = "MANIFEST_URL")]
    pub manifest_url: String,

    /// Installation root directory. Defaults to the directory containing
    /// this executable.
    #[arg(value_name = "INSTALL_ROOT")]
    pub install_root: Option<PathBuf>,

    /// Delete the previous build (Build_old) after a successful swap instead
    /// of keeping it as a manual recovery aid.
    #[arg(long)]
    pub discard_backup: bool,

    /// Perform all update steps but do not start the application.
    #[arg(long)]
    pub no_launch: bool,

    /// Enable debug output.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Resolve the layout, set up logging, and execute one run.
    pub async fn execute(self) -> Result<RunOutcome> {
        let layout = InstallLayout::discover(self.install_root.clone())?;
        logging::init(&layout.log_dir(), self.verbose, self.quiet);

        let options = RunOptions {
            manifest_url: self.manifest_url.clone(),
            layout,
            keep_backup: !self.discard_backup,
            no_launch: self.no_launch,
        };
        orchestrator::run(&options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_invocation() {
        let cli = Cli::parse_from(["slipway", "https://x/manifest.json"]);
        assert_eq!(cli.manifest_url, "https://x/manifest.json");
        assert_eq!(cli.install_root, None);
        assert!(!cli.discard_backup);
        assert!(!cli.no_launch);
    }

    #[test]
    fn parses_install_root_and_flags() {
        let cli = Cli::parse_from([
            "slipway",
            "https://x/manifest.json",
            "/opt/app",
            "--discard-backup",
            "--no-launch",
            "--verbose",
        ]);
        assert_eq!(cli.install_root, Some(PathBuf::from("/opt/app")));
        assert!(cli.discard_backup);
        assert!(cli.no_launch);
        assert!(cli.verbose);
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        let result = Cli::try_parse_from(["slipway", "https://x/m.json", "-v", "-q"]);
        assert!(result.is_err());
    }

    #[test]
    fn manifest_url_is_required() {
        let result = Cli::try_parse_from(["slipway"]);
        assert!(result.is_err());
    }
}
