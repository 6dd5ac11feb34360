//! Run sequencing: resolve -> self-update -> build update -> persist -> launch.
//!
//! The ordering is the protocol. Self-update runs before anything else and,
//! when it replaces the binary, the run ends right there with a relaunch
//! request - no build update, no state write. The local record is persisted
//! only once every other step succeeded, so a failed run leaves the previous
//! record (and therefore the next run's decisions) untouched. Launch is last.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::build::BuildUpdater;
use crate::config::InstallLayout;
use crate::core::{RunOutcome, SlipwayError};
use crate::manifest::resolver;
use crate::selfupdate::SelfUpdater;
use crate::transfer::TransferClient;
use crate::{launch, state};

/// Everything one run needs, assembled by the CLI (or tests).
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Initial manifest URL (migration may yield a different effective URL).
    pub manifest_url: String,
    /// Resolved installation layout.
    pub layout: InstallLayout,
    /// Keep `Build_old/` after a successful swap.
    pub keep_backup: bool,
    /// Do everything except starting the application.
    pub no_launch: bool,
}

/// Execute one full run.
pub async fn run(options: &RunOptions) -> Result<RunOutcome> {
    let layout = &options.layout;
    info!("starting update run against {}", options.manifest_url);

    let client = TransferClient::new()?;
    let local = state::read(layout).await;

    let (effective_url, mut remote) = resolver::resolve(&client, &options.manifest_url).await?;
    debug!("effective manifest URL: {effective_url}");

    if SelfUpdater::new(&client, layout).update_if_needed(&local, &remote).await? {
        // The new binary must run in a fresh process; the caller re-invokes us.
        return Ok(RunOutcome::RelaunchRequested);
    }

    let remote_build = remote
        .build
        .clone()
        .ok_or_else(|| SlipwayError::MissingRemoteField { field: "build".into() })?;

    let updated =
        BuildUpdater::new(&client, layout, options.keep_backup).update_if_needed(&local, &remote_build).await?;
    if updated {
        info!("build updated to version '{}'", remote_build.version.trim());
    }

    // Last effectful step: only a fully-applied state is ever recorded.
    remote.manifest_url = effective_url;
    state::write(layout, &remote).await?;

    if options.no_launch {
        info!("launch skipped (--no-launch)");
        return Ok(RunOutcome::Launched);
    }

    let exe = launch::find_main_executable(&layout.build_dir()).with_context(|| {
        format!("no launchable executable found under {}", layout.build_dir().display())
    })?;
    launch::launch(&exe)?;
    Ok(RunOutcome::Launched)
}
