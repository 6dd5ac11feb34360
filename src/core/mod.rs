//! Core types shared across the updater: the error taxonomy, the outcome of a
//! run, and the exit-code contract with the launching parent process.

pub mod error;

pub use self::error::{SlipwayError, TransferFailure};

/// Exit code signaling the caller to re-invoke this program.
///
/// Emitted after a successful self-update: the newly-installed binary must run
/// in a fresh process, so the old process terminates immediately with this
/// sentinel instead of continuing with stale code in memory.
///
/// The numeric value is load-bearing: the external launcher process matches on
/// it exactly. Never change it.
pub const RELAUNCH_EXIT_CODE: i32 = 3010;

/// Exit code for a run that reached launch.
pub const SUCCESS_EXIT_CODE: i32 = 0;

/// Exit code for any unhandled failure (details are logged).
pub const FAILURE_EXIT_CODE: i32 = 1;

/// How a completed run ended.
///
/// There is no partial-success variant: a run either reaches launch, requests
/// a relaunch after replacing its own binary, or fails loudly with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Everything applied and the managed application was started (or launch
    /// was explicitly skipped via `--no-launch`).
    Launched,
    /// The updater replaced its own binary; the caller must re-invoke it so
    /// the new code runs. Maps to [`RELAUNCH_EXIT_CODE`].
    RelaunchRequested,
}

impl RunOutcome {
    /// The process exit code this outcome maps to.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Launched => SUCCESS_EXIT_CODE,
            Self::RelaunchRequested => RELAUNCH_EXIT_CODE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relaunch_sentinel_value_is_stable() {
        // External launchers depend on the exact value.
        assert_eq!(RELAUNCH_EXIT_CODE, 3010);
        assert_eq!(RunOutcome::RelaunchRequested.exit_code(), 3010);
        assert_eq!(RunOutcome::Launched.exit_code(), 0);
    }
}
