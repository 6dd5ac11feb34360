//! Slipway - self-updating application launcher
//!
//! Slipway is the small helper that sits between a launcher shortcut and a
//! managed application. Given a remote manifest URL it decides whether its own
//! binary and the managed application's build need replacing, performs
//! verified downloads, swaps directories into place with rename-based
//! atomicity, and finally starts the application. It runs unattended, once per
//! invocation, and communicates with its caller exclusively through exit
//! codes.
//!
//! # Architecture Overview
//!
//! One run is a strict sequence with no internal parallelism:
//!
//! ```text
//! resolve manifest (incl. URL migration)
//!   └── self-update          → exit 3010 if the binary was replaced
//!         └── build update   → download, verify, extract, atomic swap
//!               └── persist local record (last fully-applied state)
//!                     └── launch the application → exit 0
//! ```
//!
//! Every multi-step mutation (self-replace, build swap) is designed so that
//! the *next* invocation can detect an incomplete prior attempt and safely
//! retry, rather than requiring in-run cancellation handling.
//!
//! # Core Modules
//!
//! - [`cli`] - Command-line interface (manifest URL, install root, flags)
//! - [`config`] - [`config::InstallLayout`], the single source of paths under the install root
//! - [`core`] - Error taxonomy, run outcomes, and the relaunch exit code
//! - [`orchestrator`] - Sequences one full run
//!
//! ## Update Protocol
//!
//! - [`manifest`] - Manifest data model and the two-phase URL migration resolver
//! - [`selfupdate`] - Self-update with encoding normalization as loop prevention
//! - [`build`] - Build archive download, extraction, and three-way rename swap
//! - [`state`] - Durable-atomic persistence of the last applied manifest
//!
//! ## Supporting Modules
//!
//! - [`transfer`] - HTTP transfers with resume-then-fallback and cache busting
//! - [`verify`] - SHA-256 content verification
//! - [`launch`] - Main-executable selection and process start
//! - [`logging`] - Timestamped console + append-only file logging

pub mod build;
pub mod cli;
pub mod config;
pub mod core;
pub mod launch;
pub mod logging;
pub mod manifest;
pub mod orchestrator;
pub mod selfupdate;
pub mod state;
pub mod transfer;
pub mod verify;

pub use crate::core::{RELAUNCH_EXIT_CODE, RunOutcome, SlipwayError};
