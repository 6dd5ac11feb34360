//! Manifest data model.
//!
//! A manifest is a small JSON document describing the desired state of the
//! updater binary and the managed application build:
//!
//! ```json
//! {
//!   "manifestUrl": "https://releases.example.com/manifest.json",
//!   "build":   { "version": "2", "url": "https://.../build.zip", "sha256": "..." },
//!   "updater": { "version": "5", "url": "https://.../updater",   "sha256": "..." }
//! }
//! ```
//!
//! The same shape is fetched from the network (desired state) and persisted
//! locally (last fully-applied state). Field handling is normalized once at
//! the parse boundary: absent and `null` both deserialize to the same
//! representation (`None` for whole sections, `""` for scalar fields), so
//! downstream code never distinguishes "absent vs. blank vs. null".
//!
//! Versions are opaque strings compared by equality only - there are no
//! ordering semantics, a differing version string in either direction means
//! "replace".

pub mod resolver;

use serde::{Deserialize, Serialize};

/// Desired state of one updatable component (the updater binary or the
/// application build).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComponentRecord {
    /// Opaque version label. Compared by trimmed equality only.
    #[serde(deserialize_with = "null_to_blank")]
    pub version: String,
    /// Source location of the artifact.
    #[serde(deserialize_with = "null_to_blank")]
    pub url: String,
    /// Optional lowercase hex SHA-256 of the artifact. Empty means "skip
    /// verification".
    #[serde(deserialize_with = "null_to_blank")]
    pub sha256: String,
}

/// Scalar fields tolerate an explicit `null` the same way they tolerate
/// absence: both become the blank string, so no downstream code ever sees
/// the difference.
fn null_to_blank<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ComponentRecord {
    /// Whether the record carries no information at all.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.version.trim().is_empty() && self.url.trim().is_empty() && self.sha256.trim().is_empty()
    }

    /// Three-field staleness rule: two records differ if any of `version`,
    /// `url`, or `sha256` differ under trimmed string equality.
    ///
    /// Leading/trailing whitespace is never significant; a manifest edited by
    /// hand must not trigger a spurious update.
    #[must_use]
    pub fn differs_from(&self, other: &Self) -> bool {
        self.version.trim() != other.version.trim()
            || self.url.trim() != other.url.trim()
            || self.sha256.trim() != other.sha256.trim()
    }

    /// The expected digest, trimmed; `None` if verification was not requested.
    #[must_use]
    pub fn expected_sha256(&self) -> Option<&str> {
        let trimmed = self.sha256.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// A manifest document, remote or locally persisted.
///
/// On the remote side a missing `build` section is a hard error (checked by
/// the orchestrator) while a missing `updater` section silently disables
/// self-update. The local record fills both in as blank on persist so the
/// file on disk always has the full shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Manifest {
    /// The canonical URL of this document. A non-blank value differing from
    /// the URL it was fetched from signals a migration (see [`resolver`]).
    pub manifest_url: String,
    /// Desired application build.
    pub build: Option<ComponentRecord>,
    /// Desired updater binary.
    pub updater: Option<ComponentRecord>,
}

impl Manifest {
    /// The empty record: all fields blank. Used whenever no local record
    /// exists or the existing one is unreadable, so callers never
    /// special-case "no record".
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The local `build` record, or a blank record if the section is absent.
    #[must_use]
    pub fn build_or_blank(&self) -> ComponentRecord {
        self.build.clone().unwrap_or_default()
    }

    /// The local `updater` record, or a blank record if the section is absent.
    #[must_use]
    pub fn updater_or_blank(&self) -> ComponentRecord {
        self.updater.clone().unwrap_or_default()
    }

    /// Fill absent sections with blank records so the persisted file always
    /// carries the full wire shape.
    #[must_use]
    pub fn with_full_shape(mut self) -> Self {
        self.build.get_or_insert_with(ComponentRecord::default);
        self.updater.get_or_insert_with(ComponentRecord::default);
        self
    }
}
