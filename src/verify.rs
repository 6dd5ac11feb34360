//! SHA-256 content verification for downloaded artifacts.
//!
//! Every downloaded artifact passes through [`ContentVerifier::verify`]
//! whenever the remote record supplies a non-empty digest. Verification runs
//! on the raw downloaded bytes, before any normalization, so the check
//! matches exactly what the publisher hashed.

use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, info};

use crate::core::SlipwayError;

/// Computes and compares SHA-256 content digests.
pub struct ContentVerifier;

impl ContentVerifier {
    /// Compute the lowercase hex SHA-256 digest of a file's contents.
    pub async fn compute_sha256(path: &Path) -> Result<String> {
        debug!("computing sha256 of {}", path.display());
        let contents = fs::read(path)
            .await
            .with_context(|| format!("failed to read {} for hashing", path.display()))?;
        Ok(Self::compute_sha256_bytes(&contents))
    }

    /// Compute the lowercase hex SHA-256 digest of a byte slice.
    #[must_use]
    pub fn compute_sha256_bytes(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    /// Verify a file against an optional expected digest.
    ///
    /// A blank/whitespace `expected` value means no verification was
    /// requested and the call succeeds trivially. Otherwise the comparison is
    /// case-insensitive with both sides trimmed; a difference fails with
    /// [`SlipwayError::HashMismatch`] carrying expected, actual, and the path.
    pub async fn verify(path: &Path, expected: &str) -> Result<()> {
        let expected = expected.trim();
        if expected.is_empty() {
            debug!("no digest supplied for {}; skipping verification", path.display());
            return Ok(());
        }

        let actual = Self::compute_sha256(path).await?;
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(SlipwayError::HashMismatch {
                path: path.to_path_buf(),
                expected: expected.to_string(),
                actual,
            }
            .into());
        }

        info!("verified {} against published digest", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    // SHA-256 of "Hello, World!".
    const HELLO_SHA256: &str = "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f";

    #[tokio::test]
    async fn computes_known_digest() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"Hello, World!").unwrap();

        let digest = ContentVerifier::compute_sha256(file.path()).await.unwrap();
        assert_eq!(digest, HELLO_SHA256);
    }

    #[test]
    fn bytes_and_file_digests_agree() {
        assert_eq!(ContentVerifier::compute_sha256_bytes(b"Hello, World!"), HELLO_SHA256);
    }

    #[tokio::test]
    async fn blank_expected_digest_skips_verification() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"anything").unwrap();

        ContentVerifier::verify(file.path(), "").await.unwrap();
        ContentVerifier::verify(file.path(), "   \t").await.unwrap();
    }

    #[tokio::test]
    async fn comparison_is_case_insensitive_and_trimmed() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"Hello, World!").unwrap();

        let uppercase = format!("  {}  ", HELLO_SHA256.to_uppercase());
        ContentVerifier::verify(file.path(), &uppercase).await.unwrap();
    }

    #[tokio::test]
    async fn mismatch_carries_expected_and_actual() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"Hello, World!").unwrap();

        let wrong = "0000000000000000000000000000000000000000000000000000000000000000";
        let err = ContentVerifier::verify(file.path(), wrong).await.unwrap_err();
        let err = err.downcast::<SlipwayError>().unwrap();
        match err {
            SlipwayError::HashMismatch { expected, actual, .. } => {
                assert_eq!(expected, wrong);
                assert_eq!(actual, HELLO_SHA256);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
