//! Shared helpers for integration tests: installation layouts in temp
//! directories, in-memory zip fixtures, and wiremock endpoint mounting.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

use serde_json::{Value, json};
use slipway::config::InstallLayout;
use slipway::verify::ContentVerifier;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// An installation layout rooted in a temp directory, with the self-location
/// pointing at a file inside it (so self-update tests never touch the real
/// test binary).
pub fn layout_in(dir: &TempDir) -> InstallLayout {
    InstallLayout::new(dir.path().to_path_buf(), dir.path().join("updater-bin"))
}

/// Build a zip archive in memory. Entries are `(name, contents)`; all files
/// are marked executable so extraction yields launchable candidates on Unix.
pub fn zip_fixture(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let cursor = std::io::Cursor::new(Vec::new());
    let mut writer = zip::ZipWriter::new(cursor);
    let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
    for (name, contents) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Lowercase hex SHA-256 of a byte slice.
pub fn sha256_of(bytes: &[u8]) -> String {
    ContentVerifier::compute_sha256_bytes(bytes)
}

/// A manifest document as served over the wire.
pub fn manifest_body(
    manifest_url: &str,
    build: Option<(&str, &str, &str)>,
    updater: Option<(&str, &str, &str)>,
) -> Value {
    let mut body = json!({ "manifestUrl": manifest_url });
    if let Some((version, url, sha256)) = build {
        body["build"] = json!({ "version": version, "url": url, "sha256": sha256 });
    }
    if let Some((version, url, sha256)) = updater {
        body["updater"] = json!({ "version": version, "url": url, "sha256": sha256 });
    }
    body
}

/// Serve a JSON document at `route`, expecting it to be fetched
/// `expected_hits` times over the server's lifetime.
pub async fn mount_json(server: &MockServer, route: &str, body: Value, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected_hits)
        .mount(server)
        .await;
}

/// Serve raw bytes at `route`, expecting `expected_hits` fetches.
pub async fn mount_bytes(server: &MockServer, route: &str, bytes: Vec<u8>, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(bytes, "application/octet-stream"))
        .expect(expected_hits)
        .mount(server)
        .await;
}

/// Place a launchable executable in a directory (creating it as needed).
pub fn place_executable(dir: &Path, name: &str, size: usize) {
    std::fs::create_dir_all(dir).unwrap();
    let file = dir.join(name);
    std::fs::write(&file, vec![0u8; size]).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}
