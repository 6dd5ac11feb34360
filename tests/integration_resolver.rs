//! Manifest resolution over a real HTTP server: migration confirmation and
//! fallback behavior.

mod common;

use common::{manifest_body, mount_json};
use slipway::manifest::resolver;
use slipway::transfer::TransferClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn canonical_url_performs_exactly_one_fetch() {
    let server = MockServer::start().await;
    let url = format!("{}/manifest.json", server.uri());

    mount_json(
        &server,
        "/manifest.json",
        manifest_body(&url, Some(("1", "https://x/b.zip", "")), None),
        1,
    )
    .await;

    let client = TransferClient::new().unwrap();
    let (effective, document) = resolver::resolve(&client, &url).await.unwrap();

    assert_eq!(effective, url);
    assert_eq!(document.manifest_url, url);
    // expect(1) on the mock verifies the single fetch when the server drops.
}

#[tokio::test]
async fn blank_declared_url_is_stamped_with_initial() {
    let server = MockServer::start().await;
    let url = format!("{}/manifest.json", server.uri());

    mount_json(
        &server,
        "/manifest.json",
        manifest_body("", Some(("1", "https://x/b.zip", "")), None),
        1,
    )
    .await;

    let client = TransferClient::new().unwrap();
    let (effective, document) = resolver::resolve(&client, &url).await.unwrap();

    assert_eq!(effective, url);
    assert_eq!(document.manifest_url, url, "initial URL is stamped as canonical");
}

#[tokio::test]
async fn migration_is_accepted_once_new_location_is_proven() {
    let server = MockServer::start().await;
    let old_url = format!("{}/old/manifest.json", server.uri());
    let new_url = format!("{}/new/manifest.json", server.uri());

    mount_json(
        &server,
        "/old/manifest.json",
        manifest_body(&new_url, Some(("1", "https://x/b.zip", "")), None),
        1,
    )
    .await;
    mount_json(
        &server,
        "/new/manifest.json",
        manifest_body(&new_url, Some(("2", "https://x/b2.zip", "")), None),
        1,
    )
    .await;

    let client = TransferClient::new().unwrap();
    let (effective, document) = resolver::resolve(&client, &old_url).await.unwrap();

    assert_eq!(effective, new_url);
    assert_eq!(document.build.unwrap().version, "2", "migrated document is used");
}

#[tokio::test]
async fn broken_migration_target_falls_back_without_error() {
    let server = MockServer::start().await;
    let old_url = format!("{}/old/manifest.json", server.uri());
    let new_url = format!("{}/gone/manifest.json", server.uri());

    mount_json(
        &server,
        "/old/manifest.json",
        manifest_body(&new_url, Some(("1", "https://x/b.zip", "")), None),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/gone/manifest.json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = TransferClient::new().unwrap();
    let (effective, document) = resolver::resolve(&client, &old_url).await.unwrap();

    assert_eq!(effective, old_url, "must keep using the still-working old URL");
    assert_eq!(document.build.unwrap().version, "1");
}

#[tokio::test]
async fn malformed_migration_target_falls_back_without_error() {
    let server = MockServer::start().await;
    let old_url = format!("{}/old/manifest.json", server.uri());
    let new_url = format!("{}/broken/manifest.json", server.uri());

    mount_json(
        &server,
        "/old/manifest.json",
        manifest_body(&new_url, Some(("1", "https://x/b.zip", "")), None),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken/manifest.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = TransferClient::new().unwrap();
    let (effective, _) = resolver::resolve(&client, &old_url).await.unwrap();
    assert_eq!(effective, old_url);
}

#[tokio::test]
async fn unreachable_initial_url_is_an_error() {
    // Nothing listens on the discard port.
    let client = TransferClient::new().unwrap();
    let result = resolver::resolve(&client, "http://127.0.0.1:9/manifest.json").await;
    assert!(result.is_err());
}
