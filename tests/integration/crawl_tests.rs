//! Integration tests for the mirror
//!
//! These tests use wiremock to stand in for the gallery site and run whole
//! mirror sessions against it end to end.

use picmirror::config::Config;
use picmirror::crawler::run_mirror;
use picmirror::{Mirror, MirrorError};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration for a site under `<server>/u`
fn create_test_config(base_url: &str, dest: &Path, continue_on_error: bool) -> Config {
    let mut config = Config::new(base_url, dest);
    config.mirror.max_network_ops = 4;
    config.mirror.continue_on_error = continue_on_error;
    config.mirror.drain_poll_interval = 10; // Very short for testing
    config
}

fn listing_html(base_url: &str, keys: &[&str]) -> String {
    let links: String = keys
        .iter()
        .map(|k| format!(r#"<a href="{}/gallery/{}">Gallery {}</a>"#, base_url, k, k))
        .collect::<Vec<_>>()
        .join("\n");
    format!("<html><body>{}</body></html>", links)
}

/// Builds a gallery metadata document
///
/// `pics` are `(key, declared bytes, mime)`.
fn gallery_xml(
    base_url: &str,
    linked_from: &[&str],
    linked_to: &[&str],
    pics: &[(&str, u64, &str)],
) -> String {
    let items: String = pics
        .iter()
        .map(|(key, bytes, mime)| {
            format!(
                r#"<mediaSetItem>
      <Title>Picture {key}</Title>
      <Description>A picture</Description>
      <InfoURL>{base}/pic/{key}.xml</InfoURL>
      <file>
        <digest type="md5">d41d8cd98f00b204e9800998ecf8427e</digest>
        <Mime>{mime}</Mime>
        <Width>640</Width>
        <Height>480</Height>
        <Bytes>{bytes}</Bytes>
        <Url>{base}/raw/{key}</Url>
      </file>
    </mediaSetItem>"#,
                key = key,
                base = base_url,
                mime = mime,
                bytes = bytes
            )
        })
        .collect();

    let urls = |list: &[&str]| -> String {
        list.iter()
            .map(|u| format!("<InfoURL>{}</InfoURL>", u))
            .collect()
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<mediaSet>
  <mediaSetItems>{}</mediaSetItems>
  <linkedFrom>{}</linkedFrom>
  <linkedTo>{}</linkedTo>
</mediaSet>"#,
        items,
        urls(linked_from),
        urls(linked_to)
    )
}

fn pic_xml(key: &str) -> String {
    format!("<mediaSetItem><Title>Picture {}</Title></mediaSetItem>", key)
}

/// Mounts a listing that returns the same galleries for every page
async fn mount_listing(server: &MockServer, base_url: &str, keys: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/u/"))
        .and(query_param("sort", "alpha"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(base_url, keys)))
        .mount(server)
        .await;
}

async fn mount_body(server: &MockServer, url_path: &str, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_blob(server: &MockServer, key: &str, size: usize, expected: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/u/pic/{}", key)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xffu8; size]))
        .expect(expected)
        .mount(server)
        .await;
}

async fn start_site() -> (MockServer, String) {
    let server = MockServer::start().await;
    let base_url = format!("{}/u", server.uri());
    (server, base_url)
}

#[tokio::test]
async fn test_frontier_stops_after_page_without_new_galleries() {
    let (server, base_url) = start_site().await;

    Mock::given(method("GET"))
        .and(path("/u/"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_html(&base_url, &["aaaaaaaa", "bbbbbbbb"])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/u/"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_html(&base_url, &["aaaaaaaa"])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/u/"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let empty = gallery_xml(&base_url, &[], &[], &[]);
    mount_body(&server, "/u/gallery/aaaaaaaa.xml", empty.clone(), 1).await;
    mount_body(&server, "/u/gallery/bbbbbbbb.xml", empty, 1).await;

    let dest = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dest.path(), false);
    let mirror = Mirror::new(&config).unwrap();
    let summary = mirror.run().await.expect("Mirror failed");

    assert_eq!(summary.pages, 2);
    assert_eq!(summary.galleries, 2);
    assert_eq!(summary.pictures, 0);
    assert!(summary.is_clean());
    assert_eq!(mirror.gate().in_flight(), 0);
}

#[tokio::test]
async fn test_full_mirror_of_linked_gallery_and_picture() {
    let (server, base_url) = start_site().await;
    mount_listing(&server, &base_url, &["aaaaaaaa"]).await;

    let gallery_b_url = format!("{}/gallery/bbbbbbbb.xml", base_url);
    mount_body(
        &server,
        "/u/gallery/aaaaaaaa.xml",
        gallery_xml(
            &base_url,
            &[],
            &[&gallery_b_url],
            &[("0000abcd", 12345, "image/jpeg")],
        ),
        1,
    )
    .await;
    mount_body(
        &server,
        "/u/gallery/bbbbbbbb.xml",
        gallery_xml(&base_url, &[], &[], &[]),
        1,
    )
    .await;
    mount_body(&server, "/u/pic/0000abcd.xml", pic_xml("0000abcd"), 1).await;
    mount_blob(&server, "0000abcd", 12345, 1).await;

    let dest = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dest.path(), false);
    let mirror = Mirror::new(&config).unwrap();
    let summary = mirror.run().await.expect("Mirror failed");

    assert_eq!(summary.galleries, 2);
    assert_eq!(summary.pictures, 1);
    assert!(summary.is_clean());

    let root = dest.path();
    assert!(root.join("gallery-aaaaaaaa.xml").is_file());
    assert!(root.join("gallery-bbbbbbbb.xml").is_file());
    assert!(root.join("pic-0000abcd.xml").is_file());

    let payload = std::fs::metadata(root.join("pic-0000abcd.jpg")).expect("payload missing");
    assert_eq!(payload.len(), 12345);
    assert_eq!(mirror.gate().in_flight(), 0);
}

#[tokio::test]
async fn test_cyclic_galleries_terminate() {
    let (server, base_url) = start_site().await;
    mount_listing(&server, &base_url, &["aaaaaaaa"]).await;

    let a_url = format!("{}/gallery/aaaaaaaa.xml", base_url);
    let b_url = format!("{}/gallery/bbbbbbbb.xml", base_url);

    // A links to B, B links back to A
    mount_body(
        &server,
        "/u/gallery/aaaaaaaa.xml",
        gallery_xml(&base_url, &[&b_url], &[&b_url], &[]),
        1,
    )
    .await;
    mount_body(
        &server,
        "/u/gallery/bbbbbbbb.xml",
        gallery_xml(&base_url, &[&a_url], &[&a_url], &[]),
        1,
    )
    .await;

    let dest = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dest.path(), false);
    let mirror = Mirror::new(&config).unwrap();

    let summary = tokio::time::timeout(std::time::Duration::from_secs(10), mirror.run())
        .await
        .expect("Mirror did not terminate")
        .expect("Mirror failed");

    assert_eq!(summary.galleries, 2);
    assert_eq!(mirror.gate().in_flight(), 0);
}

#[tokio::test]
async fn test_duplicate_references_fetch_once() {
    let (server, base_url) = start_site().await;
    mount_listing(&server, &base_url, &["aaaaaaaa", "bbbbbbbb"]).await;

    // Three spellings of B, and the same picture in both galleries
    let b_spellings = [
        format!("{}/gallery/bbbbbbbb.xml", base_url),
        "http://mirror.example.com/other/gallery/bbbbbbbb".to_string(),
        "bbbbbbbb".to_string(),
    ];
    let b_refs: Vec<&str> = b_spellings.iter().map(String::as_str).collect();
    let pic = [("0000abcd", 64, "image/png")];

    mount_body(
        &server,
        "/u/gallery/aaaaaaaa.xml",
        gallery_xml(&base_url, &[], &b_refs, &[pic[0], pic[0]]),
        1,
    )
    .await;
    mount_body(
        &server,
        "/u/gallery/bbbbbbbb.xml",
        gallery_xml(&base_url, &[], &[], &pic),
        1,
    )
    .await;
    mount_body(&server, "/u/pic/0000abcd.xml", pic_xml("0000abcd"), 1).await;
    mount_blob(&server, "0000abcd", 64, 1).await;

    let dest = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dest.path(), false);
    let mirror = Mirror::new(&config).unwrap();
    let summary = mirror.run().await.expect("Mirror failed");

    assert_eq!(summary.galleries, 2);
    assert_eq!(summary.pictures, 1);
    assert_eq!(
        std::fs::metadata(dest.path().join("pic-0000abcd.png"))
            .unwrap()
            .len(),
        64
    );
    // MockServer verifies every `.expect(1)` on drop
}

#[tokio::test]
async fn test_rerun_skips_completed_files() {
    let (server, base_url) = start_site().await;
    mount_listing(&server, &base_url, &["aaaaaaaa"]).await;

    mount_body(
        &server,
        "/u/gallery/aaaaaaaa.xml",
        gallery_xml(&base_url, &[], &[], &[("0000abcd", 100, "image/gif")]),
        1,
    )
    .await;
    mount_body(&server, "/u/pic/0000abcd.xml", pic_xml("0000abcd"), 1).await;
    mount_blob(&server, "0000abcd", 100, 1).await;

    let dest = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dest.path(), false);

    let first = Mirror::new(&config).unwrap().run().await.expect("first run failed");
    let second = run_mirror(&config).await.expect("second run failed");

    assert_eq!(first.pictures, 1);
    assert_eq!(second.pictures, 1);
    assert!(dest.path().join("pic-0000abcd.gif").is_file());
}

#[tokio::test]
async fn test_zero_size_picture_is_fatal() {
    let (server, base_url) = start_site().await;
    mount_listing(&server, &base_url, &["aaaaaaaa"]).await;

    mount_body(
        &server,
        "/u/gallery/aaaaaaaa.xml",
        gallery_xml(&base_url, &[], &[], &[("0000abcd", 0, "image/jpeg")]),
        1,
    )
    .await;
    mount_body(&server, "/u/pic/0000abcd.xml", pic_xml("0000abcd"), 1).await;
    mount_blob(&server, "0000abcd", 10, 0).await;

    let dest = TempDir::new().unwrap();
    // Fatal even when continuing past errors
    let config = create_test_config(&base_url, dest.path(), true);
    let result = Mirror::new(&config).unwrap().run().await;

    assert!(matches!(result, Err(MirrorError::InvariantViolation(_))));
    assert!(!dest.path().join("pic-0000abcd.jpg").exists());
}

#[tokio::test]
async fn test_soft_error_stops_only_its_branch() {
    let (server, base_url) = start_site().await;
    mount_listing(&server, &base_url, &["aaaaaaaa"]).await;

    let b_url = format!("{}/gallery/bbbbbbbb.xml", base_url);
    let c_url = format!("{}/gallery/cccccccc.xml", base_url);
    mount_body(
        &server,
        "/u/gallery/aaaaaaaa.xml",
        gallery_xml(&base_url, &[], &[&b_url, &c_url], &[]),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/u/gallery/bbbbbbbb.xml"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_body(
        &server,
        "/u/gallery/cccccccc.xml",
        gallery_xml(&base_url, &[], &[], &[("0000abcd", 32, "image/jpeg")]),
        1,
    )
    .await;
    mount_body(&server, "/u/pic/0000abcd.xml", pic_xml("0000abcd"), 1).await;
    mount_blob(&server, "0000abcd", 32, 1).await;

    let dest = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dest.path(), true);
    let mirror = Mirror::new(&config).unwrap();
    let summary = mirror.run().await.expect("Mirror failed");

    assert_eq!(summary.galleries, 3);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].message.contains("bbbbbbbb"));
    assert!(!dest.path().join("gallery-bbbbbbbb.xml").exists());
    assert!(dest.path().join("pic-0000abcd.jpg").is_file());
    assert_eq!(mirror.gate().in_flight(), 0);
}

#[tokio::test]
async fn test_fail_fast_on_transport_error() {
    let (server, base_url) = start_site().await;
    mount_listing(&server, &base_url, &["aaaaaaaa"]).await;

    Mock::given(method("GET"))
        .and(path("/u/gallery/aaaaaaaa.xml"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dest = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dest.path(), false);
    let result = Mirror::new(&config).unwrap().run().await;

    assert!(matches!(
        result,
        Err(MirrorError::HttpStatus { status: 503, .. })
    ));
}

#[tokio::test]
async fn test_listing_failure_is_fatal_even_when_sloppy() {
    let (server, base_url) = start_site().await;

    Mock::given(method("GET"))
        .and(path("/u/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dest = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dest.path(), true);
    let result = Mirror::new(&config).unwrap().run().await;

    assert!(matches!(
        result,
        Err(MirrorError::HttpStatus { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_malformed_picture_reference_is_fatal() {
    let (server, base_url) = start_site().await;
    mount_listing(&server, &base_url, &["aaaaaaaa"]).await;

    let xml = r#"<mediaSet><mediaSetItems><mediaSetItem>
        <Title>Broken</Title>
        <InfoURL>http://elsewhere.example.com/photo/nope.xml</InfoURL>
        <file><Mime>image/jpeg</Mime><Bytes>10</Bytes></file>
        </mediaSetItem></mediaSetItems></mediaSet>"#;
    mount_body(&server, "/u/gallery/aaaaaaaa.xml", xml.to_string(), 1).await;

    let dest = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dest.path(), true);
    let result = Mirror::new(&config).unwrap().run().await;

    assert!(matches!(result, Err(MirrorError::MalformedReference(_))));
}

#[tokio::test]
async fn test_single_local_slot_still_drains() {
    let (server, base_url) = start_site().await;
    mount_listing(&server, &base_url, &["aaaaaaaa"]).await;

    let b_url = format!("{}/gallery/bbbbbbbb.xml", base_url);
    mount_body(
        &server,
        "/u/gallery/aaaaaaaa.xml",
        gallery_xml(
            &base_url,
            &[],
            &[&b_url],
            &[("0000abcd", 16, "image/jpeg"), ("0000efgh", 8, "image/png")],
        ),
        1,
    )
    .await;
    mount_body(
        &server,
        "/u/gallery/bbbbbbbb.xml",
        gallery_xml(&base_url, &[], &[], &[("0000ijkl", 4, "image/tiff")]),
        1,
    )
    .await;
    for (key, size) in [("0000abcd", 16), ("0000efgh", 8), ("0000ijkl", 4)] {
        mount_body(&server, &format!("/u/pic/{}.xml", key), pic_xml(key), 1).await;
        mount_blob(&server, key, size, 1).await;
    }

    let dest = TempDir::new().unwrap();
    let mut config = create_test_config(&base_url, dest.path(), false);
    config.mirror.max_local_ops = 1;
    config.mirror.max_network_ops = 1;
    let mirror = Mirror::new(&config).unwrap();

    let summary = tokio::time::timeout(std::time::Duration::from_secs(10), mirror.run())
        .await
        .expect("Mirror did not drain")
        .expect("Mirror failed");

    assert_eq!(summary.galleries, 2);
    assert_eq!(summary.pictures, 3);
    assert!(summary.is_clean());
    assert_eq!(mirror.gate().in_flight(), 0);

    let root = dest.path();
    assert!(root.join("pic-0000abcd.jpg").is_file());
    assert!(root.join("pic-0000efgh.png").is_file());
    // Unknown MIME types keep the separating dot
    assert_eq!(std::fs::metadata(root.join("pic-0000ijkl.")).unwrap().len(), 4);
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_running() {
    let dest = TempDir::new().unwrap();
    let mut config = create_test_config("ftp://example.com/u", dest.path(), false);
    config.mirror.max_local_ops = 1;

    assert!(matches!(
        Mirror::new(&config),
        Err(MirrorError::Config(_))
    ));
}
