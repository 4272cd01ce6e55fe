//! Contentful client against a wiremock server.

use assetsync_catalog::{CatalogError, ContentfulClient};
use assetsync_config::CatalogConfig;
use assetsync_core::{CatalogClient, IdentityToken, RecordRef, RemoteAction};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ASSETS: &str = "/spaces/space1/environments/master/assets";

fn config(server: &MockServer) -> CatalogConfig {
    CatalogConfig {
        space_id: "space1".to_string(),
        access_token: "secret".to_string(),
        api_url: server.uri(),
        upload_url: server.uri(),
        processing_wait_ms: 1,
        page_size: 2,
        ..CatalogConfig::default()
    }
}

fn token(id: &str) -> IdentityToken {
    IdentityToken::new(id).unwrap()
}

fn asset(id: &str, version: u64, title: &str) -> serde_json::Value {
    json!({
        "sys": { "id": id, "version": version },
        "fields": {
            "title": { "en-US": title },
            "description": { "en-US": "" }
        }
    })
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_requires_credentials() {
    let err = ContentfulClient::new(&CatalogConfig::default()).unwrap_err();
    assert!(matches!(err, CatalogError::NotConfigured(_)));
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_follows_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ASSETS))
        .and(query_param("skip", "0"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [asset("a1", 1, "Rose"), asset("a2", 1, "Tulip")],
            "total": 3, "skip": 0, "limit": 2
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ASSETS))
        .and(query_param("skip", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [asset("a3", 4, "Fern")],
            "total": 3, "skip": 2, "limit": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ContentfulClient::new(&config(&server)).unwrap();
    let records = client.list_records().await.unwrap();

    assert_eq!(
        records,
        vec![
            RecordRef::new("a1", "Rose"),
            RecordRef::new("a2", "Tulip"),
            RecordRef::new("a3", "Fern"),
        ]
    );
}

#[tokio::test]
async fn test_list_maps_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ASSETS))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "message": "The access token you sent could not be found or is invalid." })),
        )
        .mount(&server)
        .await;

    let client = ContentfulClient::new(&config(&server)).unwrap();
    let err = client.list_records().await.unwrap_err();

    assert_eq!(err.action, RemoteAction::List);
    assert!(err.message.contains("401"));
    assert!(err.message.contains("access token"));
}

// ============================================================================
// Create / rename / delete
// ============================================================================

#[tokio::test]
async fn test_create_returns_asset_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ASSETS))
        .and(body_partial_json(json!({
            "fields": {
                "title": { "en-US": "Rose" },
                "description": { "en-US": "Red petals" },
                "file": { "en-US": { "fileName": "$Rose-Red petals.jpg", "contentType": "image/jpeg" } }
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(asset("new-id", 1, "Rose")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ContentfulClient::new(&config(&server)).unwrap();
    let record = client
        .create_record("Rose", "Red petals", "$Rose-Red petals.jpg")
        .await
        .unwrap();

    assert_eq!(record, RecordRef::new("new-id", "Rose"));
}

#[tokio::test]
async fn test_update_name_puts_with_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/a1", ASSETS)))
        .respond_with(ResponseTemplate::new(200).set_body_json(asset("a1", 7, "Rose")))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/a1", ASSETS)))
        .and(header("X-Contentful-Version", "7"))
        .and(body_json(json!({
            "fields": {
                "title": { "en-US": "Tulip" },
                "description": { "en-US": "Yellow" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(asset("a1", 8, "Tulip")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ContentfulClient::new(&config(&server)).unwrap();
    client
        .update_name(&token("a1"), "Tulip", "Yellow")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_name_of_missing_asset_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/gone", ASSETS)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "The resource could not be found." })))
        .mount(&server)
        .await;

    let client = ContentfulClient::new(&config(&server)).unwrap();
    let err = client
        .update_name(&token("gone"), "Tulip", "")
        .await
        .unwrap_err();

    assert_eq!(err.action, RemoteAction::UpdateName);
    assert_eq!(err.target, "gone");
}

#[tokio::test]
async fn test_delete_record() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/a1", ASSETS)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = ContentfulClient::new(&config(&server)).unwrap();
    client.delete_record(&token("a1")).await.unwrap();
}

// ============================================================================
// Upload
// ============================================================================

#[tokio::test]
async fn test_upload_links_and_processes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/spaces/space1/uploads"))
        .and(header("Content-Type", "application/octet-stream"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sys": { "id": "up1" } })))
        .expect(1)
        .mount(&server)
        .await;

    // First GET before linking, later GETs while polling
    Mock::given(method("GET"))
        .and(path(format!("{}/a1", ASSETS)))
        .respond_with(ResponseTemplate::new(200).set_body_json(asset("a1", 2, "Rose")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/a1", ASSETS)))
        .and(header("X-Contentful-Version", "2"))
        .and(body_partial_json(json!({
            "fields": { "file": { "en-US": {
                "fileName": "$Rose-watermarked.jpg",
                "uploadFrom": { "sys": { "type": "Link", "linkType": "Upload", "id": "up1" } }
            } } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(asset("a1", 3, "Rose")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/a1/files/en-US/process", ASSETS)))
        .and(header("X-Contentful-Version", "3"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/a1", ASSETS)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sys": { "id": "a1", "version": 4 },
            "fields": { "file": { "en-US": { "url": "//images.ctfassets.net/a1.jpg" } } }
        })))
        .mount(&server)
        .await;

    let client = ContentfulClient::new(&config(&server)).unwrap();
    client
        .upload_asset(&token("a1"), "$Rose-watermarked.jpg", vec![0xFF, 0xD8, 0xFF, 0xD9])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_upload_gives_up_when_never_processed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/spaces/space1/uploads"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sys": { "id": "up1" } })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/a1", ASSETS)))
        .respond_with(ResponseTemplate::new(200).set_body_json(asset("a1", 2, "Rose")))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/a1", ASSETS)))
        .respond_with(ResponseTemplate::new(200).set_body_json(asset("a1", 3, "Rose")))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/a1/files/en-US/process", ASSETS)))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = ContentfulClient::new(&config(&server)).unwrap();
    let err = client
        .upload_asset(&token("a1"), "$Rose-watermarked.jpg", vec![1, 2, 3])
        .await
        .unwrap_err();

    assert_eq!(err.action, RemoteAction::Upload);
    assert!(err.message.contains("not processed"));
}
