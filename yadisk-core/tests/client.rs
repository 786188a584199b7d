use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yadisk_core::{ResourceType, YadiskClient, YadiskError};

#[tokio::test]
async fn list_directory_sends_oauth_header_and_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/disk/resources"))
        .and(query_param("path", "/Docs/"))
        .and(query_param("limit", "10000"))
        .and(header("authorization", "OAuth test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {
                "limit": 10000,
                "offset": 0,
                "total": 2,
                "items": [
                    {
                        "path": "disk:/Docs/Archive",
                        "name": "Archive",
                        "type": "dir"
                    },
                    {
                        "path": "disk:/Docs/A.txt",
                        "name": "A.txt",
                        "type": "file",
                        "size": 1,
                        "modified": "2024-01-01T00:00:00+00:00"
                    }
                ]
            }
        })))
        .mount(&server)
        .await;

    let client = YadiskClient::with_base_url(&server.uri(), "test-token").unwrap();
    let list = client.list_directory("/Docs/", Some(10_000)).await.unwrap();

    assert_eq!(list.total, 2);
    assert_eq!(list.items[0].name, "Archive");
    assert_eq!(list.items[0].resource_type, ResourceType::Dir);
    assert_eq!(list.items[1].size, Some(1));
}

#[tokio::test]
async fn list_directory_requires_embedded_items() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/disk/resources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "path": "disk:/Docs/A.txt",
            "name": "A.txt",
            "type": "file"
        })))
        .mount(&server)
        .await;

    let client = YadiskClient::with_base_url(&server.uri(), "test-token").unwrap();
    let err = client
        .list_directory("/Docs/A.txt", None)
        .await
        .expect_err("file resource has no embedded listing");

    assert!(matches!(err, YadiskError::MissingEmbedded));
}

#[tokio::test]
async fn list_directory_rejects_non_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/disk/resources"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = YadiskClient::with_base_url(&server.uri(), "test-token").unwrap();
    let err = client.list_directory("/", None).await.unwrap_err();

    assert!(matches!(err, YadiskError::Request(_)));
    assert!(!err.is_unauthorized());
}

#[tokio::test]
async fn list_directory_classifies_expired_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/disk/resources"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "UnauthorizedError",
            "description": "Unauthorized"
        })))
        .mount(&server)
        .await;

    let client = YadiskClient::with_base_url(&server.uri(), "stale-token").unwrap();
    let err = client.list_directory("/", None).await.unwrap_err();

    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn get_upload_link_sends_overwrite_flag() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/disk/resources/upload"))
        .and(query_param("path", "/Docs/Hello World.txt"))
        .and(query_param("overwrite", "true"))
        .and(header("authorization", "OAuth test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "href": "https://uploader.example/upload-target/1",
            "method": "PUT",
            "templated": false
        })))
        .mount(&server)
        .await;

    let client = YadiskClient::with_base_url(&server.uri(), "test-token").unwrap();
    let link = client
        .get_upload_link("/Docs/Hello World.txt", true)
        .await
        .unwrap();

    assert_eq!(link.href.as_str(), "https://uploader.example/upload-target/1");
}

#[tokio::test]
async fn get_upload_link_surfaces_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/disk/resources/upload"))
        .respond_with(ResponseTemplate::new(507).set_body_string("insufficient storage"))
        .mount(&server)
        .await;

    let client = YadiskClient::with_base_url(&server.uri(), "test-token").unwrap();
    let err = client.get_upload_link("/big.iso", true).await.unwrap_err();

    match err {
        YadiskError::Api { status, body } => {
            assert_eq!(status.as_u16(), 507);
            assert_eq!(body, "insufficient storage");
        }
        other => panic!("unexpected error: {other}"),
    }
}
