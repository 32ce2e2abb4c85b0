#![allow(clippy::unwrap_used)]
// Integration tests for `PocketBaseClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pbsync_api::types::{CollectionWrite, SchemaFieldWrite};
use pbsync_api::{Credentials, Error, PocketBaseClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, PocketBaseClient) {
    let server = MockServer::start().await;
    let client = PocketBaseClient::with_client(reqwest::Client::new(), &server.uri()).unwrap();
    client.set_token(SecretString::from("test-token".to_owned()));
    (server, client)
}

fn posts_record() -> serde_json::Value {
    json!({
        "id": "abc123",
        "created": "2024-06-15 10:30:00.000Z",
        "updated": "2024-06-15 10:30:00.000Z",
        "name": "posts",
        "type": "base",
        "system": false,
        "schema": [{
            "system": false,
            "id": "fld00001",
            "name": "title",
            "type": "text",
            "required": true,
            "presentable": false,
            "unique": false,
            "options": { "min": null, "max": null, "pattern": "" }
        }],
        "indexes": [],
        "listRule": "",
        "viewRule": "",
        "createRule": null,
        "updateRule": null,
        "deleteRule": null,
        "options": {}
    })
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_password_auth_stores_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/admins/auth-with-password"))
        .and(body_json(json!({"identity": "admin@example.com", "password": "hunter22"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"token": "issued", "admin": {}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/collections/posts"))
        .and(header("authorization", "Bearer issued"))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts_record()))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = Credentials::Password {
        identity: "admin@example.com".into(),
        password: SecretString::from("hunter22".to_owned()),
    };
    let client = PocketBaseClient::connect(&server.uri(), &credentials, &TransportConfig::default())
        .await
        .unwrap();

    let record = client.get_collection("posts").await.unwrap();
    assert_eq!(record.id.as_deref(), Some("abc123"));
}

#[tokio::test]
async fn test_password_auth_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/admins/auth-with-password"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 400,
            "message": "Failed to authenticate.",
            "data": {}
        })))
        .mount(&server)
        .await;

    let client = PocketBaseClient::with_client(reqwest::Client::new(), &server.uri()).unwrap();
    let secret = SecretString::from("wrong".to_owned());
    let result = client.authenticate("admin@example.com", &secret).await;

    match result {
        Err(Error::Authentication { message }) => assert_eq!(message, "Failed to authenticate."),
        other => panic!("expected Authentication error, got: {other:?}"),
    }
    let after = client.get_collection("posts").await;
    assert!(matches!(after, Err(Error::NoSession)), "got: {after:?}");
}

#[tokio::test]
async fn test_request_without_session_is_rejected_locally() {
    let server = MockServer::start().await;
    let client = PocketBaseClient::with_client(reqwest::Client::new(), &server.uri()).unwrap();

    let result = client.get_collection("posts").await;
    assert!(matches!(result, Err(Error::NoSession)), "got: {result:?}");
}

// ── Collection tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_get_collection() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/collections/abc123"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts_record()))
        .mount(&server)
        .await;

    let record = client.get_collection("abc123").await.unwrap();

    assert_eq!(record.name.as_deref(), Some("posts"));
    assert_eq!(record.collection_type.as_deref(), Some("base"));
    assert_eq!(record.list_rule, Some(Some(String::new())));
    assert_eq!(record.create_rule, Some(None));
    let schema = record.schema.unwrap();
    assert_eq!(schema.len(), 1);
    assert_eq!(schema[0].name.as_deref(), Some("title"));
    assert_eq!(schema[0].required, Some(true));
}

#[tokio::test]
async fn test_get_collection_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/collections/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 404,
            "message": "The requested resource wasn't found.",
            "data": {}
        })))
        .mount(&server)
        .await;

    let err = client.get_collection("missing").await.unwrap_err();

    assert!(err.is_not_found(), "got: {err:?}");
    match err {
        Error::Api { data, .. } => assert!(data.is_none(), "empty data should be dropped"),
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_create_collection_sends_full_body() {
    let (server, client) = setup().await;

    let body = CollectionWrite {
        name: Some("posts".into()),
        collection_type: Some("base".into()),
        schema: Some(vec![SchemaFieldWrite {
            id: None,
            name: "title".into(),
            field_type: "text".into(),
            required: true,
            unique: false,
            options: serde_json::Map::new(),
        }]),
        indexes: Some(vec![]),
        list_rule: Some(String::new()),
        view_rule: Some(String::new()),
        create_rule: Some(String::new()),
        update_rule: Some(String::new()),
        delete_rule: Some(String::new()),
        options: None,
    };

    Mock::given(method("POST"))
        .and(path("/api/collections"))
        .and(body_json(json!({
            "name": "posts",
            "type": "base",
            "schema": [{
                "name": "title",
                "type": "text",
                "required": true,
                "unique": false,
                "options": {}
            }],
            "indexes": [],
            "listRule": "",
            "viewRule": "",
            "createRule": "",
            "updateRule": "",
            "deleteRule": ""
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts_record()))
        .expect(1)
        .mount(&server)
        .await;

    let record = client.create_collection(&body).await.unwrap();
    assert_eq!(record.id.as_deref(), Some("abc123"));
}

#[tokio::test]
async fn test_update_collection_sends_only_changes() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/collections/abc123"))
        .and(body_json(json!({"name": "articles"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "abc123",
            "name": "articles",
            "updated": "2024-06-16 08:00:00.000Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let body = CollectionWrite {
        name: Some("articles".into()),
        ..CollectionWrite::default()
    };
    let record = client.update_collection("abc123", &body).await.unwrap();

    assert_eq!(record.name.as_deref(), Some("articles"));
    assert!(record.schema.is_none());
}

#[tokio::test]
async fn test_update_validation_error_keeps_details() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/collections/abc123"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 400,
            "message": "Failed to update collection.",
            "data": { "name": { "code": "validation_collection_name_exists", "message": "Collection name must be unique." } }
        })))
        .mount(&server)
        .await;

    let body = CollectionWrite {
        name: Some("users".into()),
        ..CollectionWrite::default()
    };
    let err = client.update_collection("abc123", &body).await.unwrap_err();

    match err {
        Error::Api { status, message, data } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Failed to update collection.");
            assert!(data.unwrap().get("name").is_some());
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_collection() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/collections/abc123"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_collection("abc123").await.unwrap();
}

#[tokio::test]
async fn test_list_collections_paging() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/collections"))
        .and(query_param("page", "1"))
        .and(query_param("perPage", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "perPage": 50,
            "totalItems": 1,
            "totalPages": 1,
            "items": [posts_record()]
        })))
        .mount(&server)
        .await;

    let page = client.list_collections(1, 50).await.unwrap();
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].name.as_deref(), Some("posts"));
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/collections/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client.get_collection("abc123").await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }), "got: {err:?}");
}
