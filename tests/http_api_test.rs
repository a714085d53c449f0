use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};
use swagger_index::fetch::StaticFetcher;
use swagger_index::server::{router, AppState};
use swagger_index::{Ingestor, SqliteStore};

mod common;

/// Serve the API on an ephemeral port and return its base URL
async fn spawn_api() -> String {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let fetcher = Arc::new(StaticFetcher::new(common::petstore()));
    let ingestor = Arc::new(Ingestor::new(store, fetcher));
    let state = Arc::new(AppState::new(ingestor, "http://docs.local/v3/api-docs"));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn sync(client: &reqwest::Client, base: &str) -> Value {
    let response = client
        .post(format!("{}/sync", base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_sync_then_browse() {
    let base = spawn_api().await;
    let client = reqwest::Client::new();

    let summary = sync(&client, &base).await;
    assert_eq!(summary["version"], "2.0");
    assert_eq!(summary["endpoint_count"], 5);
    assert_eq!(summary["schema_count"], 3);

    let versions: Value = client
        .get(format!("{}/versions", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(versions.as_array().unwrap().len(), 1);
    assert_eq!(versions[0]["title"], "Petstore");

    let endpoints: Value = client
        .get(format!("{}/endpoints", base))
        .query(&[("path", "/pets"), ("method", "get")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let endpoints = endpoints.as_array().unwrap();
    assert_eq!(endpoints.len(), 2);
    assert!(endpoints.iter().all(|e| e["method"] == "GET"));

    let id = endpoints[0]["id"].as_i64().unwrap();
    let details: Value = client
        .get(format!("{}/endpoints/{}", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(details["path"], "/pets");
    assert_eq!(details["parameters"][0]["name"], "limit");
    assert_eq!(details["parameters"][0]["location"], "query");

    let schema: Value = client
        .get(format!("{}/schemas/2.0/Pet", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(schema["required_fields"], json!(["name"]));
    assert_eq!(
        schema["properties"]["category"],
        json!({"type": "ref", "ref": "Category", "description": ""})
    );

    let stats: Value = client
        .get(format!("{}/stats", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats, json!({"versions": 1, "endpoints": 5, "parameters": 3, "schemas": 3}));
}

#[tokio::test]
async fn test_not_found_and_bad_input() {
    let base = spawn_api().await;
    let client = reqwest::Client::new();
    sync(&client, &base).await;

    let response = client
        .get(format!("{}/endpoints/9999", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("9999"));

    let response = client
        .get(format!("{}/schemas/2.0/Ghost", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .get(format!("{}/endpoints?method=FETCH", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("FETCH"));
}

#[tokio::test]
async fn test_delete_version() {
    let base = spawn_api().await;
    let client = reqwest::Client::new();
    sync(&client, &base).await;

    let response = client
        .delete(format!("{}/versions/2.0", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"version": "2.0", "deleted": true}));

    let response = client
        .delete(format!("{}/versions/2.0", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let endpoints: Value = client
        .get(format!("{}/endpoints", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(endpoints, json!([]));
}
