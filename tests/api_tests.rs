//! End-to-end tests for the artifact and wizard endpoints.

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use artifacts_online::api::AppState;
use artifacts_online::clients::chat::{ChatClient, ChatError, ChatResponse, Choice, Message};
use artifacts_online::config::Config;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const BASE: &str = "/api/v1";

/// Chat model stand-in that records what it was asked.
struct FakeChat {
    reply: Result<String, (u16, String)>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl FakeChat {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn failing(status: u16, message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err((status, message.to_string())),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl ChatClient for FakeChat {
    async fn complete(&self, messages: &[Message]) -> Result<ChatResponse, ChatError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        match &self.reply {
            Ok(text) => Ok(ChatResponse {
                choices: vec![Choice {
                    index: 0,
                    message: Message {
                        role: "assistant".to_string(),
                        content: text.clone(),
                    },
                }],
            }),
            Err((status, message)) => Err(ChatError::Upstream {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

struct TestApp {
    router: Router,
    images_dir: PathBuf,
}

async fn spawn_app(chat: Arc<FakeChat>) -> TestApp {
    let root = std::env::temp_dir().join(format!("artifacts-api-test-{}", uuid::Uuid::new_v4()));
    let images_dir = root.join("images");

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", root.join("artifacts.db").display());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.storage.images_path = images_dir.display().to_string();
    config.storage.public_base_url = "http://localhost:8080/images".to_string();

    let state = AppState::with_chat_client(config, chat)
        .await
        .expect("failed to create app state");

    TestApp {
        router: artifacts_online::api::router(Arc::new(state)),
        images_dir,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, headers, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn authed(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let credentials = STANDARD.encode(format!("{username}:{password}"));
    let request = Request::builder()
        .method("POST")
        .uri(format!("{BASE}/users/login"))
        .header(header::AUTHORIZATION, format!("Basic {credentials}"))
        .body(Body::empty())
        .unwrap();

    let (status, _, json) = send(app, request).await;
    assert_eq!(status, StatusCode::OK, "login failed: {json}");
    json["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_find_artifact_by_id_is_public() {
    let app = spawn_app(FakeChat::replying("")).await.router;

    let (status, _, json) = send(&app, get(&format!("{BASE}/artifacts/125080601744904191"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["flag"], true);
    assert_eq!(json["code"], 200);
    assert_eq!(json["message"], "Find One Success");
    assert_eq!(json["data"]["name"], "Deluminator");
    assert_eq!(json["data"]["imageUrl"], "ImageUrl");
    assert_eq!(json["data"]["owner"]["name"], "Albus Dumbledore");
    assert_eq!(json["data"]["owner"]["numberOfArtifacts"], 2);
}

#[tokio::test]
async fn test_find_missing_artifact() {
    let app = spawn_app(FakeChat::replying("")).await.router;

    let (status, _, json) = send(&app, get(&format!("{BASE}/artifacts/1250808601744904999"))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["flag"], false);
    assert_eq!(json["code"], 404);
    assert_eq!(
        json["message"],
        "Could not find artifact with Id 1250808601744904999 :("
    );
    assert!(json["data"].is_null());
}

#[tokio::test]
async fn test_list_artifacts_is_paged() {
    let app = spawn_app(FakeChat::replying("")).await.router;

    let (status, _, json) = send(&app, get(&format!("{BASE}/artifacts?page=1&size=4"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Find All Success");
    assert_eq!(json["data"]["totalElements"], 6);
    assert_eq!(json["data"]["totalPages"], 2);
    assert_eq!(json["data"]["number"], 1);
    assert_eq!(json["data"]["size"], 4);
    assert_eq!(json["data"]["content"].as_array().unwrap().len(), 2);

    let (_, _, json) = send(&app, get(&format!("{BASE}/artifacts"))).await;
    assert_eq!(json["data"]["size"], 20);
    assert_eq!(json["data"]["content"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_huge_page_index_returns_empty_page() {
    let app = spawn_app(FakeChat::replying("")).await.router;

    let (status, _, json) = send(
        &app,
        get(&format!("{BASE}/artifacts?page=18446744073709551615&size=20")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["totalElements"], 6);
    assert!(json["data"]["content"].as_array().unwrap().is_empty());

    let (status, _, json) = send(
        &app,
        json_request(
            "POST",
            &format!("{BASE}/artifacts/search?page=18446744073709551615&size=100"),
            None,
            &json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["content"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_artifacts() {
    let app = spawn_app(FakeChat::replying("")).await.router;
    let uri = format!("{BASE}/artifacts/search?page=0&size=10");

    let (status, _, json) = send(&app, json_request("POST", &uri, None, &json!({"name": "WAND"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Search Success");
    assert_eq!(json["data"]["totalElements"], 1);
    assert_eq!(json["data"]["content"][0]["name"], "Elder Wand");

    let (_, _, json) = send(
        &app,
        json_request(
            "POST",
            &uri,
            None,
            &json!({"ownerName": "harry potter", "color": "red"}),
        ),
    )
    .await;
    assert_eq!(json["data"]["totalElements"], 2);

    let (_, _, json) = send(
        &app,
        json_request(
            "POST",
            &uri,
            None,
            &json!({"name": "the", "description": "hogwarts"}),
        ),
    )
    .await;
    assert_eq!(json["data"]["totalElements"], 2);

    let (_, _, json) = send(&app, json_request("POST", &uri, None, &json!({}))).await;
    assert_eq!(json["data"]["totalElements"], 6);
}

#[tokio::test]
async fn test_artifact_writes_require_token() {
    let app = spawn_app(FakeChat::replying("")).await.router;
    let body = json!({"name": "Portkey", "description": "Travel", "imageUrl": "ImageUrl"});

    let (status, headers, json) =
        send(&app, json_request("POST", &format!("{BASE}/artifacts"), None, &body)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], 401);
    assert_eq!(json["message"], "Login credentials are missing");
    assert!(headers.get(header::WWW_AUTHENTICATE).is_none());
}

#[tokio::test]
async fn test_artifact_lifecycle() {
    let app = spawn_app(FakeChat::replying("")).await.router;
    let token = login(&app, "eric", "654321").await;

    let body = json!({"name": "Portkey", "description": "An object enchanted to transport", "imageUrl": "ImageUrl"});
    let (status, _, json) = send(
        &app,
        json_request("POST", &format!("{BASE}/artifacts"), Some(&token), &body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Add Success");
    let id = json["data"]["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert!(json["data"]["owner"].is_null());

    let update = json!({"id": "ignored", "name": "Portkey (used)", "description": "Spent", "imageUrl": "ImageUrl2"});
    let (status, _, json) = send(
        &app,
        json_request("PUT", &format!("{BASE}/artifacts/{id}"), Some(&token), &update),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Update Success");
    assert_eq!(json["data"]["id"], id.as_str());
    assert_eq!(json["data"]["name"], "Portkey (used)");

    let (status, _, json) = send(&app, authed("DELETE", &format!("{BASE}/artifacts/{id}"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Delete Success");
    assert!(json["data"].is_null());

    let (status, _, _) = send(&app, get(&format!("{BASE}/artifacts/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, json) = send(&app, authed("DELETE", &format!("{BASE}/artifacts/{id}"), &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], format!("Could not find artifact with Id {id} :("));
}

#[tokio::test]
async fn test_add_artifact_validation() {
    let app = spawn_app(FakeChat::replying("")).await.router;
    let token = login(&app, "eric", "654321").await;

    let (status, _, json) = send(
        &app,
        json_request(
            "POST",
            &format!("{BASE}/artifacts"),
            Some(&token),
            &json!({"name": "", "description": "d"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], 400);
    assert_eq!(
        json["message"],
        "provided argument are invalid, see data for details."
    );
    assert_eq!(json["data"]["name"], "name is required.");
    assert_eq!(json["data"]["imageUrl"], "imageUrl is required.");
    assert!(json["data"]["description"].is_null());

    let request = Request::builder()
        .method("POST")
        .uri(format!("{BASE}/artifacts"))
        .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, json) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["data"]["body"].is_string());
}

#[tokio::test]
async fn test_summarize_artifacts() {
    let chat = FakeChat::replying("Six artifacts, mostly owned by Albus and Harry.");
    let app = spawn_app(chat.clone()).await.router;

    let (status, _, json) = send(&app, get(&format!("{BASE}/artifacts/summary"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Summarize Success");
    assert_eq!(json["data"], "Six artifacts, mostly owned by Albus and Harry.");

    let requests = chat.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].len(), 2);
    assert_eq!(requests[0][0].role, "system");
    let sent: Value = serde_json::from_str(&requests[0][1].content).unwrap();
    assert_eq!(sent.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_summarize_passes_through_upstream_status() {
    let app = spawn_app(FakeChat::failing(401, "Incorrect API key provided"))
        .await
        .router;

    let (status, _, json) = send(&app, get(&format!("{BASE}/artifacts/summary"))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], 401);
    assert_eq!(
        json["message"],
        "A rest client error occurs, see data for details."
    );
    assert_eq!(json["data"], "Incorrect API key provided");
}

#[tokio::test]
async fn test_upload_image_to_local_storage() {
    let test_app = spawn_app(FakeChat::replying("")).await;
    let app = test_app.router;
    let token = login(&app, "eric", "654321").await;

    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"wand.png\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri(format!("{BASE}/artifacts/images?containerName=artifact-images"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap();

    let (status, _, json) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["message"], "Image Upload Success");

    let url = json["data"].as_str().unwrap();
    let path = url.strip_prefix("http://localhost:8080").unwrap();
    assert!(path.starts_with("/images/artifact-images/"));
    assert!(path.ends_with(".png"));

    let file_name = path.rsplit('/').next().unwrap();
    let stored = test_app.images_dir.join("artifact-images").join(file_name);
    assert_eq!(std::fs::read(stored).unwrap(), b"PNGDATA");

    let response = app.clone().oneshot(get(path)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"PNGDATA");
}

#[tokio::test]
async fn test_upload_image_requires_container_name() {
    let app = spawn_app(FakeChat::replying("")).await.router;
    let token = login(&app, "eric", "654321").await;

    let request = Request::builder()
        .method("POST")
        .uri(format!("{BASE}/artifacts/images"))
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=B")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from("--B--\r\n"))
        .unwrap();

    let (status, _, json) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["data"]["containerName"], "containerName is required.");
}

#[tokio::test]
async fn test_wizards_require_token() {
    let app = spawn_app(FakeChat::replying("")).await.router;

    let (status, _, json) = send(&app, get(&format!("{BASE}/wizards"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Login credentials are missing");
}

#[tokio::test]
async fn test_wizard_crud() {
    let app = spawn_app(FakeChat::replying("")).await.router;
    let token = login(&app, "eric", "654321").await;

    let (status, _, json) = send(&app, authed("GET", &format!("{BASE}/wizards"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Find All Success");
    let counts: Vec<u64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["numberOfArtifacts"].as_u64().unwrap())
        .collect();
    assert_eq!(counts, vec![2, 2, 1]);

    let (status, _, json) = send(
        &app,
        json_request("POST", &format!("{BASE}/wizards"), Some(&token), &json!({"name": "Hermione Granger"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Add Success");
    assert_eq!(json["data"]["numberOfArtifacts"], 0);
    let id = json["data"]["id"].as_i64().unwrap();

    let (status, _, json) = send(
        &app,
        json_request("PUT", &format!("{BASE}/wizards/{id}"), Some(&token), &json!({"name": "Hermione"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Update Success");
    assert_eq!(json["data"]["name"], "Hermione");

    let (status, _, json) = send(&app, authed("GET", &format!("{BASE}/wizards/{id}"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Find One Success");

    let (status, _, json) = send(&app, authed("DELETE", &format!("{BASE}/wizards/{id}"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Delete Success");

    let (status, _, json) = send(&app, authed("GET", &format!("{BASE}/wizards/{id}"), &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], format!("Could not find wizard with Id {id} :("));

    let (status, _, json) = send(&app, authed("GET", &format!("{BASE}/wizards/abc"), &token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["data"]["wizardId"].is_string());
}

#[tokio::test]
async fn test_assign_artifact_moves_ownership() {
    let app = spawn_app(FakeChat::replying("")).await.router;
    let token = login(&app, "eric", "654321").await;

    let (status, _, json) = send(
        &app,
        authed("PUT", &format!("{BASE}/wizards/3/artifacts/125080601744904192"), &token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Artifact Assignment Success");
    assert!(json["data"].is_null());

    let (_, _, json) = send(&app, authed("GET", &format!("{BASE}/wizards/2"), &token)).await;
    assert_eq!(json["data"]["numberOfArtifacts"], 1);
    let (_, _, json) = send(&app, authed("GET", &format!("{BASE}/wizards/3"), &token)).await;
    assert_eq!(json["data"]["numberOfArtifacts"], 2);

    let (_, _, json) = send(&app, get(&format!("{BASE}/artifacts/125080601744904192"))).await;
    assert_eq!(json["data"]["owner"]["id"], 3);
}

#[tokio::test]
async fn test_assign_artifact_not_found() {
    let app = spawn_app(FakeChat::replying("")).await.router;
    let token = login(&app, "eric", "654321").await;

    let (status, _, json) = send(
        &app,
        authed("PUT", &format!("{BASE}/wizards/99/artifacts/1250808601744904999"), &token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        json["message"],
        "Could not find artifact with Id 1250808601744904999 :("
    );

    let (status, _, json) = send(
        &app,
        authed("PUT", &format!("{BASE}/wizards/99/artifacts/125080601744904192"), &token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Could not find wizard with Id 99 :(");

    let (_, _, json) = send(&app, get(&format!("{BASE}/artifacts/125080601744904192"))).await;
    assert_eq!(json["data"]["owner"]["id"], 2);
}

#[tokio::test]
async fn test_delete_wizard_orphans_artifacts() {
    let app = spawn_app(FakeChat::replying("")).await.router;
    let token = login(&app, "eric", "654321").await;

    let (status, _, _) = send(&app, authed("DELETE", &format!("{BASE}/wizards/1"), &token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, json) = send(&app, get(&format!("{BASE}/artifacts/125080601744904191"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["owner"].is_null());
}
