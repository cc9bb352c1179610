//! End-to-end tests against a mock of the OceanConnect platform.
//!
//! Starts an axum server on a random local port that mimics the login and
//! device-management endpoints, checks the auth headers on every call, and
//! drives the real `reqwest` transport against it.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query as QueryParams, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Form, Json, Router,
};
use oceanlink_core::models::{DeviceCommand, DeviceQuery, NotifyType, RegisterOptions};
use oceanlink_core::{ApiError, AuthError, ClientConfig, HttpTransport, OceanClient};
use serde::Deserialize;
use serde_json::{json, Value};

const APP_ID: &str = "app-1";
const SECRET: &str = "s3cret";

struct Platform {
    expires_in: i64,
    logins: AtomicUsize,
    unauthorized: AtomicUsize,
    token: Mutex<Option<String>>,
    devices: Mutex<HashMap<String, Value>>,
    commands: Mutex<Vec<Value>>,
    subscriptions: Mutex<Vec<Value>>,
}

type Shared = Arc<Platform>;

#[derive(Deserialize)]
struct LoginForm {
    #[serde(rename = "appId")]
    app_id: String,
    secret: String,
}

fn authorized(platform: &Platform, headers: &HeaderMap) -> Result<(), StatusCode> {
    let token = platform.token.lock().unwrap().clone();
    let auth = headers.get("Authorization").and_then(|v| v.to_str().ok());
    let app_key = headers.get("app_key").and_then(|v| v.to_str().ok());
    let content_type = headers.get("Content-Type").and_then(|v| v.to_str().ok());
    if token.is_some() && auth == token.as_deref() && app_key == Some(APP_ID) && content_type == Some("application/json") {
        Ok(())
    } else {
        platform.unauthorized.fetch_add(1, Ordering::SeqCst);
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn login(State(platform): State<Shared>, Form(form): Form<LoginForm>) -> Result<Json<Value>, StatusCode> {
    if form.app_id != APP_ID || form.secret != SECRET {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let n = platform.logins.fetch_add(1, Ordering::SeqCst) + 1;
    let token = format!("token-{n}");
    *platform.token.lock().unwrap() = Some(token.clone());
    Ok(Json(json!({
        "accessToken": token,
        "tokenType": "bearer",
        "expiresIn": platform.expires_in,
        "refreshToken": format!("refresh-{n}"),
        "scope": "default"
    })))
}

async fn register(
    State(platform): State<Shared>,
    headers: HeaderMap,
    QueryParams(params): QueryParams<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    authorized(&platform, &headers)?;
    if params.get("appId").map(String::as_str) != Some(APP_ID) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let imei = body["nodeId"].as_str().ok_or(StatusCode::BAD_REQUEST)?.to_string();
    let device_id = format!("dev-{imei}");
    platform.devices.lock().unwrap().insert(
        device_id.clone(),
        json!({"deviceId": device_id, "deviceInfo": {"nodeId": imei, "status": "INACTIVE"}, "services": []}),
    );
    Ok(Json(json!({
        "verifyCode": body["verifyCode"],
        "deviceId": device_id,
        "timeout": body["timeout"],
        "psk": "00112233"
    })))
}

async fn list_devices(
    State(platform): State<Shared>,
    headers: HeaderMap,
    QueryParams(params): QueryParams<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    authorized(&platform, &headers)?;
    let devices: Vec<Value> = platform.devices.lock().unwrap().values().cloned().collect();
    let page_no: u32 = params.get("pageNo").and_then(|v| v.parse().ok()).ok_or(StatusCode::BAD_REQUEST)?;
    let page_size: u32 = params.get("pageSize").and_then(|v| v.parse().ok()).unwrap_or(25);
    Ok(Json(json!({
        "totalCount": devices.len(),
        "pageNo": page_no,
        "pageSize": page_size,
        "devices": devices
    })))
}

async fn get_device(
    State(platform): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    authorized(&platform, &headers)?;
    let devices = platform.devices.lock().unwrap();
    devices.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn delete_device(
    State(platform): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    authorized(&platform, &headers)?;
    let mut devices = platform.devices.lock().unwrap();
    devices.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

async fn update_device(
    State(platform): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<StatusCode, StatusCode> {
    authorized(&platform, &headers)?;
    let mut devices = platform.devices.lock().unwrap();
    let device = devices.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    device["deviceInfo"]["name"] = body["name"].clone();
    device["deviceInfo"]["model"] = body["model"].clone();
    device["deviceInfo"]["status"] = json!("ONLINE");
    Ok(StatusCode::NO_CONTENT)
}

async fn command(
    State(platform): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<StatusCode, StatusCode> {
    authorized(&platform, &headers)?;
    platform.commands.lock().unwrap().push(body);
    Ok(StatusCode::CREATED)
}

async fn subscribe(
    State(platform): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<StatusCode, StatusCode> {
    authorized(&platform, &headers)?;
    platform.subscriptions.lock().unwrap().push(body);
    Ok(StatusCode::CREATED)
}

async fn start_platform(expires_in: i64) -> (SocketAddr, Shared) {
    let platform = Arc::new(Platform {
        expires_in,
        logins: AtomicUsize::new(0),
        unauthorized: AtomicUsize::new(0),
        token: Mutex::new(None),
        devices: Mutex::new(HashMap::new()),
        commands: Mutex::new(Vec::new()),
        subscriptions: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/iocm/app/sec/v1.1.0/login", post(login))
        .route("/iocm/app/reg/v1.2.0/devices", post(register))
        .route("/iocm/app/dm/v1.1.0/devices", get(list_devices))
        .route("/iocm/app/dm/v1.1.0/devices/{id}", get(get_device).delete(delete_device))
        .route("/iocm/app/dm/v1.2.0/devices/{id}", put(update_device))
        .route("/iocm/app/cmd/v1.4.0/deviceCommands", post(command))
        .route("/iocm/app/sub/v1.2.0/subscribe", post(subscribe))
        .with_state(platform.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (addr, platform)
}

fn client(addr: SocketAddr, secret: &str) -> OceanClient {
    let mut config = ClientConfig::new(format!("http://{addr}/"), "unused.crt", "unused.key", APP_ID, secret);
    config.end_user_id = "user-7".to_string();
    config.model = "WM-100".to_string();
    OceanClient::with_transport(config, HttpTransport::from_client(reqwest::Client::new())).unwrap()
}

#[tokio::test]
async fn device_lifecycle() {
    let (addr, platform) = start_platform(3600).await;
    let client = client(addr, SECRET);

    let reply = client
        .register_device("863703036528401", RegisterOptions { timeout: Some(300) })
        .await
        .unwrap();
    assert_eq!(reply.device_id, "dev-863703036528401");
    assert_eq!(reply.timeout, 300);

    client.set_device_info(&reply.device_id, "meter-01").await.unwrap();

    let device = client.get_device(&reply.device_id).await.unwrap();
    assert_eq!(device.display_name(), "meter-01");
    assert_eq!(device.device_info.model.as_deref(), Some("WM-100"));

    let page = client.get_devices(&DeviceQuery::page(0, 10)).await.unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.page_size, 10);

    let command = DeviceCommand::new(&reply.device_id, "Switch", "SET_STATE", json!({"state": "ON"}));
    client.send_command(&command).await.unwrap();
    assert_eq!(platform.commands.lock().unwrap()[0]["command"]["method"], "SET_STATE");

    let sub = client.subscribe("http://127.0.0.1:9/notify").await.unwrap();
    assert_eq!(sub.notify_type, NotifyType::DeviceDataChanged);
    assert_eq!(platform.subscriptions.lock().unwrap()[0]["callbackurl"], "http://127.0.0.1:9/notify");

    client.delete_device(&reply.device_id).await.unwrap();
    let err = client.get_device(&reply.device_id).await.unwrap_err();
    assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));

    assert_eq!(platform.logins.load(Ordering::SeqCst), 1);
    assert_eq!(platform.unauthorized.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn wrong_secret_fails_authentication_without_touching_devices() {
    let (addr, platform) = start_platform(3600).await;
    let client = client(addr, "wrong");

    let err = client.get_device("dev-1").await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::Authentication(AuthError::Rejected { status, .. }) if status == reqwest::StatusCode::UNAUTHORIZED
    ));
    assert_eq!(platform.unauthorized.load(Ordering::SeqCst), 0);
    assert!(client.session().snapshot().await.is_none());
}

#[tokio::test]
async fn token_shorter_than_margin_is_refused() {
    let (addr, _platform) = start_platform(60).await;
    let client = client(addr, SECRET);

    let err = client.get_devices(&DeviceQuery::default()).await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::Authentication(AuthError::InvalidLifetime { expires_in: 60, margin: 300 })
    ));
}

#[tokio::test]
async fn unreachable_platform_is_a_login_network_error() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(addr, SECRET);
    let err = client.get_device("dev-1").await.unwrap_err();
    assert!(matches!(err, ApiError::Authentication(AuthError::Network(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_login() {
    let (addr, platform) = start_platform(3600).await;
    let client = Arc::new(client(addr, SECRET));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.get_devices(&DeviceQuery::default()).await })
        })
        .collect();
    for result in futures::future::join_all(tasks).await {
        assert!(result.unwrap().is_ok());
    }

    assert_eq!(platform.logins.load(Ordering::SeqCst), 1);
    assert_eq!(platform.unauthorized.load(Ordering::SeqCst), 0);
}
