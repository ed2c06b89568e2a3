//! In-process fake of the CloudPanel REST API

#![allow(dead_code)]

use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use cloudpanel_client::{ApiClient, NotificationCenter, Panel, ReqwestTransport};
use cloudpanel_common::{ClientConfig, MemoryStore};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub const PASSWORD: &str = "secret";

#[derive(Default)]
pub struct Backend {
    pub vms: Mutex<Vec<Value>>,
    pub services: Mutex<Vec<Value>>,
    pub token: Mutex<Option<String>>,
    /// When set, deletes are refused with this detail
    pub refuse_delete: Mutex<Option<String>>,
    pub hits: Mutex<Vec<String>>,
    pub next_token: Mutex<u32>,
}

impl Backend {
    fn hit(&self, route: impl Into<String>) {
        self.hits.lock().push(route.into());
    }

    pub fn count(&self, route: &str) -> usize {
        self.hits.lock().iter().filter(|h| *h == route).count()
    }

    pub fn expire_token(&self) {
        *self.token.lock() = None;
    }
}

type Shared = Arc<Backend>;

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

/// Rejects requests whose bearer the backend no longer knows
fn check_bearer(backend: &Backend, headers: &HeaderMap) -> Result<(), Response> {
    let Some(value) = headers.get("authorization").and_then(|v| v.to_str().ok()) else {
        return Ok(());
    };
    let presented = value.trim_start_matches("Bearer ").to_string();
    if backend.token.lock().as_deref() == Some(presented.as_str()) {
        Ok(())
    } else {
        Err(detail(StatusCode::UNAUTHORIZED, "Invalid token"))
    }
}

async fn login(State(b): State<Shared>, Form(form): Form<HashMap<String, String>>) -> Response {
    b.hit("POST /login");
    if form.get("password").map(String::as_str) != Some(PASSWORD) {
        return detail(StatusCode::UNAUTHORIZED, "Incorrect username or password");
    }
    let token = {
        let mut next = b.next_token.lock();
        *next += 1;
        format!("tok-{}", next)
    };
    *b.token.lock() = Some(token.clone());
    Json(json!({ "access_token": token, "token_type": "bearer" })).into_response()
}

async fn verify_session(
    State(b): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    b.hit("GET /verify-session");
    let valid = query.get("token").is_some() && b.token.lock().as_ref() == query.get("token");
    if valid {
        Json(json!({
            "success": true,
            "user": { "name": "Asha", "email": "asha@example.com", "plan": "pro" }
        }))
        .into_response()
    } else {
        Json(json!({ "success": false })).into_response()
    }
}

async fn logout(State(b): State<Shared>, Json(_body): Json<Value>) -> Response {
    b.hit("POST /logout");
    *b.token.lock() = None;
    Json(json!({ "message": "Logged out" })).into_response()
}

async fn contact(State(b): State<Shared>, Json(body): Json<Value>) -> Response {
    b.hit("POST /contact");
    if body["email"].as_str().unwrap_or_default().is_empty() {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "email required");
    }
    Json(json!({ "message": "Thank you for your message" })).into_response()
}

async fn vm_list(State(b): State<Shared>, headers: HeaderMap) -> Response {
    b.hit("GET /vm-list");
    if let Err(rejection) = check_bearer(&b, &headers) {
        return rejection;
    }
    Json(Value::Array(b.vms.lock().clone())).into_response()
}

async fn create_vm(State(b): State<Shared>, Json(body): Json<Value>) -> Response {
    b.hit("POST /create-vm");
    let vmid = body["vmid"].as_u64().unwrap_or_default();
    if b.vms.lock().iter().any(|vm| vm["vmid"] == vmid) {
        return detail(StatusCode::BAD_REQUEST, &format!("VM {} already exists", vmid));
    }
    b.vms.lock().push(json!({
        "vmid": vmid,
        "name": body["name"],
        "status": "running",
        "memory": body["memory"],
        "cores": body["cores"],
    }));
    (
        StatusCode::CREATED,
        Json(json!({ "status": "success", "vmid": vmid })),
    )
        .into_response()
}

async fn vm_status(State(b): State<Shared>, Path(vmid): Path<u64>) -> Response {
    b.hit(format!("GET /vm-status/{}", vmid));
    let vms = b.vms.lock();
    match vms.iter().find(|vm| vm["vmid"] == vmid) {
        Some(vm) => Json(json!({
            "name": vm["name"],
            "status": vm["status"],
            "mem": 512.0,
            "cpu": 3.5
        }))
        .into_response(),
        None => detail(StatusCode::NOT_FOUND, &format!("VM with ID {} not found", vmid)),
    }
}

async fn delete_vm(
    State(b): State<Shared>,
    Path(vmid): Path<u64>,
    Json(_payment): Json<Value>,
) -> Response {
    b.hit(format!("DELETE /delete-vm/{}", vmid));
    if let Some(reason) = b.refuse_delete.lock().clone() {
        return detail(StatusCode::BAD_REQUEST, &reason);
    }
    b.vms.lock().retain(|vm| vm["vmid"] != vmid);
    Json(json!({ "status": "success" })).into_response()
}

async fn service_list(State(b): State<Shared>, headers: HeaderMap) -> Response {
    b.hit("GET /service-list");
    if let Err(rejection) = check_bearer(&b, &headers) {
        return rejection;
    }
    Json(Value::Array(b.services.lock().clone())).into_response()
}

async fn create_service(State(b): State<Shared>, Json(body): Json<Value>) -> Response {
    b.hit("POST /create-service");
    let mut services = b.services.lock();
    let id = services.len() as u64 + 1;
    services.push(json!({
        "id": id,
        "name": body["name"],
        "description": body["description"],
        "price": body["price"],
        "features": body["features"],
        "status": "active",
    }));
    Json(json!({ "id": id })).into_response()
}

async fn update_service(
    State(b): State<Shared>,
    Path(id): Path<u64>,
    Json(patch): Json<Value>,
) -> Response {
    b.hit(format!("PUT /update-service/{}", id));
    let mut services = b.services.lock();
    let Some(service) = services.iter_mut().find(|s| s["id"] == id) else {
        return detail(StatusCode::NOT_FOUND, "Service not found");
    };
    if let (Some(target), Some(changes)) = (service.as_object_mut(), patch.as_object()) {
        for (key, value) in changes {
            target.insert(key.clone(), value.clone());
        }
    }
    Json(service.clone()).into_response()
}

async fn delete_service(
    State(b): State<Shared>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    b.hit(format!("DELETE /delete-service/{}", id));
    if body["service_id"] != id {
        return detail(StatusCode::BAD_REQUEST, "service_id mismatch");
    }
    b.services.lock().retain(|s| s["id"] != id);
    Json(json!({ "status": "success" })).into_response()
}

fn router(backend: Shared) -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/verify-session", get(verify_session))
        .route("/api/logout", post(logout))
        .route("/api/contact", post(contact))
        .route("/api/vm-list", get(vm_list))
        .route("/api/create-vm", post(create_vm))
        .route("/api/vm-status/:vmid", get(vm_status))
        .route("/api/delete-vm/:vmid", delete(delete_vm))
        .route("/api/service-list", get(service_list))
        .route("/api/create-service", post(create_service))
        .route("/api/update-service/:id", put(update_service))
        .route("/api/delete-service/:id", delete(delete_service))
        .with_state(backend)
}

/// Serve the fake API on an ephemeral port; returns its base URL
pub async fn spawn_backend() -> (String, Shared) {
    Lazy::force(&TRACING);

    let backend = Arc::new(Backend::default());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(backend.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api", addr), backend)
}

pub struct Harness {
    pub backend: Shared,
    pub notes: Arc<NotificationCenter>,
    pub panel: Panel,
}

/// A panel wired to the fake backend over real HTTP
pub async fn harness() -> Harness {
    let (base_url, backend) = spawn_backend().await;
    let mut config = ClientConfig::default();
    config.api.base_url = base_url.clone();
    config.api.timeout_secs = 5;

    let transport = ReqwestTransport::new(config.request_timeout()).unwrap();
    let api = ApiClient::new(base_url, Arc::new(transport));
    let notes = Arc::new(NotificationCenter::new(config.notification_ttl()));
    let storage = Arc::new(MemoryStore::new());
    let panel = Panel::with_parts(config, api, storage, notes.clone()).unwrap();

    Harness {
        backend,
        notes,
        panel,
    }
}
