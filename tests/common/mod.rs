// Fake upload endpoint shared by the HTTP integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;

/// Echo every multipart field back as JSON: text fields under `fields`
/// (repeated names become arrays), the file part under `file`.
async fn echo_upload(mut multipart: Multipart) -> impl IntoResponse {
    let mut fields = Map::new();
    let mut file = Value::Null;

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.unwrap();

        if let Some(file_name) = file_name {
            file = json!({
                "field": name,
                "name": file_name,
                "content_type": content_type,
                "len": data.len(),
            });
            continue;
        }

        let text = String::from_utf8_lossy(&data).into_owned();
        match fields.get_mut(&name) {
            Some(Value::Array(items)) => items.push(Value::String(text)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(text)]);
            }
            None => {
                fields.insert(name, Value::String(text));
            }
        }
    }

    Json(json!({ "fields": fields, "file": file }))
}

async fn always_fail() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "storage unavailable")
}

async fn not_json() -> impl IntoResponse {
    (StatusCode::OK, "<html>ok</html>")
}

/// Start the fake endpoint on a random port.
pub async fn start_server() -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/upload", post(echo_upload))
        .route("/fail", post(always_fail))
        .route("/html", post(not_json));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, handle)
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
