use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
}

#[derive(Deserialize)]
pub struct NewItem {
    pub name: String,
}

/// What `/echo` saw, returned as the response body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Default)]
pub struct Store {
    items: RwLock<BTreeMap<u64, Item>>,
    next_id: AtomicU64,
}

pub type Db = Arc<Store>;

pub fn app() -> Router {
    let db: Db = Arc::new(Store::default());
    Router::new()
        .route("/echo", any(echo))
        .route("/items", get(list_items).post(create_item))
        .route(
            "/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/fail/{code}", any(fail))
        .route("/redirect", post(redirect))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Echo> {
    debug!(%method, %uri, "echo");
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    })
}

async fn list_items(State(db): State<Db>) -> Json<Vec<Item>> {
    let items = db.items.read().await;
    Json(items.values().cloned().collect())
}

async fn create_item(State(db): State<Db>, Json(input): Json<NewItem>) -> (StatusCode, Json<Item>) {
    let id = db.next_id.fetch_add(1, Ordering::SeqCst) + 1;
    let item = Item {
        id,
        name: input.name,
    };
    db.items.write().await.insert(id, item.clone());
    (StatusCode::CREATED, Json(item))
}

async fn get_item(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Item>, StatusCode> {
    let items = db.items.read().await;
    items.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_item(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<NewItem>,
) -> Result<Json<Item>, StatusCode> {
    let mut items = db.items.write().await;
    let item = items.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    item.name = input.name;
    Ok(Json(item.clone()))
}

async fn delete_item(State(db): State<Db>, Path(id): Path<u64>) -> Result<StatusCode, StatusCode> {
    let mut items = db.items.write().await;
    items.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

/// Respond with the requested status and `?body=` text (or the reason phrase).
async fn fail(Path(code): Path<u16>, Query(params): Query<HashMap<String, String>>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = params
        .get("body")
        .cloned()
        .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());
    (status, body).into_response()
}

async fn redirect() -> Response {
    (StatusCode::SEE_OTHER, [(header::LOCATION, "/echo")]).into_response()
}
