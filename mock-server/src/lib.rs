//! In-memory inventory service used to exercise generated clients.
//!
//! Besides a small item store it exposes routes that reflect what a client
//! sent (`/echo`), reply with an arbitrary status (`/status/{code}`) and
//! answer in XML (`/greeting`).

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, delete, get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Items returned per search page.
pub const PAGE_SIZE: usize = 10;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub quantity: u32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RateLimit {
    pub limit: u32,
    pub remaining: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchPage {
    pub page: u32,
    pub term: String,
    pub items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub term: String,
}

/// Everything the server saw of an `/echo` request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Item>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/rateLimit", get(rate_limit))
        .route("/create", post(create_json))
        .route("/items", post(create_form))
        .route("/items/{page}", get(search))
        .route("/item/{id}", delete(delete_item))
        .route("/status/{code}", get(status))
        .route("/greeting", get(greeting))
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn rate_limit() -> Json<RateLimit> {
    Json(RateLimit {
        limit: 60,
        remaining: 59,
    })
}

async fn insert(db: &Db, input: NewItem) -> Item {
    let item = Item {
        id: Uuid::new_v4(),
        name: input.name,
        quantity: input.quantity,
    };
    db.write().await.insert(item.id, item.clone());
    info!(id = %item.id, name = %item.name, "item created");
    item
}

async fn create_json(State(db): State<Db>, Json(input): Json<NewItem>) -> (StatusCode, Json<Item>) {
    (StatusCode::CREATED, Json(insert(&db, input).await))
}

async fn create_form(State(db): State<Db>, Form(input): Form<NewItem>) -> (StatusCode, Json<Item>) {
    (StatusCode::CREATED, Json(insert(&db, input).await))
}

async fn search(
    State(db): State<Db>,
    Path(page): Path<u32>,
    Query(query): Query<SearchQuery>,
) -> Json<SearchPage> {
    let items = db.read().await;
    let mut matches: Vec<Item> = items
        .values()
        .filter(|item| item.name.contains(&query.term))
        .cloned()
        .collect();
    matches.sort_by(|a, b| a.name.cmp(&b.name));
    let items = matches
        .into_iter()
        .skip(page as usize * PAGE_SIZE)
        .take(PAGE_SIZE)
        .collect();
    Json(SearchPage {
        page,
        term: query.term,
        items,
    })
}

async fn delete_item(State(db): State<Db>, Path(id): Path<Uuid>) -> StatusCode {
    match db.write().await.remove(&id) {
        Some(_) => {
            info!(%id, "item deleted");
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, String), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    let reason = status.canonical_reason().unwrap_or_default().to_string();
    Ok((status, reason))
}

async fn greeting() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/xml")],
        "<Greeting><message>hello</message><count>2</count></Greeting>",
    )
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Echo> {
    debug!(%method, %uri, "echo");
    let headers = headers
        .iter()
        .filter_map(|(key, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (key.as_str().to_string(), value.to_string()))
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
