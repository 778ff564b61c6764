//! HTTP server for the todo API.
//!
//! This module provides the axum-based server: route table, request
//! payloads, and handlers. Handlers resolve the caller's identity from
//! the Authorization header, validate the payload into typed values,
//! and delegate to the storage layer.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderMap, header},
    routing::{get, post, put},
};
use axum::response::Json;
use chrono::NaiveDate;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth;
use crate::db::Database;
use crate::error::{ApiError, ApiResult};
use crate::query::{TaskFilter, TaskQuery, TaskSort};
use crate::types::{Dashboard, Priority, Stats, Task, TaskFields, User, UserInfo};

/// Starter categories offered alongside the stored ones.
const CATEGORY_SUGGESTIONS: [&str; 5] = ["Work", "Personal", "Shopping", "Health", "Learning"];

/// API server state shared across handlers.
#[derive(Clone)]
pub struct ApiServer {
    /// Reference to the task database.
    db: Arc<Database>,
    /// Whether /auth routes and bearer tokens are active.
    auth_enabled: bool,
}

impl ApiServer {
    /// Create a new API server instance.
    pub fn new(db: Arc<Database>, auth_enabled: bool) -> Self {
        Self { db, auth_enabled }
    }

    /// Get the database reference.
    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    /// Resolve the caller's identity from the Authorization header.
    ///
    /// No header means an anonymous caller scoped to ownerless tasks. A
    /// presented token is always checked, never silently ignored; with
    /// auth disabled any presented token is rejected outright.
    fn resolve_owner(&self, headers: &HeaderMap) -> ApiResult<Option<i64>> {
        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return Ok(None);
        };

        if !self.auth_enabled {
            return Err(ApiError::invalid_token());
        }

        let token = value
            .to_str()
            .ok()
            .and_then(auth::bearer_token)
            .ok_or_else(ApiError::invalid_token)?;

        match self.db.get_user_for_token(&auth::token_hash(token))? {
            Some(user) => Ok(Some(user.id)),
            None => Err(ApiError::invalid_token()),
        }
    }

    /// Resolve the caller's identity, requiring a valid token.
    fn require_user(&self, headers: &HeaderMap) -> ApiResult<User> {
        if !self.auth_enabled {
            return Err(ApiError::auth_disabled());
        }

        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(auth::bearer_token)
            .ok_or_else(ApiError::invalid_token)?;

        self.db
            .get_user_for_token(&auth::token_hash(token))?
            .ok_or_else(ApiError::invalid_token)
    }

    fn ensure_auth_routes(&self) -> ApiResult<()> {
        if self.auth_enabled {
            Ok(())
        } else {
            Err(ApiError::auth_disabled())
        }
    }
}

// =============================================================================
// Request payloads
// =============================================================================

/// Body for creating or replacing a task.
#[derive(Debug, Default, serde::Deserialize)]
pub struct TaskPayload {
    pub title: Option<String>,
    #[serde(default)]
    pub done: bool,
    pub due_date: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
}

impl TaskPayload {
    /// Validate the raw payload into typed task fields.
    ///
    /// A missing title is a 422; a malformed due_date or priority is a
    /// 400. An empty title is allowed. Validation happens before any
    /// statement runs, so a rejected update leaves the record untouched.
    fn into_fields(self) -> ApiResult<TaskFields> {
        let Some(title) = self.title else {
            return Err(ApiError::missing_field("title"));
        };

        let due_date = match self.due_date.filter(|s| !s.is_empty()) {
            Some(raw) => Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                ApiError::invalid_value(
                    "due_date",
                    format!("Invalid date '{}', expected YYYY-MM-DD", raw),
                )
            })?),
            None => None,
        };

        let priority = match &self.priority {
            Some(raw) => Some(Priority::parse(raw).ok_or_else(|| {
                ApiError::invalid_value(
                    "priority",
                    format!("Invalid priority '{}', expected high, medium, or low", raw),
                )
            })?),
            None => None,
        };

        Ok(TaskFields {
            title,
            done: self.done,
            due_date,
            category: self.category,
            priority,
        })
    }
}

/// Query parameters for the task list endpoint.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ListParams {
    pub filter_by: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub sort_by: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListParams {
    /// Translate raw parameters into a typed query.
    ///
    /// Unrecognized filter_by / sort_by values are ignored; a malformed
    /// priority predicate is rejected like any other bad priority.
    fn into_query(self) -> ApiResult<TaskQuery> {
        let priority = match self.priority.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => Some(Priority::parse(raw).ok_or_else(|| {
                ApiError::invalid_value(
                    "priority",
                    format!("Invalid priority '{}', expected high, medium, or low", raw),
                )
            })?),
            None => None,
        };

        Ok(TaskQuery {
            filter: self.filter_by.as_deref().and_then(TaskFilter::from_param),
            category: self.category.filter(|s| !s.is_empty()),
            priority,
            sort: self
                .sort_by
                .as_deref()
                .and_then(TaskSort::from_param)
                .unwrap_or_default(),
            limit: self.limit.filter(|l| *l >= 0),
            offset: self.offset.unwrap_or(0).max(0),
        })
    }
}

/// Query parameters for the search endpoint.
#[derive(Debug, Default, serde::Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub in_title: Option<bool>,
    pub in_category: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Body for signup and login.
#[derive(Debug, serde::Deserialize)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    fn into_required(self) -> ApiResult<(String, String)> {
        let Some(username) = self.username else {
            return Err(ApiError::missing_field("username"));
        };
        let Some(password) = self.password else {
            return Err(ApiError::missing_field("password"));
        };
        Ok((username, password))
    }
}

// =============================================================================
// Response payloads
// =============================================================================

/// Landing response for the service root.
#[derive(serde::Serialize)]
struct RootInfo {
    message: &'static str,
    docs: &'static str,
    features: Vec<&'static str>,
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(serde::Serialize)]
struct DeleteResponse {
    message: &'static str,
}

#[derive(serde::Serialize)]
struct CategoriesResponse {
    /// Distinct categories in use, alphabetical.
    categories: Vec<String>,
    suggestions: Vec<&'static str>,
}

#[derive(serde::Serialize)]
struct SearchResponse {
    query: String,
    /// Number of results in this page.
    results_count: usize,
    results: Vec<Task>,
}

#[derive(serde::Serialize)]
struct TokenResponse {
    access_token: String,
    token_type: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// Root endpoint - service banner.
async fn root() -> Json<RootInfo> {
    Json(RootInfo {
        message: "Todo API is running! Go to /docs to see the interactive documentation",
        docs: "/docs",
        features: vec![
            "filtering",
            "sorting",
            "search",
            "statistics",
            "dashboard",
            "auth",
        ],
    })
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// List tasks with optional filtering, sorting, and pagination.
async fn list_tasks(
    State(state): State<ApiServer>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Task>>> {
    let owner = state.resolve_owner(&headers)?;
    let query = params.into_query()?;
    let tasks = state.db().list_tasks(&query, owner)?;
    Ok(Json(tasks))
}

/// Create a task.
async fn create_task(
    State(state): State<ApiServer>,
    headers: HeaderMap,
    Json(payload): Json<TaskPayload>,
) -> ApiResult<Json<Task>> {
    let owner = state.resolve_owner(&headers)?;
    let fields = payload.into_fields()?;
    let task = state.db().create_task(fields, owner)?;
    Ok(Json(task))
}

/// Replace a task's fields.
async fn update_task(
    State(state): State<ApiServer>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<TaskPayload>,
) -> ApiResult<Json<Task>> {
    let owner = state.resolve_owner(&headers)?;
    let fields = payload.into_fields()?;
    match state.db().update_task(id, fields, owner)? {
        Some(task) => Ok(Json(task)),
        None => Err(ApiError::task_not_found()),
    }
}

/// Delete a task.
async fn delete_task(
    State(state): State<ApiServer>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteResponse>> {
    let owner = state.resolve_owner(&headers)?;
    if state.db().delete_task(id, owner)? {
        Ok(Json(DeleteResponse {
            message: "Task deleted successfully",
        }))
    } else {
        Err(ApiError::task_not_found())
    }
}

/// Aggregate statistics.
async fn get_stats(
    State(state): State<ApiServer>,
    headers: HeaderMap,
) -> ApiResult<Json<Stats>> {
    let owner = state.resolve_owner(&headers)?;
    let stats = state.db().get_stats(owner)?;
    Ok(Json(stats))
}

/// Categories in use plus fixed suggestions.
async fn get_categories(
    State(state): State<ApiServer>,
    headers: HeaderMap,
) -> ApiResult<Json<CategoriesResponse>> {
    let owner = state.resolve_owner(&headers)?;
    let categories = state.db().distinct_categories(owner)?;
    Ok(Json(CategoriesResponse {
        categories,
        suggestions: CATEGORY_SUGGESTIONS.to_vec(),
    }))
}

/// Composite dashboard.
async fn get_dashboard(
    State(state): State<ApiServer>,
    headers: HeaderMap,
) -> ApiResult<Json<Dashboard>> {
    let owner = state.resolve_owner(&headers)?;
    let dashboard = state.db().get_dashboard(owner)?;
    Ok(Json(dashboard))
}

/// Substring search over title and/or category.
async fn search_tasks(
    State(state): State<ApiServer>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResponse>> {
    let owner = state.resolve_owner(&headers)?;

    let Some(q) = params.q else {
        return Err(ApiError::missing_field("q"));
    };

    let results = state.db().search_tasks(
        &q,
        params.in_title.unwrap_or(true),
        params.in_category.unwrap_or(true),
        params.limit.filter(|l| *l >= 0),
        params.offset.unwrap_or(0).max(0),
        owner,
    )?;

    Ok(Json(SearchResponse {
        query: q,
        results_count: results.len(),
        results,
    }))
}

/// Register a new account.
async fn signup(
    State(state): State<ApiServer>,
    Json(body): Json<Credentials>,
) -> ApiResult<Json<UserInfo>> {
    state.ensure_auth_routes()?;
    let (username, password) = body.into_required()?;

    let password_hash = auth::hash_password(&password);
    match state.db().create_user(&username, &password_hash)? {
        Some(user) => {
            info!("New user registered: {}", user.username);
            Ok(Json(user.into()))
        }
        None => Err(ApiError::username_taken(&username)),
    }
}

/// Exchange credentials for a bearer token.
async fn login(
    State(state): State<ApiServer>,
    Json(body): Json<Credentials>,
) -> ApiResult<Json<TokenResponse>> {
    state.ensure_auth_routes()?;
    let (username, password) = body.into_required()?;

    let user = state
        .db()
        .get_user_by_username(&username)?
        .ok_or_else(ApiError::invalid_credentials)?;

    if !auth::verify_password(&password, &user.password_hash) {
        return Err(ApiError::invalid_credentials());
    }

    let token = auth::mint_token();
    state.db().insert_auth_token(&auth::token_hash(&token), user.id)?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer",
    }))
}

/// Identity behind the presented token.
async fn me(State(state): State<ApiServer>, headers: HeaderMap) -> ApiResult<Json<UserInfo>> {
    let user = state.require_user(&headers)?;
    Ok(Json(user.into()))
}

// =============================================================================
// Router and startup
// =============================================================================

/// Build the router with all routes.
pub fn build_router(state: ApiServer) -> Router {
    // Configure CORS for browser clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        // Task routes
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", put(update_task).delete(delete_task))
        // Aggregation routes
        .route("/stats", get(get_stats))
        .route("/categories", get(get_categories))
        .route("/dashboard", get(get_dashboard))
        .route("/search", get(search_tasks))
        // Auth routes
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        // Service routes
        .route("/api/health", get(health))
        // Add middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server and serve until interrupted.
pub async fn start_server(
    db: Arc<Database>,
    host: &str,
    port: u16,
    auth_enabled: bool,
) -> anyhow::Result<()> {
    let state = ApiServer::new(db, auth_enabled);
    let app = build_router(state);

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Todo API listening on http://{}", bound_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Todo API shutting down");
        })
        .await?;

    Ok(())
}
