use std::sync::{Arc, Mutex};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use todo_shared::constants::{
    MSG_CONTACT_OK, MSG_TODO_DELETED, MSG_TODO_FIELDS_REQUIRED, MSG_TODO_NOT_FOUND,
    ROUTE_CONTACT, ROUTE_LOGIN, ROUTE_REGISTER, ROUTE_TODOS,
};
use todo_shared::protocol::{
    AuthResponse, ContactSubmission, LoginRequest, MessageResponse, NewTask, RegisterRequest,
    Task, TaskPatch,
};
use todo_shared::{TaskId, UserId};
use todo_store::Database;

use crate::auth::{authorize, AuthUser};
use crate::config::ServerConfig;
use crate::credentials::{lock_db, CredentialStore, SharedDb};
use crate::error::ServerError;

#[derive(Clone)]
pub struct AppState {
    pub db: SharedDb,
    pub credentials: CredentialStore,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let db = Arc::new(Mutex::new(db));
        let tokens = Arc::new(config.token_signer());
        Self {
            credentials: CredentialStore::new(db.clone(), tokens),
            db,
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health_check))
        .route(ROUTE_REGISTER, post(register))
        .route(ROUTE_LOGIN, post(login))
        .route(ROUTE_TODOS, post(create_todo))
        // GET takes a user id, PUT/DELETE a todo id
        .route(
            &format!("{ROUTE_TODOS}/:id"),
            get(list_todos).put(update_todo).delete(delete_todo),
        )
        .route(ROUTE_CONTACT, post(submit_contact))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    match config.client_app_url.as_deref() {
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => cors.allow_origin(value),
            Err(_) => {
                warn!(origin = %origin, "Invalid CLIENT_APP_URL, allowing any origin");
                cors.allow_origin(Any)
            }
        },
        None => cors.allow_origin(Any),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Unwrap a JSON body, turning axum's plain-text rejection into a `{message}` error.
fn json_body<T>(
    body: Result<Json<T>, JsonRejection>,
    on_error: impl FnOnce(String) -> ServerError,
) -> Result<T, ServerError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| on_error(rejection.body_text()))
}

// ─── Users ───

async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ServerError> {
    let req = json_body(body, ServerError::Validation)?;
    let session = state
        .credentials
        .register(
            req.name.as_deref().unwrap_or_default(),
            req.email.as_deref().unwrap_or_default(),
            req.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ServerError> {
    let req = json_body(body, ServerError::Validation)?;
    let session = state
        .credentials
        .login(
            req.email.as_deref().unwrap_or_default(),
            req.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(session))
}

// ─── Todos ───

fn fields_required() -> ServerError {
    ServerError::Validation(MSG_TODO_FIELDS_REQUIRED.to_string())
}

/// Under `REQUIRE_AUTH`, only the task's owner may touch it.
fn check_task_access(
    state: &AppState,
    caller: Option<&AuthUser>,
    id: TaskId,
) -> Result<(), ServerError> {
    if !state.config.require_auth {
        return Ok(());
    }
    if caller.is_none() {
        return authorize(&state.config, None, None);
    }

    let owner = {
        let db = lock_db(&state.db)?;
        db.get_task(id)?.owner
    };
    authorize(&state.config, caller, Some(owner))
}

async fn create_todo(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    body: Result<Json<NewTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ServerError> {
    let body = json_body(body, |_| fields_required())?;
    let (Some(user), Some(title), Some(description)) = (body.user, body.title, body.description)
    else {
        return Err(fields_required());
    };
    if [&user, &title, &description]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return Err(fields_required());
    }

    let owner: UserId = user.parse().map_err(|_| fields_required())?;
    authorize(&state.config, caller.as_ref(), Some(owner))?;

    let task = {
        let db = lock_db(&state.db)?;
        db.create_task(owner, &title, &description)?
    };

    info!(task_id = %task.id, owner = %owner, "todo created");
    Ok((StatusCode::CREATED, Json(task)))
}

async fn list_todos(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Task>>, ServerError> {
    let owner = user_id.parse::<UserId>().ok();
    authorize(&state.config, caller.as_ref(), owner)?;

    // a malformed id cannot own anything
    let Some(owner) = owner else {
        return Ok(Json(Vec::new()));
    };

    let tasks = {
        let db = lock_db(&state.db)?;
        db.list_tasks(owner)?
    };
    Ok(Json(tasks))
}

async fn update_todo(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Path(todo_id): Path<String>,
    body: Result<Json<TaskPatch>, JsonRejection>,
) -> Result<Json<Task>, ServerError> {
    let id = parse_todo_id(&todo_id)?;
    check_task_access(&state, caller.as_ref(), id)?;
    let patch = json_body(body, ServerError::Validation)?;

    let task = {
        let db = lock_db(&state.db)?;
        db.update_task(id, &patch)?
    };

    info!(task_id = %id, completed = task.completed, "todo updated");
    Ok(Json(task))
}

async fn delete_todo(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Path(todo_id): Path<String>,
) -> Result<Json<MessageResponse>, ServerError> {
    let id = parse_todo_id(&todo_id)?;
    check_task_access(&state, caller.as_ref(), id)?;

    {
        let db = lock_db(&state.db)?;
        db.delete_task(id)?;
    }

    info!(task_id = %id, "todo deleted");
    Ok(Json(MessageResponse::new(MSG_TODO_DELETED)))
}

fn parse_todo_id(raw: &str) -> Result<TaskId, ServerError> {
    raw.parse()
        .map_err(|_| ServerError::NotFound(MSG_TODO_NOT_FOUND.to_string()))
}

// ─── Contact form ───

async fn submit_contact(
    State(state): State<AppState>,
    body: Result<Json<ContactSubmission>, JsonRejection>,
) -> Result<Json<MessageResponse>, ServerError> {
    let submission = json_body(body, ServerError::ContactFailed)?;
    let record = {
        let db = lock_db(&state.db).map_err(|e| ServerError::ContactFailed(e.to_string()))?;
        db.insert_contact_message(&submission)
            .map_err(|e| ServerError::ContactFailed(e.to_string()))?
    };

    info!(message_id = %record.id, "contact message received");
    Ok(Json(MessageResponse::new(MSG_CONTACT_OK)))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
