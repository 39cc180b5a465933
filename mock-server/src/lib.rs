//! In-memory stand-in for the Cloud Debugger v2 service.
//!
//! Serves the same eight routes as the real API so the client core can be
//! exercised over real HTTP. Wait tokens never block: a list request whose
//! `waitToken` matches the current state answers `ABORTED` at once, the same
//! status the real service uses when its long-poll times out.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debuggee {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub uniquifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_inactive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_version: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub path: String,
    pub line: u32,
}

/// Action of a breakpoint created without one.
pub const DEFAULT_ACTION: &str = "CAPTURE";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expressions: Vec<String>,
    #[serde(default)]
    pub is_final_state: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_frames: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluated_expressions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_table: Option<Value>,
}

impl Breakpoint {
    fn stripped(mut self) -> Self {
        self.stack_frames = None;
        self.evaluated_expressions = None;
        self.variable_table = None;
        self
    }
}

#[derive(Deserialize)]
pub struct RegisterDebuggeeRequest {
    pub debuggee: Option<Debuggee>,
}

#[derive(Deserialize)]
pub struct UpdateActiveBreakpointRequest {
    pub breakpoint: Option<Breakpoint>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListActiveParams {
    pub wait_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDebuggeesParams {
    pub project: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBreakpointsParams {
    /// Accepted but ignored: breakpoints are not tracked per user.
    #[serde(default)]
    pub include_all_users: bool,
    #[serde(default)]
    pub include_inactive: bool,
    #[serde(rename = "action.value")]
    pub action: Option<String>,
    #[serde(default)]
    pub strip_results: bool,
    pub wait_token: Option<String>,
}

/// Server state. `version` moves on every breakpoint change and doubles as
/// the wait token handed out by the list endpoints.
#[derive(Debug, Default)]
pub struct Store {
    debuggees: Vec<Debuggee>,
    breakpoints: HashMap<String, Vec<Breakpoint>>,
    version: u64,
}

impl Store {
    fn debuggee_exists(&self, id: &str) -> bool {
        self.debuggees.iter().any(|d| d.id == id)
    }

    fn wait_token(&self) -> String {
        self.version.to_string()
    }

    /// Breakpoints of a known debuggee, or `NOT_FOUND`.
    fn breakpoints_of(&self, debuggee_id: &str) -> Result<&[Breakpoint], RpcError> {
        if !self.debuggee_exists(debuggee_id) {
            return Err(RpcError::not_found(format!("debuggee {debuggee_id} not found")));
        }
        Ok(self
            .breakpoints
            .get(debuggee_id)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    fn check_wait_token(&self, token: Option<&str>) -> Result<(), RpcError> {
        match token {
            Some(token) if token == self.wait_token() => Err(RpcError {
                status: StatusCode::CONFLICT,
                code: "ABORTED",
                message: "wait expired without changes".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Google-style error body: `{"error": {"code", "status", "message"}}`.
#[derive(Debug)]
pub struct RpcError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl RpcError {
    fn not_found(message: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "NOT_FOUND",
            message,
        }
    }

    fn invalid_argument(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "INVALID_ARGUMENT",
            message: message.to_string(),
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": self.status.as_u16(),
                "status": self.code,
                "message": self.message,
            }
        });
        (self.status, Json(body)).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/v2/controller/debuggees/register", post(register_debuggee))
        .route(
            "/v2/controller/debuggees/{debuggee_id}/breakpoints",
            get(list_active_breakpoints),
        )
        .route(
            "/v2/controller/debuggees/{debuggee_id}/breakpoints/{id}",
            put(update_active_breakpoint),
        )
        .route("/v2/debugger/debuggees", get(list_debuggees))
        .route(
            "/v2/debugger/debuggees/{debuggee_id}/breakpoints",
            get(list_breakpoints),
        )
        .route(
            "/v2/debugger/debuggees/{debuggee_id}/breakpoints/set",
            post(set_breakpoint),
        )
        .route(
            "/v2/debugger/debuggees/{debuggee_id}/breakpoints/{breakpoint_id}",
            get(get_breakpoint).delete(delete_breakpoint),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn register_debuggee(
    State(db): State<Db>,
    Json(input): Json<RegisterDebuggeeRequest>,
) -> Result<Json<Value>, RpcError> {
    let mut debuggee = input
        .debuggee
        .ok_or_else(|| RpcError::invalid_argument("debuggee is required"))?;
    if debuggee.project.is_empty() || debuggee.uniquifier.is_empty() {
        return Err(RpcError::invalid_argument("project and uniquifier are required"));
    }

    let mut store = db.write().await;
    let existing = store
        .debuggees
        .iter_mut()
        .find(|d| d.project == debuggee.project && d.uniquifier == debuggee.uniquifier);
    match existing {
        Some(found) => {
            debuggee.id = found.id.clone();
            *found = debuggee.clone();
        }
        None => {
            debuggee.id = Uuid::new_v4().to_string();
            info!(id = %debuggee.id, project = %debuggee.project, "registered debuggee");
            store.debuggees.push(debuggee.clone());
        }
    }
    Ok(Json(json!({ "debuggee": debuggee })))
}

async fn list_active_breakpoints(
    State(db): State<Db>,
    Path(debuggee_id): Path<String>,
    Query(params): Query<ListActiveParams>,
) -> Result<Json<Value>, RpcError> {
    let store = db.read().await;
    let breakpoints: Vec<&Breakpoint> = store
        .breakpoints_of(&debuggee_id)?
        .iter()
        .filter(|b| !b.is_final_state)
        .collect();
    store.check_wait_token(params.wait_token.as_deref())?;
    Ok(Json(json!({
        "breakpoints": breakpoints,
        "nextWaitToken": store.wait_token(),
    })))
}

async fn update_active_breakpoint(
    State(db): State<Db>,
    Path((debuggee_id, id)): Path<(String, String)>,
    Json(input): Json<UpdateActiveBreakpointRequest>,
) -> Result<Json<Value>, RpcError> {
    let mut update = input
        .breakpoint
        .ok_or_else(|| RpcError::invalid_argument("breakpoint is required"))?;

    let mut store = db.write().await;
    store.breakpoints_of(&debuggee_id)?;
    let slot = store
        .breakpoints
        .get_mut(&debuggee_id)
        .and_then(|list| list.iter_mut().find(|b| b.id == id))
        .ok_or_else(|| RpcError::not_found(format!("breakpoint {id} not found")))?;
    update.id = id;
    *slot = update;
    store.version += 1;
    debug!(%debuggee_id, version = store.version, "breakpoint updated by agent");
    Ok(Json(json!({})))
}

async fn list_debuggees(
    State(db): State<Db>,
    Query(params): Query<ListDebuggeesParams>,
) -> Json<Value> {
    let store = db.read().await;
    let debuggees: Vec<&Debuggee> = store
        .debuggees
        .iter()
        .filter(|d| params.project.as_ref().is_none_or(|p| *p == d.project))
        .filter(|d| params.include_inactive || !d.is_inactive)
        .collect();
    Json(json!({ "debuggees": debuggees }))
}

async fn set_breakpoint(
    State(db): State<Db>,
    Path(debuggee_id): Path<String>,
    Json(mut breakpoint): Json<Breakpoint>,
) -> Result<Json<Value>, RpcError> {
    let mut store = db.write().await;
    store.breakpoints_of(&debuggee_id)?;
    breakpoint.id = Uuid::new_v4().to_string();
    breakpoint.is_final_state = false;
    store
        .breakpoints
        .entry(debuggee_id)
        .or_default()
        .push(breakpoint.clone());
    store.version += 1;
    Ok(Json(json!({ "breakpoint": breakpoint })))
}

async fn get_breakpoint(
    State(db): State<Db>,
    Path((debuggee_id, breakpoint_id)): Path<(String, String)>,
) -> Result<Json<Value>, RpcError> {
    let store = db.read().await;
    let breakpoint = store
        .breakpoints_of(&debuggee_id)?
        .iter()
        .find(|b| b.id == breakpoint_id)
        .ok_or_else(|| RpcError::not_found(format!("breakpoint {breakpoint_id} not found")))?;
    Ok(Json(json!({ "breakpoint": breakpoint })))
}

async fn delete_breakpoint(
    State(db): State<Db>,
    Path((debuggee_id, breakpoint_id)): Path<(String, String)>,
) -> Result<Json<Value>, RpcError> {
    let mut store = db.write().await;
    store.breakpoints_of(&debuggee_id)?;
    let list = store.breakpoints.entry(debuggee_id).or_default();
    let before = list.len();
    list.retain(|b| b.id != breakpoint_id);
    if list.len() == before {
        return Err(RpcError::not_found(format!("breakpoint {breakpoint_id} not found")));
    }
    store.version += 1;
    Ok(Json(json!({})))
}

async fn list_breakpoints(
    State(db): State<Db>,
    Path(debuggee_id): Path<String>,
    Query(params): Query<ListBreakpointsParams>,
) -> Result<Json<Value>, RpcError> {
    let store = db.read().await;
    let breakpoints: Vec<Breakpoint> = store
        .breakpoints_of(&debuggee_id)?
        .iter()
        .filter(|b| params.include_inactive || !b.is_final_state)
        .filter(|b| {
            params
                .action
                .as_deref()
                .is_none_or(|wanted| b.action.as_deref().unwrap_or(DEFAULT_ACTION) == wanted)
        })
        .cloned()
        .map(|b| if params.strip_results { b.stripped() } else { b })
        .collect();
    store.check_wait_token(params.wait_token.as_deref())?;
    Ok(Json(json!({
        "breakpoints": breakpoints,
        "nextWaitToken": store.wait_token(),
    })))
}
