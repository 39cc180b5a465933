use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Breakpoint, Debuggee};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

/// Send one request through a cloned router that shares the same store.
async fn send(app: &axum::Router, request: Request<String>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn register(app: &axum::Router, project: &str, uniquifier: &str) -> Debuggee {
    let body = format!(r#"{{"debuggee":{{"project":"{project}","uniquifier":"{uniquifier}"}}}}"#);
    let resp = send(app, json_request("POST", "/v2/controller/debuggees/register", &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let v: Value = body_json(resp).await;
    serde_json::from_value(v["debuggee"].clone()).unwrap()
}

async fn set(app: &axum::Router, debuggee_id: &str, body: &str) -> Breakpoint {
    let uri = format!("/v2/debugger/debuggees/{debuggee_id}/breakpoints/set");
    let resp = send(app, json_request("POST", &uri, body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let v: Value = body_json(resp).await;
    serde_json::from_value(v["breakpoint"].clone()).unwrap()
}

// --- register ---

#[tokio::test]
async fn register_assigns_stable_id() {
    let app = app();
    let first = register(&app, "p1", "u1").await;
    let again = register(&app, "p1", "u1").await;
    let other = register(&app, "p1", "u2").await;

    assert!(!first.id.is_empty());
    assert_eq!(first.id, again.id);
    assert_ne!(first.id, other.id);
}

#[tokio::test]
async fn register_without_debuggee_is_invalid() {
    let resp = app()
        .oneshot(json_request("POST", "/v2/controller/debuggees/register", "{}"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let v: Value = body_json(resp).await;
    assert_eq!(v["error"]["status"], "INVALID_ARGUMENT");
    assert_eq!(v["error"]["code"], 400);
}

// --- debuggees ---

#[tokio::test]
async fn list_debuggees_filters_by_project() {
    let app = app();
    register(&app, "p1", "u1").await;
    register(&app, "p2", "u1").await;

    let resp = send(&app, empty_request("GET", "/v2/debugger/debuggees?project=p2")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let v: Value = body_json(resp).await;
    let debuggees = v["debuggees"].as_array().unwrap();
    assert_eq!(debuggees.len(), 1);
    assert_eq!(debuggees[0]["project"], "p2");
}

#[tokio::test]
async fn list_debuggees_hides_inactive_unless_asked() {
    let app = app();
    let body = r#"{"debuggee":{"project":"p1","uniquifier":"old","isInactive":true}}"#;
    send(&app, json_request("POST", "/v2/controller/debuggees/register", body)).await;

    let v: Value = body_json(send(&app, empty_request("GET", "/v2/debugger/debuggees")).await).await;
    assert!(v["debuggees"].as_array().unwrap().is_empty());

    let uri = "/v2/debugger/debuggees?includeInactive=true";
    let v: Value = body_json(send(&app, empty_request("GET", uri)).await).await;
    assert_eq!(v["debuggees"].as_array().unwrap().len(), 1);
}

// --- breakpoints ---

#[tokio::test]
async fn set_on_unknown_debuggee_is_not_found() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/v2/debugger/debuggees/nope/breakpoints/set",
            r#"{"location":{"path":"a.rs","line":1}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let v: Value = body_json(resp).await;
    assert_eq!(v["error"]["status"], "NOT_FOUND");
}

#[tokio::test]
async fn get_unknown_breakpoint_is_not_found() {
    let app = app();
    let d = register(&app, "p1", "u1").await;
    let uri = format!("/v2/debugger/debuggees/{}/breakpoints/missing", d.id);
    let resp = send(&app, empty_request("GET", &uri)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_breakpoints_filters_by_action_and_strips_results() {
    let app = app();
    let d = register(&app, "p1", "u1").await;
    set(&app, &d.id, r#"{"action":"CAPTURE","location":{"path":"a.rs","line":3}}"#).await;
    set(
        &app,
        &d.id,
        r#"{"action":"LOG","location":{"path":"a.rs","line":9},"stackFrames":[{"function":"f"}]}"#,
    )
    .await;

    let uri = format!(
        "/v2/debugger/debuggees/{}/breakpoints?action.value=LOG&stripResults=true",
        d.id
    );
    let v: Value = body_json(send(&app, empty_request("GET", &uri)).await).await;
    let breakpoints = v["breakpoints"].as_array().unwrap();
    assert_eq!(breakpoints.len(), 1);
    assert_eq!(breakpoints[0]["action"], "LOG");
    assert!(breakpoints[0].get("stackFrames").is_none());
}

#[tokio::test]
async fn capture_filter_matches_breakpoints_without_action() {
    let app = app();
    let d = register(&app, "p1", "u1").await;
    set(&app, &d.id, r#"{"location":{"path":"a.rs","line":3}}"#).await;
    set(&app, &d.id, r#"{"action":"LOG","location":{"path":"a.rs","line":9}}"#).await;

    let uri = format!("/v2/debugger/debuggees/{}/breakpoints?action.value=CAPTURE", d.id);
    let v: Value = body_json(send(&app, empty_request("GET", &uri)).await).await;
    let breakpoints = v["breakpoints"].as_array().unwrap();
    assert_eq!(breakpoints.len(), 1);
    assert_eq!(breakpoints[0]["location"]["line"], 3);
}

#[tokio::test]
async fn matching_wait_token_answers_aborted() {
    let app = app();
    let d = register(&app, "p1", "u1").await;
    let uri = format!("/v2/controller/debuggees/{}/breakpoints", d.id);
    let v: Value = body_json(send(&app, empty_request("GET", &uri)).await).await;
    let token = v["nextWaitToken"].as_str().unwrap().to_string();

    let waiting = format!("{uri}?waitToken={token}");
    let resp = send(&app, empty_request("GET", &waiting)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let v: Value = body_json(resp).await;
    assert_eq!(v["error"]["status"], "ABORTED");

    set(&app, &d.id, r#"{"location":{"path":"a.rs","line":1}}"#).await;
    let resp = send(&app, empty_request("GET", &waiting)).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

// --- full agent/user lifecycle ---

#[tokio::test]
async fn breakpoint_lifecycle() {
    let app = app();
    let d = register(&app, "p1", "agent-1").await;

    // user sets a breakpoint
    let bp = set(&app, &d.id, r#"{"location":{"path":"src/lib.rs","line":42}}"#).await;
    assert!(!bp.id.is_empty());
    assert!(!bp.is_final_state);

    // agent sees it as active
    let uri = format!("/v2/controller/debuggees/{}/breakpoints", d.id);
    let v: Value = body_json(send(&app, empty_request("GET", &uri)).await).await;
    assert_eq!(v["breakpoints"].as_array().unwrap().len(), 1);

    // agent completes it
    let uri = format!("/v2/controller/debuggees/{}/breakpoints/{}", d.id, bp.id);
    let body = r#"{"breakpoint":{"location":{"path":"src/lib.rs","line":42},"isFinalState":true,"stackFrames":[]}}"#;
    let resp = send(&app, json_request("PUT", &uri, body)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // no longer active for the agent
    let uri = format!("/v2/controller/debuggees/{}/breakpoints", d.id);
    let v: Value = body_json(send(&app, empty_request("GET", &uri)).await).await;
    assert!(v["breakpoints"].as_array().unwrap().is_empty());

    // still visible to the user with includeInactive
    let uri = format!("/v2/debugger/debuggees/{}/breakpoints?includeInactive=true", d.id);
    let v: Value = body_json(send(&app, empty_request("GET", &uri)).await).await;
    assert_eq!(v["breakpoints"].as_array().unwrap().len(), 1);

    // get returns the completed state
    let uri = format!("/v2/debugger/debuggees/{}/breakpoints/{}", d.id, bp.id);
    let resp = send(&app, empty_request("GET", &uri)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let v: Value = body_json(resp).await;
    assert_eq!(v["breakpoint"]["isFinalState"], true);

    // delete, then delete again
    let resp = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
