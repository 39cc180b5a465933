//! Stateless request builder for the Cloud Debugger v2 API.
//!
//! # Design
//! `DebuggerClient` holds only a root URL and a set of default parameters and
//! carries no mutable state between calls. Every operation goes through the
//! single `build` function, driven by the descriptor table in `endpoint`.
//! The typed `build_*` helpers only assemble `Params` for it. Executing the
//! request is left to a caller-supplied `RequestExecutor`, keeping the core
//! deterministic and free of I/O dependencies.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::endpoint::Operation;
use crate::error::ApiError;
use crate::executor::RequestExecutor;
use crate::http::HttpRequest;
use crate::params::Params;

/// Fixed host every operation targets unless a client is built with
/// another root.
pub const DEFAULT_ROOT_URL: &str = "https://clouddebugger.googleapis.com";

/// Optional parameters of `clouddebugger.debugger.debuggees.list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDebuggeesQuery {
    /// Project number whose debuggees are listed.
    pub project: Option<String>,
    /// Include debuggees that are no longer active.
    pub include_inactive: Option<bool>,
}

/// Optional parameters of `clouddebugger.debugger.debuggees.breakpoints.list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListBreakpointsQuery {
    /// Include breakpoints set by any user, not only the caller.
    pub include_all_users: Option<bool>,
    /// Include completed breakpoints.
    pub include_inactive: Option<bool>,
    /// Only breakpoints with this action (`CAPTURE` or `LOG`).
    pub action: Option<String>,
    /// Drop stack frames, evaluated expressions and the variable table.
    pub strip_results: Option<bool>,
    /// Token from the previous response; the server holds the call until
    /// the list changes or answers `ABORTED` on timeout.
    pub wait_token: Option<String>,
}

/// Synchronous, stateless client for the Cloud Debugger API.
///
/// Builds `HttpRequest` values without touching the network. `call` hands
/// the request to an executor and returns its handle untouched.
#[derive(Debug, Clone)]
pub struct DebuggerClient {
    root_url: String,
    default_params: Params,
}

impl Default for DebuggerClient {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_URL)
    }
}

impl DebuggerClient {
    pub fn new(root_url: &str) -> Self {
        Self {
            root_url: root_url.trim_end_matches('/').to_string(),
            default_params: Params::new(),
        }
    }

    /// Parameters sent with every request, such as an API `key`.
    /// Per-call parameters with the same name take precedence.
    pub fn with_default_params(mut self, params: Params) -> Self {
        self.default_params = params;
        self
    }

    /// Build the request for `operation`.
    ///
    /// Fails with `ApiError::MissingParameters` when any required or path
    /// parameter is absent or empty. Path parameters are percent-encoded
    /// into the template; every other parameter becomes a query pair.
    pub fn build(
        &self,
        operation: Operation,
        params: &Params,
        body: Option<Value>,
    ) -> Result<HttpRequest, ApiError> {
        let endpoint = operation.endpoint();
        let params = self.default_params.merged(params);

        let missing = endpoint.missing_params(&params);
        if !missing.is_empty() {
            warn!(%operation, missing = ?missing, "rejecting request with missing parameters");
            return Err(ApiError::MissingParameters {
                operation,
                names: missing,
            });
        }

        let path = endpoint.expand_path(&params);

        let query: Vec<(String, String)> = params
            .into_iter()
            .filter(|(name, _)| !endpoint.path_params.iter().any(|p| p == name))
            .collect();
        for (name, _) in query.iter().filter(|(name, _)| !endpoint.documents_query(name)) {
            debug!(%operation, param = %name, "forwarding undocumented parameter");
        }

        let (headers, body) = match body {
            Some(body) => {
                if !endpoint.accepts_body {
                    debug!(%operation, "attaching body to a method that documents none");
                }
                (
                    vec![("content-type".to_string(), "application/json".to_string())],
                    Some(serde_json::to_string(&body)?),
                )
            }
            None => (Vec::new(), None),
        };

        let request = HttpRequest {
            method: endpoint.method,
            url: format!("{}/{path}", self.root_url),
            query,
            headers,
            body,
        };
        debug!(%operation, method = %request.method, url = %request.full_url(), "built request");
        Ok(request)
    }

    /// Build the request for `operation` and hand it to `executor`.
    ///
    /// The executor is never invoked when building fails.
    pub fn call<E: RequestExecutor>(
        &self,
        executor: &E,
        operation: Operation,
        params: &Params,
        body: Option<Value>,
    ) -> Result<E::Handle, ApiError> {
        let request = self.build(operation, params, body)?;
        Ok(executor.execute(request))
    }

    pub fn build_register_debuggee<B: Serialize + ?Sized>(
        &self,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        self.build(
            Operation::RegisterDebuggee,
            &Params::new(),
            Some(serde_json::to_value(body)?),
        )
    }

    pub fn build_list_active_breakpoints(
        &self,
        debuggee_id: &str,
        wait_token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let params = Params::new()
            .with("debuggeeId", debuggee_id)
            .with_opt("waitToken", wait_token);
        self.build(Operation::ListActiveBreakpoints, &params, None)
    }

    pub fn build_update_active_breakpoint<B: Serialize + ?Sized>(
        &self,
        debuggee_id: &str,
        id: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let params = Params::new().with("debuggeeId", debuggee_id).with("id", id);
        self.build(
            Operation::UpdateActiveBreakpoint,
            &params,
            Some(serde_json::to_value(body)?),
        )
    }

    pub fn build_list_debuggees(&self, query: &ListDebuggeesQuery) -> Result<HttpRequest, ApiError> {
        let params = Params::new()
            .with_opt("project", query.project.as_deref())
            .with_opt("includeInactive", query.include_inactive);
        self.build(Operation::ListDebuggees, &params, None)
    }

    pub fn build_set_breakpoint<B: Serialize + ?Sized>(
        &self,
        debuggee_id: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let params = Params::new().with("debuggeeId", debuggee_id);
        self.build(
            Operation::SetBreakpoint,
            &params,
            Some(serde_json::to_value(body)?),
        )
    }

    pub fn build_get_breakpoint(
        &self,
        debuggee_id: &str,
        breakpoint_id: &str,
    ) -> Result<HttpRequest, ApiError> {
        let params = Params::new()
            .with("debuggeeId", debuggee_id)
            .with("breakpointId", breakpoint_id);
        self.build(Operation::GetBreakpoint, &params, None)
    }

    pub fn build_delete_breakpoint(
        &self,
        debuggee_id: &str,
        breakpoint_id: &str,
    ) -> Result<HttpRequest, ApiError> {
        let params = Params::new()
            .with("debuggeeId", debuggee_id)
            .with("breakpointId", breakpoint_id);
        self.build(Operation::DeleteBreakpoint, &params, None)
    }

    pub fn build_list_breakpoints(
        &self,
        debuggee_id: &str,
        query: &ListBreakpointsQuery,
    ) -> Result<HttpRequest, ApiError> {
        let params = Params::new()
            .with("debuggeeId", debuggee_id)
            .with_opt("includeAllUsers", query.include_all_users)
            .with_opt("includeInactive", query.include_inactive)
            .with_opt("action.value", query.action.as_deref())
            .with_opt("stripResults", query.strip_results)
            .with_opt("waitToken", query.wait_token.as_deref());
        self.build(Operation::ListBreakpoints, &params, None)
    }
}
