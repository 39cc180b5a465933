//! Endpoint descriptor table for the Cloud Debugger v2 surface.
//!
//! # Design
//! Each remote method is a row in `ENDPOINTS`: verb, path template,
//! required and path parameter names, the documented optional query
//! parameters, and whether it carries a request body. `DebuggerClient::build`
//! is the only consumer, so adding a method is a one-row change.

use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::params::Params;

/// A named remote method of the Cloud Debugger API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    RegisterDebuggee,
    ListActiveBreakpoints,
    UpdateActiveBreakpoint,
    ListDebuggees,
    SetBreakpoint,
    GetBreakpoint,
    DeleteBreakpoint,
    ListBreakpoints,
}

/// Immutable request descriptor for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub operation: Operation,
    pub method: HttpMethod,
    /// Path relative to the root URL, with `{name}` placeholders.
    pub path: &'static str,
    pub required_params: &'static [&'static str],
    pub path_params: &'static [&'static str],
    /// Documented optional parameters. Others are still forwarded.
    pub query_params: &'static [&'static str],
    pub accepts_body: bool,
}

pub const ENDPOINTS: [Endpoint; 8] = [
    Endpoint {
        operation: Operation::RegisterDebuggee,
        method: HttpMethod::Post,
        path: "v2/controller/debuggees/register",
        required_params: &[],
        path_params: &[],
        query_params: &[],
        accepts_body: true,
    },
    Endpoint {
        operation: Operation::ListActiveBreakpoints,
        method: HttpMethod::Get,
        path: "v2/controller/debuggees/{debuggeeId}/breakpoints",
        required_params: &["debuggeeId"],
        path_params: &["debuggeeId"],
        query_params: &["waitToken"],
        accepts_body: false,
    },
    Endpoint {
        operation: Operation::UpdateActiveBreakpoint,
        method: HttpMethod::Put,
        path: "v2/controller/debuggees/{debuggeeId}/breakpoints/{id}",
        required_params: &["debuggeeId", "id"],
        path_params: &["debuggeeId", "id"],
        query_params: &[],
        accepts_body: true,
    },
    Endpoint {
        operation: Operation::ListDebuggees,
        method: HttpMethod::Get,
        path: "v2/debugger/debuggees",
        required_params: &[],
        path_params: &[],
        query_params: &["project", "includeInactive"],
        accepts_body: false,
    },
    Endpoint {
        operation: Operation::SetBreakpoint,
        method: HttpMethod::Post,
        path: "v2/debugger/debuggees/{debuggeeId}/breakpoints/set",
        required_params: &["debuggeeId"],
        path_params: &["debuggeeId"],
        query_params: &[],
        accepts_body: true,
    },
    Endpoint {
        operation: Operation::GetBreakpoint,
        method: HttpMethod::Get,
        path: "v2/debugger/debuggees/{debuggeeId}/breakpoints/{breakpointId}",
        required_params: &["debuggeeId", "breakpointId"],
        path_params: &["debuggeeId", "breakpointId"],
        query_params: &[],
        accepts_body: false,
    },
    Endpoint {
        operation: Operation::DeleteBreakpoint,
        method: HttpMethod::Delete,
        path: "v2/debugger/debuggees/{debuggeeId}/breakpoints/{breakpointId}",
        required_params: &["debuggeeId", "breakpointId"],
        path_params: &["debuggeeId", "breakpointId"],
        query_params: &[],
        accepts_body: false,
    },
    Endpoint {
        operation: Operation::ListBreakpoints,
        method: HttpMethod::Get,
        path: "v2/debugger/debuggees/{debuggeeId}/breakpoints",
        required_params: &["debuggeeId"],
        path_params: &["debuggeeId"],
        query_params: &[
            "includeAllUsers",
            "includeInactive",
            "action.value",
            "stripResults",
            "waitToken",
        ],
        accepts_body: false,
    },
];

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::RegisterDebuggee,
        Operation::ListActiveBreakpoints,
        Operation::UpdateActiveBreakpoint,
        Operation::ListDebuggees,
        Operation::SetBreakpoint,
        Operation::GetBreakpoint,
        Operation::DeleteBreakpoint,
        Operation::ListBreakpoints,
    ];

    /// Dotted API method name, e.g. `clouddebugger.debugger.debuggees.list`.
    pub fn name(self) -> &'static str {
        match self {
            Operation::RegisterDebuggee => "clouddebugger.controller.debuggees.register",
            Operation::ListActiveBreakpoints => {
                "clouddebugger.controller.debuggees.breakpoints.list"
            }
            Operation::UpdateActiveBreakpoint => {
                "clouddebugger.controller.debuggees.breakpoints.update"
            }
            Operation::ListDebuggees => "clouddebugger.debugger.debuggees.list",
            Operation::SetBreakpoint => "clouddebugger.debugger.debuggees.breakpoints.set",
            Operation::GetBreakpoint => "clouddebugger.debugger.debuggees.breakpoints.get",
            Operation::DeleteBreakpoint => "clouddebugger.debugger.debuggees.breakpoints.delete",
            Operation::ListBreakpoints => "clouddebugger.debugger.debuggees.breakpoints.list",
        }
    }

    pub fn endpoint(self) -> &'static Endpoint {
        // Rows are declared in the same order as `Operation::ALL`.
        &ENDPOINTS[self as usize]
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| ApiError::UnknownOperation(s.to_string()))
    }
}

impl Endpoint {
    /// Find the descriptor for a dotted method name.
    pub fn lookup(name: &str) -> Result<&'static Endpoint, ApiError> {
        name.parse::<Operation>().map(Operation::endpoint)
    }

    /// Placeholder names in `path`, in template order.
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut rest = self.path;
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            names.push(&rest[start + 1..start + len]);
            rest = &rest[start + len + 1..];
        }
        names
    }

    /// Union of required and path parameters, without duplicates, in
    /// declaration order.
    pub fn mandatory_params(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.required_params.to_vec();
        for name in self.path_params {
            if !names.contains(name) {
                names.push(name);
            }
        }
        names
    }

    /// Mandatory parameters that are absent or empty in `params`, in
    /// `mandatory_params` order.
    pub fn missing_params(&self, params: &Params) -> Vec<&'static str> {
        self.mandatory_params()
            .into_iter()
            .filter(|name| !params.is_set(name))
            .collect()
    }

    /// `path` with every path parameter percent-encoded into its
    /// placeholder. Callers check `missing_params` first.
    pub fn expand_path(&self, params: &Params) -> String {
        let mut path = self.path.to_string();
        for name in self.path_params {
            let value = params.get(name).unwrap_or_default();
            path = path.replace(&format!("{{{name}}}"), &urlencoding::encode(value));
        }
        path
    }

    /// True for a parameter this method documents as a query parameter.
    pub fn documents_query(&self, name: &str) -> bool {
        self.query_params.iter().chain(self.required_params).any(|q| *q == name)
    }
}
