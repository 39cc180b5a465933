//! Request-building core for the Google Cloud Debugger v2 API.
//!
//! # Overview
//! Builds `HttpRequest` values for the eight debugger and controller
//! methods without touching the network (host-does-IO pattern). A caller
//! supplied `RequestExecutor` performs the round-trip; its handle is passed
//! back unchanged.
//!
//! # Design
//! - Endpoints are rows in a static descriptor table (`endpoint::ENDPOINTS`);
//!   one generic `DebuggerClient::build` validates, substitutes and encodes.
//! - A missing required or path parameter fails before any executor runs.
//! - Bodies are opaque JSON; responses are never interpreted here.

pub mod client;
pub mod endpoint;
pub mod error;
pub mod executor;
pub mod http;
pub mod params;

pub use client::{DebuggerClient, ListBreakpointsQuery, ListDebuggeesQuery, DEFAULT_ROOT_URL};
pub use endpoint::{Endpoint, Operation, ENDPOINTS};
pub use error::ApiError;
pub use executor::RequestExecutor;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use params::Params;
