//! HTTP API: server wiring, routing, request interceptors and
//! request/response mapping.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
pub mod rpc;
