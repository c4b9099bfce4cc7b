//! HTTP API: server wiring, request context extraction, and response mapping.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
