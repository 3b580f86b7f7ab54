//! HTTP API: availability gate, settings surface and server wiring.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod gate;
pub mod middleware;
pub mod settings_store;
