pub mod api;
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod router;
pub mod server;
pub mod state;
