//! Lane API Library
//!
//! This crate provides the HTTP API handlers, middleware, and application
//! setup for the Memory Lane storage service.

// Module declarations
mod api_doc;
pub mod handlers;
pub mod setup;
mod telemetry;
mod utils;

// Public modules
pub mod auth;
pub mod error;
pub mod state;

// Re-exports
pub use error::ErrorResponse;
pub use state::AppState;
