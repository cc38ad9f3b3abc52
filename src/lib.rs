// Tanka API - Data access and HTTP surface for a short-poem sharing service

// HTTP handlers and router
pub mod api;

// Core types and primitives
pub mod core;

// Infrastructure - Database, store, identity and webhooks
pub mod infrastructure;

// Common utilities
pub mod app_state;
pub mod config;
pub mod error;
pub mod models;

// Re-exports for convenience
pub use error::{AppError, AppResult};
