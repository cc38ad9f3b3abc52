// Infrastructure - Database, data access, identity provider integration and request middleware

pub mod database;
pub mod identity;
pub mod middleware;
pub mod store;
pub mod viewer;
pub mod webhook;

pub use database::TankaDatabase;
pub use store::TankaStore;
