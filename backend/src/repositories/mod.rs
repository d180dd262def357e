//! Data access layer.
//!
//! Repositories wrap the SQLite pool and expose typed queries; the user and
//! role repositories double as the login flow's `UserStore` and
//! `RoleChecker`.

pub mod role_repository;
pub mod user_repository;
