//! Authentication module.
//!
//! This module provides the legacy login-compatibility endpoint: request
//! models and their normalization, the adapter service, the collaborator
//! interfaces it depends on, and the token middleware shared by other
//! routes.

pub mod collaborators;
pub mod compat;
pub mod errors;
pub mod handlers;
pub mod invocation;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
