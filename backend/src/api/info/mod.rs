//! Server information endpoint.

pub mod handlers;
pub mod routes;
