//! End-to-end-encryption service token endpoint.

pub mod handlers;
pub mod routes;
