//! Module for core business logic services.
//!
//! This module encapsulates services that perform specific business
//! operations: authenticating logins, managing users, building user info
//! and issuing end-to-end-encryption tokens.

pub mod authentication_service;
pub mod e2e_token_service;
pub mod info_service;
pub mod user_info_service;
pub mod user_service;
