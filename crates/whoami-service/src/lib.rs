//! whoami Service Library
//!
//! A small reference service wiring up jwt-guard from environment
//! configuration. It serves:
//!
//! - `/health` - Liveness check, no authentication
//! - `/v1/public` - Public endpoint, no authentication
//! - `/v1/greeting` - Optional authentication: greets the caller by subject
//!   or as anonymous
//! - `/v1/me` - Required authentication: returns the caller's claims
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `handlers` - HTTP request handlers
//! - `routes` - Axum router setup

pub mod config;
pub mod handlers;
pub mod routes;
