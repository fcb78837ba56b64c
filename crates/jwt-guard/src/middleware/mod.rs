//! Authentication middleware.
//!
//! # Components
//!
//! - `auth` - `JwtAuth` state and the `require_authentication` /
//!   `optional_authentication` middleware
//! - `context` - `AuthContext` placed in request extensions
//! - `failure` - Failure handlers producing rejection responses

pub mod auth;
pub mod context;
pub mod failure;

pub use auth::{optional_authentication, require_authentication, AuthAttempt, JwtAuth};
pub use context::{AuthContext, AuthContextExt};
pub use failure::{FailureHandler, RejectUnauthorized, RejectUnavailable};
