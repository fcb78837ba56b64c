//! Observability for jwt-guard.
//!
//! Provides metrics definitions. Installing an exporter is left to the host
//! application; without one, recording is a no-op.

pub mod metrics;
