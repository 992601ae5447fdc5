//! # API Shared
//!
//! Shared utilities and definitions for the summarisation APIs.
//!
//! Contains:
//! - Wire bodies for health checks and error responses (`bodies` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest`, and by any further transport, so every surface answers with the same shapes.

pub mod bodies;
pub mod health;

pub use bodies::{
    GenerationUnavailableBody, HealthRes, InvalidJsonBody, ValidationFailedBody,
    GENERATION_UNAVAILABLE, INVALID_JSON, VALIDATION_FAILED,
};
pub use health::HealthService;
