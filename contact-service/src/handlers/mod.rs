//! HTTP handlers for contact-service.

pub mod health;
pub mod submit;

pub use health::{health_check, metrics_endpoint, not_found, readiness_check};
pub use submit::submit;
