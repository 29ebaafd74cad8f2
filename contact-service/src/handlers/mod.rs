//! HTTP handlers for contact-service.

pub mod contact;
pub mod health;
pub mod metrics;

pub use contact::{submit_contact, ContactResponse};
pub use health::health_check;
pub use metrics::metrics_endpoint;
