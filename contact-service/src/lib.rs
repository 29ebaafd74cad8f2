//! contact-service: relays website contact-form submissions to a fixed
//! inbox over SMTP, falling back to Mailgun's HTTP API.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
