//! form-relay: contact form submissions relayed to email.

pub mod api;
pub mod config;
pub mod error;
pub mod notifier;
pub mod pipeline;
pub mod verifier;
