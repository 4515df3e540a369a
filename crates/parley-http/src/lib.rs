//! # parley-http
//! Axum transport for the Parley pipeline: environment configuration, the
//! interaction webhook router, and the outbound command-registration client.

pub mod config;
pub mod rest;
pub mod routes;

pub use config::Config;
pub use rest::{CommandRegistrar, RegistrationError, RegistrationSummary};
pub use routes::{router, AppState};
