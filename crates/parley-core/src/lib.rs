//! # parley-core
//! Verification, registry and dispatch pipeline for signed interaction webhooks.

pub mod auth;
pub mod constants;
pub mod crypto;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod registry;
pub mod response;
pub mod types;

pub use auth::{authenticate, AuthResult, SignatureHeaders};
pub use dispatch::{dispatch, DispatchOutcome};
pub use error::{ConfigurationError, DispatchFailure, MisconfigurationReason, UnauthorizedReason};
pub use handler::{handler, HandlerError, HandlerRef, HandlerReply, HandlerResult, InteractionHandler};
pub use registry::{CommandDeclaration, CommandEntry, Declaration, OptionDeclaration, Registry, RegistryBuilder};
pub use response::InteractionResponse;
pub use types::{GuildId, Interaction, InteractionType};
