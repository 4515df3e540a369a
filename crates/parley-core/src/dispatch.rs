//! Interaction dispatch.
//!
//! [`dispatch`] selects the handler for a decoded, already authenticated
//! interaction, runs it, and normalises the result into a [`DispatchOutcome`].
//!
//! | Interaction type      | Route                                                   |
//! |-----------------------|---------------------------------------------------------|
//! | Ping                  | answered with Pong, no handler involved                 |
//! | ApplicationCommand    | guild-scoped entry, else global entry, else failure     |
//! | Autocomplete          | same lookup, then the entry's autocomplete handler      |
//! | MessageComponent      | the registry's single component handler                 |
//! | ModalSubmit           | the registry's single modal handler                     |
//! | anything else         | `UnknownInteractionType`                                |
//!
//! Handlers run on their own tokio task. An `Err` return or a panic is
//! contained here and becomes [`DispatchFailure::HandlerCrashed`]; nothing
//! propagates to the transport. No deadline is enforced: the platform's
//! response window is the caller's concern.

use std::any::Any;
use std::sync::Arc;

use tokio::task::JoinError;
use tracing::{debug, error};

use crate::constants::{STATUS_ACCEPTED, STATUS_OK};
use crate::error::DispatchFailure;
use crate::handler::{HandlerRef, HandlerReply};
use crate::registry::Registry;
use crate::response::InteractionResponse;
use crate::types::{Interaction, InteractionType};

/// Result of dispatching one interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Handled, nothing to send back (HTTP 202, empty body).
    Acknowledged,
    /// Handled, send this payload (HTTP 200).
    Responded(InteractionResponse),
    /// Not handled (HTTP 500).
    Failed(DispatchFailure),
}

impl DispatchOutcome {
    pub fn status(&self) -> u16 {
        match self {
            Self::Acknowledged => STATUS_ACCEPTED,
            Self::Responded(_) => STATUS_OK,
            Self::Failed(failure) => failure.status(),
        }
    }
}

/// Route `interaction` through `registry` and run the selected handler.
pub async fn dispatch(interaction: Interaction, registry: &Registry) -> DispatchOutcome {
    let kind = interaction.kind;
    let outcome = route(interaction, registry).await;
    if let DispatchOutcome::Failed(failure) = &outcome {
        error!(
            interaction_type = kind.code(),
            category = failure.category(),
            %failure,
            "interaction dispatch failed"
        );
    }
    outcome
}

async fn route(interaction: Interaction, registry: &Registry) -> DispatchOutcome {
    match interaction.kind {
        InteractionType::Ping => DispatchOutcome::Responded(InteractionResponse::pong()),
        InteractionType::ApplicationCommand => {
            let name = interaction.command_name().unwrap_or_default().to_string();
            let Some(entry) = registry.resolve_command(interaction.guild_id.as_ref(), &name) else {
                return DispatchOutcome::Failed(DispatchFailure::UnknownCommand(name));
            };
            debug!(command = %name, global = entry.is_global(), "routing command");
            invoke(entry.handler(), interaction).await
        }
        InteractionType::ApplicationCommandAutocomplete => {
            let name = interaction.command_name().unwrap_or_default().to_string();
            let Some(entry) = registry.resolve_command(interaction.guild_id.as_ref(), &name) else {
                return DispatchOutcome::Failed(DispatchFailure::UnknownCommand(name));
            };
            let Some(handler) = entry.autocomplete_handler() else {
                return DispatchOutcome::Failed(DispatchFailure::NoAutocompleteHandler(name));
            };
            debug!(command = %name, global = entry.is_global(), "routing autocomplete");
            invoke(handler, interaction).await
        }
        InteractionType::MessageComponent => match registry.component_handler() {
            Some(handler) => {
                debug!(custom_id = interaction.custom_id().unwrap_or_default(), "routing component");
                invoke(handler, interaction).await
            }
            None => DispatchOutcome::Failed(DispatchFailure::NoComponentHandler),
        },
        InteractionType::ModalSubmit => match registry.modal_handler() {
            Some(handler) => {
                debug!(custom_id = interaction.custom_id().unwrap_or_default(), "routing modal");
                invoke(handler, interaction).await
            }
            None => DispatchOutcome::Failed(DispatchFailure::NoModalHandler),
        },
        InteractionType::Unknown(code) => {
            DispatchOutcome::Failed(DispatchFailure::UnknownInteractionType(Some(code)))
        }
        InteractionType::Unrecognized => {
            DispatchOutcome::Failed(DispatchFailure::UnknownInteractionType(None))
        }
    }
}

async fn invoke(handler: &HandlerRef, interaction: Interaction) -> DispatchOutcome {
    let handler = Arc::clone(handler);
    let task = tokio::spawn(async move { handler.handle(interaction).await });

    match task.await {
        Ok(Ok(HandlerReply::Respond(response))) => DispatchOutcome::Responded(response),
        Ok(Ok(HandlerReply::Acknowledge)) => DispatchOutcome::Acknowledged,
        Ok(Ok(HandlerReply::Reject(reason))) => {
            DispatchOutcome::Failed(DispatchFailure::HandlerReportedError(reason))
        }
        Ok(Err(err)) => {
            error!(error = %err, detail = ?err, "handler returned an error");
            DispatchOutcome::Failed(DispatchFailure::HandlerCrashed(err.to_string()))
        }
        Err(join_error) => {
            let cause = join_failure(join_error);
            error!(cause = %cause, "handler task aborted");
            DispatchOutcome::Failed(DispatchFailure::HandlerCrashed(cause))
        }
    }
}

fn join_failure(join_error: JoinError) -> String {
    if !join_error.is_panic() {
        return "handler task was cancelled".to_string();
    }
    panic_message(join_error.into_panic())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return format!("panic: {message}");
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return format!("panic: {message}");
    }
    "panic with non-string payload".to_string()
}
