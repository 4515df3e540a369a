//! Application handler contract.
//!
//! A handler receives the full decoded [`Interaction`] and answers with a
//! [`HandlerReply`]. Returning `Err` (or panicking) counts as a crash and is
//! contained by the dispatcher; [`HandlerReply::Reject`] is the explicit way
//! for a handler to report that it could not serve the interaction.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::response::InteractionResponse;
use crate::types::Interaction;

/// Error raised by a handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// What a handler returns.
pub type HandlerResult = Result<HandlerReply, HandlerError>;

/// Successful handler outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerReply {
    /// Answer with this payload (HTTP 200).
    Respond(InteractionResponse),
    /// Accept without a payload (HTTP 202).
    Acknowledge,
    /// The handler declined; the string is logged, not sent.
    Reject(String),
}

/// Application code invoked for a routed interaction.
#[async_trait]
pub trait InteractionHandler: Send + Sync {
    async fn handle(&self, interaction: Interaction) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> InteractionHandler for F
where
    F: Fn(Interaction) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, interaction: Interaction) -> HandlerResult {
        (self)(interaction).await
    }
}

/// Shared reference to a registered handler.
pub type HandlerRef = Arc<dyn InteractionHandler>;

/// Wrap a handler (an `async fn(Interaction) -> HandlerResult` or any
/// [`InteractionHandler`]) for registration.
pub fn handler<H: InteractionHandler + 'static>(handler: H) -> HandlerRef {
    Arc::new(handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InteractionType;

    async fn pong(_: Interaction) -> HandlerResult {
        Ok(HandlerReply::Respond(InteractionResponse::pong()))
    }

    struct Counter(std::sync::atomic::AtomicUsize);

    #[async_trait]
    impl InteractionHandler for Counter {
        async fn handle(&self, _: Interaction) -> HandlerResult {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(HandlerReply::Acknowledge)
        }
    }

    #[tokio::test]
    async fn async_fn_is_a_handler() {
        let h = handler(pong);
        let reply = h.handle(Interaction::new(InteractionType::Ping)).await.unwrap();
        assert_eq!(reply, HandlerReply::Respond(InteractionResponse::pong()));
    }

    #[tokio::test]
    async fn struct_handlers_keep_state() {
        let counter = Arc::new(Counter(Default::default()));
        let h: HandlerRef = counter.clone();
        h.handle(Interaction::new(InteractionType::MessageComponent)).await.unwrap();
        h.handle(Interaction::new(InteractionType::MessageComponent)).await.unwrap();
        assert_eq!(counter.0.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
