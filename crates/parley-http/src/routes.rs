//! Axum router and HTTP handlers.
//!
//! `POST {interactions_path}` authenticates the raw body, decodes it and hands
//! it to the dispatcher. Every other method on that path is answered 405 by
//! the router itself.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, FailedToBufferBody};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{instrument, warn};

use parley_core::constants::{
    SIGNATURE_HEADER, STATUS_BAD_REQUEST, STATUS_INTERNAL_SERVER_ERROR, TIMESTAMP_HEADER,
};
use parley_core::{
    authenticate, dispatch, AuthResult, DispatchOutcome, Interaction, MisconfigurationReason,
    Registry, SignatureHeaders,
};

use crate::config::HEALTH_PATH;

/// Shared state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Immutable after startup.
    pub registry: Arc<Registry>,
    /// Hex-encoded application public key, as configured.
    pub public_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(registry: Arc<Registry>, public_key: Option<String>) -> Self {
        Self {
            registry,
            public_key: public_key.map(Arc::from),
        }
    }
}

pub fn router(state: AppState, interactions_path: &str) -> Router {
    Router::new()
        .route(interactions_path, post(interactions))
        .route(HEALTH_PATH, get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// `GET /health`: liveness plus registry size.
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "global_commands": state.registry.global_len(),
        "guild_commands": state.registry.guild_len(),
    }))
}

/// `POST {interactions_path}`: verify, decode, dispatch.
#[instrument(
    name = "interaction",
    skip_all,
    fields(interaction_type = tracing::field::Empty, command = tracing::field::Empty)
)]
async fn interactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let raw_body = match body {
        Ok(bytes) => Some(bytes),
        Err(BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(limit))) => {
            warn!(error = %limit, "request body exceeds the size limit");
            return error_response(limit.status(), "payload_too_large");
        }
        Err(rejection) => {
            warn!(error = %rejection, "request body could not be read");
            None
        }
    };

    let signature_headers =
        SignatureHeaders::new(header_str(&headers, SIGNATURE_HEADER), header_str(&headers, TIMESTAMP_HEADER));

    let verdict = authenticate(raw_body.as_deref(), &signature_headers, state.public_key.as_deref());
    let body = match (verdict, raw_body) {
        (AuthResult::Authorized, Some(body)) => body,
        (AuthResult::Authorized, None) => {
            return error_response(
                status_code(STATUS_INTERNAL_SERVER_ERROR),
                MisconfigurationReason::NoRawBody.category(),
            );
        }
        (AuthResult::Unauthorized(reason), _) => {
            return error_response(status_code(verdict.status()), reason.category());
        }
        (AuthResult::ServerMisconfigured(reason), _) => {
            return error_response(status_code(verdict.status()), reason.category());
        }
    };

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(interaction) => interaction,
        Err(e) => {
            warn!(error = %e, "authenticated body is not a valid interaction");
            return error_response(status_code(STATUS_BAD_REQUEST), "invalid interaction payload");
        }
    };

    let span = tracing::Span::current();
    span.record("interaction_type", interaction.kind.code());
    if let Some(name) = interaction.command_name() {
        span.record("command", name);
    }

    let outcome = dispatch(interaction, &state.registry).await;
    let status = status_code(outcome.status());
    match outcome {
        DispatchOutcome::Responded(response) => (status, Json(response)).into_response(),
        DispatchOutcome::Acknowledged => status.into_response(),
        DispatchOutcome::Failed(failure) => error_response(status, failure.category()),
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Header value as text; absent and non-UTF-8 are both `None`.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn error_response(status: StatusCode, category: &str) -> Response {
    (status, Json(json!({ "error": category }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use ed25519_dalek::{Signer, SigningKey};
    use parley_core::{handler, CommandDeclaration, HandlerReply, HandlerResult, InteractionResponse};
    use tower::ServiceExt;

    const PATH: &str = "/interactions";

    async fn pong(_: Interaction) -> HandlerResult {
        Ok(HandlerReply::Respond(InteractionResponse::message("pong")))
    }

    fn key() -> SigningKey {
        SigningKey::from_bytes(&[3u8; 32])
    }

    fn app(public_key: Option<String>) -> Router {
        let registry = Registry::builder()
            .command(CommandDeclaration::chat_input("ping", "Replies with pong", handler(pong)))
            .command(CommandDeclaration::chat_input("ping", "Guild pong", handler(pong)).guild("7"))
            .build()
            .unwrap();
        router(AppState::new(Arc::new(registry), public_key), PATH)
    }

    fn signed(body: &str) -> Request<Body> {
        let timestamp = "1700000000";
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body.as_bytes());
        let signature = hex::encode(key().sign(&message).to_bytes());
        Request::post(PATH)
            .header(SIGNATURE_HEADER, signature)
            .header(TIMESTAMP_HEADER, timestamp)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn public_hex() -> Option<String> {
        Some(hex::encode(key().verifying_key().to_bytes()))
    }

    #[tokio::test]
    async fn health_reports_registry_size() {
        let response = app(None)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"status": "ok", "global_commands": 1, "guild_commands": 1})
        );
    }

    #[tokio::test]
    async fn ping_is_answered_with_pong() {
        let response = app(public_hex()).oneshot(signed(r#"{"type":1}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"type": 1}));
    }

    #[tokio::test]
    async fn get_is_method_not_allowed() {
        let response = app(public_hex())
            .oneshot(Request::get(PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn missing_public_key_is_a_server_error() {
        let response = app(None).oneshot(signed(r#"{"type":1}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await, json!({"error": "no_public_key"}));
    }

    #[tokio::test]
    async fn unsigned_request_is_unauthorized() {
        let request = Request::post(PATH).body(Body::from(r#"{"type":1}"#)).unwrap();
        let response = app(public_hex()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await, json!({"error": "missing_headers"}));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_before_auth() {
        let body = format!(r#"{{"type":1,"pad":"{}"}}"#, "a".repeat(3 * 1024 * 1024));
        let response = app(public_hex()).oneshot(signed(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json_body(response).await, json!({"error": "payload_too_large"}));
    }

    #[tokio::test]
    async fn signed_garbage_is_bad_request() {
        let response = app(public_hex()).oneshot(signed("not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_command_hides_detail() {
        let body = r#"{"type":2,"data":{"name":"secret-internal-name"}}"#;
        let response = app(public_hex()).oneshot(signed(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await, json!({"error": "unknown_command"}));
    }
}
