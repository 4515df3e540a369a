//! Shared test helpers for E2E and adversarial tests.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use ed25519_dalek::{Signer, SigningKey};
use serde_json::Value;

use parley_core::constants::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use parley_core::crypto::signed_message;
use parley_core::handler::{handler, HandlerReply, HandlerResult};
use parley_core::{CommandDeclaration, Interaction, InteractionResponse, Registry};
use parley_http::{router, AppState};

pub const PATH: &str = "/interactions";
pub const TIMESTAMP: &str = "1700000000";
pub const DEV_GUILD: &str = "111";

/// Deterministic signing key from a seed byte.
pub fn signing_key(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

pub fn public_key_hex(key: &SigningKey) -> String {
    hex::encode(key.verifying_key().to_bytes())
}

/// Hex signature over `timestamp || body`.
pub fn sign(key: &SigningKey, timestamp: &str, body: &[u8]) -> String {
    hex::encode(key.sign(&signed_message(timestamp, body)).to_bytes())
}

/// `POST {PATH}` carrying a valid signature for `body`.
pub fn signed_request(key: &SigningKey, body: &str) -> Request<Body> {
    Request::post(PATH)
        .header(SIGNATURE_HEADER, sign(key, TIMESTAMP, body.as_bytes()))
        .header(TIMESTAMP_HEADER, TIMESTAMP)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Application command payload for `name`, optionally inside a guild.
pub fn command_body(name: &str, guild_id: Option<&str>) -> String {
    let mut body = serde_json::json!({
        "id": "1",
        "application_id": "2",
        "token": "interaction-token",
        "type": 2,
        "data": {"id": "3", "name": name, "type": 1},
    });
    if let Some(guild_id) = guild_id {
        body["guild_id"] = Value::from(guild_id);
    }
    body.to_string()
}

async fn global_ping(_: Interaction) -> HandlerResult {
    Ok(HandlerReply::Respond(InteractionResponse::message("global pong")))
}

async fn guild_ping(_: Interaction) -> HandlerResult {
    Ok(HandlerReply::Respond(InteractionResponse::message("guild pong")))
}

async fn quiet(_: Interaction) -> HandlerResult {
    Ok(HandlerReply::Acknowledge)
}

async fn refuse(_: Interaction) -> HandlerResult {
    Ok(HandlerReply::Reject("refused".into()))
}

async fn fail(_: Interaction) -> HandlerResult {
    Err("backend unavailable".into())
}

async fn explode(_: Interaction) -> HandlerResult {
    panic!("handler exploded")
}

/// Registry exercising every dispatch path:
/// `ping` (global, overridden in [`DEV_GUILD`]), `quiet` (202),
/// `refuse` (reported error), `fail` (`Err`), `explode` (panic).
pub fn sample_registry() -> Registry {
    Registry::builder()
        .command(CommandDeclaration::chat_input("ping", "Global ping", handler(global_ping)))
        .command(CommandDeclaration::chat_input("ping", "Guild ping", handler(guild_ping)).guild(DEV_GUILD))
        .command(CommandDeclaration::chat_input("quiet", "Acknowledge only", handler(quiet)))
        .command(CommandDeclaration::chat_input("refuse", "Always declines", handler(refuse)))
        .command(CommandDeclaration::chat_input("fail", "Always errors", handler(fail)))
        .command(CommandDeclaration::chat_input("explode", "Always panics", handler(explode)))
        .build()
        .unwrap()
}

/// Router over [`sample_registry`] trusting `public_key` (hex).
pub fn app(public_key: Option<String>) -> Router {
    router(AppState::new(Arc::new(sample_registry()), public_key), PATH)
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
