//! Criterion benchmarks for the request hot path.
//!
//! Covers: raw Ed25519 verification, full request authentication, and
//! dispatch of a command through a populated registry.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ed25519_dalek::{Signer, SigningKey};

use parley_core::crypto::{signed_message, verify};
use parley_core::handler::{handler, HandlerReply, HandlerResult};
use parley_core::response::InteractionResponse;
use parley_core::types::InteractionData;
use parley_core::{
    authenticate, dispatch, CommandDeclaration, Interaction, InteractionType, Registry,
    SignatureHeaders,
};

const TIMESTAMP: &str = "1700000000";
const BODY: &[u8] = br#"{"type":2,"id":"1","application_id":"2","token":"t","data":{"id":"3","name":"ping","type":1}}"#;

async fn pong(_: Interaction) -> HandlerResult {
    Ok(HandlerReply::Respond(InteractionResponse::message("pong")))
}

fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

fn bench_verify(c: &mut Criterion) {
    let key = signing_key();
    let message = signed_message(TIMESTAMP, BODY);
    let signature = key.sign(&message).to_bytes();
    let public_key = key.verifying_key().to_bytes();

    c.bench_function("ed25519_verify", |b| {
        b.iter(|| verify(black_box(&signature), black_box(&message), black_box(&public_key)))
    });
}

fn bench_authenticate(c: &mut Criterion) {
    let key = signing_key();
    let signature_hex = hex::encode(key.sign(&signed_message(TIMESTAMP, BODY)).to_bytes());
    let public_key_hex = hex::encode(key.verifying_key().to_bytes());
    let headers = SignatureHeaders::new(Some(&signature_hex), Some(TIMESTAMP));

    c.bench_function("authenticate_valid_request", |b| {
        b.iter(|| authenticate(black_box(Some(BODY)), &headers, Some(&public_key_hex)))
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let mut builder = Registry::builder();
    for i in 0..50 {
        builder = builder.command(
            CommandDeclaration::chat_input(format!("command-{i}"), "filler", handler(pong))
                .guild(format!("{}", 1000 + i % 5)),
        );
    }
    let registry = builder
        .command(CommandDeclaration::chat_input("ping", "Replies with pong", handler(pong)))
        .build()
        .unwrap();

    let mut interaction = Interaction::new(InteractionType::ApplicationCommand);
    interaction.guild_id = Some("1002".into());
    interaction.data = Some(InteractionData {
        name: Some("ping".into()),
        ..Default::default()
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    c.bench_function("dispatch_global_command", |b| {
        b.iter(|| runtime.block_on(dispatch(black_box(interaction.clone()), &registry)))
    });
}

criterion_group!(benches, bench_verify, bench_authenticate, bench_dispatch);
criterion_main!(benches);
