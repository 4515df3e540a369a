//! Adversarial property-based tests for Parley.
//!
//! Each property uses 256 cases with proptest shrinking.
//!
//! Attack vectors tested:
//! - Single-bit tampering with the signature, timestamp or body
//! - Signatures produced by a different key
//! - Arbitrary header garbage
//! - Declaration order dependence of the registry

use proptest::prelude::*;

use parley_core::handler::{handler, HandlerReply, HandlerResult};
use parley_core::{
    authenticate, AuthResult, CommandDeclaration, Declaration, Interaction, Registry,
    SignatureHeaders, UnauthorizedReason,
};
use parley_tests::helpers::{public_key_hex, sign, signing_key};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ack(_: Interaction) -> HandlerResult {
    Ok(HandlerReply::Acknowledge)
}

/// Flip one bit of `bytes` at a position derived from `index`.
fn flip(bytes: &mut [u8], index: usize, bit: u8) {
    let i = index % bytes.len();
    bytes[i] ^= 1 << (bit % 8);
}

fn auth(body: &[u8], signature: &str, timestamp: &str, public_key: &str) -> AuthResult {
    authenticate(
        Some(body),
        &SignatureHeaders::new(Some(signature), Some(timestamp)),
        Some(public_key),
    )
}

const INVALID: AuthResult = AuthResult::Unauthorized(UnauthorizedReason::InvalidSignature);

/// Distinct command names, each global or scoped to some of three guilds.
fn command_specs() -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    prop::collection::btree_map(
        "[a-z][a-z0-9_-]{0,15}",
        prop::sample::subsequence(vec!["1", "2", "3"], 0..=3),
        1..12,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .map(|(name, guilds)| (name, guilds.into_iter().map(str::to_string).collect()))
            .collect()
    })
}

fn declarations(specs: &[(String, Vec<String>)]) -> Vec<Declaration> {
    let mut declarations: Vec<Declaration> = specs
        .iter()
        .map(|(name, guilds)| {
            Declaration::from(
                CommandDeclaration::chat_input(name.as_str(), "generated", handler(ack))
                    .guilds(guilds.iter().map(String::as_str)),
            )
        })
        .collect();
    declarations.push(Declaration::ComponentHandler(handler(ack)));
    declarations.push(Declaration::ModalHandler(handler(ack)));
    declarations
}

// ---------------------------------------------------------------------------
// Signature verification
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn valid_signature_always_authorizes(
        body in prop::collection::vec(any::<u8>(), 0..512),
        timestamp in "[0-9]{1,12}",
        seed in any::<u8>(),
    ) {
        let key = signing_key(seed);
        let signature = sign(&key, &timestamp, &body);
        prop_assert_eq!(auth(&body, &signature, &timestamp, &public_key_hex(&key)), AuthResult::Authorized);
    }

    #[test]
    fn flipped_body_bit_is_rejected(
        body in prop::collection::vec(any::<u8>(), 1..512),
        index in any::<usize>(),
        bit in any::<u8>(),
    ) {
        let key = signing_key(9);
        let signature = sign(&key, "1700000000", &body);
        let mut tampered = body.clone();
        flip(&mut tampered, index, bit);
        prop_assert_eq!(auth(&tampered, &signature, "1700000000", &public_key_hex(&key)), INVALID);
    }

    #[test]
    fn flipped_timestamp_bit_is_rejected(
        timestamp in "[0-9]{1,12}",
        index in any::<usize>(),
        bit in 0u8..7,
    ) {
        let key = signing_key(9);
        let body = br#"{"type":1}"#;
        let signature = sign(&key, &timestamp, body);
        let mut tampered = timestamp.clone().into_bytes();
        flip(&mut tampered, index, bit);
        // Bits 0..7 of an ASCII digit stay ASCII.
        let tampered = String::from_utf8(tampered).unwrap();
        prop_assert_eq!(auth(body, &signature, &tampered, &public_key_hex(&key)), INVALID);
    }

    #[test]
    fn flipped_signature_bit_is_rejected(
        body in prop::collection::vec(any::<u8>(), 0..256),
        index in any::<usize>(),
        bit in any::<u8>(),
    ) {
        let key = signing_key(9);
        let mut signature = hex::decode(sign(&key, "1700000000", &body)).unwrap();
        flip(&mut signature, index, bit);
        let tampered = hex::encode(signature);
        prop_assert_eq!(auth(&body, &tampered, "1700000000", &public_key_hex(&key)), INVALID);
    }

    #[test]
    fn other_key_is_rejected(
        body in prop::collection::vec(any::<u8>(), 0..256),
        signer in any::<u8>(),
        verifier in any::<u8>(),
    ) {
        prop_assume!(signer != verifier);
        let signature = sign(&signing_key(signer), "1700000000", &body);
        let result = auth(&body, &signature, "1700000000", &public_key_hex(&signing_key(verifier)));
        prop_assert_eq!(result, INVALID);
    }

    #[test]
    fn header_garbage_never_authorizes(
        signature in ".{0,200}",
        timestamp in ".{0,40}",
        body in prop::collection::vec(any::<u8>(), 0..128),
    ) {
        let key = signing_key(9);
        let result = auth(&body, &signature, &timestamp, &public_key_hex(&key));
        prop_assert!(matches!(result, AuthResult::Unauthorized(_)), "got {:?}", result);
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn registry_is_independent_of_declaration_order(
        (specs, order) in command_specs().prop_flat_map(|specs| {
            let indices: Vec<usize> = (0..specs.len() + 2).collect();
            (Just(specs), Just(indices).prop_shuffle())
        })
    ) {
        let declarations = declarations(&specs);
        let shuffled: Vec<Declaration> = order.iter().map(|&i| declarations[i].clone()).collect();

        let in_order = parley_core::registry::build(declarations).unwrap();
        let reordered = parley_core::registry::build(shuffled).unwrap();
        prop_assert_eq!(in_order, reordered);
    }

    #[test]
    fn building_twice_gives_the_same_registry(specs in command_specs()) {
        let declarations = declarations(&specs);
        let first = parley_core::registry::build(declarations.clone()).unwrap();
        let second = parley_core::registry::build(declarations).unwrap();
        prop_assert_eq!(&first, &second);

        let global = specs.iter().filter(|(_, guilds)| guilds.is_empty()).count();
        let scoped: usize = specs.iter().map(|(_, guilds)| guilds.len()).sum();
        prop_assert_eq!(first.global_len(), global);
        prop_assert_eq!(first.guild_len(), scoped);
    }

    #[test]
    fn every_declared_command_resolves(specs in command_specs()) {
        let registry: Registry = parley_core::registry::build(declarations(&specs)).unwrap();
        for (name, guilds) in &specs {
            if guilds.is_empty() {
                prop_assert!(registry.global_command(name).is_some());
            }
            for guild in guilds {
                let entry = registry.resolve_command(Some(&guild.as_str().into()), name);
                prop_assert!(entry.is_some_and(|e| !e.is_global()));
            }
        }
    }
}
