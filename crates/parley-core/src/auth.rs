//! Request authentication for interaction webhooks.
//!
//! [`authenticate`] runs the ordered checks below and stops at the first
//! failure:
//!
//! 1. configured public key missing or undecodable → `ServerMisconfigured(NoPublicKey)`
//! 2. raw body not captured upstream → `ServerMisconfigured(NoRawBody)`
//! 3. either signature header missing → `Unauthorized(MissingHeaders)`
//! 4. signature header not hex → `Unauthorized(MissingHeaders)`
//! 5. signature does not verify → `Unauthorized(InvalidSignature)`
//!
//! It must run before the body is parsed and before dispatch.

use tracing::{error, warn};

use crate::constants::{STATUS_INTERNAL_SERVER_ERROR, STATUS_OK, STATUS_UNAUTHORIZED};
use crate::crypto;
use crate::error::{MisconfigurationReason, UnauthorizedReason};

/// The two signature headers, as read from the request.
///
/// A header that is present but not valid UTF-8 should be passed as `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignatureHeaders<'a> {
    /// `X-Signature-Ed25519`, hex-encoded.
    pub signature: Option<&'a str>,
    /// `X-Signature-Timestamp`, used verbatim as the message prefix.
    pub timestamp: Option<&'a str>,
}

impl<'a> SignatureHeaders<'a> {
    pub fn new(signature: Option<&'a str>, timestamp: Option<&'a str>) -> Self {
        Self { signature, timestamp }
    }
}

/// Authorization verdict for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthResult {
    Authorized,
    Unauthorized(UnauthorizedReason),
    ServerMisconfigured(MisconfigurationReason),
}

impl AuthResult {
    /// HTTP status: 200 to proceed, 401 for client faults, 500 for host faults.
    pub fn status(&self) -> u16 {
        match self {
            Self::Authorized => STATUS_OK,
            Self::Unauthorized(_) => STATUS_UNAUTHORIZED,
            Self::ServerMisconfigured(_) => STATUS_INTERNAL_SERVER_ERROR,
        }
    }
}

/// Authenticate a request against the configured application public key.
///
/// `raw_body` is the byte-exact request body, or `None` if the host failed to
/// capture it. Failures are logged: client-caused at warn, host-caused at error.
pub fn authenticate(
    raw_body: Option<&[u8]>,
    headers: &SignatureHeaders<'_>,
    public_key_hex: Option<&str>,
) -> AuthResult {
    let result = check(raw_body, headers, public_key_hex);
    match result {
        AuthResult::Authorized => {}
        AuthResult::Unauthorized(reason) => {
            warn!(%reason, "rejected unauthenticated interaction");
        }
        AuthResult::ServerMisconfigured(reason) => {
            error!(%reason, "cannot authenticate interaction");
        }
    }
    result
}

fn check(
    raw_body: Option<&[u8]>,
    headers: &SignatureHeaders<'_>,
    public_key_hex: Option<&str>,
) -> AuthResult {
    let Some(public_key) = public_key_hex.and_then(crypto::decode_public_key) else {
        return AuthResult::ServerMisconfigured(MisconfigurationReason::NoPublicKey);
    };
    let Some(body) = raw_body else {
        return AuthResult::ServerMisconfigured(MisconfigurationReason::NoRawBody);
    };
    let (Some(signature_hex), Some(timestamp)) = (headers.signature, headers.timestamp) else {
        return AuthResult::Unauthorized(UnauthorizedReason::MissingHeaders);
    };
    // Unverifiable is treated the same as absent.
    let Ok(signature) = hex::decode(signature_hex) else {
        return AuthResult::Unauthorized(UnauthorizedReason::MissingHeaders);
    };

    let message = crypto::signed_message(timestamp, body);
    if crypto::verify(&signature, &message, &public_key) {
        AuthResult::Authorized
    } else {
        AuthResult::Unauthorized(UnauthorizedReason::InvalidSignature)
    }
}
