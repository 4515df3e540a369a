//! Protocol constants for interaction webhooks.
//!
//! Header names, key sizes and the platform's declaration limits live here so
//! the registry validation and the HTTP layer agree on them.

/// Header carrying the hex-encoded Ed25519 signature.
pub const SIGNATURE_HEADER: &str = "X-Signature-Ed25519";

/// Header carrying the timestamp that prefixes the signed message.
pub const TIMESTAMP_HEADER: &str = "X-Signature-Timestamp";

/// Raw Ed25519 public key length in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Raw Ed25519 signature length in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Maximum length of a command or option name.
pub const MAX_NAME_LEN: usize = 32;

/// Maximum length of a command or option description.
pub const MAX_DESCRIPTION_LEN: usize = 100;

/// Maximum number of options on a command or sub-command.
pub const MAX_OPTIONS: usize = 25;

/// Maximum number of predefined choices on one option.
pub const MAX_CHOICES: usize = 25;

/// Message flag that hides a response from everyone but the invoking user.
pub const EPHEMERAL_FLAG: u64 = 1 << 6;

// HTTP status codes used by the transport mapping.
pub const STATUS_OK: u16 = 200;
pub const STATUS_ACCEPTED: u16 = 202;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_UNAUTHORIZED: u16 = 401;
pub const STATUS_INTERNAL_SERVER_ERROR: u16 = 500;
