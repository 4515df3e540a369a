//! Error taxonomy for the verification and dispatch pipeline.
//!
//! Every failure the pipeline can produce is one of these closed enums, and
//! each maps to exactly one HTTP status (see [`DispatchFailure::status`] and
//! [`crate::auth::AuthResult::status`]).
use thiserror::Error;

use crate::constants::STATUS_INTERNAL_SERVER_ERROR;

/// Invalid declaration detected while building a [`crate::Registry`].
///
/// Raised at startup, never at request time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("unknown option type `{kind}` on option `{option}`")] UnknownOptionType { option: String, kind: String },
    #[error("unknown channel kind `{kind}` on option `{option}`")] UnknownChannelKind { option: String, kind: String },
    #[error("unknown wire code {code} for {what}")] UnknownCode { what: &'static str, code: u8 },
    #[error("chat input command `{0}` requires a description")] MissingDescription(String),
    #[error("invalid name `{0}`")] InvalidName(String),
    #[error("invalid description on `{0}`")] InvalidDescription(String),
    #[error("option `{0}` sets both choices and autocomplete")] ChoicesWithAutocomplete(String),
    #[error("option `{option}`: {reason}")] InvalidBounds { option: String, reason: &'static str },
    #[error("option `{0}` sets channel types but is not a channel option")] ChannelTypesOnNonChannel(String),
    #[error("`{name}` declares {count} {what}, at most {max} allowed")] TooMany { name: String, what: &'static str, count: usize, max: usize },
    #[error("option `{0}` nests options but is not a sub-command or group")] UnexpectedNesting(String),
    #[error("command `{0}` has an autocomplete handler but is not a chat input command")] AutocompleteOnContextMenu(String),
    #[error("context menu command `{0}` cannot declare options")] OptionsOnContextMenu(String),
}

/// Why a request was refused as unauthenticated (HTTP 401).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedReason {
    /// A signature header is absent, or the signature is not valid hex.
    #[error("missing or unreadable signature headers")]
    MissingHeaders,
    /// The signature does not verify over timestamp and raw body.
    #[error("invalid request signature")]
    InvalidSignature,
}

impl UnauthorizedReason {
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingHeaders => "missing_headers",
            Self::InvalidSignature => "invalid_signature",
        }
    }
}

/// Why the host could not authenticate a request at all (HTTP 500).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MisconfigurationReason {
    /// No application public key configured, or it does not decode.
    #[error("no usable application public key configured")]
    NoPublicKey,
    /// The byte-exact request body was not captured upstream.
    #[error("raw request body unavailable")]
    NoRawBody,
}

impl MisconfigurationReason {
    pub fn category(&self) -> &'static str {
        match self {
            Self::NoPublicKey => "no_public_key",
            Self::NoRawBody => "no_raw_body",
        }
    }
}

/// Terminal failure of a single dispatch.
///
/// All variants map to HTTP 500: they are registry or application bugs, or a
/// handler that gave up, never transport faults.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchFailure {
    #[error("unknown command `{0}`")] UnknownCommand(String),
    #[error("command `{0}` has no autocomplete handler")] NoAutocompleteHandler(String),
    #[error("no component handler registered")] NoComponentHandler,
    #[error("no modal handler registered")] NoModalHandler,
    #[error("unknown interaction type {0:?}")] UnknownInteractionType(Option<u64>),
    #[error("handler reported an error: {0}")] HandlerReportedError(String),
    #[error("handler crashed: {0}")] HandlerCrashed(String),
}

impl DispatchFailure {
    /// Short machine-readable category, safe to expose to callers.
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnknownCommand(_) => "unknown_command",
            Self::NoAutocompleteHandler(_) => "no_autocomplete_handler",
            Self::NoComponentHandler => "no_component_handler",
            Self::NoModalHandler => "no_modal_handler",
            Self::UnknownInteractionType(_) => "unknown_interaction_type",
            Self::HandlerReportedError(_) => "handler_reported_error",
            Self::HandlerCrashed(_) => "handler_crashed",
        }
    }

    /// HTTP status for this failure.
    pub fn status(&self) -> u16 {
        STATUS_INTERNAL_SERVER_ERROR
    }
}
