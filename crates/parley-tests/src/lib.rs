//! End-to-end and adversarial test suite for Parley.
//!
//! Integration tests drive the full HTTP router in process and try to get an
//! unauthenticated or malformed request past the verification gate.

pub mod helpers;
