//! Common utilities shared across the SSO gate crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT utilities (size limits, clock skew, iat validation)
pub mod jwt;
