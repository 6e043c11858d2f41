//! Session token handling.
//!
//! Tokens are issued by the identity server and only ever verified here.
//!
//! # Components
//!
//! - `principal` - Verified identity extracted from a session token
//! - `token` - HS256 signature and lifetime verification

pub mod principal;
pub mod token;

pub use principal::Principal;
pub use token::{verify, TokenError};
