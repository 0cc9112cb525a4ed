#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![doc = include_str!("../README.md")]

/// Supported keyed-hash algorithms
pub mod algorithm;

/// Error types
pub mod error;

/// Range checks shared by generators and URI builders
pub mod validation;

/// HOTP (HMAC-based One-Time Password) generation and verification
pub mod hotp;

/// TOTP (Time-based One-Time Password) generation and verification
pub mod totp;

/// `otpauth://totp/` provisioning URIs and QR code links
pub mod uri;

pub use algorithm::HashAlgorithm;
pub use error::{TotpError, ValidationError};
pub use totp::{Totp, TotpParameters, TotpSecret};
pub use uri::TotpUriBuilder;
