use std::fmt;
use std::str::FromStr;
use ring::hmac;
use serde::{Deserialize, Serialize};
use crate::error::TotpError;

/// Keyed-hash algorithm used to derive codes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// HMAC-SHA1, the default of most authenticator apps
    #[default]
    #[serde(rename = "SHA1")]
    Sha1,
    /// HMAC-SHA256
    #[serde(rename = "SHA256")]
    Sha256,
    /// HMAC-SHA512
    #[serde(rename = "SHA512")]
    Sha512,
}

impl HashAlgorithm {
    /// All supported algorithms
    pub const ALL: [HashAlgorithm; 3] = [Self::Sha1, Self::Sha256, Self::Sha512];

    /// The name used in provisioning URIs
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }

    /// Length of the HMAC output in bytes
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }

    pub(crate) fn hmac_algorithm(self) -> hmac::Algorithm {
        match self {
            Self::Sha1 => hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
            Self::Sha256 => hmac::HMAC_SHA256,
            Self::Sha512 => hmac::HMAC_SHA512,
        }
    }

    /// Sign `message` with `key`
    pub(crate) fn sign(self, key: &[u8], message: &[u8]) -> hmac::Tag {
        let key = hmac::Key::new(self.hmac_algorithm(), key);
        hmac::sign(&key, message)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = TotpError;

    /// Accepts `SHA1`, `sha256`, `SHA-512` and similar spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "").to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == normalized)
            .ok_or_else(|| {
                tracing::debug!(algorithm = s, "unsupported hash algorithm requested");
                TotpError::UnsupportedAlgorithm(s.to_owned())
            })
    }
}
