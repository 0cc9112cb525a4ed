use constant_time_eq::constant_time_eq;
use fast32::base32;
use crate::algorithm::HashAlgorithm;
use crate::error::TotpError;
use crate::validation;

/// HOTP secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotpSecret(Box<[u8]>);

impl AsRef<[u8]> for HotpSecret {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl HotpSecret {
    /// Create a new HOTP secret from a byte array
    pub fn new(secret: &[u8]) -> Self {
        Self(secret.into())
    }

    /// Create a new HOTP secret from a base32 encoded string
    pub fn try_from_base32(secret: impl AsRef<str>) -> Result<Self, TotpError> {
        Ok(Self(decode_base32(secret.as_ref())?))
    }

    /// Generate a HOTP code
    ///
    /// - `counter`: the counter value, hashed as 8 big-endian bytes
    /// - `digits`: length of the code, 6 or 8
    /// - `algorithm`: the keyed-hash algorithm
    pub fn generate(
        &self,
        counter: u64,
        digits: u32,
        algorithm: HashAlgorithm,
    ) -> Result<String, TotpError> {
        generate(&self.0, counter, digits, algorithm)
    }

    /// Verify a HOTP code against a single counter value
    pub fn verify(
        &self,
        code: &str,
        counter: u64,
        digits: u32,
        algorithm: HashAlgorithm,
    ) -> Result<bool, TotpError> {
        if code.len() != digits as usize {
            validation::check_digits(digits)?;
            return Ok(false);
        }
        let generated = self.generate(counter, digits, algorithm)?;
        Ok(constant_time_eq(generated.as_bytes(), code.as_bytes()))
    }
}

/// Derive a zero-padded decimal code from `secret` and `counter`
pub fn generate(
    secret: &[u8],
    counter: u64,
    digits: u32,
    algorithm: HashAlgorithm,
) -> Result<String, TotpError> {
    // Checked before any hashing work.
    let digits = validation::check_digits(digits)?;

    let signature = algorithm.sign(secret, &counter.to_be_bytes());
    let code = truncate(signature.as_ref()) % 10u32.pow(digits);
    tracing::trace!(counter, %algorithm, "derived one-time code");

    Ok(format!("{:0width$}", code, width = digits as usize))
}

/// RFC 4226 dynamic truncation to a 31-bit integer
///
/// # Panics
///
/// `signature` must be at least 20 bytes long, which every supported HMAC output satisfies.
/// Shorter input indexes out of bounds.
pub fn truncate(signature: &[u8]) -> u32 {
    let offset = (signature[signature.len() - 1] & 0x0f) as usize;
    ((signature[offset] & 0x7f) as u32) << 24
        | (signature[offset + 1] as u32) << 16
        | (signature[offset + 2] as u32) << 8
        | signature[offset + 3] as u32
}

/// Decode unpadded RFC 4648 base32, ignoring case, whitespace and trailing `=`
pub(crate) fn decode_base32(secret: &str) -> Result<Box<[u8]>, TotpError> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let secret = base32::RFC4648_NOPAD
        .decode_str(normalized.trim_end_matches('='))?
        .into_boxed_slice();
    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RFC4226_SECRET: &[u8] = b"12345678901234567890";

    #[test]
    fn test_rfc4226_truncation_example() {
        // Worked example from RFC 4226 section 5.4
        let signature = [
            0x1f, 0x86, 0x98, 0x69, 0x0e, 0x02, 0xca, 0x16, 0x61, 0x85, 0x50, 0xef, 0x7f, 0x19,
            0xda, 0x8e, 0x94, 0x5b, 0x55, 0x5a,
        ];
        assert_eq!(truncate(&signature), 0x50ef7f19);
        assert_eq!(truncate(&signature) % 1_000_000, 872921);
    }

    #[test]
    fn test_high_bit_is_masked() {
        let mut signature = [0xffu8; 20];
        signature[19] = 0x00;
        assert_eq!(truncate(&signature), 0x7fff_ffff);
    }

    #[test]
    fn test_invalid_digits_rejected() {
        let err = generate(RFC4226_SECRET, 0, 7, HashAlgorithm::Sha1).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_verify() {
        let secret = HotpSecret::new(RFC4226_SECRET);
        assert!(secret.verify("755224", 0, 6, HashAlgorithm::Sha1).unwrap());
        assert!(!secret.verify("755224", 1, 6, HashAlgorithm::Sha1).unwrap());
        assert!(!secret.verify("75522", 0, 6, HashAlgorithm::Sha1).unwrap());
        assert!(!secret.verify("755225", 0, 6, HashAlgorithm::Sha1).unwrap());
        assert!(!secret.verify("000000", 0, 6, HashAlgorithm::Sha1).unwrap());
        assert!(secret.verify("755224", 0, 5, HashAlgorithm::Sha1).is_err());
    }

    #[test]
    fn test_base32_secret() {
        let secret = HotpSecret::try_from_base32("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ").unwrap();
        assert_eq!(secret.as_ref(), RFC4226_SECRET);
        assert!(HotpSecret::try_from_base32("not base32!").is_err());
    }

    #[test]
    fn test_base32_secret_is_normalized() {
        let secret =
            HotpSecret::try_from_base32("gezd gnbv gy3t qojq gezd gnbv gy3t qojq").unwrap();
        assert_eq!(secret.as_ref(), RFC4226_SECRET);
    }

    #[test]
    fn test_invalid_base32_keeps_decode_error() {
        let err = HotpSecret::try_from_base32("GEZDGNB!").unwrap_err();
        assert!(matches!(
            err,
            TotpError::InvalidSecret(fast32::DecodeError::InvalidChar { char: '!', index: 7 })
        ));
        assert!(!err.is_validation());
        assert_eq!(
            err.to_string(),
            "Invalid base32 secret: invalid character '!' at index 7"
        );
    }
}
