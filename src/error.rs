/// A caller supplied a value outside the accepted range
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Digit count other than 6 or 8
    #[error("digits must be 6 or 8, got {0}")]
    InvalidDigits(u32),

    /// Time step of zero or less milliseconds
    #[error("time step must be positive, got {0} ms")]
    NonPositiveTimeStep(i64),

    /// Period of zero or less seconds
    #[error("period must be positive, got {0} s")]
    NonPositivePeriod(i64),
}

/// Errors produced while deriving or provisioning one-time passwords
#[derive(Debug, thiserror::Error)]
pub enum TotpError {
    /// Invalid argument
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Hash algorithm name not recognized
    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Secret is not valid base32
    #[error("Invalid base32 secret: {}", describe_decode_error(.0))]
    InvalidSecret(fast32::DecodeError),
}

impl From<fast32::DecodeError> for TotpError {
    fn from(err: fast32::DecodeError) -> Self {
        TotpError::InvalidSecret(err)
    }
}

fn describe_decode_error(err: &fast32::DecodeError) -> String {
    match err {
        fast32::DecodeError::InvalidChar { char, index } => {
            format!("invalid character {char:?} at index {index}")
        }
        _ => "malformed encoding".to_owned(),
    }
}

impl TotpError {
    /// Whether the error was caused by an invalid argument rather than by configuration
    pub fn is_validation(&self) -> bool {
        matches!(self, TotpError::Validation(_))
    }
}
