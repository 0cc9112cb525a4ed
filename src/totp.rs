use std::time::{Duration, SystemTime};
use constant_time_eq::constant_time_eq;
use fast32::base32;
use serde::{Deserialize, Serialize};
use crate::algorithm::HashAlgorithm;
use crate::error::{TotpError, ValidationError};
use crate::{hotp, validation};

/// The default period of TOTP code in seconds
pub const RFC6238_TOTP_PERIOD: u64 = 30;

/// The default time step of TOTP code in milliseconds
pub const DEFAULT_TIME_STEP_MILLIS: i64 = RFC6238_TOTP_PERIOD as i64 * 1000;

/// The default number of digits
pub const DEFAULT_DIGITS: u32 = 6;

/// Immutable TOTP configuration: time step, code length and hash algorithm
///
/// The default (30 s, 6 digits, SHA1) matches Google Authenticator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTotpParameters")]
pub struct TotpParameters {
    time_step_millis: i64,
    digits: u32,
    algorithm: HashAlgorithm,
}

#[derive(Deserialize)]
#[serde(default)]
struct RawTotpParameters {
    time_step_millis: i64,
    digits: u32,
    algorithm: HashAlgorithm,
}

impl Default for RawTotpParameters {
    fn default() -> Self {
        Self {
            time_step_millis: DEFAULT_TIME_STEP_MILLIS,
            digits: DEFAULT_DIGITS,
            algorithm: HashAlgorithm::default(),
        }
    }
}

impl TryFrom<RawTotpParameters> for TotpParameters {
    type Error = ValidationError;

    fn try_from(raw: RawTotpParameters) -> Result<Self, Self::Error> {
        Self::new(raw.time_step_millis, raw.digits, raw.algorithm)
    }
}

impl Default for TotpParameters {
    fn default() -> Self {
        Self {
            time_step_millis: DEFAULT_TIME_STEP_MILLIS,
            digits: DEFAULT_DIGITS,
            algorithm: HashAlgorithm::default(),
        }
    }
}

impl TotpParameters {
    /// Create a parameter set, rejecting a non-positive time step or digits other than 6 and 8
    pub fn new(
        time_step_millis: i64,
        digits: u32,
        algorithm: HashAlgorithm,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            time_step_millis: validation::check_time_step(time_step_millis)?,
            digits: validation::check_digits(digits)?,
            algorithm,
        })
    }

    /// Time step in milliseconds
    pub fn time_step_millis(&self) -> i64 {
        self.time_step_millis
    }

    /// Time step in whole seconds, truncated
    pub fn period_secs(&self) -> i64 {
        self.time_step_millis / 1000
    }

    /// Number of digits of a code
    pub fn digits(&self) -> u32 {
        self.digits
    }

    /// Keyed-hash algorithm
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Copy with another time step
    pub fn with_time_step_millis(self, time_step_millis: i64) -> Result<Self, ValidationError> {
        Self::new(time_step_millis, self.digits, self.algorithm)
    }

    /// Copy with another number of digits
    pub fn with_digits(self, digits: u32) -> Result<Self, ValidationError> {
        Self::new(self.time_step_millis, digits, self.algorithm)
    }

    /// Copy with another algorithm
    pub fn with_algorithm(self, algorithm: HashAlgorithm) -> Self {
        Self { algorithm, ..self }
    }

    /// The step counter `floor(timestamp / time_step)`
    pub fn time_counter(&self, timestamp_millis: i64) -> i64 {
        timestamp_millis.div_euclid(self.time_step_millis)
    }

    /// Milliseconds until the step containing `timestamp_millis` ends
    pub fn remaining_millis(&self, timestamp_millis: i64) -> i64 {
        self.time_step_millis - timestamp_millis.rem_euclid(self.time_step_millis)
    }
}

/// Generate the code for `secret` at `timestamp_millis` (Unix epoch)
pub fn generate(
    secret: &[u8],
    timestamp_millis: i64,
    params: &TotpParameters,
) -> Result<String, TotpError> {
    let counter = params.time_counter(timestamp_millis);
    // Negative counters keep their two's complement byte layout.
    hotp::generate(secret, counter as u64, params.digits, params.algorithm)
}

/// Generate the code for `secret` at the current wall-clock time
pub fn generate_now(secret: &[u8], params: &TotpParameters) -> Result<String, TotpError> {
    generate(secret, current_millis(), params)
}

/// Generate a code from loose parameters, validating them first
pub fn generate_with(
    time_step_millis: i64,
    secret: &[u8],
    timestamp_millis: i64,
    digits: u32,
    algorithm: HashAlgorithm,
) -> Result<String, TotpError> {
    let params = TotpParameters::new(time_step_millis, digits, algorithm)?;
    generate(secret, timestamp_millis, &params)
}

/// Verify `code` at `timestamp_millis`
///
/// - `back_steps`: also accept codes from up to this many earlier time steps
pub fn verify(
    secret: &[u8],
    code: &str,
    timestamp_millis: i64,
    back_steps: u32,
    params: &TotpParameters,
) -> Result<bool, TotpError> {
    if code.len() != params.digits as usize {
        return Ok(false);
    }
    let counter = params.time_counter(timestamp_millis);
    for i in 0..=i64::from(back_steps) {
        let step = counter.saturating_sub(i);
        let generated = hotp::generate(secret, step as u64, params.digits, params.algorithm)?;
        if constant_time_eq(generated.as_bytes(), code.as_bytes()) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Milliseconds since the Unix epoch, negative if the clock is set before it
fn current_millis() -> i64 {
    match SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
        Ok(elapsed) => duration_millis(elapsed),
        Err(err) => -duration_millis(err.duration()),
    }
}

fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// TOTP generator bound to a parameter set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totp {
    params: TotpParameters,
}

impl From<TotpParameters> for Totp {
    fn from(params: TotpParameters) -> Self {
        Self { params }
    }
}

impl Totp {
    /// Create a generator, validating the parameters
    pub fn new(
        time_step_millis: i64,
        digits: u32,
        algorithm: HashAlgorithm,
    ) -> Result<Self, ValidationError> {
        TotpParameters::new(time_step_millis, digits, algorithm).map(Self::from)
    }

    /// The parameters of this generator
    pub fn params(&self) -> &TotpParameters {
        &self.params
    }

    /// Generate the code at the given timestamp in milliseconds
    pub fn generate(&self, secret: &[u8], timestamp_millis: i64) -> Result<String, TotpError> {
        generate(secret, timestamp_millis, &self.params)
    }

    /// Generate the code at the current time
    pub fn generate_now(&self, secret: &[u8]) -> Result<String, TotpError> {
        generate_now(secret, &self.params)
    }

    /// Verify a code at the given timestamp, see [verify](crate::totp::verify)
    pub fn verify(
        &self,
        secret: &[u8],
        code: &str,
        timestamp_millis: i64,
        back_steps: u32,
    ) -> Result<bool, TotpError> {
        verify(secret, code, timestamp_millis, back_steps, &self.params)
    }
}

/// TOTP secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotpSecret(Box<[u8]>);

impl AsRef<[u8]> for TotpSecret {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TotpSecret {
    /// Create a new TOTP secret from a byte array
    pub fn new(secret: &[u8]) -> Self {
        Self(secret.into())
    }

    /// Create a new TOTP secret from a base32 encoded string
    pub fn try_from_base32(secret: impl AsRef<str>) -> Result<Self, TotpError> {
        Ok(Self(hotp::decode_base32(secret.as_ref())?))
    }

    /// Encode the secret as unpadded RFC 4648 base32
    pub fn to_base32(&self) -> String {
        base32::RFC4648_NOPAD.encode(&self.0)
    }

    /// Generate a TOTP code at the given timestamp in milliseconds
    pub fn generate(
        &self,
        timestamp_millis: i64,
        params: &TotpParameters,
    ) -> Result<String, TotpError> {
        generate(&self.0, timestamp_millis, params)
    }

    /// Verify a TOTP code at the given timestamp, see [verify](crate::totp::verify)
    pub fn verify(
        &self,
        code: &str,
        timestamp_millis: i64,
        back_steps: u32,
        params: &TotpParameters,
    ) -> Result<bool, TotpError> {
        verify(&self.0, code, timestamp_millis, back_steps, params)
    }
}
