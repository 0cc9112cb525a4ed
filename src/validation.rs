use crate::error::ValidationError;

/// Digit counts accepted by common authenticator apps
pub const ALLOWED_DIGITS: [u32; 2] = [6, 8];

/// Whether `digits` is an accepted code length
pub fn is_valid_digits(digits: u32) -> bool {
    ALLOWED_DIGITS.contains(&digits)
}

/// Returns `digits` unchanged if it is 6 or 8
pub fn check_digits(digits: u32) -> Result<u32, ValidationError> {
    if !is_valid_digits(digits) {
        tracing::debug!(digits, "rejected digit count");
        return Err(ValidationError::InvalidDigits(digits));
    }
    Ok(digits)
}

/// Returns the time step in milliseconds if it is strictly positive
pub fn check_time_step(time_step_millis: i64) -> Result<i64, ValidationError> {
    if time_step_millis <= 0 {
        tracing::debug!(time_step_millis, "rejected time step");
        return Err(ValidationError::NonPositiveTimeStep(time_step_millis));
    }
    Ok(time_step_millis)
}

/// Returns the period in seconds if it is strictly positive
pub fn check_period(period: i64) -> Result<u64, ValidationError> {
    if period <= 0 {
        tracing::debug!(period, "rejected period");
        return Err(ValidationError::NonPositivePeriod(period));
    }
    Ok(period as u64)
}
