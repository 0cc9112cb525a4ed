use std::fmt;
use fast32::base32;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use crate::algorithm::HashAlgorithm;
use crate::error::ValidationError;
use crate::totp::TotpParameters;
use crate::validation;

const PREFIX: &str = "otpauth://totp/";

/// Chart service used by [TotpUriBuilder::build_qr_code_url]
pub const DEFAULT_QR_CODE_ENDPOINT: &str = "https://chart.googleapis.com/chart";

/// Characters escaped in the label, which is a URI path segment (`:` and `@` are kept)
const LABEL: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b':')
    .remove(b'@');

/// Builder for `otpauth://totp/` provisioning URIs in the
/// [Key URI format](https://github.com/google/google-authenticator/wiki/Key-Uri-Format)
///
/// Optional fields left unset are omitted, letting the authenticator app use its defaults.
/// Invalid values are rejected by the setter, so [build](Self::build) cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotpUriBuilder {
    label: String,
    secret: String,
    issuer: Option<String>,
    algorithm: Option<HashAlgorithm>,
    digits: Option<u32>,
    period: Option<u64>,
}

impl TotpUriBuilder {
    /// Create a builder from a raw secret, which is stored base32 encoded
    ///
    /// - `label`: usually `issuer:account`. The part before the first `:` becomes the issuer
    pub fn new(label: impl Into<String>, secret: &[u8]) -> Self {
        Self::from_base32(label, base32::RFC4648_NOPAD.encode(secret))
    }

    /// Create a builder from a secret that is already base32 encoded
    pub fn from_base32(label: impl Into<String>, secret: impl Into<String>) -> Self {
        let label = label.into();
        let issuer = label
            .split_once(':')
            .map(|(prefix, _)| prefix.to_owned());
        Self {
            label,
            secret: secret.into(),
            issuer,
            algorithm: None,
            digits: None,
            period: None,
        }
    }

    /// Copy period (whole seconds), digits and algorithm from `params`
    pub fn configure(self, params: &TotpParameters) -> Result<Self, ValidationError> {
        Ok(self
            .with_period(Some(params.period_secs()))?
            .with_digits(Some(params.digits()))?
            .with_algorithm(Some(params.algorithm())))
    }

    /// Set the provider of the account. It should equal the label prefix
    pub fn with_issuer(mut self, issuer: Option<&str>) -> Self {
        self.issuer = issuer.map(str::to_owned);
        self
    }

    /// Set the algorithm. Google Authenticator ignores it
    pub fn with_algorithm(mut self, algorithm: Option<HashAlgorithm>) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the number of digits, 6 or 8
    pub fn with_digits(mut self, digits: Option<u32>) -> Result<Self, ValidationError> {
        self.digits = digits.map(validation::check_digits).transpose()?;
        Ok(self)
    }

    /// Set how many seconds a code stays valid, must be positive
    pub fn with_period(mut self, period: Option<i64>) -> Result<Self, ValidationError> {
        self.period = period.map(validation::check_period).transpose()?;
        Ok(self)
    }

    /// The label as given
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The base32 encoded secret
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// The issuer, explicit or taken from the label
    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    /// Serialize to `otpauth://totp/<label>?secret=...`
    pub fn build(&self) -> String {
        let mut uri = format!(
            "{PREFIX}{}?secret={}",
            utf8_percent_encode(&self.label, LABEL),
            self.secret
        );
        if let Some(issuer) = &self.issuer {
            uri.push_str("&issuer=");
            uri.push_str(&urlencoding::encode(issuer));
        }
        if let Some(algorithm) = self.algorithm {
            uri.push_str("&algorithm=");
            uri.push_str(algorithm.name());
        }
        if let Some(digits) = self.digits {
            uri.push_str(&format!("&digits={digits}"));
        }
        if let Some(period) = self.period {
            uri.push_str(&format!("&period={period}"));
        }
        uri
    }

    /// URL of a QR code image for [build](Self::build), rendered by the default chart service
    pub fn build_qr_code_url(&self) -> String {
        create_qr_code_url(&self.build())
    }
}

impl fmt::Display for TotpUriBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

/// URL of a QR code image encoding `uri`, rendered by [DEFAULT_QR_CODE_ENDPOINT]
pub fn create_qr_code_url(uri: &str) -> String {
    create_qr_code_url_with(DEFAULT_QR_CODE_ENDPOINT, uri)
}

/// URL of a QR code image encoding `uri`, rendered by a chart-compatible `endpoint`
///
/// No request is made, fetching the image is up to the caller.
pub fn create_qr_code_url_with(endpoint: &str, uri: &str) -> String {
    format!(
        "{endpoint}?chs=200x200&chld=M%7C0&cht=qr&chl={}",
        urlencoding::encode(uri)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"12345678901234567890";
    const SECRET_BASE32: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn test_issuer_from_label_prefix() {
        let uri = TotpUriBuilder::new("issuer:alice@example.com", SECRET).build();
        assert!(uri.starts_with("otpauth://totp/issuer:alice@example.com?secret="));
        assert_eq!(
            uri,
            format!("otpauth://totp/issuer:alice@example.com?secret={SECRET_BASE32}&issuer=issuer")
        );
    }

    #[test]
    fn test_issuer_override() {
        let uri = TotpUriBuilder::new("issuer:alice@example.com", SECRET)
            .with_issuer(Some("Example Corp"))
            .build();
        assert!(uri.ends_with("&issuer=Example%20Corp"));

        let uri = TotpUriBuilder::new("issuer:alice@example.com", SECRET)
            .with_issuer(None)
            .build();
        assert!(!uri.contains("issuer="));
    }

    #[test]
    fn test_optional_fields_omitted() {
        let uri = TotpUriBuilder::new("alice", SECRET).build();
        assert_eq!(uri, format!("otpauth://totp/alice?secret={SECRET_BASE32}"));
    }

    #[test]
    fn test_field_order() {
        let uri = TotpUriBuilder::from_base32("ACME:bob", "JBSWY3DPEHPK3PXP")
            .with_period(Some(60))
            .unwrap()
            .with_digits(Some(8))
            .unwrap()
            .with_algorithm(Some(HashAlgorithm::Sha256))
            .build();
        assert_eq!(
            uri,
            "otpauth://totp/ACME:bob?secret=JBSWY3DPEHPK3PXP&issuer=ACME&algorithm=SHA256&digits=8&period=60"
        );
    }

    #[test]
    fn test_label_is_escaped() {
        let uri = TotpUriBuilder::new("My Co:jane doe?", SECRET).build();
        assert!(uri.starts_with("otpauth://totp/My%20Co:jane%20doe%3F?secret="));
        assert!(uri.ends_with("&issuer=My%20Co"));
    }

    #[test]
    fn test_digits_validation() {
        let builder = TotpUriBuilder::new("alice", SECRET);
        assert_eq!(
            builder.clone().with_digits(Some(5)),
            Err(ValidationError::InvalidDigits(5))
        );
        assert!(builder.clone().with_digits(Some(6)).is_ok());
        assert!(builder.clone().with_digits(Some(8)).is_ok());
        assert!(!builder.with_digits(None).unwrap().build().contains("digits="));
    }

    #[test]
    fn test_period_validation() {
        let builder = TotpUriBuilder::new("alice", SECRET);
        assert_eq!(
            builder.clone().with_period(Some(0)),
            Err(ValidationError::NonPositivePeriod(0))
        );
        assert_eq!(
            builder.clone().with_period(Some(-5)),
            Err(ValidationError::NonPositivePeriod(-5))
        );
        let uri = builder.with_period(Some(30)).unwrap().build();
        assert!(uri.ends_with("&period=30"));
    }

    #[test]
    fn test_configure_from_parameters() {
        let params = TotpParameters::new(45_500, 8, HashAlgorithm::Sha512).unwrap();
        let uri = TotpUriBuilder::new("alice", SECRET)
            .configure(&params)
            .unwrap()
            .build();
        assert!(uri.ends_with("&algorithm=SHA512&digits=8&period=45"));
    }

    #[test]
    fn test_configure_rejects_sub_second_step() {
        let params = TotpParameters::new(500, 6, HashAlgorithm::Sha1).unwrap();
        let err = TotpUriBuilder::new("alice", SECRET).configure(&params);
        assert_eq!(err, Err(ValidationError::NonPositivePeriod(0)));
    }

    #[test]
    fn test_qr_code_url() {
        let builder = TotpUriBuilder::new("alice", SECRET);
        assert_eq!(
            builder.build_qr_code_url(),
            format!(
                "https://chart.googleapis.com/chart?chs=200x200&chld=M%7C0&cht=qr&chl=otpauth%3A%2F%2Ftotp%2Falice%3Fsecret%3D{SECRET_BASE32}"
            )
        );
        assert_eq!(builder.build_qr_code_url(), create_qr_code_url(&builder.to_string()));
    }

    #[test]
    fn test_qr_code_url_custom_endpoint() {
        let url =
            create_qr_code_url_with("https://qr.example.com/chart", "otpauth://totp/a?secret=AA");
        assert_eq!(
            url,
            "https://qr.example.com/chart?chs=200x200&chld=M%7C0&cht=qr&chl=otpauth%3A%2F%2Ftotp%2Fa%3Fsecret%3DAA"
        );
    }
}
