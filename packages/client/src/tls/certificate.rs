//! Certificate fields needed for verification diagnostics

use chrono::{DateTime, SecondsFormat, Utc};
use x509_parser::prelude::*;

use super::errors::TlsError;

// Common OIDs for DN components, rendered with their short names
const NAME_ATTRIBUTES: &[(&str, &str)] = &[
    ("2.5.4.3", "CN"),
    ("2.5.4.6", "C"),
    ("2.5.4.7", "L"),
    ("2.5.4.8", "ST"),
    ("2.5.4.10", "O"),
    ("2.5.4.11", "OU"),
    ("2.5.4.5", "serialNumber"),
    ("0.9.2342.19200300.100.1.25", "DC"),
    ("1.2.840.113549.1.9.1", "emailAddress"),
];

/// The subject, issuer and validity window of one certificate in a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    /// Subject in `/C=US/O=Example/CN=host` form
    pub subject: String,
    /// Issuer in `/C=US/O=Example/CN=host` form
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl CertificateInfo {
    /// Parse the fields from a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, TlsError> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| TlsError::CertificateParsing(format!("invalid X.509 DER: {e}")))?;

        let validity = cert.validity();
        Ok(Self {
            subject: format_name(cert.subject()),
            issuer: format_name(cert.issuer()),
            not_before: to_utc(validity.not_before)?,
            not_after: to_utc(validity.not_after)?,
        })
    }

    /// True when the certificate names itself as issuer.
    #[must_use]
    pub fn is_self_issued(&self) -> bool {
        self.subject == self.issuer
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.not_after
    }

    #[must_use]
    pub fn is_not_yet_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.not_before
    }

    /// `not_before` as an ISO 8601 UTC timestamp, e.g. `2013-01-02T03:04:05Z`.
    #[must_use]
    pub fn not_before_iso8601(&self) -> String {
        self.not_before.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Render a distinguished name as slash-separated `KEY=value` pairs.
fn format_name(name: &X509Name<'_>) -> String {
    let mut rendered = String::new();
    for rdn in name.iter() {
        for attr in rdn.iter() {
            let oid = attr.attr_type().to_id_string();
            let key = NAME_ATTRIBUTES
                .iter()
                .find(|(id, _)| *id == oid)
                .map_or(oid.as_str(), |&(_, short)| short);
            let value = attr.as_str().unwrap_or("<unprintable>");
            rendered.push('/');
            rendered.push_str(key);
            rendered.push('=');
            rendered.push_str(value);
        }
    }
    rendered
}

fn to_utc(time: ASN1Time) -> Result<DateTime<Utc>, TlsError> {
    DateTime::<Utc>::from_timestamp(time.timestamp(), 0).ok_or_else(|| {
        TlsError::CertificateParsing(format!("validity time out of range: {time}"))
    })
}
