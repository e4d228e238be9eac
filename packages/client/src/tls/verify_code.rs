//! Numeric certificate verification codes
//!
//! The numbering follows the X.509 verification result codes reported by
//! OpenSSL-based clients, so diagnostics read the same as other package tools.

use std::fmt;

/// A certificate verification result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerifyCode(pub i32);

impl VerifyCode {
    pub const UNSPECIFIED: VerifyCode = VerifyCode(1);
    pub const UNABLE_TO_GET_ISSUER_CERT: VerifyCode = VerifyCode(2);
    pub const CERT_SIGNATURE_FAILURE: VerifyCode = VerifyCode(7);
    pub const CERT_NOT_YET_VALID: VerifyCode = VerifyCode(9);
    pub const CERT_HAS_EXPIRED: VerifyCode = VerifyCode(10);
    pub const DEPTH_ZERO_SELF_SIGNED_CERT: VerifyCode = VerifyCode(18);
    pub const SELF_SIGNED_CERT_IN_CHAIN: VerifyCode = VerifyCode(19);
    pub const UNABLE_TO_GET_ISSUER_CERT_LOCALLY: VerifyCode = VerifyCode(20);
    pub const UNABLE_TO_VERIFY_LEAF_SIGNATURE: VerifyCode = VerifyCode(21);
    pub const CERT_REVOKED: VerifyCode = VerifyCode(23);
    pub const INVALID_CA: VerifyCode = VerifyCode(24);
    pub const INVALID_PURPOSE: VerifyCode = VerifyCode(26);
    pub const CERT_UNTRUSTED: VerifyCode = VerifyCode(27);
    pub const CERT_REJECTED: VerifyCode = VerifyCode(28);
    pub const UNHANDLED_CRITICAL_EXTENSION: VerifyCode = VerifyCode(34);
    pub const HOSTNAME_MISMATCH: VerifyCode = VerifyCode(62);

    /// The short library text for this code.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::UNSPECIFIED => "unspecified certificate verification error",
            Self::UNABLE_TO_GET_ISSUER_CERT => "unable to get issuer certificate",
            Self::CERT_SIGNATURE_FAILURE => "certificate signature failure",
            Self::CERT_NOT_YET_VALID => "certificate is not yet valid",
            Self::CERT_HAS_EXPIRED => "certificate has expired",
            Self::DEPTH_ZERO_SELF_SIGNED_CERT => "self-signed certificate",
            Self::SELF_SIGNED_CERT_IN_CHAIN => "self-signed certificate in certificate chain",
            Self::UNABLE_TO_GET_ISSUER_CERT_LOCALLY => "unable to get local issuer certificate",
            Self::UNABLE_TO_VERIFY_LEAF_SIGNATURE => "unable to verify the first certificate",
            Self::CERT_REVOKED => "certificate revoked",
            Self::INVALID_CA => "invalid CA certificate",
            Self::INVALID_PURPOSE => "unsupported certificate purpose",
            Self::CERT_UNTRUSTED => "certificate not trusted",
            Self::CERT_REJECTED => "certificate rejected",
            Self::UNHANDLED_CRITICAL_EXTENSION => "unhandled critical extension",
            Self::HOSTNAME_MISMATCH => "hostname mismatch",
            _ => "unknown certificate verification error",
        }
    }
}

impl fmt::Display for VerifyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
