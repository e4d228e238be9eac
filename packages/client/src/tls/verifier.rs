//! Certificate verification failure diagnostics
//!
//! The decision logic is a pure function of the failure code, the offending
//! certificate and its depth; the rustls hook in `tls_manager` only feeds it.

use std::fmt;

use chrono::{DateTime, Utc};
use rustls::CertificateError;

use super::certificate::CertificateInfo;
use super::verify_code::VerifyCode;

/// Lines to show the user for one verification failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostic {
    lines: Vec<String>,
}

impl Diagnostic {
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The specialized explanation, when the code has one.
    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.lines.get(1).map(String::as_str)
    }

    pub(crate) fn extend(&mut self, other: Diagnostic) {
        self.lines.extend(other.lines);
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

/// What to do with a connection whose chain failed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyDecision {
    /// Tear the handshake down and report the diagnostic.
    Abort(Diagnostic),
}

impl VerifyDecision {
    #[must_use]
    pub fn diagnostic(&self) -> &Diagnostic {
        match self {
            VerifyDecision::Abort(diagnostic) => diagnostic,
        }
    }
}

/// A verification failure observed during a TLS handshake.
#[derive(Debug, Clone)]
pub struct CertificateFailure {
    pub code: VerifyCode,
    /// The certificate at `depth`, when the chain could be parsed
    pub certificate: Option<CertificateInfo>,
    pub depth: usize,
    pub diagnostic: Diagnostic,
}

impl fmt::Display for CertificateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diagnostic)
    }
}

impl std::error::Error for CertificateFailure {}

/// Maps verification failures to user-facing messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct CertificateVerifier;

impl CertificateVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Decide the fate of a failed verification. Failures always abort.
    pub fn on_verify_failure(
        &self,
        code: VerifyCode,
        certificate: Option<&CertificateInfo>,
        depth: usize,
    ) -> VerifyDecision {
        let mut lines = vec![format!(
            "SSL verification error at depth {depth}: {} ({code})",
            code.description()
        )];

        if let Some(extra) = certificate.and_then(|cert| self.message_for(code, cert)) {
            lines.push(extra);
        }

        VerifyDecision::Abort(Diagnostic { lines })
    }

    /// The specialized explanation for `code`, or `None` for codes without one.
    pub fn message_for(&self, code: VerifyCode, cert: &CertificateInfo) -> Option<String> {
        let message = match code {
            VerifyCode::CERT_HAS_EXPIRED => format!(
                "Certificate {} expired at {}",
                cert.subject,
                cert.not_before_iso8601()
            ),
            VerifyCode::CERT_NOT_YET_VALID => format!(
                "Certificate {} not valid until {}",
                cert.subject,
                cert.not_before_iso8601()
            ),
            VerifyCode::CERT_REJECTED => format!("Certificate {} is rejected", cert.subject),
            VerifyCode::CERT_UNTRUSTED => format!("Certificate {} is not trusted", cert.subject),
            VerifyCode::DEPTH_ZERO_SELF_SIGNED_CERT => {
                format!("Certificate {} is not trusted", cert.issuer)
            }
            VerifyCode::INVALID_CA => {
                format!("Certificate {} is an invalid CA certificate", cert.subject)
            }
            VerifyCode::INVALID_PURPOSE => {
                format!("Certificate {} has an invalid purpose", cert.subject)
            }
            VerifyCode::SELF_SIGNED_CERT_IN_CHAIN => {
                format!("Root certificate is not trusted ({})", cert.subject)
            }
            VerifyCode::UNABLE_TO_GET_ISSUER_CERT_LOCALLY => {
                format!("You must add {} to your local trusted store", cert.issuer)
            }
            VerifyCode::UNABLE_TO_VERIFY_LEAF_SIGNATURE => {
                format!("Cannot verify certificate issued by {}", cert.issuer)
            }
            _ => return None,
        };
        Some(message)
    }

    /// Run every classified failure through `on_verify_failure` and fold the
    /// result into one `CertificateFailure`, keyed by the first code.
    pub fn evaluate(
        &self,
        error: &CertificateError,
        chain: &[CertificateInfo],
        now: DateTime<Utc>,
    ) -> CertificateFailure {
        let failures = classify(error, chain, now);
        let (code, depth) = failures[0];

        let mut diagnostic = Diagnostic::default();
        for &(code, depth) in &failures {
            let decision = self.on_verify_failure(code, chain.get(depth), depth);
            diagnostic.extend(decision.diagnostic().clone());
        }

        CertificateFailure {
            code,
            certificate: chain.get(depth).cloned(),
            depth,
            diagnostic,
        }
    }
}

/// Translate a rustls verification error into verification codes and chain
/// depths, leaf first. Never returns an empty list.
pub fn classify(
    error: &CertificateError,
    chain: &[CertificateInfo],
    now: DateTime<Utc>,
) -> Vec<(VerifyCode, usize)> {
    let top = chain.len().saturating_sub(1);

    let failure = match error {
        CertificateError::Expired
        | CertificateError::ExpiredContext { .. }
        | CertificateError::NotValidYet
        | CertificateError::NotValidYetContext { .. } => {
            time_failure(chain, now).unwrap_or_else(|| {
                if matches!(
                    error,
                    CertificateError::NotValidYet | CertificateError::NotValidYetContext { .. }
                ) {
                    (VerifyCode::CERT_NOT_YET_VALID, 0)
                } else {
                    (VerifyCode::CERT_HAS_EXPIRED, 0)
                }
            })
        }
        CertificateError::UnknownIssuer => {
            let top_self_issued = chain.last().is_some_and(CertificateInfo::is_self_issued);
            if top == 0 && top_self_issued {
                (VerifyCode::DEPTH_ZERO_SELF_SIGNED_CERT, 0)
            } else if top_self_issued {
                (VerifyCode::SELF_SIGNED_CERT_IN_CHAIN, top)
            } else if top == 0 {
                return vec![
                    (VerifyCode::UNABLE_TO_GET_ISSUER_CERT_LOCALLY, 0),
                    (VerifyCode::UNABLE_TO_VERIFY_LEAF_SIGNATURE, 0),
                ];
            } else {
                (VerifyCode::UNABLE_TO_GET_ISSUER_CERT_LOCALLY, top)
            }
        }
        CertificateError::BadSignature => (VerifyCode::CERT_SIGNATURE_FAILURE, 0),
        CertificateError::Revoked => (VerifyCode::CERT_REVOKED, 0),
        CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. } => {
            (VerifyCode::HOSTNAME_MISMATCH, 0)
        }
        CertificateError::InvalidPurpose | CertificateError::InvalidPurposeContext { .. } => {
            (VerifyCode::INVALID_PURPOSE, 0)
        }
        CertificateError::UnhandledCriticalExtension => {
            (VerifyCode::UNHANDLED_CRITICAL_EXTENSION, 0)
        }
        CertificateError::ApplicationVerificationFailure => (VerifyCode::CERT_REJECTED, 0),
        CertificateError::Other(_) => (VerifyCode::CERT_UNTRUSTED, 0),
        _ => (VerifyCode::UNSPECIFIED, 0),
    };

    vec![failure]
}

fn time_failure(chain: &[CertificateInfo], now: DateTime<Utc>) -> Option<(VerifyCode, usize)> {
    chain.iter().enumerate().find_map(|(depth, cert)| {
        if cert.is_expired_at(now) {
            Some((VerifyCode::CERT_HAS_EXPIRED, depth))
        } else if cert.is_not_yet_valid_at(now) {
            Some((VerifyCode::CERT_NOT_YET_VALID, depth))
        } else {
            None
        }
    })
}
