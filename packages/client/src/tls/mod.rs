//! TLS trust configuration and certificate failure diagnostics

pub mod certificate;
pub mod errors;
pub mod tls_manager;
pub mod verifier;
pub mod verify_code;

pub use certificate::CertificateInfo;
pub use errors::TlsError;
pub use tls_manager::{TlsConfig, TlsManager};
pub use verifier::{CertificateFailure, CertificateVerifier, Diagnostic, VerifyDecision, classify};
pub use verify_code::VerifyCode;
