//! TLS-specific error types for detailed error handling

/// Errors raised while assembling the TLS client configuration
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("Certificate parsing failed: {0}")]
    CertificateParsing(String),
    #[error("Certificate store could not be built: {0}")]
    CertificateStore(String),
    #[error("Client certificate unusable: {0}")]
    ClientCertificate(String),
    #[error("File operation failed: {0}")]
    FileOperation(String),
    #[error("Invalid server name: {0}")]
    ServerName(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TlsError> for crate::Error {
    fn from(err: TlsError) -> Self {
        crate::error::builder(err)
    }
}
