//! TLS client configuration and handshakes
//!
//! Builds the root store from the system store (or bundled webpki roots)
//! plus caller-supplied bundles, installs the diagnostic verifier and runs
//! handshakes over an already connected stream.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{
    CertificateError, ClientConfig, DigitallySignedStruct, OtherError, RootCertStore,
    SignatureScheme,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use super::certificate::CertificateInfo;
use super::errors::TlsError;
use super::verifier::{CertificateFailure, CertificateVerifier};
use crate::config::HttpConfig;
use crate::error;
use crate::telemetry::DiagnosticSink;

/// Trust and identity settings for TLS connections.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// Start from the operating system store instead of the bundled roots
    pub use_system_certs: bool,
    /// Extra PEM bundles; missing files are skipped
    pub cert_files: Vec<PathBuf>,
    /// PEM file or directory of `.pem` files that must exist
    pub ssl_ca_cert: Option<PathBuf>,
    /// PEM file holding a client certificate chain and its private key
    pub ssl_client_cert: Option<PathBuf>,
}

impl TlsConfig {
    pub fn from_http_config(http_config: &HttpConfig) -> Self {
        Self {
            use_system_certs: http_config.use_system_certs,
            cert_files: http_config.cert_files.clone(),
            ssl_ca_cert: http_config.ssl_ca_cert.clone(),
            ssl_client_cert: http_config.ssl_client_cert.clone(),
        }
    }
}

/// Owns the lazily built client configuration shared by every TLS connection.
#[derive(Debug)]
pub struct TlsManager {
    config: TlsConfig,
    verifier: CertificateVerifier,
    sink: Arc<dyn DiagnosticSink>,
    client_config: Mutex<Option<Arc<ClientConfig>>>,
}

impl TlsManager {
    pub fn new(config: TlsConfig, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            config,
            verifier: CertificateVerifier::new(),
            sink,
            client_config: Mutex::new(None),
        }
    }

    pub fn from_http_config(http_config: &HttpConfig, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self::new(TlsConfig::from_http_config(http_config), sink)
    }

    pub fn config(&self) -> &TlsConfig {
        &self.config
    }

    /// Whether the client configuration has been built yet.
    pub fn is_initialized(&self) -> bool {
        self.client_config
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Trust anchors: system (or bundled) roots, then `cert_files`, then
    /// `ssl_ca_cert`.
    pub fn root_store(&self) -> Result<RootCertStore, TlsError> {
        let mut root_store = RootCertStore::empty();

        if self.config.use_system_certs {
            let cert_result = rustls_native_certs::load_native_certs();
            for cert in cert_result.certs {
                if let Err(e) = root_store.add(cert) {
                    tracing::debug!("Skipping unusable system certificate: {}", e);
                }
            }

            if !cert_result.errors.is_empty() || root_store.is_empty() {
                for err in &cert_result.errors {
                    tracing::warn!("Certificate load error: {}", err);
                }
                root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            }

            tracing::debug!("Loaded {} system certificates", root_store.len());
        } else {
            root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }

        for path in &self.config.cert_files {
            if path.is_file() {
                add_pem_file(&mut root_store, path)?;
            } else {
                tracing::debug!("Certificate bundle {} not present, skipping", path.display());
            }
        }

        if let Some(path) = &self.config.ssl_ca_cert {
            if path.is_dir() {
                let entries = std::fs::read_dir(path).map_err(|e| {
                    TlsError::FileOperation(format!("{}: {e}", path.display()))
                })?;
                let mut files: Vec<PathBuf> = entries
                    .flatten()
                    .map(|entry| entry.path())
                    .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("pem"))
                    .collect();
                files.sort();
                for file in files {
                    add_pem_file(&mut root_store, &file)?;
                }
            } else if path.is_file() {
                add_pem_file(&mut root_store, path)?;
            } else {
                return Err(TlsError::FileOperation(format!(
                    "ssl_ca_cert {} does not exist",
                    path.display()
                )));
            }
        }

        Ok(root_store)
    }

    /// The shared client configuration, built on first use.
    pub fn client_config(&self) -> Result<Arc<ClientConfig>, TlsError> {
        let mut guard = self
            .client_config
            .lock()
            .map_err(|_| TlsError::Internal("TLS configuration lock poisoned".to_string()))?;

        if let Some(config) = guard.as_ref() {
            return Ok(Arc::clone(config));
        }

        let config = Arc::new(self.build_client_config()?);
        *guard = Some(Arc::clone(&config));
        Ok(config)
    }

    fn build_client_config(&self) -> Result<ClientConfig, TlsError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let root_store = Arc::new(self.root_store()?);

        let inner = WebPkiServerVerifier::builder_with_provider(root_store, Arc::clone(&provider))
            .build()
            .map_err(|e| TlsError::CertificateStore(e.to_string()))?;

        let verifier = Arc::new(DiagnosticServerCertVerifier {
            inner,
            verifier: self.verifier,
            sink: Arc::clone(&self.sink),
        });

        let builder = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| TlsError::Internal(format!("Failed to set protocol versions: {e}")))?
            .dangerous()
            .with_custom_certificate_verifier(verifier);

        let config = match &self.config.ssl_client_cert {
            Some(path) => {
                let (certs, key) = load_client_identity(path)?;
                builder
                    .with_client_auth_cert(certs, key)
                    .map_err(|e| TlsError::ClientCertificate(e.to_string()))?
            }
            None => builder.with_no_client_auth(),
        };

        tracing::debug!("TLS client configuration built");
        Ok(config)
    }

    /// Run a client handshake over `stream`.
    ///
    /// A rejected chain surfaces as a certificate error carrying the
    /// diagnostic already sent to the sink.
    pub async fn handshake<S>(&self, stream: S, host: &str) -> crate::Result<TlsStream<S>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let config = self.client_config()?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| TlsError::ServerName(format!("{host}: {e}")))?;

        let tls = TlsConnector::from(config)
            .connect(server_name, stream)
            .await
            .map_err(handshake_error)?;

        tracing::debug!(
            "TLS handshake with {host} complete ({:?})",
            tls.get_ref().1.protocol_version()
        );
        Ok(tls)
    }
}

/// Recover the verification failure stashed in the rustls error, if any.
fn handshake_error(e: io::Error) -> crate::Error {
    let failure = e
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
        .and_then(|tls| match tls {
            rustls::Error::InvalidCertificate(CertificateError::Other(other)) => {
                other.0.downcast_ref::<CertificateFailure>().cloned()
            }
            _ => None,
        });

    match failure {
        Some(failure) => error::certificate(failure),
        None if matches!(
            e.kind(),
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
        ) =>
        {
            error::timeout(e)
        }
        None => error::connect(e),
    }
}

fn add_pem_file(root_store: &mut RootCertStore, path: &Path) -> Result<(), TlsError> {
    let pem = std::fs::read(path)
        .map_err(|e| TlsError::FileOperation(format!("{}: {e}", path.display())))?;
    let certs = rustls_pemfile::certs(&mut pem.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TlsError::CertificateParsing(format!("{}: {e}", path.display())))?;

    let (added, ignored) = root_store.add_parsable_certificates(certs);
    if ignored > 0 {
        tracing::warn!("Ignored {ignored} unusable certificates in {}", path.display());
    }
    tracing::debug!("Added {added} certificates from {}", path.display());
    Ok(())
}

fn load_client_identity(
    path: &Path,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>), TlsError> {
    let pem = std::fs::read(path)
        .map_err(|e| TlsError::FileOperation(format!("{}: {e}", path.display())))?;

    let certs = rustls_pemfile::certs(&mut pem.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TlsError::ClientCertificate(e.to_string()))?;
    if certs.is_empty() {
        return Err(TlsError::ClientCertificate(format!(
            "no certificate in {}",
            path.display()
        )));
    }

    let key = rustls_pemfile::private_key(&mut pem.as_slice())
        .map_err(|e| TlsError::ClientCertificate(e.to_string()))?
        .ok_or_else(|| {
            TlsError::ClientCertificate(format!("no private key in {}", path.display()))
        })?;

    Ok((certs, key))
}

/// Delegates to webpki and, on a rejected chain, turns the failure into a
/// diagnostic before aborting the handshake.
#[derive(Debug)]
struct DiagnosticServerCertVerifier {
    inner: Arc<WebPkiServerVerifier>,
    verifier: CertificateVerifier,
    sink: Arc<dyn DiagnosticSink>,
}

impl ServerCertVerifier for DiagnosticServerCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let error = match self.inner.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            now,
        ) {
            Ok(verified) => return Ok(verified),
            Err(rustls::Error::InvalidCertificate(error)) => error,
            Err(other) => return Err(other),
        };

        // Depths must stay aligned with the presented chain
        let chain: Vec<CertificateInfo> = std::iter::once(end_entity)
            .chain(intermediates)
            .map_while(|der| CertificateInfo::from_der(der.as_ref()).ok())
            .collect();

        let now = i64::try_from(now.as_secs())
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);

        let failure = self.verifier.evaluate(&error, &chain, now);
        for line in failure.diagnostic.lines() {
            self.sink.alert_error(line);
        }

        Err(rustls::Error::InvalidCertificate(CertificateError::Other(
            OtherError(Arc::new(failure)),
        )))
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}
