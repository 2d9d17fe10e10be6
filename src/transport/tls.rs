//! TLS for the socket transport.
//!
//! Chain validation is left to rustls against the webpki roots. Host-name
//! matching is done afterwards on the leaf certificate with
//! `ssl::verify_certificate`, so the matching rules are the engine's own and
//! can be switched off with `Options::verify_hostname`.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, DigitallySignedStruct, Error as TLSError, SignatureScheme};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::config::TLS_HANDSHAKE_TIMEOUT_SECS;
use crate::error_handling::TransportError;
use crate::ssl::{self, CertificateFields};

/// Validates the certificate chain but not the name it was issued for.
#[derive(Debug)]
struct ChainOnlyVerifier {
    inner: Arc<WebPkiServerVerifier>,
}

impl ServerCertVerifier for ChainOnlyVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, TLSError> {
        match self
            .inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            // webpki checks the name only once the chain is trusted
            Err(TLSError::InvalidCertificate(CertificateError::NotValidForName))
            | Err(TLSError::InvalidCertificate(CertificateError::NotValidForNameContext {
                ..
            })) => Ok(ServerCertVerified::assertion()),
            other => other,
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TLSError> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TLSError> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// Builds the client configuration used for every TLS connection.
fn client_config() -> Result<ClientConfig, TLSError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let inner = WebPkiServerVerifier::builder_with_provider(Arc::new(root_store), provider.clone())
        .build()
        .map_err(|e| TLSError::General(e.to_string()))?;

    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(ChainOnlyVerifier { inner }))
        .with_no_client_auth();
    Ok(config)
}

/// Whether a usable TLS configuration can be built.
pub(crate) fn available() -> bool {
    client_config().is_ok()
}

/// Performs the TLS handshake on `stream` and checks the peer certificate
/// against `host`.
///
/// # Errors
///
/// Returns `TransportError::Tls` if the handshake fails or times out, or if
/// `verify_hostname` is set and the leaf certificate was not issued for
/// `host`.
pub(crate) async fn connect(
    stream: TcpStream,
    host: &str,
    verify_hostname: bool,
) -> Result<TlsStream<TcpStream>, TransportError> {
    let tls_error = |message: String| TransportError::Tls {
        host: host.to_string(),
        message,
    };

    let config = client_config().map_err(|e| tls_error(e.to_string()))?;
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| tls_error(format!("Invalid domain name: {}", e)))?;

    debug!("Starting TLS handshake with {host}");
    let connector = TlsConnector::from(Arc::new(config));
    let stream = match tokio::time::timeout(
        Duration::from_secs(TLS_HANDSHAKE_TIMEOUT_SECS),
        connector.connect(server_name, stream),
    )
    .await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            error!("TLS connection failed for {host}: {e}");
            return Err(tls_error(e.to_string()));
        }
        Err(_) => {
            error!("TLS handshake timeout for {host}");
            return Err(tls_error(format!(
                "handshake timed out ({}s)",
                TLS_HANDSHAKE_TIMEOUT_SECS
            )));
        }
    };

    if verify_hostname {
        let leaf = stream
            .get_ref()
            .1
            .peer_certificates()
            .and_then(|certs| certs.first())
            .ok_or_else(|| tls_error("peer sent no certificate".to_string()))?;
        let fields = CertificateFields::from_der(leaf.as_ref())
            .map_err(|e| tls_error(format!("unreadable certificate: {}", e)))?;
        if !ssl::verify_certificate(host, &fields) {
            return Err(tls_error(format!(
                "certificate (CN {:?}, SAN {:?}) does not match host",
                fields.subject_cn.as_deref().unwrap_or_default(),
                fields.subject_alt_name.as_deref().unwrap_or_default()
            )));
        }
    }

    debug!(
        "TLS established with {host} ({})",
        stream
            .get_ref()
            .1
            .protocol_version()
            .map(|v| format!("{v:?}"))
            .unwrap_or_else(|| "Unknown".to_string())
    );
    Ok(stream)
}
