//! TLS helpers for explicit FTPS (RFC 4217).
//!
//! One `ClientConfig` is built per session and shared by the control
//! channel and every data channel, so servers that require TLS session
//! reuse on the data connection accept our handshakes.

use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::protocol::{FtpCodec, ReadHalf, WriteHalf};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

/// Build the rustls client configuration.
pub fn build_client_config(accept_invalid_certs: bool) -> FtpResult<Arc<ClientConfig>> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| FtpError::tls_failed(format!("TLS protocol setup: {}", e)))?;

    let config = if accept_invalid_certs {
        log::warn!("FTPS certificate verification disabled, accepting any server certificate");
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert(provider)))
            .with_no_client_auth()
    } else {
        builder
            .with_root_certificates(native_roots()?)
            .with_no_client_auth()
    };
    Ok(Arc::new(config))
}

fn native_roots() -> FtpResult<RootCertStore> {
    let mut roots = RootCertStore::empty();
    let loaded = rustls_native_certs::load_native_certs();
    for err in &loaded.errors {
        log::debug!("Skipping native certificate source: {}", err);
    }
    let (added, ignored) = roots.add_parsable_certificates(loaded.certs);
    log::debug!("Loaded {} native root certificates ({} ignored)", added, ignored);
    if roots.is_empty() {
        return Err(FtpError::tls_failed("No usable native root certificates found"));
    }
    Ok(roots)
}

fn server_name(host: &str) -> FtpResult<ServerName<'static>> {
    ServerName::try_from(host.to_string())
        .map_err(|e| FtpError::tls_failed(format!("Invalid server name '{}': {}", host, e)))
}

/// Upgrade an existing plain control connection to TLS.
///
/// Called after a successful `AUTH TLS`. Consumes the plain codec.
pub async fn upgrade_to_tls(
    codec: FtpCodec,
    host: &str,
    config: Arc<ClientConfig>,
) -> FtpResult<FtpCodec> {
    let tcp = reunite_plain(codec)?;
    let tls = TlsConnector::from(config)
        .connect(server_name(host)?, tcp)
        .await
        .map_err(|e| FtpError::tls_failed(format!("Explicit TLS handshake: {}", e)))?;
    Ok(FtpCodec::from_tls(tls))
}

/// Reunite the read + write halves back into a `TcpStream`.
fn reunite_plain(codec: FtpCodec) -> FtpResult<TcpStream> {
    let (rd, wr) = match (codec.reader, codec.writer) {
        (ReadHalf::Plain(br), WriteHalf::Plain(w)) => (br.into_inner(), w),
        _ => {
            return Err(FtpError::protocol_error(
                "Cannot upgrade: connection is already TLS",
            ))
        }
    };
    rd.reunite(wr)
        .map_err(|e| FtpError::protocol_error(format!("Reunite failed: {}", e)))
}

/// Wrap a freshly opened data connection in TLS (`PROT P`).
pub async fn wrap_data_stream(
    tcp: TcpStream,
    host: &str,
    config: Arc<ClientConfig>,
) -> FtpResult<TlsStream<TcpStream>> {
    TlsConnector::from(config)
        .connect(server_name(host)?, tcp)
        .await
        .map_err(|e| FtpError::tls_failed(format!("Data channel TLS: {}", e)))
}

// ─── AcceptAnyCert (self-signed test servers) ───────────────────────

#[derive(Debug)]
struct AcceptAnyCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    // Signatures are still checked; only the chain of trust is skipped.
    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
