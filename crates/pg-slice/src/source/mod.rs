//! Source database connection handling.
//!
//! One pool serves the whole run. The pipeline is single-threaded, so the
//! pool exists for connection lifecycle management rather than parallelism;
//! a handful of connections covers introspection and extraction.

use crate::config::SourceConfig;
use crate::error::{Result, SliceError};
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use rustls::ClientConfig;
use std::sync::Arc;
use tokio_postgres::Config as PgConfig;
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{info, warn};

/// Maximum pooled connections. The pipeline issues one query at a time.
const MAX_CONNECTIONS: usize = 4;

/// Pooled connection to the source database.
pub struct SourcePool {
    pool: Pool,
}

impl SourcePool {
    /// Connect to the source database described by the configuration.
    pub async fn connect(config: &SourceConfig) -> Result<Self> {
        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(config.port);
        pg_config.dbname(&config.db_name);
        pg_config.user(&config.username);
        pg_config.password(&config.password);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let pool = if config.ssl_enabled {
            let tls_connector = MakeRustlsConnect::new(build_tls_config());
            let mgr = Manager::from_config(pg_config, tls_connector, mgr_config);
            Pool::builder(mgr)
                .max_size(MAX_CONNECTIONS)
                .build()
                .map_err(|e| SliceError::pool(e, "creating source pool"))?
        } else {
            warn!("TLS is disabled. Credentials will be transmitted in plaintext.");
            let mgr = Manager::from_config(pg_config, tokio_postgres::NoTls, mgr_config);
            Pool::builder(mgr)
                .max_size(MAX_CONNECTIONS)
                .build()
                .map_err(|e| SliceError::pool(e, "creating source pool"))?
        };

        // Fail fast on unreachable or misconfigured sources.
        let client = pool
            .get()
            .await
            .map_err(|e| SliceError::pool(e, "testing source connection"))?;
        client.simple_query("SELECT 1").await?;

        info!(
            "Connected to source: {}:{}/{}",
            config.host, config.port, config.db_name
        );

        Ok(Self { pool })
    }

    /// Check out a connection from the pool.
    pub async fn client(&self, context: &str) -> Result<Object> {
        self.pool
            .get()
            .await
            .map_err(|e| SliceError::pool(e, format!("getting connection for {}", context)))
    }
}

/// TLS configuration matching `sslEnabled: true`: the session is encrypted
/// but the server certificate is not verified, mirroring libpq's `require`
/// posture.
fn build_tls_config() -> ClientConfig {
    warn!("sslEnabled: TLS enabled but server certificate is not verified.");
    ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(NoVerifier))
        .with_no_client_auth()
}

/// Certificate verifier that accepts any certificate.
///
/// Used only for the `sslEnabled` connection mode, which encrypts the
/// session without verifying the peer. Not suitable for untrusted networks.
#[derive(Debug)]
struct NoVerifier;

impl rustls::client::danger::ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::ECDSA_NISTP521_SHA512,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA512,
            rustls::SignatureScheme::ED25519,
        ]
    }
}
