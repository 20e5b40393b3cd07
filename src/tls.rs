//! TLS certificate checks
//!
//! warp's `tls` feature serves the certificate; this module makes sure the
//! PEM files are readable and non-empty before the server binds, so a bad
//! path fails at startup with a clear error instead of at first handshake.

use std::fs::File;
use std::io::BufReader;

use crate::error::{Result, RustySessionsError};

/// Summary of what was found in the PEM files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsMaterial {
    pub certificate_count: usize,
    pub key_format: KeyFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    Pkcs8,
    Rsa,
}

/// Validate a certificate chain and private key pair
pub fn validate_tls_files(cert_path: &str, key_path: &str) -> Result<TlsMaterial> {
    let mut cert_reader = open(cert_path, "certificate")?;
    let certs = rustls_pemfile::certs(&mut cert_reader).map_err(|e| {
        RustySessionsError::ConfigError(format!("Failed to parse certificate file '{}': {}", cert_path, e))
    })?;

    if certs.is_empty() {
        return Err(RustySessionsError::ConfigError(format!(
            "No certificates found in '{}'",
            cert_path
        )));
    }

    let mut key_reader = open(key_path, "private key")?;
    let pkcs8 = rustls_pemfile::pkcs8_private_keys(&mut key_reader).map_err(|e| {
        RustySessionsError::ConfigError(format!("Failed to parse PKCS8 private key from '{}': {}", key_path, e))
    })?;

    let key_format = if !pkcs8.is_empty() {
        KeyFormat::Pkcs8
    } else {
        // If no PKCS8 keys found, try RSA format
        let mut key_reader = open(key_path, "private key")?;
        let rsa = rustls_pemfile::rsa_private_keys(&mut key_reader).map_err(|e| {
            RustySessionsError::ConfigError(format!("Failed to parse RSA private key from '{}': {}", key_path, e))
        })?;
        if rsa.is_empty() {
            return Err(RustySessionsError::ConfigError(format!(
                "No private keys found in '{}'",
                key_path
            )));
        }
        KeyFormat::Rsa
    };

    log::debug!("TLS files {} and {} parsed", cert_path, key_path);

    Ok(TlsMaterial {
        certificate_count: certs.len(),
        key_format,
    })
}

fn open(path: &str, what: &str) -> Result<BufReader<File>> {
    File::open(path).map(BufReader::new).map_err(|e| {
        RustySessionsError::ConfigError(format!("Failed to open {} file '{}': {}", what, path, e))
    })
}
