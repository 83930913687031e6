//! PKCS#12 credential loading.

use anyhow::{Context, Result};
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::x509::{X509, X509Ref};
use pdf_p12_sign_core::SignerIdentity;
use std::fmt;

/// Signing key, leaf certificate and chain pulled out of a PKCS#12 container.
pub struct Credential {
    pub private_key: PKey<Private>,
    pub certificate: X509,
    pub additional_certs: Vec<X509>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("private_key", &"<redacted>")
            .field("certificate", &subject_of(&self.certificate))
            .field("additional_certs", &self.additional_certs.len())
            .finish()
    }
}

impl SignerIdentity for Credential {
    fn subject(&self) -> String {
        subject_of(&self.certificate)
    }

    fn chain_len(&self) -> usize {
        self.additional_certs.len()
    }
}

/// Common name of a certificate, falling back to the full one-line subject.
fn subject_of(cert: &X509Ref) -> String {
    let name = cert.subject_name();
    if let Some(cn) = name.entries_by_nid(Nid::COMMONNAME).next() {
        if let Ok(cn) = cn.data().to_string() {
            return cn;
        }
    }
    name.entries()
        .filter_map(|entry| {
            let key = entry.object().nid().short_name().ok()?;
            let value = entry.data().to_string().ok()?;
            Some(format!("{key}={value}"))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a DER-encoded PKCS#12 container.
///
/// An empty `password` also matches containers created without one: OpenSSL
/// tries both the empty and the absent password when checking the MAC, so
/// callers do not need to distinguish the two.
#[tracing::instrument(skip_all, fields(container_len = der.len()))]
pub fn load_credential(der: &[u8], password: &str) -> Result<Credential> {
    let parsed = Pkcs12::from_der(der)
        .context("Certificate container is not a PKCS#12 file")?
        .parse2(password)
        .context("Failed to decrypt certificate container (wrong password or unsupported format)")?;

    let private_key = parsed
        .pkey
        .context("No private key found in certificate container")?;
    let certificate = parsed
        .cert
        .context("No certificate found in certificate container")?;
    let additional_certs: Vec<X509> = parsed
        .ca
        .map(|stack| stack.into_iter().collect())
        .unwrap_or_default();

    tracing::debug!(
        subject = %subject_of(&certificate),
        chain = additional_certs.len(),
        "Loaded PKCS#12 credential"
    );

    Ok(Credential {
        private_key,
        certificate,
        additional_certs,
    })
}
