//! CMS (PKCS#7 detached) signing engine backed by OpenSSL.

use anyhow::{Context, Result, bail};
use openssl::cms::{CMSOptions, CmsContentInfo};
use openssl::stack::Stack;
use openssl::x509::X509;
use pdf_p12_sign_core::pdf::{byte_range, embed_signature, patch_byte_range, signed_content};
use pdf_p12_sign_core::{
    DigestAlgorithm, SignatureMetadata, SignerIdentity, SigningEngine, compute_digest, encode_sri,
};

use crate::credential::{Credential, load_credential};
use crate::update;

/// Room added on top of a measured signature, so ECDSA signatures (whose DER
/// length varies by a few bytes) still fit.
const SIGNATURE_SLACK: usize = 32;

/// Signs PDFs as `adbe.pkcs7.detached` over an incremental update.
///
/// OpenSSL picks the message digest from the key's default, which is SHA-256
/// for RSA and EC keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct CmsEngine;

impl CmsEngine {
    pub fn new() -> Self {
        Self
    }
}

impl SigningEngine for CmsEngine {
    type Credential = Credential;

    fn load_credential(&self, container: &[u8], password: &str) -> Result<Credential> {
        load_credential(container, password)
    }

    #[tracing::instrument(skip_all, fields(pdf_len = pdf.len(), digest = digest.name()))]
    fn sign(
        &self,
        pdf: &[u8],
        metadata: &SignatureMetadata,
        credential: &Credential,
        digest: DigestAlgorithm,
    ) -> Result<Vec<u8>> {
        if metadata.sigbutton {
            bail!("Visible signature widgets are not supported");
        }
        let capacity = if metadata.aligned > 0 {
            metadata.aligned
        } else {
            measure_signature(credential)? + SIGNATURE_SLACK
        };

        let mut update = update::prepare(pdf, metadata, &credential.subject(), capacity)?;
        let range = byte_range(pdf.len(), &update.slots, update.bytes.len());
        patch_byte_range(&mut update.bytes, &update.slots, range)?;

        let content = signed_content(pdf, &update.bytes, &update.slots);
        tracing::debug!(
            ?range,
            digest = %encode_sri(digest, &compute_digest(digest, &content)),
            "Signing byte range"
        );

        let der = cms_detached(credential, &content)?;
        embed_signature(&mut update.bytes, &update.slots, &der)?;

        tracing::info!(
            signature_len = der.len(),
            update_len = update.bytes.len(),
            "PDF signature created"
        );
        Ok(update.bytes)
    }
}

/// Detached CMS SignedData over `data`, carrying the leaf and chain certificates.
fn cms_detached(credential: &Credential, data: &[u8]) -> Result<Vec<u8>> {
    let mut chain: Stack<X509> = Stack::new()?;
    for cert in &credential.additional_certs {
        chain.push(cert.clone())?;
    }

    let flags = CMSOptions::DETACHED | CMSOptions::BINARY | CMSOptions::NOSMIMECAP;
    CmsContentInfo::sign(
        Some(&*credential.certificate),
        Some(&*credential.private_key),
        Some(&*chain),
        Some(data),
        flags,
    )
    .context("CMS signing failed")?
    .to_der()
    .context("Failed to encode CMS signature")
}

/// Size of a signature over empty content; the real one differs only in the digest value.
fn measure_signature(credential: &Credential) -> Result<usize> {
    Ok(cms_detached(credential, &[])?.len())
}
