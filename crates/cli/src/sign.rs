//! The signing run: validate, load the credential, sign, write.

use console::style;
use pdf_p12_sign_core::{DigestAlgorithm, SignerIdentity, SigningEngine};
use std::fs;
use std::path::Path;

use crate::error::SignError;
use crate::request::SigningRequest;
use crate::util::{format_bytes, spinner};

/// Digest of every signature this tool produces.
const SIGNING_DIGEST: DigestAlgorithm = DigestAlgorithm::Sha256;

pub fn sign_pdf<E: SigningEngine>(request: &SigningRequest, engine: &E) -> Result<(), SignError> {
    tracing::debug!(?request, "Resolved signing request");

    if !request.container_path.exists() {
        return Err(SignError::ContainerNotFound(request.container_path.clone()));
    }
    if !request.input_path.exists() {
        return Err(SignError::InputNotFound(request.input_path.clone()));
    }

    println!("{}", style("==> Signing PDF with PKCS#12 certificate").cyan().bold());

    println!(
        "    Loading certificate {}",
        style(request.container_path.display()).cyan()
    );
    let container = fs::read(&request.container_path).map_err(|source| SignError::ContainerRead {
        path: request.container_path.clone(),
        source,
    })?;
    let credential = engine
        .load_credential(&container, &request.container_password)
        .map_err(SignError::Credential)?;
    println!(
        "    Using certificate: {} ({} chain certificate(s))",
        style(credential.subject()).cyan(),
        credential.chain_len()
    );

    println!(
        "    Reading PDF {}",
        style(request.input_path.display()).cyan()
    );
    let pdf_data = fs::read(&request.input_path).map_err(|source| SignError::InputRead {
        path: request.input_path.clone(),
        source,
    })?;
    println!("[OK] Read PDF ({})", style(format_bytes(pdf_data.len())).cyan());

    let metadata = request.metadata();
    let progress = spinner("Creating digital signature...");
    let signed = engine.sign(&pdf_data, &metadata, &credential, SIGNING_DIGEST);
    progress.finish_and_clear();
    let signature_block = signed.map_err(SignError::Signing)?;
    println!(
        "[OK] Created signature ({})",
        style(format_bytes(signature_block.len())).cyan()
    );

    println!(
        "    Writing signed PDF to {}",
        style(request.output_path.display()).cyan()
    );
    write_signed(&request.output_path, &pdf_data, &signature_block)?;

    println!(
        "\n{} {}",
        style("[SUCCESS]").green().bold(),
        style("Signed successfully").cyan()
    );
    Ok(())
}

/// Write `pdf ‖ signature_block` in one go; a failed write leaves no file behind.
fn write_signed(path: &Path, pdf: &[u8], signature_block: &[u8]) -> Result<(), SignError> {
    let mut out = Vec::with_capacity(pdf.len() + signature_block.len());
    out.extend_from_slice(pdf);
    out.extend_from_slice(signature_block);

    fs::write(path, &out).map_err(|source| {
        if path.is_file()
            && let Err(e) = fs::remove_file(path)
        {
            tracing::warn!(error = %e, path = %path.display(), "Could not remove partial output");
        }
        SignError::OutputWrite {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_original_then_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signed.pdf");
        write_signed(&path, b"%PDF-1.4\n%%EOF\n", b"SIG").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"%PDF-1.4\n%%EOF\nSIG");
    }

    #[test]
    fn unwritable_destination_is_an_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("signed.pdf");
        let err = write_signed(&path, b"pdf", b"sig").unwrap_err();
        assert!(matches!(err, SignError::OutputWrite { .. }), "{err:?}");
        assert_eq!(err.exit_code(), 4);
        assert!(!path.exists());
    }
}
