//! The seam between the CLI and whatever produces the signature block.

use anyhow::Result;

use crate::{DigestAlgorithm, SignatureMetadata};

/// What a loaded credential can tell about its signer, without exposing keys.
pub trait SignerIdentity {
    /// Human-readable subject of the leaf certificate.
    fn subject(&self) -> String;

    /// Number of chain certificates shipped alongside the leaf.
    fn chain_len(&self) -> usize;
}

/// A PDF signing backend.
///
/// Implementations own credential parsing as well as signing, so the CLI
/// never touches key material directly.
pub trait SigningEngine {
    type Credential: SignerIdentity;

    /// Parse a password-protected certificate container.
    ///
    /// Fails when the container cannot be decrypted or lacks a private key or
    /// leaf certificate.
    fn load_credential(&self, container: &[u8], password: &str) -> Result<Self::Credential>;

    /// Produce the signature block for `pdf`.
    ///
    /// The returned bytes are appended verbatim after the original document;
    /// any cross-reference bookkeeping they need is the engine's business.
    fn sign(
        &self,
        pdf: &[u8],
        metadata: &SignatureMetadata,
        credential: &Self::Credential,
        digest: DigestAlgorithm,
    ) -> Result<Vec<u8>>;
}
