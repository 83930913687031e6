//! Digest (hash) algorithm identifier and SRI-style encoding.

use sha2::{Digest as _, Sha256};

/// Supported digest algorithms.
///
/// PKCS#7 detached PDF signatures are produced with SHA-256 only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
}

impl DigestAlgorithm {
    /// Returns the algorithm name in lowercase (for SRI strings).
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
        }
    }
}

/// Compute digest of the given data using the specified algorithm.
#[tracing::instrument(skip(data), fields(data_len = data.len(), alg = ?algorithm))]
pub fn compute_digest(algorithm: DigestAlgorithm, data: &[u8]) -> Vec<u8> {
    match algorithm {
        DigestAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(data);
            hasher.finalize().to_vec()
        }
    }
}

/// Encode digest as SRI string (e.g., `sha256-<base64>`).
pub fn encode_sri(algorithm: DigestAlgorithm, digest: &[u8]) -> String {
    use base64::Engine;
    format!(
        "{}-{}",
        algorithm.name(),
        base64::engine::general_purpose::STANDARD.encode(digest)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_computes_correctly() {
        let digest = compute_digest(DigestAlgorithm::Sha256, b"abc");
        assert_eq!(digest.len(), 32);
        assert_eq!(
            hex::encode(&digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sri_has_algorithm_prefix() {
        let sri = encode_sri(DigestAlgorithm::Sha256, &[0u8; 32]);
        assert_eq!(sri, "sha256-AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=");
    }
}
