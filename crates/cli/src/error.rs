//! Failure classes of a signing run and their exit codes.

use std::path::PathBuf;

use crate::config::{DEFAULT_CONTAINER_PATH, ENV_CONTAINER_PATH};

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("Invalid arguments")]
    Usage(#[from] clap::Error),

    #[error("Environment variable {0} is not valid UTF-8")]
    NonUnicodeEnv(&'static str),

    #[error("Input file does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Certificate container does not exist: {}", .0.display())]
    ContainerNotFound(PathBuf),

    #[error("Failed to read certificate container: {}", path.display())]
    ContainerRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load certificate (wrong password or invalid format)")]
    Credential(#[source] anyhow::Error),

    #[error("Failed to read input PDF: {}", path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Signing failed")]
    Signing(#[source] anyhow::Error),

    #[error("Failed to write signed PDF: {}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SignError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            SignError::Usage(_) | SignError::NonUnicodeEnv(_) | SignError::InputNotFound(_) => 1,
            SignError::ContainerNotFound(_) => 2,
            SignError::ContainerRead { .. } | SignError::Credential(_) => 3,
            SignError::InputRead { .. } | SignError::Signing(_) | SignError::OutputWrite { .. } => 4,
        }
    }

    /// Extra guidance printed under the error.
    pub fn hints(&self) -> Vec<String> {
        match self {
            SignError::ContainerNotFound(_) => vec![
                format!("The default certificate path is {DEFAULT_CONTAINER_PATH}"),
                format!(
                    "Set {} to use a different PKCS#12 file",
                    ENV_CONTAINER_PATH.0
                ),
            ],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn io_error() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied")
    }

    #[test]
    fn exit_codes_follow_failure_class() {
        let usage = crate::cli::Cli::try_parse_from(["pdf-p12-sign"]).unwrap_err();
        assert_eq!(SignError::Usage(usage).exit_code(), 1);
        assert_eq!(SignError::InputNotFound("a.pdf".into()).exit_code(), 1);
        assert_eq!(SignError::ContainerNotFound("c.p12".into()).exit_code(), 2);
        assert_eq!(
            SignError::ContainerRead {
                path: "c.p12".into(),
                source: io_error()
            }
            .exit_code(),
            3
        );
        assert_eq!(
            SignError::Credential(anyhow::anyhow!("bad mac")).exit_code(),
            3
        );
        assert_eq!(
            SignError::InputRead {
                path: "a.pdf".into(),
                source: io_error()
            }
            .exit_code(),
            4
        );
        assert_eq!(SignError::Signing(anyhow::anyhow!("boom")).exit_code(), 4);
        assert_eq!(
            SignError::OutputWrite {
                path: "o.pdf".into(),
                source: io_error()
            }
            .exit_code(),
            4
        );
    }

    #[test]
    fn missing_container_explains_default() {
        let hints = SignError::ContainerNotFound("/nope.p12".into()).hints();
        assert!(hints.iter().any(|h| h.contains(DEFAULT_CONTAINER_PATH)));
        assert!(hints.iter().any(|h| h.contains("CERT_CONTAINER_PATH")));
    }

    #[test]
    fn cause_is_kept_as_source() {
        let err = SignError::Signing(anyhow::anyhow!("engine exploded"));
        let chained = anyhow::Error::from(err);
        let causes: Vec<String> = chained.chain().map(|c| c.to_string()).collect();
        assert_eq!(causes, ["Signing failed", "engine exploded"]);
    }
}
