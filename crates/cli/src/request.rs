//! The immutable description of one signing run.

use chrono::{DateTime, Utc};
use pdf_p12_sign_core::SignatureMetadata;
use std::fmt;
use std::path::PathBuf;
use zeroize::Zeroizing;

use crate::cli::Cli;
use crate::config::SignerConfig;

pub struct SigningRequest {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub container_path: PathBuf,
    pub container_password: Zeroizing<String>,
    pub reason: String,
    pub location: String,
    pub contact: String,
    pub signed_at: DateTime<Utc>,
}

impl SigningRequest {
    pub fn new(cli: Cli, config: SignerConfig, signed_at: DateTime<Utc>) -> Self {
        Self {
            input_path: cli.input,
            output_path: cli.output,
            container_path: config.container_path,
            container_password: config.container_password,
            reason: config.reason,
            location: config.location,
            contact: config.contact,
            signed_at,
        }
    }

    /// Certified, invisible signature on the first page.
    pub fn metadata(&self) -> SignatureMetadata {
        SignatureMetadata::certified(
            self.reason.as_str(),
            self.location.as_str(),
            self.contact.as_str(),
            self.signed_at,
        )
    }
}

impl fmt::Debug for SigningRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningRequest")
            .field("input_path", &self.input_path)
            .field("output_path", &self.output_path)
            .field("container_path", &self.container_path)
            .field("container_password", &"<redacted>")
            .field("reason", &self.reason)
            .field("location", &self.location)
            .field("contact", &self.contact)
            .field("signed_at", &self.signed_at)
            .finish()
    }
}
