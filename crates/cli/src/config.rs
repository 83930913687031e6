//! Environment-driven configuration.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use zeroize::Zeroizing;

use crate::error::SignError;

pub const DEFAULT_CONTAINER_PATH: &str = "/app/certs/default.p12";
pub const DEFAULT_REASON: &str = "PDF P12 Signer";
pub const DEFAULT_LOCATION: &str = "PDF P12 Signer";

/// Environment variable names: (primary, legacy alias).
pub const ENV_CONTAINER_PATH: (&str, &str) = ("CERT_CONTAINER_PATH", "PDF_SIGN_P12_PATH");
pub const ENV_CONTAINER_PASSWORD: (&str, &str) =
    ("CERT_CONTAINER_PASSWORD", "PDF_SIGN_P12_PASSWORD");
pub const ENV_REASON: (&str, &str) = ("SIGN_REASON", "PDF_SIGN_REASON");
pub const ENV_LOCATION: (&str, &str) = ("SIGN_LOCATION", "PDF_SIGN_LOCATION");
pub const ENV_CONTACT: (&str, &str) = ("SIGN_CONTACT", "PDF_SIGN_CONTACT");

/// Signer settings, each independently defaulted.
pub struct SignerConfig {
    pub container_path: PathBuf,
    pub container_password: Zeroizing<String>,
    pub reason: String,
    pub location: String,
    pub contact: String,
}

impl SignerConfig {
    /// Resolve every setting through `lookup`, typically `std::env::var_os`.
    ///
    /// A variable that is set, even to an empty string, wins over the default.
    /// The container path is taken as raw OS bytes; the text settings must be
    /// valid UTF-8.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Result<Self, SignError> {
        let get = |(primary, legacy): (&'static str, &'static str)| {
            lookup(primary)
                .map(|value| (primary, value))
                .or_else(|| lookup(legacy).map(|value| (legacy, value)))
        };
        let text = |names: (&'static str, &'static str)| {
            get(names)
                .map(|(name, value)| {
                    value
                        .into_string()
                        .map_err(|_| SignError::NonUnicodeEnv(name))
                })
                .transpose()
        };

        Ok(Self {
            container_path: get(ENV_CONTAINER_PATH)
                .map(|(_, value)| PathBuf::from(value))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTAINER_PATH)),
            container_password: Zeroizing::new(text(ENV_CONTAINER_PASSWORD)?.unwrap_or_default()),
            reason: text(ENV_REASON)?.unwrap_or_else(|| DEFAULT_REASON.to_string()),
            location: text(ENV_LOCATION)?.unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            contact: text(ENV_CONTACT)?.unwrap_or_default(),
        })
    }
}

impl fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerConfig")
            .field("container_path", &self.container_path)
            .field("container_password", &"<redacted>")
            .field("reason", &self.reason)
            .field("location", &self.location)
            .field("contact", &self.contact)
            .finish()
    }
}
