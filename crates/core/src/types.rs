//! Signature metadata handed to a signing engine.

use chrono::{DateTime, Utc};

/// `/SigFlags` bit 1: the document contains at least one signature field.
pub const SIGFLAGS_SIGNATURES_EXIST: u32 = 1;
/// `/SigFlags` bit 2: the document must only be changed by incremental updates.
pub const SIGFLAGS_APPEND_ONLY: u32 = 2;

/// Annotation flag: print the widget.
pub const ANNOT_FLAG_PRINT: u32 = 4;
/// Annotation flag: the widget cannot be deleted or moved.
pub const ANNOT_FLAG_LOCKED: u32 = 128;

/// `strftime` pattern of the signing date, UTC with the fixed offset notation
/// the PDF date string requires.
pub const SIGNING_DATE_FORMAT: &str = "%Y%m%d%H%M%S+00'00'";

/// Format a UTC instant as a PDF signing date (`YYYYMMDDHHMMSS+00'00'`).
pub fn format_signing_date(at: DateTime<Utc>) -> String {
    at.format(SIGNING_DATE_FORMAT).to_string()
}

/// Everything about the signature except the key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMetadata {
    /// Bytes reserved for the CMS blob; 0 lets the engine size it to fit.
    pub aligned: usize,
    /// Value written to `/AcroForm /SigFlags`.
    pub sigflags: u32,
    /// Annotation flags (`/F`) of the signature widget.
    pub sigflagsft: u32,
    /// Zero-based index of the page carrying the signature widget.
    pub sigpage: usize,
    /// Whether the widget is visible. Invisible signatures use an empty rect.
    pub sigbutton: bool,
    pub contact: String,
    pub location: String,
    pub reason: String,
    /// Signing date, see [`format_signing_date`].
    pub signing_date: String,
}

impl SignatureMetadata {
    /// Metadata for a certified, invisible signature on the first page.
    pub fn certified(
        reason: impl Into<String>,
        location: impl Into<String>,
        contact: impl Into<String>,
        signed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            aligned: 0,
            sigflags: SIGFLAGS_SIGNATURES_EXIST | SIGFLAGS_APPEND_ONLY,
            sigflagsft: ANNOT_FLAG_PRINT | ANNOT_FLAG_LOCKED,
            sigpage: 0,
            sigbutton: false,
            contact: contact.into(),
            location: location.into(),
            reason: reason.into(),
            signing_date: format_signing_date(signed_at),
        }
    }
}
