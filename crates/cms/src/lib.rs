//! PKCS#12 + CMS signing engine: loads credentials with OpenSSL and signs PDFs
//! through an incremental update built on top of `lopdf`.

pub mod credential;
pub mod engine;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
mod update;

pub use credential::{Credential, load_credential};
pub use engine::CmsEngine;
