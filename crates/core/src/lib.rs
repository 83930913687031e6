//! Core PDF signing primitives: signature metadata, the engine seam, digest
//! identifiers, and the byte layout of incremental-update signatures.
//!
//! This crate provides the foundational building blocks for pdf-p12-sign, with no CLI or crypto backend dependencies.

pub mod digest;
pub mod engine;
pub mod pdf;
pub mod types;

pub use digest::{DigestAlgorithm, compute_digest, encode_sri};
pub use engine::{SignerIdentity, SigningEngine};
pub use pdf::{SignatureSlots, find_eof_offset, find_startxref};
pub use types::*;
