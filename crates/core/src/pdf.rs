//! PDF byte-level helpers for incremental-update signatures.
//!
//! A signature dictionary is written with two fixed-width placeholders: the
//! `/ByteRange` array and the hex `/Contents` string. Once the whole update
//! is laid out, the byte range is patched in place, the covered bytes are
//! signed, and the DER blob is hex-encoded into `/Contents`. Neither patch
//! changes any length, so every offset computed during layout stays valid.

use anyhow::{Context, Result, bail, ensure};
use std::ops::Range;

/// `/ByteRange` value before patching. Each `*` run holds one offset.
pub const BYTE_RANGE_PLACEHOLDER: &[u8] = b"[0 ********** ********** **********]";

const BYTE_RANGE_FIELD_WIDTH: usize = 10;

/// Find the offset immediately after the last `%%EOF` marker in the PDF.
#[tracing::instrument(skip(data), fields(data_len = data.len()))]
pub fn find_eof_offset(data: &[u8]) -> Result<usize> {
    data.windows(5)
        .rposition(|w| w == b"%%EOF")
        .map(|pos| pos + 5)
        .context("PDF does not contain %%EOF marker")
}

/// Read the offset recorded after the last `startxref` keyword.
///
/// This is the cross-reference section an incremental update chains to via
/// `/Prev`.
#[tracing::instrument(skip(data), fields(data_len = data.len()))]
pub fn find_startxref(data: &[u8]) -> Result<usize> {
    let keyword = b"startxref";
    let pos = data
        .windows(keyword.len())
        .rposition(|w| w == keyword)
        .context("PDF does not contain a startxref keyword")?;

    let digits: Vec<u8> = data[pos + keyword.len()..]
        .iter()
        .skip_while(|b| b.is_ascii_whitespace())
        .take_while(|b| b.is_ascii_digit())
        .copied()
        .collect();
    ensure!(!digits.is_empty(), "startxref is not followed by an offset");

    std::str::from_utf8(&digits)?
        .parse::<usize>()
        .context("startxref offset does not fit in usize")
}

/// Positions of the two placeholders inside an update buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureSlots {
    /// The `[...]` array after `/ByteRange`.
    pub byte_range: Range<usize>,
    /// The `<...>` hex string after `/Contents`, delimiters included.
    pub contents: Range<usize>,
}

impl SignatureSlots {
    /// Bytes of DER the `/Contents` slot can hold.
    pub fn capacity(&self) -> usize {
        (self.contents.len() - 2) / 2
    }
}

/// Append the `/ByteRange` placeholder and return where it landed.
pub fn write_byte_range_placeholder(out: &mut Vec<u8>) -> Range<usize> {
    let start = out.len();
    out.extend_from_slice(BYTE_RANGE_PLACEHOLDER);
    start..out.len()
}

/// Append a zero-filled hex string able to carry `capacity` bytes of DER.
pub fn write_contents_placeholder(out: &mut Vec<u8>, capacity: usize) -> Range<usize> {
    let start = out.len();
    out.push(b'<');
    out.resize(out.len() + capacity * 2, b'0');
    out.push(b'>');
    start..out.len()
}

/// Compute the `/ByteRange` for an update appended after `base` original bytes.
///
/// The range covers everything except the `/Contents` hex string.
pub fn byte_range(base: usize, slots: &SignatureSlots, update_len: usize) -> [usize; 4] {
    [
        0,
        base + slots.contents.start,
        base + slots.contents.end,
        update_len - slots.contents.end,
    ]
}

/// Overwrite the `/ByteRange` placeholder with concrete offsets.
pub fn patch_byte_range(update: &mut [u8], slots: &SignatureSlots, range: [usize; 4]) -> Result<()> {
    let w = BYTE_RANGE_FIELD_WIDTH;
    let text = format!(
        "[{} {:<w$} {:<w$} {:<w$}]",
        range[0], range[1], range[2], range[3]
    );
    if text.len() != slots.byte_range.len() {
        bail!(
            "ByteRange {:?} does not fit the {}-byte placeholder",
            range,
            slots.byte_range.len()
        );
    }
    update[slots.byte_range.clone()].copy_from_slice(text.as_bytes());
    Ok(())
}

/// Collect the bytes a signature over `pdf ‖ update` must cover.
pub fn signed_content(pdf: &[u8], update: &[u8], slots: &SignatureSlots) -> Vec<u8> {
    let tail = &update[slots.contents.end..];
    let mut out = Vec::with_capacity(pdf.len() + slots.contents.start + tail.len());
    out.extend_from_slice(pdf);
    out.extend_from_slice(&update[..slots.contents.start]);
    out.extend_from_slice(tail);
    out
}

/// Hex-encode `der` into the `/Contents` placeholder, zero padding the rest.
pub fn embed_signature(update: &mut [u8], slots: &SignatureSlots, der: &[u8]) -> Result<()> {
    if der.len() > slots.capacity() {
        bail!(
            "Signature is {} bytes but only {} bytes were reserved",
            der.len(),
            slots.capacity()
        );
    }
    let encoded = hex::encode_upper(der);
    let start = slots.contents.start + 1;
    update[start..start + encoded.len()].copy_from_slice(encoded.as_bytes());
    Ok(())
}
