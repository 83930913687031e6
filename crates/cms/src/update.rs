//! Incremental update carrying an invisible signature field.
//!
//! The update rewrites two existing objects (the signed page and the
//! catalog) and adds two new ones (the signature dictionary and its widget),
//! followed by a classic cross-reference section chained to the original via
//! `/Prev`. Nothing before the original `%%EOF` is touched.

use anyhow::{Context, Result, bail};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat, dictionary};
use pdf_p12_sign_core::pdf::{write_byte_range_placeholder, write_contents_placeholder};
use pdf_p12_sign_core::{SignatureMetadata, SignatureSlots, find_eof_offset, find_startxref};
use std::collections::BTreeMap;
use std::io::Write;

/// An update buffer with its signature placeholders still unfilled.
#[derive(Debug)]
pub(crate) struct PreparedUpdate {
    pub bytes: Vec<u8>,
    pub slots: SignatureSlots,
}

/// Lay out the update for `pdf`, reserving `capacity` bytes for the CMS blob.
///
/// `signer` becomes the `/Name` of the signature dictionary.
#[tracing::instrument(skip(pdf, metadata), fields(pdf_len = pdf.len()))]
pub(crate) fn prepare(
    pdf: &[u8],
    metadata: &SignatureMetadata,
    signer: &str,
    capacity: usize,
) -> Result<PreparedUpdate> {
    let eof = find_eof_offset(pdf)?;
    let prev = find_startxref(&pdf[..eof])?;
    let doc = Document::load_mem(pdf).context("Failed to parse input PDF")?;

    if doc.trailer.has(b"Encrypt") {
        bail!("Encrypted PDFs cannot be signed");
    }

    let root_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .context("PDF trailer has no /Root reference")?;
    let declared_size = doc
        .trailer
        .get(b"Size")
        .and_then(Object::as_i64)
        .ok()
        .and_then(|size| u32::try_from(size).ok())
        .unwrap_or(0);
    let next_id = declared_size.max(doc.max_id + 1);

    let page_id = *doc
        .get_pages()
        .values()
        .nth(metadata.sigpage)
        .with_context(|| format!("PDF has no page at index {}", metadata.sigpage))?;

    let sig_id: ObjectId = (next_id, 0);
    let widget_id: ObjectId = (next_id + 1, 0);

    let mut page = doc
        .get_dictionary(page_id)
        .context("Signature page is not a dictionary")?
        .clone();
    let mut annots = resolve_array(&doc, page.get(b"Annots").ok())?;
    annots.push(Object::Reference(widget_id));
    page.set("Annots", annots);

    let mut catalog = doc
        .get_dictionary(root_id)
        .context("Document catalog is not a dictionary")?
        .clone();
    let mut acroform = match catalog.get(b"AcroForm") {
        Ok(Object::Dictionary(form)) => form.clone(),
        Ok(Object::Reference(id)) => doc
            .get_dictionary(*id)
            .context("/AcroForm does not point at a dictionary")?
            .clone(),
        _ => Dictionary::new(),
    };
    let mut fields = resolve_array(&doc, acroform.get(b"Fields").ok())?;
    let field_name = format!("Signature{}", fields.len() + 1);
    fields.push(Object::Reference(widget_id));
    acroform.set("Fields", fields);
    acroform.set("SigFlags", Object::Integer(i64::from(metadata.sigflags)));
    catalog.set("AcroForm", acroform);

    let widget = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Sig",
        "Rect" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(0),
        ],
        "F" => Object::Integer(i64::from(metadata.sigflagsft)),
        "P" => page_id,
        "T" => Object::string_literal(field_name),
        "V" => sig_id,
    };

    tracing::debug!(?page_id, ?root_id, ?sig_id, ?widget_id, prev, "Laying out incremental update");

    let base = pdf.len();
    let mut out = Vec::new();
    if !pdf.ends_with(b"\n") {
        out.push(b'\n');
    }

    let mut xref = BTreeMap::new();

    xref.insert(sig_id.0, (base + out.len(), sig_id.1));
    writeln!(out, "{} {} obj", sig_id.0, sig_id.1)?;
    out.extend_from_slice(b"<</Type /Sig /Filter /Adobe.PPKLite /SubFilter /adbe.pkcs7.detached /M ");
    write_literal_string(&mut out, format!("D:{}", metadata.signing_date).as_bytes());
    out.extend_from_slice(b" /Name ");
    write_text_string(&mut out, signer);
    out.extend_from_slice(b" /Reason ");
    write_text_string(&mut out, &metadata.reason);
    out.extend_from_slice(b" /Location ");
    write_text_string(&mut out, &metadata.location);
    out.extend_from_slice(b" /ContactInfo ");
    write_text_string(&mut out, &metadata.contact);
    out.extend_from_slice(b" /ByteRange ");
    let byte_range = write_byte_range_placeholder(&mut out);
    out.extend_from_slice(b" /Contents ");
    let contents = write_contents_placeholder(&mut out, capacity);
    out.extend_from_slice(b">>\nendobj\n");

    for (id, object) in [
        (widget_id, Object::Dictionary(widget)),
        (page_id, Object::Dictionary(page)),
        (root_id, Object::Dictionary(catalog)),
    ] {
        xref.insert(id.0, (base + out.len(), id.1));
        writeln!(out, "{} {} obj", id.0, id.1)?;
        write_object(&mut out, &object)?;
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = base + out.len();
    write_xref_section(&mut out, &xref)?;

    let mut trailer = dictionary! {
        "Size" => Object::Integer(i64::from(next_id + 2)),
        "Root" => root_id,
        "Prev" => Object::Integer(prev as i64),
    };
    if let Ok(id) = doc.trailer.get(b"ID") {
        trailer.set("ID", id.clone());
    }
    out.extend_from_slice(b"trailer\n");
    write_dictionary(&mut out, &trailer)?;
    write!(out, "\nstartxref\n{xref_offset}\n%%EOF\n")?;

    Ok(PreparedUpdate {
        bytes: out,
        slots: SignatureSlots {
            byte_range,
            contents,
        },
    })
}

/// Return a copy of an array given directly or through a reference.
fn resolve_array(doc: &Document, value: Option<&Object>) -> Result<Vec<Object>> {
    match value {
        None => Ok(Vec::new()),
        Some(Object::Array(items)) => Ok(items.clone()),
        Some(Object::Reference(id)) => Ok(doc
            .get_object(*id)
            .and_then(Object::as_array)
            .with_context(|| format!("Object {} {} R is not an array", id.0, id.1))?
            .clone()),
        Some(other) => bail!("Expected an array, found {:?}", other),
    }
}

/// Cross-reference subsections, one per run of consecutive object numbers.
fn write_xref_section(out: &mut Vec<u8>, entries: &BTreeMap<u32, (usize, u16)>) -> Result<()> {
    out.extend_from_slice(b"xref\n");
    let ids: Vec<u32> = entries.keys().copied().collect();
    for run in ids.chunk_by(|a, b| b == &(a + 1)) {
        writeln!(out, "{} {}", run[0], run.len())?;
        for id in run {
            let (offset, generation) = entries[id];
            write!(out, "{offset:010} {generation:05} n \n")?;
        }
    }
    Ok(())
}

fn write_object(out: &mut Vec<u8>, object: &Object) -> Result<()> {
    match object {
        Object::Null => out.extend_from_slice(b"null"),
        Object::Boolean(value) => out.extend_from_slice(if *value { &b"true"[..] } else { &b"false"[..] }),
        Object::Integer(value) => write!(out, "{value}")?,
        Object::Real(value) => write!(out, "{value}")?,
        Object::Name(name) => write_name(out, name),
        Object::String(bytes, StringFormat::Hexadecimal) => {
            out.push(b'<');
            out.extend_from_slice(hex::encode_upper(bytes).as_bytes());
            out.push(b'>');
        }
        Object::String(bytes, StringFormat::Literal) => write_literal_string(out, bytes),
        Object::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                write_object(out, item)?;
            }
            out.push(b']');
        }
        Object::Dictionary(dict) => write_dictionary(out, dict)?,
        Object::Stream(_) => bail!("Streams cannot be rewritten inside an incremental update"),
        Object::Reference((id, generation)) => write!(out, "{id} {generation} R")?,
    }
    Ok(())
}

fn write_dictionary(out: &mut Vec<u8>, dict: &Dictionary) -> Result<()> {
    out.extend_from_slice(b"<<");
    for (key, value) in dict.iter() {
        write_name(out, key);
        out.push(b' ');
        write_object(out, value)?;
    }
    out.extend_from_slice(b">>");
    Ok(())
}

fn write_name(out: &mut Vec<u8>, name: &[u8]) {
    out.push(b'/');
    for &b in name {
        let delimiter = b"()<>[]{}/%#".contains(&b);
        if (b'!'..=b'~').contains(&b) && !delimiter {
            out.push(b);
        } else {
            out.extend_from_slice(format!("#{b:02X}").as_bytes());
        }
    }
}

/// Text string: literal when PDFDocEncoding agrees with ASCII, otherwise
/// UTF-16BE with a byte order mark.
fn write_text_string(out: &mut Vec<u8>, text: &str) {
    let pdfdoc_safe = text
        .chars()
        .all(|c| matches!(c, '\t' | '\n' | '\r' | ' '..='~'));
    if pdfdoc_safe {
        write_literal_string(out, text.as_bytes());
        return;
    }
    out.extend_from_slice(b"<FEFF");
    for unit in text.encode_utf16() {
        out.extend_from_slice(format!("{unit:04X}").as_bytes());
    }
    out.push(b'>');
}

fn write_literal_string(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(b'(');
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            }
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\n' => out.extend_from_slice(b"\\n"),
            _ => out.push(b),
        }
    }
    out.push(b')');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use pdf_p12_sign_core::pdf::{byte_range, patch_byte_range};
    use pdf_p12_sign_core::{
        ANNOT_FLAG_LOCKED, ANNOT_FLAG_PRINT, SIGFLAGS_APPEND_ONLY, SIGFLAGS_SIGNATURES_EXIST,
    };

    fn sample_metadata() -> SignatureMetadata {
        SignatureMetadata {
            aligned: 0,
            sigflags: SIGFLAGS_SIGNATURES_EXIST | SIGFLAGS_APPEND_ONLY,
            sigflagsft: ANNOT_FLAG_PRINT | ANNOT_FLAG_LOCKED,
            sigpage: 0,
            sigbutton: false,
            contact: "ops@example.com".into(),
            location: "Lab (bench 2)".into(),
            reason: "Approved".into(),
            signing_date: "20240101120000+00'00'".into(),
        }
    }

    #[test]
    fn names_escape_delimiters_and_spaces() {
        let mut out = Vec::new();
        write_name(&mut out, b"A B/C");
        assert_eq!(out, b"/A#20B#2FC");
    }

    #[test]
    fn literal_strings_escape_parentheses() {
        let mut out = Vec::new();
        write_literal_string(&mut out, b"a(b)\\c\n");
        assert_eq!(out, b"(a\\(b\\)\\\\c\\n)");
    }

    #[test]
    fn ascii_text_stays_literal() {
        let mut out = Vec::new();
        write_text_string(&mut out, "Lab (bench 2)");
        assert_eq!(out, b"(Lab \\(bench 2\\))");
    }

    #[test]
    fn non_ascii_text_is_utf16() {
        let mut out = Vec::new();
        write_text_string(&mut out, "Zürich");
        assert_eq!(out, b"<FEFF005A00FC0072006900630068>");
    }

    #[test]
    fn xref_groups_consecutive_ids() {
        let mut entries = BTreeMap::new();
        entries.insert(1, (100, 0));
        entries.insert(7, (200, 0));
        entries.insert(8, (300, 1));
        let mut out = Vec::new();
        write_xref_section(&mut out, &entries).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "xref\n1 1\n0000000100 00000 n \n7 2\n0000000200 00000 n \n0000000300 00001 n \n"
        );
    }

    #[test]
    fn update_offsets_point_at_objects() {
        let pdf = fixtures::sample_pdf(1).unwrap();
        let update = prepare(&pdf, &sample_metadata(), "Test Signer", 64).unwrap();

        let mut full = pdf.clone();
        full.extend_from_slice(&update.bytes);

        let text = String::from_utf8_lossy(&update.bytes);
        let startxref: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .and_then(|n| n.parse().ok())
            .unwrap();
        assert!(full[startxref..].starts_with(b"xref\n"));
        assert!(text.contains("/Prev "));
        assert!(text.contains("/SigFlags 3"));
        assert!(text.contains("/F 132"));
        assert!(text.contains("(Lab \\(bench 2\\))"));
        assert!(text.contains("/M (D:20240101120000+00'00')"));
        assert!(text.contains("/Name (Test Signer)"));
        assert_eq!(update.slots.capacity(), 64);
    }

    #[test]
    fn updated_document_still_loads() {
        let pdf = fixtures::sample_pdf(2).unwrap();
        let mut update = prepare(&pdf, &sample_metadata(), "Test Signer", 64).unwrap();
        let range = byte_range(pdf.len(), &update.slots, update.bytes.len());
        patch_byte_range(&mut update.bytes, &update.slots, range).unwrap();
        let mut full = pdf.clone();
        full.extend_from_slice(&update.bytes);

        let doc = Document::load_mem(&full).unwrap();
        let root = doc
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .unwrap();
        let catalog = doc.get_dictionary(root).unwrap();
        let form = catalog.get(b"AcroForm").and_then(Object::as_dict).unwrap();
        assert_eq!(form.get(b"SigFlags").and_then(Object::as_i64).unwrap(), 3);
        assert_eq!(form.get(b"Fields").and_then(Object::as_array).unwrap().len(), 1);

        let first_page = *doc.get_pages().values().next().unwrap();
        let page = doc.get_dictionary(first_page).unwrap();
        assert_eq!(page.get(b"Annots").and_then(Object::as_array).unwrap().len(), 1);
    }

    #[test]
    fn non_ascii_fields_decode_after_reload() {
        let pdf = fixtures::sample_pdf(1).unwrap();
        let mut meta = sample_metadata();
        meta.reason = "簽章".into();
        meta.location = "Zürich".into();
        let mut update = prepare(&pdf, &meta, "Jürgen Signer", 64).unwrap();
        let range = byte_range(pdf.len(), &update.slots, update.bytes.len());
        patch_byte_range(&mut update.bytes, &update.slots, range).unwrap();
        let mut full = pdf.clone();
        full.extend_from_slice(&update.bytes);

        let doc = Document::load_mem(&full).unwrap();
        let root = doc
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .unwrap();
        let form = doc
            .get_dictionary(root)
            .and_then(|catalog| catalog.get(b"AcroForm"))
            .and_then(Object::as_dict)
            .unwrap();
        let widget_id = form.get(b"Fields").and_then(Object::as_array).unwrap()[0]
            .as_reference()
            .unwrap();
        let sig_id = doc
            .get_dictionary(widget_id)
            .and_then(|widget| widget.get(b"V"))
            .and_then(Object::as_reference)
            .unwrap();
        let sig = doc.get_dictionary(sig_id).unwrap();

        let text = |key: &[u8]| lopdf::decode_text_string(sig.get(key).unwrap()).unwrap();
        assert_eq!(text(b"Reason"), "簽章");
        assert_eq!(text(b"Location"), "Zürich");
        assert_eq!(text(b"Name"), "Jürgen Signer");
        assert_eq!(text(b"ContactInfo"), "ops@example.com");
    }

    #[test]
    fn missing_page_is_reported() {
        let pdf = fixtures::sample_pdf(1).unwrap();
        let mut meta = sample_metadata();
        meta.sigpage = 3;
        let err = prepare(&pdf, &meta, "Test Signer", 64).unwrap_err();
        assert!(err.to_string().contains("no page at index 3"), "unexpected error: {err}");
    }

    #[test]
    fn non_pdf_input_is_rejected() {
        assert!(prepare(b"hello world", &sample_metadata(), "Test Signer", 64).is_err());
    }
}
