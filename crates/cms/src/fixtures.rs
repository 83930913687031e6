//! Throwaway PKCS#12 containers and PDFs for tests.

use anyhow::Result;
use lopdf::{Document, Object, Stream, dictionary};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, PKeyRef, Private};
use openssl::rsa::Rsa;
use openssl::stack::Stack;
use openssl::x509::{X509, X509NameBuilder};

/// RSA key pair plus a certificate for `common_name`, signed by `issuer` or self-signed.
pub fn certificate(
    common_name: &str,
    issuer: Option<(&str, &PKeyRef<Private>)>,
) -> Result<(PKey<Private>, X509)> {
    let key = PKey::from_rsa(Rsa::generate(2048)?)?;

    let mut subject = X509NameBuilder::new()?;
    subject.append_entry_by_text("CN", common_name)?;
    let subject = subject.build();

    let (issuer_name, issuer_key) = match issuer {
        Some((cn, issuer_key)) => {
            let mut name = X509NameBuilder::new()?;
            name.append_entry_by_text("CN", cn)?;
            (name.build(), issuer_key)
        }
        None => {
            let mut name = X509NameBuilder::new()?;
            name.append_entry_by_text("CN", common_name)?;
            (name.build(), &*key)
        }
    };

    let mut builder = X509::builder()?;
    builder.set_version(2)?;
    let serial = BigNum::from_u32(1)?.to_asn1_integer()?;
    builder.set_serial_number(&serial)?;
    builder.set_subject_name(&subject)?;
    builder.set_issuer_name(&issuer_name)?;
    builder.set_pubkey(&key)?;
    let not_before = Asn1Time::days_from_now(0)?;
    let not_after = Asn1Time::days_from_now(365)?;
    builder.set_not_before(&not_before)?;
    builder.set_not_after(&not_after)?;
    builder.sign(issuer_key, MessageDigest::sha256())?;
    let cert = builder.build();

    Ok((key, cert))
}

/// DER-encoded PKCS#12 holding a self-signed certificate and its key.
pub fn pkcs12_container(common_name: &str, password: &str) -> Result<Vec<u8>> {
    let (key, cert) = certificate(common_name, None)?;
    let p12 = Pkcs12::builder()
        .name(common_name)
        .pkey(&key)
        .cert(&cert)
        .build2(password)?;
    Ok(p12.to_der()?)
}

/// Like [`pkcs12_container`], with extra chain certificates in the given order.
///
/// The leaf is issued by the first chain entry.
pub fn pkcs12_container_with_chain(
    common_name: &str,
    chain: &[&str],
    password: &str,
) -> Result<Vec<u8>> {
    let mut ca = Stack::new()?;
    let mut issuer = None;
    for cn in chain {
        let (chain_key, chain_cert) = certificate(cn, None)?;
        if issuer.is_none() {
            issuer = Some((*cn, chain_key));
        }
        ca.push(chain_cert)?;
    }
    let (key, cert) = certificate(
        common_name,
        issuer.as_ref().map(|(cn, issuer_key)| (*cn, &**issuer_key)),
    )?;
    let p12 = Pkcs12::builder()
        .name(common_name)
        .pkey(&key)
        .cert(&cert)
        .ca(ca)
        .build2(password)?;
    Ok(p12.to_der()?)
}

/// PKCS#12 with no password at all: plaintext bags and no MAC.
pub fn unprotected_container(common_name: &str) -> Result<Vec<u8>> {
    let (key, cert) = certificate(common_name, None)?;
    let plaintext = Nid::from_raw(-1);
    let p12 = Pkcs12::builder()
        .name(common_name)
        .pkey(&key)
        .cert(&cert)
        .key_algorithm(plaintext)
        .cert_algorithm(plaintext)
        .mac_iter(u32::MAX) // cast to c_int -1: no MAC
        .build2("")?;
    Ok(p12.to_der()?)
}

/// PKCS#12 carrying a certificate but no private key.
pub fn certificate_only_container(common_name: &str, password: &str) -> Result<Vec<u8>> {
    let (_, cert) = certificate(common_name, None)?;
    let p12 = Pkcs12::builder().cert(&cert).build2(password)?;
    Ok(p12.to_der()?)
}

/// A small PDF with `pages` blank pages.
pub fn sample_pdf(pages: usize) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(pages);
    for n in 0..pages {
        let content = format!("BT /F1 12 Tf 72 720 Td (page {}) Tj ET", n + 1);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(pages as i64),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}
