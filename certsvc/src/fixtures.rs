//! Encoded CRL, CTL and certificate fixtures built with the `der` writer.
//!
//! Every fixture shares the issuer `CN=Fixture CA`, so certificates built
//! here can be looked up in revocation lists built here.

use chrono::{NaiveDate, NaiveDateTime};
use der::{ObjectIdentifier, Tlv};

use crate::ctl::{CTL_CONTENT_OID, SHA1_OID, SIGNED_DATA_OID};
use crate::format::{CRL_NUMBER, CRL_REASON_CODE};

const SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
const RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
const COMMON_NAME: &str = "2.5.4.3";
const CODE_SIGNING: &str = "1.3.6.1.5.5.7.3.3";
const FRIENDLY_NAME_ATTRIBUTE: &str = "1.3.6.1.4.1.311.10.11.11";

fn oid(dotted: &str) -> ObjectIdentifier {
    dotted.parse().expect("fixture OIDs are valid")
}

fn date(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("fixture dates are valid")
}

fn algorithm(dotted: &str) -> Tlv {
    Tlv::sequence(vec![Tlv::oid(&oid(dotted)), Tlv::null()])
}

fn name(common_name: &str) -> Tlv {
    Tlv::sequence(vec![Tlv::set(vec![Tlv::sequence(vec![
        Tlv::oid(&oid(COMMON_NAME)),
        Tlv::utf8_string(common_name),
    ])])])
}

fn extension(dotted: &str, value: Tlv) -> Tlv {
    Tlv::sequence(vec![Tlv::oid(&oid(dotted)), Tlv::octet_string(value.raw())])
}

/// `CN=Fixture CA`, as encoded.
pub fn issuer() -> Vec<u8> {
    name("Fixture CA").raw().to_vec()
}

fn signed(tbs: Tlv) -> Vec<u8> {
    Tlv::sequence(vec![
        tbs,
        algorithm(SHA256_WITH_RSA),
        Tlv::bit_string(0, &[0u8; 16]),
    ])
    .raw()
    .to_vec()
}

/// A v2 CRL without revoked certificates.
pub fn empty_crl() -> Vec<u8> {
    crl_with_revoked(&[])
}

/// A v2 CRL revoking `serials` (INTEGER content octets), each with a
/// key-compromise reason code.
pub fn crl_with_revoked(serials: &[&[u8]]) -> Vec<u8> {
    let mut tbs = vec![
        Tlv::unsigned(1),
        algorithm(SHA256_WITH_RSA),
        name("Fixture CA"),
        Tlv::time(date(2024, 1, 1)),
        Tlv::time(date(2024, 2, 1)),
    ];
    if !serials.is_empty() {
        let entries = serials
            .iter()
            .map(|serial| {
                Tlv::sequence(vec![
                    Tlv::integer(serial),
                    Tlv::time(date(2023, 12, 24)),
                    Tlv::sequence(vec![extension(CRL_REASON_CODE, Tlv::enumerated(1))]),
                ])
            })
            .collect();
        tbs.push(Tlv::sequence(entries));
    }
    tbs.push(Tlv::explicit(
        0,
        Tlv::sequence(vec![extension(CRL_NUMBER, Tlv::unsigned(serials.len() as u64 + 1))]),
    ));
    signed(Tlv::sequence(tbs))
}

/// A v3 certificate issued by `CN=Fixture CA` with the given serial.
pub fn certificate(serial: &[u8]) -> Vec<u8> {
    let tbs = Tlv::sequence(vec![
        Tlv::explicit(0, Tlv::unsigned(2)),
        Tlv::integer(serial),
        algorithm(SHA256_WITH_RSA),
        name("Fixture CA"),
        Tlv::sequence(vec![Tlv::time(date(2024, 1, 1)), Tlv::time(date(2025, 1, 1))]),
        name("Fixture Leaf"),
        Tlv::sequence(vec![algorithm(RSA_ENCRYPTION), Tlv::bit_string(0, &[0u8; 8])]),
    ]);
    signed(tbs)
}

/// A code-signing trust list using SHA-1 identifiers, stored in the order
/// given.
pub fn ctl(identifiers: &[&[u8]]) -> Vec<u8> {
    ctl_with(SHA1_OID, identifiers, false)
}

/// A trust list inside PKCS#7 signed data. With `wrap_in_octets` the list is
/// carried as an OCTET STRING the way CMS encodes content.
pub fn ctl_with(subject_algorithm: &str, identifiers: &[&[u8]], wrap_in_octets: bool) -> Vec<u8> {
    let subjects = identifiers
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let friendly_name = Tlv::octet_string(format!("subject {}", i).as_bytes());
            Tlv::sequence(vec![
                Tlv::octet_string(id),
                Tlv::set(vec![Tlv::sequence(vec![
                    Tlv::oid(&oid(FRIENDLY_NAME_ATTRIBUTE)),
                    Tlv::set(vec![friendly_name]),
                ])]),
            ])
        })
        .collect();
    let list = Tlv::sequence(vec![
        Tlv::sequence(vec![Tlv::oid(&oid(CODE_SIGNING))]),
        Tlv::octet_string(b"fixture-list"),
        Tlv::unsigned(7),
        Tlv::time(date(2024, 1, 1)),
        algorithm(subject_algorithm),
        Tlv::sequence(subjects),
    ]);
    let content = if wrap_in_octets {
        Tlv::octet_string(list.raw())
    } else {
        list
    };
    let signed_data = Tlv::sequence(vec![
        Tlv::unsigned(1),
        Tlv::set(vec![algorithm("2.16.840.1.101.3.4.2.1")]),
        Tlv::sequence(vec![
            Tlv::oid(&oid(CTL_CONTENT_OID)),
            Tlv::explicit(0, content),
        ]),
        Tlv::set(vec![]),
    ]);
    Tlv::sequence(vec![
        Tlv::oid(&oid(SIGNED_DATA_OID)),
        Tlv::explicit(0, signed_data),
    ])
    .raw()
    .to_vec()
}
