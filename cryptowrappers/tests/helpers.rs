use std::cell::RefCell;

use certsvc::{CertServices, Encoding, EncodingType, FormatFlags, MemoryServices, StringFormat};
use cryptowrappers::{Error, binary_to_text, format_object, query_then_fill, text_to_binary};
use rstest::rstest;

const ARMOR: &str = "-----BEGIN CERTIFICATE-----\r\n-----END CERTIFICATE-----\r\n";

#[rstest]
#[case(StringFormat::new(Encoding::Base64), "")]
#[case(StringFormat::new(Encoding::Base64Uri), "")]
#[case(StringFormat::new(Encoding::HexRaw), "")]
#[case(StringFormat::new(Encoding::Hex), "")]
#[case(StringFormat::new(Encoding::Base64Header), ARMOR)]
#[case(
    StringFormat::new(Encoding::Base64X509CrlHeader).with_flags(StringFormat::NOCR),
    "-----BEGIN X509 CRL-----\n-----END X509 CRL-----\n",
)]
fn test_empty_input(#[case] format: StringFormat, #[case] expected: &str) {
    let services = MemoryServices::new();
    assert_eq!(expected, binary_to_text(&services, &[], format).unwrap());
}

#[rstest]
#[case(StringFormat::new(Encoding::Base64), "MAMCAQE=\r\n")]
#[case(StringFormat::new(Encoding::Base64).with_flags(StringFormat::NOCRLF), "MAMCAQE=")]
#[case(StringFormat::new(Encoding::Base64Uri), "MAMCAQE")]
#[case(StringFormat::new(Encoding::HexRaw).with_flags(StringFormat::NOCR), "3003020101\n")]
#[case(StringFormat::new(Encoding::Hex), "30 03 02 01 01\r\n")]
#[case(StringFormat::new(Encoding::HexAddr), "0000    30 03 02 01 01\r\n")]
fn test_binary_to_text(#[case] format: StringFormat, #[case] expected: &str) {
    let services = MemoryServices::new();
    let data = [0x30, 0x03, 0x02, 0x01, 0x01];
    assert_eq!(expected, binary_to_text(&services, &data, format).unwrap());
}

#[rstest]
#[case(Encoding::Base64Header)]
#[case(Encoding::Base64)]
#[case(Encoding::Hex)]
#[case(Encoding::HexAscii)]
#[case(Encoding::HexAsciiAddr)]
#[case(Encoding::HexRaw)]
#[case(Encoding::Base64Uri)]
fn test_text_round_trip(#[case] encoding: Encoding) {
    let services = MemoryServices::new();
    let data: Vec<u8> = (0u8..=40).collect();
    let text = binary_to_text(&services, &data, encoding.into()).unwrap();
    let decoded = text_to_binary(&services, &text, encoding.into()).unwrap();
    assert_eq!(data, decoded.bytes);
    assert_eq!(encoding, decoded.detected);
}

#[test]
fn test_text_to_binary_detection() {
    let services = MemoryServices::new();
    let text = "issued today\n-----BEGIN X509 CRL-----\nMAA=\n-----END X509 CRL-----\n";
    let decoded = text_to_binary(&services, text, Encoding::Any.into()).unwrap();
    assert_eq!(vec![0x30, 0x00], decoded.bytes);
    assert_eq!("issued today\n".len(), decoded.skipped);
    assert_eq!(Encoding::Base64Header, decoded.detected);

    let decoded = text_to_binary(&services, "30 00\n", Encoding::HexAny.into()).unwrap();
    assert_eq!(vec![0x30, 0x00], decoded.bytes);
    assert_eq!(Encoding::Hex, decoded.detected);
}

#[rstest]
#[case("not base64!", StringFormat::new(Encoding::Base64))]
#[case("MA A=", StringFormat::new(Encoding::Base64).with_flags(StringFormat::STRICT))]
#[case("zz", StringFormat::new(Encoding::HexRaw))]
#[case("-----BEGIN CERTIFICATE-----\nMAA=\n", StringFormat::new(Encoding::Base64Header))]
fn test_text_to_binary_errors(#[case] text: &str, #[case] format: StringFormat) {
    let services = MemoryServices::new();
    let err = text_to_binary(&services, text, format).unwrap_err();
    assert!(matches!(err, Error::Conversion(_)));
}

#[rstest]
#[case(StringFormat::new(Encoding::Any))]
#[case(StringFormat::new(Encoding::Hex).with_flags(StringFormat::NOCRLF))]
#[case(StringFormat::new(Encoding::Base64Header).with_flags(StringFormat::NOCRLF))]
fn test_binary_to_text_rejected(#[case] format: StringFormat) {
    let services = MemoryServices::new();
    assert!(matches!(
        binary_to_text(&services, &[1, 2, 3], format),
        Err(Error::Conversion(_))
    ));
}

#[rstest]
#[case(
    Some("2.5.29.15"),
    FormatFlags::NONE,
    vec![0x03, 0x02, 0x01, 0x86],
    "Digital Signature, Certificate Signing, Off-line CRL Signing, CRL Signing (86)",
)]
#[case(
    Some("2.5.29.15"),
    FormatFlags::NO_HEX,
    vec![0x03, 0x02, 0x01, 0x86],
    "Digital Signature, Certificate Signing, Off-line CRL Signing, CRL Signing",
)]
#[case(
    Some("2.5.29.19"),
    FormatFlags::MULTI_LINE,
    vec![0x30, 0x03, 0x01, 0x01, 0xff],
    "Subject Type=CA\r\nPath Length Constraint=None\r\n",
)]
#[case(Some("2.5.29.20"), FormatFlags::NONE, vec![0x02, 0x02, 0x00, 0x9a], "9a")]
#[case(Some("2.5.29.21"), FormatFlags::NONE, vec![0x0a, 0x01, 0x01], "Key Compromise (1)")]
#[case(Some("2.5.29.14"), FormatFlags::NONE, vec![0x04, 0x02, 0xab, 0xcd], "ab cd")]
#[case(None, FormatFlags::NONE, vec![0x05, 0x00], "05 00")]
#[case(Some("1.2.3.4"), FormatFlags::MULTI_LINE, vec![0x05, 0x00], "05 00\r\n")]
fn test_format_object(
    #[case] struct_type: Option<&str>,
    #[case] flags: FormatFlags,
    #[case] encoded: Vec<u8>,
    #[case] expected: &str,
) {
    let services = MemoryServices::new();
    let text = format_object(&services, EncodingType::X509_ASN, flags, struct_type, &encoded).unwrap();
    assert_eq!(expected, text);
}

#[test]
fn test_format_object_malformed() {
    let services = MemoryServices::new();
    let err = format_object(
        &services,
        EncodingType::X509_ASN,
        FormatFlags::NONE,
        Some("2.5.29.21"),
        &[0x0a, 0x05],
    )
    .unwrap_err();
    assert!(matches!(err, Error::Format(_)));
}

#[test]
fn test_two_pass_sizes_agree() {
    let services = MemoryServices::new();
    let calls = RefCell::new(Vec::new());
    let data = vec![0x5a; 100];
    let format = StringFormat::new(Encoding::Base64Header);
    let mut first_len = 0;
    let text = query_then_fill(|out: Option<&mut [u8]>, len: &mut usize| {
        calls.borrow_mut().push(out.as_ref().map(|b| b.len()));
        let result = services.binary_to_string(&data, format, out, len);
        if first_len == 0 {
            first_len = *len;
        }
        result
    })
    .unwrap();
    assert_eq!(vec![None, Some(first_len)], *calls.borrow());
    assert_eq!(first_len, text.len());
}
