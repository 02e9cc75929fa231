//! Structural view of a certificate trust list carried in PKCS#7 signed data.

use chrono::NaiveDateTime;
use codec::decoder::{DecodableFrom, Decoder};
use der::{Der, Error, Tag, Tlv};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::fields::{self, Extension, Fields};

pub const SIGNED_DATA_OID: &str = "1.2.840.113549.1.7.2";
pub const CTL_CONTENT_OID: &str = "1.3.6.1.4.1.311.10.1";
pub const SHA1_OID: &str = "1.3.14.3.2.26";
pub const SHA256_OID: &str = "2.16.840.1.101.3.4.2.1";

/*
CertificateTrustList ::= SEQUENCE {
    version              CTLVersion DEFAULT v1,
    subjectUsage         SubjectUsage,
    listIdentifier       ListIdentifier OPTIONAL,
    sequenceNumber       HUGEINTEGER OPTIONAL,
    ctlThisUpdate        ChoiceOfTime,
    ctlNextUpdate        ChoiceOfTime OPTIONAL,
    subjectAlgorithm     AlgorithmIdentifier,
    trustedSubjects      TrustedSubjects OPTIONAL,
    ctlExtensions        [0] EXPLICIT Extensions OPTIONAL
}

TrustedSubject ::= SEQUENCE {
    subjectIdentifier    SubjectIdentifier,
    subjectAttributes    Attributes OPTIONAL
}
*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtlInfo {
    pub version: u32,
    /// Usage OIDs the list applies to.
    pub subject_usage: Vec<String>,
    #[serde(default, with = "optional_hex")]
    pub list_identifier: Option<Vec<u8>>,
    #[serde(default, with = "optional_hex")]
    pub sequence_number: Option<Vec<u8>>,
    pub this_update: NaiveDateTime,
    pub next_update: Option<NaiveDateTime>,
    pub subject_algorithm: String,
    pub entries: Vec<CtlEntry>,
    pub extensions: Vec<Extension>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtlEntry {
    #[serde(with = "crate::fields::hex_bytes")]
    pub subject_identifier: Vec<u8>,
    pub attributes: Vec<Attribute>,
    /// The `SET OF Attribute` as encoded, empty when absent.
    #[serde(skip)]
    pub encoded_attributes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub oid: String,
    /// Each value as a complete DER element.
    #[serde(with = "hex_list")]
    pub values: Vec<Vec<u8>>,
}

/// One element of a sorted trust list enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortedSubject {
    #[serde(with = "crate::fields::hex_bytes")]
    pub identifier: Vec<u8>,
    #[serde(with = "crate::fields::hex_bytes")]
    pub encoded_attributes: Vec<u8>,
}

impl CtlInfo {
    pub(crate) fn parse(encoded: &[u8]) -> Result<Self, Error> {
        let der: Der = encoded.decode()?;
        der.decode()
    }

    fn from_content_info(content_info: &Tlv) -> Result<Self, Error> {
        let list = trust_list(content_info)?;
        let mut fields = Fields::new(list.expect(Tag::SEQUENCE)?);

        let version = match fields.next_tagged(Tag::INTEGER) {
            Some(v) => u32::try_from(v.as_u64()?).map_err(|_| Error::IntegerOutOfRange)?,
            None => 0,
        };
        let subject_usage = fields
            .next("subjectUsage")?
            .expect(Tag::SEQUENCE)?
            .children()
            .iter()
            .map(|oid| oid.as_oid().map(|o| o.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        let list_identifier = fields
            .next_tagged(Tag::OCTET_STRING)
            .map(|t| t.data().to_vec());
        let sequence_number = fields
            .next_tagged(Tag::INTEGER)
            .map(|t| t.as_integer().map(<[u8]>::to_vec))
            .transpose()?;
        let this_update = fields.next("ctlThisUpdate")?.as_time()?;
        let next_update = fields.next_if(Tlv::is_time).map(Tlv::as_time).transpose()?;
        let subject_algorithm = fields::algorithm(fields.next("subjectAlgorithm")?)?;

        let entries = match fields.next_tagged(Tag::SEQUENCE) {
            Some(subjects) => subjects
                .children()
                .iter()
                .map(CtlEntry::parse)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        let extensions = match fields.next_tagged(Tag::context(0, true)) {
            Some(explicit) => {
                let inner = explicit
                    .children()
                    .first()
                    .ok_or(Error::MissingElement("ctlExtensions"))?;
                fields::extensions(inner)?
            }
            None => Vec::new(),
        };

        Ok(CtlInfo {
            version,
            subject_usage,
            list_identifier,
            sequence_number,
            this_update,
            next_update,
            subject_algorithm,
            entries,
            extensions,
        })
    }

    /// Entry indices ordered by subject identifier.
    pub(crate) fn sorted_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        order.sort_by(|&a, &b| {
            self.entries[a]
                .subject_identifier
                .cmp(&self.entries[b].subject_identifier)
        });
        order
    }
}

impl DecodableFrom<Der> for CtlInfo {}

impl Decoder<Der, CtlInfo> for Der {
    type Error = Error;

    fn decode(&self) -> Result<CtlInfo, Self::Error> {
        match self.elements() {
            [content_info] => CtlInfo::from_content_info(content_info),
            [] => Err(Error::Empty),
            [_, rest @ ..] => Err(Error::TrailingData(rest.iter().map(|t| t.raw().len()).sum())),
        }
    }
}

impl CtlEntry {
    fn parse(tlv: &Tlv) -> Result<Self, Error> {
        let mut fields = Fields::new(tlv.expect(Tag::SEQUENCE)?);
        let subject_identifier = fields.next("subjectIdentifier")?.as_octets()?.to_vec();
        let (attributes, encoded_attributes) = match fields.next_tagged(Tag::SET) {
            Some(set) => (
                set.children()
                    .iter()
                    .map(Attribute::parse)
                    .collect::<Result<Vec<_>, _>>()?,
                set.raw().to_vec(),
            ),
            None => (Vec::new(), Vec::new()),
        };
        Ok(CtlEntry {
            subject_identifier,
            attributes,
            encoded_attributes,
        })
    }
}

impl Attribute {
    fn parse(tlv: &Tlv) -> Result<Self, Error> {
        let mut fields = Fields::new(tlv.expect(Tag::SEQUENCE)?);
        let oid = fields.next("type")?.as_oid()?.to_string();
        let values = fields
            .next("values")?
            .expect(Tag::SET)?
            .children()
            .iter()
            .map(|v| v.raw().to_vec())
            .collect();
        Ok(Attribute { oid, values })
    }
}

/// Unwraps `ContentInfo` and `SignedData` down to the trust list itself.
fn trust_list(content_info: &Tlv) -> Result<Tlv, Error> {
    let mut fields = Fields::new(content_info.expect(Tag::SEQUENCE)?);
    let content_type = fields.next("contentType")?.as_oid()?.to_string();
    if content_type != SIGNED_DATA_OID {
        return Err(Error::InvalidObjectIdentifier(format!(
            "content type {} is not signedData",
            content_type
        )));
    }
    let signed_data = explicit_inner(fields.next("content")?, "content")?;

    let mut signed = Fields::new(signed_data.expect(Tag::SEQUENCE)?);
    signed.next("version")?.as_u64()?;
    signed.next("digestAlgorithms")?.expect(Tag::SET)?;
    let encap = signed.next("encapContentInfo")?;

    let mut encap = Fields::new(encap.expect(Tag::SEQUENCE)?);
    let e_content_type = encap.next("eContentType")?.as_oid()?.to_string();
    if e_content_type != CTL_CONTENT_OID {
        return Err(Error::InvalidObjectIdentifier(format!(
            "content type {} is not a trust list",
            e_content_type
        )));
    }
    let e_content = explicit_inner(encap.next("eContent")?, "eContent")?;
    // PKCS#7 v1.5 embeds the list directly, CMS wraps it in an OCTET STRING
    match e_content.tag() {
        Tag::OCTET_STRING => Tlv::from_der(e_content.data()),
        _ => Ok(e_content.clone()),
    }
}

fn explicit_inner<'a>(tlv: &'a Tlv, name: &'static str) -> Result<&'a Tlv, Error> {
    tlv.expect(Tag::context(0, true))?
        .children()
        .first()
        .ok_or(Error::MissingElement(name))
}

/// Identifier of an encoded certificate under `algorithm`.
pub(crate) fn subject_identifier(algorithm: &str, certificate: &[u8]) -> Option<Vec<u8>> {
    match algorithm {
        SHA1_OID => Some(Sha1::digest(certificate).to_vec()),
        SHA256_OID => Some(Sha256::digest(certificate).to_vec()),
        _ => None,
    }
}

mod optional_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::fields::{hex_bytes, to_hex};

    pub(super) fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => serializer.serialize_some(&to_hex(b)),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapped(#[serde(with = "hex_bytes")] Vec<u8>);
        Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|w| w.0))
    }
}

mod hex_list {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::fields::{hex_bytes, to_hex};

    pub(super) fn serialize<S: Serializer>(
        values: &[Vec<u8>],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for v in values {
            seq.serialize_element(&to_hex(v))?;
        }
        seq.end()
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapped(#[serde(with = "hex_bytes")] Vec<u8>);
        Ok(Vec::<Wrapped>::deserialize(deserializer)?
            .into_iter()
            .map(|w| w.0)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{CtlInfo, SHA1_OID, SHA256_OID, subject_identifier};
    use crate::fixtures;

    #[rstest]
    #[case(false)]
    #[case(true)]
    fn test_parse_ctl(#[case] wrap_in_octets: bool) {
        let encoded = fixtures::ctl_with(
            SHA1_OID,
            &[&[0x03; 20], &[0x01; 20], &[0x02; 20]],
            wrap_in_octets,
        );
        let info = CtlInfo::parse(&encoded).unwrap();
        assert_eq!(vec!["1.3.6.1.5.5.7.3.3".to_string()], info.subject_usage);
        assert_eq!(Some(b"fixture-list".to_vec()), info.list_identifier);
        assert_eq!(Some(vec![0x07]), info.sequence_number);
        assert_eq!(SHA1_OID, info.subject_algorithm);
        assert_eq!(3, info.entries.len());
        assert_eq!("1.3.6.1.4.1.311.10.11.11", info.entries[0].attributes[0].oid);
        assert_eq!(vec![1, 2, 0], info.sorted_order());
    }

    #[test]
    fn test_parse_rejects_other_content() {
        assert!(CtlInfo::parse(&fixtures::empty_crl()).is_err());
    }

    #[rstest]
    #[case(SHA1_OID, Some(20))]
    #[case(SHA256_OID, Some(32))]
    #[case("1.2.840.113549.2.5", None)]
    fn test_subject_identifier(#[case] algorithm: &str, #[case] length: Option<usize>) {
        assert_eq!(length, subject_identifier(algorithm, b"certificate").map(|id| id.len()));
    }
}
