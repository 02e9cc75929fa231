//! Structural view of an X.509 revocation list (RFC 5280 section 5).

use chrono::NaiveDateTime;
use codec::decoder::{DecodableFrom, Decoder};
use der::{Der, Error, Tag, Tlv};
use serde::{Deserialize, Serialize};

use crate::fields::{self, Extension, Fields};

/*
CertificateList  ::=  SEQUENCE  {
     tbsCertList          TBSCertList,
     signatureAlgorithm   AlgorithmIdentifier,
     signatureValue       BIT STRING  }

TBSCertList  ::=  SEQUENCE  {
     version                 Version OPTIONAL,
     signature               AlgorithmIdentifier,
     issuer                  Name,
     thisUpdate              Time,
     nextUpdate              Time OPTIONAL,
     revokedCertificates     SEQUENCE OF SEQUENCE  {
          userCertificate         CertificateSerialNumber,
          revocationDate          Time,
          crlEntryExtensions      Extensions OPTIONAL
                                   } OPTIONAL,
     crlExtensions           [0]  EXPLICIT Extensions OPTIONAL }
*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrlInfo {
    /// 0 for v1, 1 for v2.
    pub version: u32,
    pub signature_algorithm: String,
    /// The issuer `Name` exactly as encoded.
    #[serde(with = "crate::fields::hex_bytes")]
    pub issuer: Vec<u8>,
    pub issuer_name: String,
    pub this_update: NaiveDateTime,
    pub next_update: Option<NaiveDateTime>,
    pub entries: Vec<CrlEntry>,
    pub extensions: Vec<Extension>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrlEntry {
    /// Serial number content octets, sign byte included.
    #[serde(with = "crate::fields::hex_bytes")]
    pub serial: Vec<u8>,
    pub revocation_date: NaiveDateTime,
    pub extensions: Vec<Extension>,
}

impl CrlInfo {
    pub(crate) fn parse(encoded: &[u8]) -> Result<Self, Error> {
        let der: Der = encoded.decode()?;
        der.decode()
    }

    fn from_tlv(list: &Tlv) -> Result<Self, Error> {
        let mut outer = Fields::new(list.expect(Tag::SEQUENCE)?);
        let tbs = outer.next("tbsCertList")?.expect(Tag::SEQUENCE)?;
        // signatureAlgorithm and signatureValue are present but not checked
        outer.next("signatureAlgorithm")?;
        outer.next("signatureValue")?;

        let mut fields = Fields::new(tbs);
        let version = match fields.next_tagged(Tag::INTEGER) {
            Some(v) => u32::try_from(v.as_u64()?).map_err(|_| Error::IntegerOutOfRange)?,
            None => 0,
        };
        let signature_algorithm = fields::algorithm(fields.next("signature")?)?;
        let issuer = fields.next("issuer")?;
        let issuer_name = fields::display_name(issuer)?;
        let this_update = fields.next("thisUpdate")?.as_time()?;
        let next_update = fields.next_if(Tlv::is_time).map(Tlv::as_time).transpose()?;

        let entries = match fields.next_tagged(Tag::SEQUENCE) {
            Some(revoked) => revoked
                .children()
                .iter()
                .map(CrlEntry::parse)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        let extensions = match fields.next_tagged(Tag::context(0, true)) {
            Some(explicit) => {
                let inner = explicit
                    .children()
                    .first()
                    .ok_or(Error::MissingElement("crlExtensions"))?;
                fields::extensions(inner)?
            }
            None => Vec::new(),
        };

        Ok(CrlInfo {
            version,
            signature_algorithm,
            issuer: issuer.raw().to_vec(),
            issuer_name,
            this_update,
            next_update,
            entries,
            extensions,
        })
    }
}

impl DecodableFrom<Der> for CrlInfo {}

impl Decoder<Der, CrlInfo> for Der {
    type Error = Error;

    fn decode(&self) -> Result<CrlInfo, Self::Error> {
        match self.elements() {
            [list] => CrlInfo::from_tlv(list),
            [] => Err(Error::Empty),
            [_, rest @ ..] => Err(Error::TrailingData(rest.iter().map(|t| t.raw().len()).sum())),
        }
    }
}

impl CrlEntry {
    fn parse(tlv: &Tlv) -> Result<Self, Error> {
        let mut fields = Fields::new(tlv.expect(Tag::SEQUENCE)?);
        let serial = fields.next("userCertificate")?.as_integer()?.to_vec();
        let revocation_date = fields.next("revocationDate")?.as_time()?;
        let extensions = match fields.next_tagged(Tag::SEQUENCE) {
            Some(exts) => fields::extensions(exts)?,
            None => Vec::new(),
        };
        Ok(CrlEntry {
            serial,
            revocation_date,
            extensions,
        })
    }
}

/// Issuer name and serial number of an encoded certificate, both as
/// encoded.
pub(crate) fn certificate_issuer_and_serial(encoded: &[u8]) -> Result<(Vec<u8>, Vec<u8>), Error> {
    let cert = Tlv::from_der(encoded)?;
    let mut outer = Fields::new(cert.expect(Tag::SEQUENCE)?);
    let tbs = outer.next("tbsCertificate")?.expect(Tag::SEQUENCE)?;
    let mut fields = Fields::new(tbs);
    fields.next_tagged(Tag::context(0, true));
    let serial = fields.next("serialNumber")?.as_integer()?.to_vec();
    fields.next("signature")?;
    let issuer = fields.next("issuer")?.expect(Tag::SEQUENCE)?;
    Ok((issuer.raw().to_vec(), serial))
}
