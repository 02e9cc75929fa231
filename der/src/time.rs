use chrono::{Datelike, NaiveDateTime};

use crate::error::Error;
use crate::{Tag, Tlv};

/*
RFC 5280 Section 4.1.2.5.1
UTCTime YYMMDDHHMMSSZ: YY >= 50 is 19YY, YY < 50 is 20YY.
*/
pub(crate) fn parse_utc_time(data: &[u8]) -> Result<NaiveDateTime, Error> {
    let s = std::str::from_utf8(data).map_err(|e| Error::InvalidTime(e.to_string()))?;
    if s.len() != 13 || !s.is_ascii() {
        return Err(Error::InvalidTime(format!("UTCTime '{}'", s)));
    }
    let yy: i32 = s[..2]
        .parse()
        .map_err(|_| Error::InvalidTime(format!("UTCTime '{}'", s)))?;
    let year = if yy < 50 { 2000 + yy } else { 1900 + yy };
    NaiveDateTime::parse_from_str(&format!("{}{}", year, &s[2..]), "%Y%m%d%H%M%SZ")
        .map_err(|e| Error::InvalidTime(e.to_string()))
}

pub(crate) fn parse_generalized_time(data: &[u8]) -> Result<NaiveDateTime, Error> {
    NaiveDateTime::parse_from_str(
        std::str::from_utf8(data).map_err(|e| Error::InvalidTime(e.to_string()))?,
        "%Y%m%d%H%M%SZ",
    )
    .map_err(|e| Error::InvalidTime(e.to_string()))
}

pub(crate) fn encode_time(value: NaiveDateTime) -> Tlv {
    if (1950..2050).contains(&value.year()) {
        let s = value.format("%y%m%d%H%M%SZ").to_string();
        Tlv::primitive(Tag::UTC_TIME, s.into_bytes())
    } else {
        let s = value.format("%Y%m%d%H%M%SZ").to_string();
        Tlv::primitive(Tag::GENERALIZED_TIME, s.into_bytes())
    }
}
