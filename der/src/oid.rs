use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectIdentifier {
    inner: Vec<u64>,
}

impl ObjectIdentifier {
    pub fn arcs(&self) -> &[u64] {
        &self.inner
    }

    pub(crate) fn from_der_content(value: &[u8]) -> Result<Self, Error> {
        if value.is_empty() {
            return Err(Error::InvalidObjectIdentifier("no data".to_string()));
        }

        let mut subidentifiers = Vec::new();
        let mut val = 0u64;
        let mut pending = false;
        for &b in value {
            if val > (u64::MAX >> 7) {
                return Err(Error::InvalidObjectIdentifier(
                    "component out of range".to_string(),
                ));
            }
            val = (val << 7) | (b & 0x7f) as u64;
            pending = b & 0x80 != 0;
            if !pending {
                subidentifiers.push(val);
                val = 0;
            }
        }
        if pending {
            return Err(Error::InvalidObjectIdentifier(
                "incomplete encoding".to_string(),
            ));
        }

        // the first subidentifier packs the first two arcs
        let first = subidentifiers[0];
        let mut inner = match first {
            0..=39 => vec![0, first],
            40..=79 => vec![1, first - 40],
            _ => vec![2, first - 80],
        };
        inner.extend_from_slice(&subidentifiers[1..]);
        Ok(ObjectIdentifier { inner })
    }

    pub(crate) fn to_der_content(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let first = self.inner[0] * 40 + self.inner[1];
        for n in std::iter::once(first).chain(self.inner[2..].iter().copied()) {
            let mut groups = vec![(n & 0x7f) as u8];
            let mut rest = n >> 7;
            while rest > 0 {
                groups.push((rest & 0x7f) as u8 | 0x80);
                rest >>= 7;
            }
            out.extend(groups.iter().rev());
        }
        out
    }
}

impl FromStr for ObjectIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::InvalidObjectIdentifier("empty string".to_string()));
        }
        let inner = s
            .split('.')
            .map(|c| {
                c.parse::<u64>()
                    .map_err(|_| Error::InvalidObjectIdentifier(format!("invalid component '{}'", c)))
            })
            .collect::<Result<Vec<u64>, Error>>()?;
        if inner.len() < 2 {
            return Err(Error::InvalidObjectIdentifier(
                "too few components".to_string(),
            ));
        }
        if inner[0] > 2 || (inner[0] < 2 && inner[1] >= 40) {
            return Err(Error::InvalidObjectIdentifier(format!(
                "invalid leading arcs {}.{}",
                inner[0], inner[1]
            )));
        }
        Ok(ObjectIdentifier { inner })
    }
}

impl Display for ObjectIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.inner.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::ObjectIdentifier;

    #[rstest]
    #[case(vec![0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b], "1.2.840.113549.1.1.11")]
    #[case(vec![0x55, 0x04, 0x03], "2.5.4.3")]
    #[case(vec![0x2b, 0x06, 0x01, 0x04, 0x01, 0x82, 0x37, 0x0a, 0x01], "1.3.6.1.4.1.311.10.1")]
    #[case(vec![0x88, 0x37, 0x03], "2.999.3")]
    fn test_oid_decode_encode(#[case] input: Vec<u8>, #[case] expected: &str) {
        let oid = ObjectIdentifier::from_der_content(&input).unwrap();
        assert_eq!(expected, oid.to_string());

        let parsed: ObjectIdentifier = expected.parse().unwrap();
        assert_eq!(input, parsed.to_der_content());
    }

    #[rstest]
    #[case("")]
    #[case("1")]
    #[case("1.x.3")]
    #[case("3.1")]
    #[case("1.40")]
    fn test_oid_from_str_error(#[case] input: &str) {
        assert!(input.parse::<ObjectIdentifier>().is_err());
    }

    #[test]
    fn test_oid_incomplete() {
        assert!(ObjectIdentifier::from_der_content(&[0x55, 0x84]).is_err());
    }
}
