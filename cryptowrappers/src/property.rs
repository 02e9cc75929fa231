//! Typed access to context properties.

use certsvc::PropId;

/// A property with a known byte layout.
pub trait Property {
    const ID: PropId;
    type Value;

    fn decode(bytes: &[u8]) -> Result<Self::Value, certsvc::Error>;
    fn encode(value: &Self::Value) -> Vec<u8>;
}

/// Display name, stored as null-terminated UTF-16LE.
#[derive(Debug)]
pub enum FriendlyName {}

impl Property for FriendlyName {
    const ID: PropId = PropId::FRIENDLY_NAME;
    type Value = String;

    fn decode(bytes: &[u8]) -> Result<String, certsvc::Error> {
        if bytes.len() % 2 != 0 {
            return Err(certsvc::Error::InvalidData(
                "odd length UTF-16 string".to_string(),
            ));
        }
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .take_while(|&u| u != 0)
            .collect();
        String::from_utf16(&units).map_err(|e| certsvc::Error::InvalidData(e.to_string()))
    }

    fn encode(value: &String) -> Vec<u8> {
        value
            .encode_utf16()
            .chain(std::iter::once(0))
            .flat_map(u16::to_le_bytes)
            .collect()
    }
}

fn digest<const N: usize>(bytes: &[u8]) -> Result<[u8; N], certsvc::Error> {
    bytes.try_into().map_err(|_| {
        certsvc::Error::InvalidData(format!("expected a {} byte hash, got {}", N, bytes.len()))
    })
}

/// SHA-1 of the encoded context.
#[derive(Debug)]
pub enum Sha1Hash {}

impl Property for Sha1Hash {
    const ID: PropId = PropId::SHA1_HASH;
    type Value = [u8; 20];

    fn decode(bytes: &[u8]) -> Result<[u8; 20], certsvc::Error> {
        digest(bytes)
    }

    fn encode(value: &[u8; 20]) -> Vec<u8> {
        value.to_vec()
    }
}

/// SHA-256 of the encoded context.
#[derive(Debug)]
pub enum Sha256Hash {}

impl Property for Sha256Hash {
    const ID: PropId = PropId::SHA256_HASH;
    type Value = [u8; 32];

    fn decode(bytes: &[u8]) -> Result<[u8; 32], certsvc::Error> {
        digest(bytes)
    }

    fn encode(value: &[u8; 32]) -> Vec<u8> {
        value.to_vec()
    }
}

/// Presence marks the context archived; the value is empty.
#[derive(Debug)]
pub enum Archived {}

impl Property for Archived {
    const ID: PropId = PropId::ARCHIVED;
    type Value = ();

    fn decode(_: &[u8]) -> Result<(), certsvc::Error> {
        Ok(())
    }

    fn encode(_: &()) -> Vec<u8> {
        Vec::new()
    }
}

/// Persistence flags of the context. Read only.
#[derive(Debug)]
pub enum AccessState {}

impl Property for AccessState {
    const ID: PropId = PropId::ACCESS_STATE;
    type Value = u32;

    fn decode(bytes: &[u8]) -> Result<u32, certsvc::Error> {
        digest::<4>(bytes).map(u32::from_le_bytes)
    }

    fn encode(value: &u32) -> Vec<u8> {
        value.to_le_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{AccessState, FriendlyName, Property, Sha1Hash};

    #[rstest]
    #[case("", vec![0, 0])]
    #[case("CA", vec![b'C', 0, b'A', 0, 0, 0])]
    #[case("é", vec![0xe9, 0, 0, 0])]
    fn test_friendly_name_encode(#[case] input: &str, #[case] expected: Vec<u8>) {
        assert_eq!(expected, FriendlyName::encode(&input.to_string()));
        assert_eq!(input, FriendlyName::decode(&expected).unwrap());
    }

    #[test]
    fn test_friendly_name_stops_at_null() {
        let bytes = [b'a', 0, 0, 0, b'b', 0];
        assert_eq!("a", FriendlyName::decode(&bytes).unwrap());
        assert_eq!("ab", FriendlyName::decode(&[b'a', 0, b'b', 0]).unwrap());
    }

    #[test]
    fn test_friendly_name_odd_length() {
        assert!(FriendlyName::decode(&[b'a', 0, 0]).is_err());
    }

    #[test]
    fn test_hash_length_checked() {
        assert!(Sha1Hash::decode(&[0; 19]).is_err());
        assert_eq!([7; 20], Sha1Hash::decode(&[7; 20]).unwrap());
    }

    #[test]
    fn test_access_state() {
        assert_eq!(0x0102, AccessState::decode(&[2, 1, 0, 0]).unwrap());
        assert!(AccessState::decode(&[0; 3]).is_err());
    }
}
