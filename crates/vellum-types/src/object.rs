use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Content-addressed identifier for any stored object.
///
/// An `ObjectId` is a 32-byte BLAKE3 digest. Identical content always
/// produces the same `ObjectId`, so objects deduplicate and can be verified
/// after transport. It serializes as a 64-character lowercase hex string,
/// which keeps commit encodings and dump records readable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 32]);

impl ObjectId {
    /// Length of the hex representation.
    pub const HEX_LEN: usize = 64;

    /// Create an `ObjectId` from a pre-computed hash.
    pub const fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// Plain BLAKE3 digest of `data`, without domain separation.
    ///
    /// Stored objects are identified through `vellum_crypto::ContentHasher`;
    /// this is for tests and ad-hoc identifiers.
    pub fn digest(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    /// Returns `true` if `s` looks like a full object id (64 hex digits).
    ///
    /// Used to tell commit hashes apart from state names when a caller
    /// passes either.
    pub fn is_hex_id(s: &str) -> bool {
        s.len() == Self::HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for ObjectId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(ObjectId::digest(b"hello"), ObjectId::digest(b"hello"));
        assert_ne!(ObjectId::digest(b"hello"), ObjectId::digest(b"world"));
    }

    #[test]
    fn hex_roundtrip() {
        let id = ObjectId::digest(b"test");
        let parsed = ObjectId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, parsed);
        assert_eq!(id.to_hex().len(), ObjectId::HEX_LEN);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = ObjectId::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn from_hex_rejects_non_hex() {
        assert!(matches!(
            ObjectId::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn short_hex_is_8_chars() {
        assert_eq!(ObjectId::digest(b"test").short_hex().len(), 8);
    }

    #[test]
    fn serializes_as_hex_string() {
        let id = ObjectId::digest(b"serde test");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
        let parsed: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn is_hex_id_distinguishes_state_names() {
        let id = ObjectId::digest(b"x");
        assert!(ObjectId::is_hex_id(&id.to_hex()));
        assert!(!ObjectId::is_hex_id("published"));
        assert!(!ObjectId::is_hex_id("master"));
    }

    #[test]
    fn ordering_is_consistent() {
        let id1 = ObjectId::from_hash([0; 32]);
        let id2 = ObjectId::from_hash([1; 32]);
        assert!(id1 < id2);
    }
}
