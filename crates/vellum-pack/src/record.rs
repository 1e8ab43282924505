//! Line records of the dump format.
//!
//! A dump is plain text, one item per line:
//!
//! ```text
//! document: 3f2a…
//! objects:
//! {"oid":"…","type":"commit","data":"<base64>","len":187}
//! references:
//! {"name":"HEAD","type":"symbolic","target":"refs/heads/master"}
//! {"name":"refs/heads/master","type":"direct","target":"…"}
//! ```
//!
//! Any number of documents follow each other in one stream.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use vellum_store::{ObjectKind, StoredObject};
use vellum_types::ObjectId;

pub const DOCUMENT_PREFIX: &str = "document:";
pub const OBJECTS_MARKER: &str = "objects:";
pub const REFERENCES_MARKER: &str = "references:";

/// One stored object, payload base64-encoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub oid: ObjectId,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub data: String,
    pub len: u64,
}

impl ObjectRecord {
    pub fn from_object(oid: ObjectId, object: &StoredObject) -> Self {
        Self {
            oid,
            kind: object.kind,
            data: STANDARD.encode(&object.data),
            len: object.size,
        }
    }

    /// Decode the payload. Fails only on invalid base64; the length is
    /// checked by the caller.
    pub fn decode_data(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    /// Points at another ref by name (only `HEAD`).
    Symbolic,
    /// Points at a commit hash.
    Direct,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: RefKind,
    pub target: String,
}

impl RefRecord {
    pub fn symbolic(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RefKind::Symbolic,
            target: target.into(),
        }
    }

    pub fn direct(name: impl Into<String>, target: &ObjectId) -> Self {
        Self {
            name: name.into(),
            kind: RefKind::Direct,
            target: target.to_hex(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_record_json_shape() {
        let obj = StoredObject::new(ObjectKind::Blob, b"{\"a\":1}".to_vec());
        let oid = obj.compute_id();
        let record = ObjectRecord::from_object(oid, &obj);
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();

        assert_eq!(json["oid"], oid.to_hex());
        assert_eq!(json["type"], "blob");
        assert_eq!(json["data"], "eyJhIjoxfQ==");
        assert_eq!(json["len"], 7);
        assert_eq!(record.decode_data().unwrap(), b"{\"a\":1}");
    }

    #[test]
    fn ref_record_json_shape() {
        let head =
            serde_json::to_string(&RefRecord::symbolic("HEAD", "refs/heads/master")).unwrap();
        assert_eq!(
            head,
            r#"{"name":"HEAD","type":"symbolic","target":"refs/heads/master"}"#
        );

        let parsed: RefRecord =
            serde_json::from_str(r#"{"name":"refs/tags/root","type":"direct","target":"ab"}"#)
                .unwrap();
        assert_eq!(parsed.kind, RefKind::Direct);
        assert_eq!(parsed.target, "ab");
    }

    #[test]
    fn unknown_types_rejected() {
        assert!(
            serde_json::from_str::<RefRecord>(r#"{"name":"x","type":"oid","target":"y"}"#).is_err()
        );
        assert!(serde_json::from_str::<ObjectRecord>(
            r#"{"oid":"00","type":"tag","data":"","len":0}"#
        )
        .is_err());
    }
}
