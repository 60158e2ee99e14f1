//! JSON codec for analysis snapshots and grant results
//!
//! Stored text is canonical compact JSON. Decoding ignores fields the target
//! type does not declare, so rows written by a newer schema stay readable.
//! Target types must not opt into `#[serde(deny_unknown_fields)]`.

use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("could not serialize result: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("could not deserialize result: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encode a value into its stored text form
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, CodecError> {
    serde_json::to_string(value).map_err(CodecError::Encode)
}

/// Decode stored text into `T`, tolerating unknown fields
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
    serde_json::from_str(text).map_err(CodecError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde::{Deserialize, Serializer};
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct SnapshotV1 {
        pattern: String,
        receivers: Vec<u64>,
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        // Written by a newer schema with an extra field
        let text = r#"{"pattern":"thankwords","receivers":[7,9],"confidence":0.93}"#;

        let snapshot: SnapshotV1 = decode(text).unwrap();

        assert_eq!(snapshot.pattern, "thankwords");
        assert_eq!(snapshot.receivers, vec![7, 9]);
    }

    #[test]
    fn test_encode_is_compact_json() {
        let snapshot = SnapshotV1 {
            pattern: "mention".to_string(),
            receivers: vec![1],
        };

        let text = encode(&snapshot).unwrap();

        assert_eq!(text, r#"{"pattern":"mention","receivers":[1]}"#);
    }

    #[test]
    fn test_decode_missing_field_is_error() {
        let err = decode::<SnapshotV1>(r#"{"pattern":"mention"}"#).unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }

    #[test]
    fn test_encode_failure_is_reported() {
        struct Unserializable;

        impl Serialize for Unserializable {
            fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
                Err(S::Error::custom("not representable"))
            }
        }

        let err = encode(&Unserializable).unwrap_err();
        assert!(matches!(err, CodecError::Encode(_)));
        assert!(err.to_string().contains("not representable"));
    }

    #[test]
    fn test_non_string_map_keys_fail_to_encode() {
        let mut map = BTreeMap::new();
        map.insert((1u8, 2u8), "tuple key");

        assert!(matches!(encode(&map), Err(CodecError::Encode(_))));
    }
}
