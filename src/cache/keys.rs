//! Cache key derivation.
//!
//! A key is the SHA-256 digest of the compact JSON encoding of
//! `{"operation": .., "params": [..]}`. Object members are emitted in sorted
//! key order at every depth and arrays keep their order, so equal inputs
//! always produce the same bytes.

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// Length of every derived key, in hex characters.
pub const KEY_LENGTH: usize = 64;

/// Derives the cache key for a query shape and its ordered parameters.
pub fn derive_key(operation: &str, params: &[Value]) -> String {
    let params: Vec<Value> = params.iter().map(canonical).collect();
    let material = json!({
        "operation": operation,
        "params": params,
    });

    hex::encode(Sha256::digest(material.to_string().as_bytes()))
}

/// Rebuilds objects with sorted members; holds even if `preserve_order` is
/// switched on somewhere in the dependency graph.
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut members: Vec<(&String, &Value)> = map.iter().collect();
            members.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                members
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonical(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_fixed_length_hex() {
        let key = derive_key("findByEmail", &[json!("a@x.com")]);
        assert_eq!(key.len(), KEY_LENGTH);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_key_is_deterministic() {
        let a = derive_key("findByEmail", &[json!("a@x.com")]);
        let b = derive_key("findByEmail", &[json!("a@x.com")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_known_digest() {
        // sha256 of {"operation":"findByEmail","params":["a@x.com"]}
        let expected = hex::encode(Sha256::digest(
            br#"{"operation":"findByEmail","params":["a@x.com"]}"#,
        ));
        assert_eq!(derive_key("findByEmail", &[json!("a@x.com")]), expected);
    }

    #[test]
    fn test_operation_changes_key() {
        let params = [json!("(11) 90000-0001")];
        assert_ne!(
            derive_key("findByEmail", &params),
            derive_key("findByPhone", &params)
        );
    }

    #[test]
    fn test_params_change_key() {
        assert_ne!(
            derive_key("findByEmail", &[json!("a@x.com")]),
            derive_key("findByEmail", &[json!("b@x.com")])
        );
    }

    #[test]
    fn test_param_order_matters() {
        assert_ne!(
            derive_key("op", &[json!("a"), json!("b")]),
            derive_key("op", &[json!("b"), json!("a")])
        );
    }

    #[test]
    fn test_no_concatenation_ambiguity() {
        assert_ne!(
            derive_key("find", &[json!("ByEmail")]),
            derive_key("findBy", &[json!("Email")])
        );
        assert_ne!(
            derive_key("op", &[json!("ab")]),
            derive_key("op", &[json!("a"), json!("b")])
        );
    }

    #[test]
    fn test_object_params_are_canonical() {
        let a = derive_key("op", &[json!({"x": 1, "y": 2})]);
        let b = derive_key("op", &[json!({"y": 2, "x": 1})]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_params() {
        let key = derive_key("all", &[]);
        assert_eq!(key.len(), KEY_LENGTH);
        assert_ne!(key, derive_key("all", &[Value::Null]));
    }
}
