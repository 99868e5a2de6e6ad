//! Upload-parameter signing

use serde_json::{Map, Number, Value};
use sha1::{Digest, Sha1};

/// Parameters that take part in the signature; everything else is ignored.
pub const ALLOWED_KEYS: &[&str] = &["timestamp", "folder", "public_id", "eager"];

/// Build the `k=v&k=v` string that gets signed.
///
/// Keys are sorted, filtered to [`ALLOWED_KEYS`], and entries whose value is
/// null or the empty string are dropped.
#[must_use]
pub fn string_to_sign(params: &Map<String, Value>) -> String {
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();

    keys.into_iter()
        .filter(|key| ALLOWED_KEYS.contains(&key.as_str()))
        .filter_map(|key| {
            let value = &params[key.as_str()];
            match value {
                Value::Null => None,
                Value::String(s) if s.is_empty() => None,
                other => Some(format!("{key}={}", render(other))),
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Hex SHA-1 of the string to sign followed by the secret.
#[must_use]
pub fn sign_params(params: &Map<String, Value>, secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(string_to_sign(params).as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Plain-text rendering of a parameter value.
///
/// Arrays are comma-joined with null members left empty, objects render as
/// `[object Object]`, matching what browser upload widgets sign.
fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => render_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Integral floats print without a fraction, so `1.0` signs as `1`.
fn render_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 1e21 => {
            format!("{f:.0}")
        }
        _ => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn sha1_hex(input: &str) -> String {
        hex::encode(Sha1::digest(input.as_bytes()))
    }

    #[test]
    fn test_string_to_sign_sorted() {
        let p = params(json!({"timestamp": 1_700_000_000, "folder": "flow_sounds"}));
        assert_eq!(string_to_sign(&p), "folder=flow_sounds&timestamp=1700000000");
    }

    #[test]
    fn test_signature_ignores_insertion_order() {
        let a = params(json!({"timestamp": 123, "folder": "f", "public_id": "x"}));
        let mut b = Map::new();
        b.insert("public_id".into(), json!("x"));
        b.insert("folder".into(), json!("f"));
        b.insert("timestamp".into(), json!(123));

        assert_eq!(sign_params(&a, "s3cret"), sign_params(&b, "s3cret"));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let with_extra = params(json!({"timestamp": 5, "api_key": "nope", "resource_type": "video"}));
        let plain = params(json!({"timestamp": 5}));
        assert_eq!(sign_params(&with_extra, "k"), sign_params(&plain, "k"));
    }

    #[test]
    fn test_only_disallowed_keys_signs_secret() {
        let p = params(json!({"resource_type": "video"}));
        assert_eq!(string_to_sign(&p), "");
        assert_eq!(sign_params(&p, "abc"), sha1_hex("abc"));
    }

    #[test]
    fn test_null_and_empty_values_skipped() {
        let p = params(json!({"folder": "", "public_id": null, "timestamp": 9}));
        assert_eq!(string_to_sign(&p), "timestamp=9");
    }

    #[test]
    fn test_falsy_values_kept() {
        let p = params(json!({"eager": false, "timestamp": 0}));
        assert_eq!(string_to_sign(&p), "eager=false&timestamp=0");
    }

    #[test]
    fn test_array_values_comma_joined() {
        let p = params(json!({"eager": ["w_400", null, "h_300"]}));
        assert_eq!(string_to_sign(&p), "eager=w_400,,h_300");
    }

    #[test]
    fn test_known_signature() {
        let p = params(json!({"timestamp": 1_315_060_510, "public_id": "sample_image"}));
        assert_eq!(
            sign_params(&p, "abcd"),
            sha1_hex("public_id=sample_image&timestamp=1315060510abcd")
        );
    }

    #[test]
    fn test_integral_floats_render_as_integers() {
        let p = params(json!({"timestamp": 1.0, "eager": [1e3, 2.5]}));
        assert_eq!(string_to_sign(&p), "eager=1000,2.5&timestamp=1");
        assert_eq!(
            sign_params(&p, "abcd"),
            sha1_hex("eager=1000,2.5&timestamp=1abcd")
        );
    }
}
