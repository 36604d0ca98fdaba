//! Conversion between JSON values and Firestore typed values.
//!
//! Firestore wraps every value in a single-key object naming its type, e.g.
//! `{"integerValue": "42"}`. Integers travel as strings. Timestamps decode to
//! their RFC 3339 text.

use serde_json::{Map, Number, Value, json};

pub fn encode_fields(fields: &Map<String, Value>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect(),
    )
}

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => json!({ "integerValue": integer.to_string() }),
            None => json!({ "doubleValue": number.as_f64() }),
        },
        Value::String(text) => json!({ "stringValue": text }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } })
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

pub fn decode_fields(fields: &Value) -> Result<Map<String, Value>, String> {
    let Some(fields) = fields.as_object() else {
        return Err("fields is not an object".to_string());
    };
    fields
        .iter()
        .map(|(key, value)| {
            decode_value(value)
                .map(|decoded| (key.clone(), decoded))
                .map_err(|reason| format!("{key}: {reason}"))
        })
        .collect()
}

pub fn decode_value(value: &Value) -> Result<Value, String> {
    let Some((kind, inner)) = value.as_object().and_then(|object| object.iter().next()) else {
        return Err(format!("untyped value {value}"));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => {
            Ok(inner.clone())
        }
        "integerValue" => match inner {
            Value::String(text) => text
                .parse::<i64>()
                .map(Value::from)
                .map_err(|err| format!("bad integer {text}: {err}")),
            Value::Number(_) => Ok(inner.clone()),
            other => Err(format!("bad integer {other}")),
        },
        "doubleValue" => match inner {
            Value::Number(_) => Ok(inner.clone()),
            // NaN and infinities arrive as strings and have no JSON form.
            Value::String(text) => text
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("bad double {text}")),
            other => Err(format!("bad double {other}")),
        },
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => inner
            .get("values")
            .and_then(Value::as_array)
            .map(|values| values.iter().map(decode_value).collect::<Result<Vec<_>, _>>())
            .unwrap_or_else(|| Ok(Vec::new()))
            .map(Value::Array),
        "mapValue" => match inner.get("fields") {
            Some(fields) => decode_fields(fields).map(Value::Object),
            None => Ok(Value::Object(Map::new())),
        },
        other => Err(format!("unsupported value type {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_nested_payload() {
        let payload = json!({"mass": 10, "ratio": 0.5, "tags": ["a", null], "ok": true});

        let encoded = encode_value(&payload);

        let fields = &encoded["mapValue"]["fields"];
        assert_eq!(fields["mass"], json!({"integerValue": "10"}));
        assert_eq!(fields["ratio"], json!({"doubleValue": 0.5}));
        assert_eq!(fields["ok"], json!({"booleanValue": true}));
        assert_eq!(
            fields["tags"],
            json!({"arrayValue": {"values": [{"stringValue": "a"}, {"nullValue": null}]}})
        );
        assert_eq!(decode_value(&encoded).unwrap(), payload);
    }

    #[test]
    fn decodes_server_timestamp_as_text() {
        let fields = json!({
            "userId": {"stringValue": "alice"},
            "createdAt": {"timestampValue": "2024-05-01T12:00:00.123456Z"},
        });

        let decoded = decode_fields(&fields).unwrap();

        assert_eq!(decoded["createdAt"], "2024-05-01T12:00:00.123456Z");
        assert_eq!(decoded["userId"], "alice");
    }

    #[test]
    fn empty_containers_decode() {
        assert_eq!(decode_value(&json!({"arrayValue": {}})).unwrap(), json!([]));
        assert_eq!(decode_value(&json!({"mapValue": {}})).unwrap(), json!({}));
    }

    #[test]
    fn rejects_untyped_and_unknown_values() {
        assert!(decode_value(&json!("bare")).is_err());
        assert!(decode_value(&json!({"vectorValue": {}})).is_err());
        assert!(decode_value(&json!({"integerValue": "ten"})).is_err());

        let err = decode_fields(&json!({"n": {"integerValue": "x"}})).unwrap_err();
        assert!(err.starts_with("n:"));
    }
}
