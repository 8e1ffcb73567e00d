//! Tagged-union wire values.
//!
//! The proxy speaks protobuf, where dynamically typed data is carried as a
//! `Value` oneof. Decoded messages expose that oneof as a JSON object with a
//! `kind` discriminator and exactly one payload field named after it:
//!
//! ```text
//! {"kind": "numberValue", "numberValue": 5}
//! {"kind": "structValue", "structValue": {"fields": {"a": {...}}}}
//! {"kind": "listValue",   "listValue":   {"values": [{...}]}}
//! ```
//!
//! [`WireValue`] is the typed form of that object. [`to_wire`] and
//! [`from_wire_json`] convert between plain JSON and the wire form.

use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::diagnostics::{Diagnostic, Diagnostics, child_location};

/// Enum name the serializer expects in a `nullValue` payload.
pub const NULL_VALUE: &str = "NULL_VALUE";

/// Field name of the discriminator.
pub const KIND_FIELD: &str = "kind";

/// Largest integer magnitude a double carries without loss (2^53).
pub const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// Discriminator of a [`WireValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Number,
    String,
    Bool,
    List,
    Struct,
}

impl Kind {
    /// All kinds, in declaration order.
    pub const ALL: [Kind; 6] = [
        Kind::Null,
        Kind::Number,
        Kind::String,
        Kind::Bool,
        Kind::List,
        Kind::Struct,
    ];

    /// Returns the wire name, which is also the payload field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "nullValue",
            Self::Number => "numberValue",
            Self::String => "stringValue",
            Self::Bool => "boolValue",
            Self::List => "listValue",
            Self::Struct => "structValue",
        }
    }

    /// Looks up a kind by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A JSON value in its tagged-union wire form.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Null,
    Number(Number),
    String(String),
    Bool(bool),
    List(WireList),
    Struct(WireStruct),
}

/// Wire form of a JSON array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WireList {
    pub values: Vec<WireValue>,
}

/// Wire form of a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WireStruct {
    pub fields: IndexMap<String, WireValue>,
}

impl WireValue {
    /// Returns the discriminator of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Null => Kind::Null,
            Self::Number(_) => Kind::Number,
            Self::String(_) => Kind::String,
            Self::Bool(_) => Kind::Bool,
            Self::List(_) => Kind::List,
            Self::Struct(_) => Kind::Struct,
        }
    }

    /// Renders the value in the `{kind, <kind>: payload}` shape the message
    /// serializer consumes.
    pub fn to_json(&self) -> Value {
        let payload = match self {
            Self::Null => Value::String(NULL_VALUE.to_string()),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Bool(b) => Value::Bool(*b),
            Self::List(list) => {
                let values = list.values.iter().map(WireValue::to_json).collect();
                let mut obj = Map::new();
                obj.insert("values".to_string(), Value::Array(values));
                Value::Object(obj)
            }
            Self::Struct(st) => {
                let fields = st
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect();
                let mut obj = Map::new();
                obj.insert("fields".to_string(), Value::Object(fields));
                Value::Object(obj)
            }
        };

        let kind = self.kind();
        let mut obj = Map::with_capacity(2);
        obj.insert(KIND_FIELD.to_string(), Value::String(kind.as_str().to_string()));
        obj.insert(kind.as_str().to_string(), payload);
        Value::Object(obj)
    }

    /// Parses a decoded wire object.
    ///
    /// Returns `None` for anything that is not an object with a known
    /// `kind` and a payload matching it; unknown kinds and mismatched
    /// payloads are recorded in `diagnostics`. Repeated and map payload
    /// fields may be omitted by the deserializer when empty, so a
    /// `listValue` without `values` is an empty list and a `structValue`
    /// without `fields` is an empty object.
    pub fn from_json(
        value: &Value,
        location: &str,
        diagnostics: &mut Diagnostics,
    ) -> Option<WireValue> {
        let obj = value.as_object()?;
        let name = obj.get(KIND_FIELD).and_then(Value::as_str)?;
        if name.is_empty() {
            return None;
        }

        let Some(kind) = Kind::from_name(name) else {
            diagnostics.push(Diagnostic::UnknownKind {
                location: location.to_string(),
                kind: name.to_string(),
            });
            return None;
        };

        let payload = obj.get(kind.as_str());
        let parsed = match (kind, payload) {
            (Kind::Null, _) => Some(WireValue::Null),
            (Kind::Number, Some(Value::Number(n))) => Some(WireValue::Number(n.clone())),
            (Kind::String, Some(Value::String(s))) => Some(WireValue::String(s.clone())),
            (Kind::Bool, Some(Value::Bool(b))) => Some(WireValue::Bool(*b)),
            (Kind::List, Some(Value::Object(list))) => {
                let values = match list.get("values") {
                    Some(Value::Array(items)) => items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| {
                            let loc = child_location(location, &i.to_string());
                            WireValue::from_json(item, &loc, diagnostics).unwrap_or(WireValue::Null)
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                Some(WireValue::List(WireList { values }))
            }
            (Kind::Struct, Some(Value::Object(st))) => {
                let fields = match st.get("fields") {
                    Some(Value::Object(fields)) => fields
                        .iter()
                        .map(|(k, v)| {
                            let loc = child_location(location, k);
                            let wire =
                                WireValue::from_json(v, &loc, diagnostics).unwrap_or(WireValue::Null);
                            (k.clone(), wire)
                        })
                        .collect(),
                    _ => IndexMap::new(),
                };
                Some(WireValue::Struct(WireStruct { fields }))
            }
            _ => None,
        };

        if parsed.is_none() {
            diagnostics.push(Diagnostic::MalformedWireValue {
                location: location.to_string(),
                kind: name.to_string(),
            });
        }
        parsed
    }
}

impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<WireValue> for Value {
    fn from(wire: WireValue) -> Self {
        match wire {
            WireValue::Null => Value::Null,
            WireValue::Number(n) => Value::Number(n),
            WireValue::String(s) => Value::String(s),
            WireValue::Bool(b) => Value::Bool(b),
            WireValue::List(list) => {
                Value::Array(list.values.into_iter().map(Value::from).collect())
            }
            WireValue::Struct(st) => Value::Object(
                st.fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Converts a plain JSON value to its wire form.
///
/// Never fails. Integers a double cannot represent exactly are still
/// converted but reported as [`Diagnostic::UnsupportedValue`].
pub fn to_wire(value: &Value, diagnostics: &mut Diagnostics) -> WireValue {
    to_wire_at(value, "", diagnostics)
}

pub(crate) fn to_wire_at(value: &Value, location: &str, diagnostics: &mut Diagnostics) -> WireValue {
    match value {
        Value::Null => WireValue::Null,
        Value::Bool(b) => WireValue::Bool(*b),
        Value::Number(n) => {
            check_number(n, location, diagnostics);
            WireValue::Number(n.clone())
        }
        Value::String(s) => WireValue::String(s.clone()),
        Value::Array(items) => WireValue::List(WireList {
            values: items
                .iter()
                .enumerate()
                .map(|(i, item)| to_wire_at(item, &child_location(location, &i.to_string()), diagnostics))
                .collect(),
        }),
        Value::Object(obj) => WireValue::Struct(WireStruct {
            fields: obj
                .iter()
                .map(|(k, v)| (k.clone(), to_wire_at(v, &child_location(location, k), diagnostics)))
                .collect(),
        }),
    }
}

fn check_number(n: &Number, location: &str, diagnostics: &mut Diagnostics) {
    let magnitude = if let Some(u) = n.as_u64() {
        Some(u)
    } else {
        n.as_i64().map(i64::unsigned_abs)
    };

    if let Some(m) = magnitude {
        if m > MAX_EXACT_INTEGER {
            diagnostics.push(Diagnostic::UnsupportedValue {
                location: location.to_string(),
                detail: format!("integer {} exceeds double precision", n),
            });
        }
    }
}

/// Converts a wire value back to plain JSON.
pub fn from_wire(wire: WireValue) -> Value {
    Value::from(wire)
}

/// Converts a decoded wire object back to plain JSON.
///
/// Anything that is not a well-formed wire value becomes `null`.
pub fn from_wire_json(value: &Value, diagnostics: &mut Diagnostics) -> Value {
    from_wire_json_at(value, "", diagnostics)
}

pub(crate) fn from_wire_json_at(value: &Value, location: &str, diagnostics: &mut Diagnostics) -> Value {
    WireValue::from_json(value, location, diagnostics)
        .map(Value::from)
        .unwrap_or(Value::Null)
}

/// Returns true if `value` is an object whose `kind` names a known wire kind.
pub fn is_wire_value(value: &Value) -> bool {
    value
        .get(KIND_FIELD)
        .and_then(Value::as_str)
        .and_then(Kind::from_name)
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn forward(v: &Value) -> Value {
        let mut diagnostics = Diagnostics::new();
        let wire = to_wire(v, &mut diagnostics);
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);
        wire.to_json()
    }

    fn reverse(v: &Value) -> Value {
        let mut diagnostics = Diagnostics::new();
        from_wire_json(v, &mut diagnostics)
    }

    #[test]
    fn kind_names_roundtrip() {
        for kind in Kind::ALL {
            assert_eq!(Kind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(Kind::from_name("bytesValue"), None);
    }

    #[test]
    fn forward_scalars() {
        assert_eq!(forward(&json!(null)), json!({"kind": "nullValue", "nullValue": "NULL_VALUE"}));
        assert_eq!(forward(&json!(1.5)), json!({"kind": "numberValue", "numberValue": 1.5}));
        assert_eq!(forward(&json!("x")), json!({"kind": "stringValue", "stringValue": "x"}));
        assert_eq!(forward(&json!(false)), json!({"kind": "boolValue", "boolValue": false}));
    }

    #[test]
    fn forward_nested_snapshot() {
        let wire = forward(&json!({"name": "greet", "args": [1, null]}));
        insta::assert_json_snapshot!(wire, @r#"
        {
          "kind": "structValue",
          "structValue": {
            "fields": {
              "name": {
                "kind": "stringValue",
                "stringValue": "greet"
              },
              "args": {
                "kind": "listValue",
                "listValue": {
                  "values": [
                    {
                      "kind": "numberValue",
                      "numberValue": 1
                    },
                    {
                      "kind": "nullValue",
                      "nullValue": "NULL_VALUE"
                    }
                  ]
                }
              }
            }
          }
        }
        "#);
    }

    #[test]
    fn roundtrip_preserves_json() {
        let samples = [
            json!(null),
            json!(0),
            json!(-42),
            json!(3.25),
            json!(""),
            json!("hello"),
            json!(true),
            json!([]),
            json!({}),
            json!([1, "two", [3, [4]], {"five": null}]),
            json!({"z": 1, "a": {"nested": [true, false]}, "m": "last"}),
        ];

        for sample in samples {
            assert_eq!(reverse(&forward(&sample)), sample);

            let mut diagnostics = Diagnostics::new();
            assert_eq!(from_wire(to_wire(&sample, &mut diagnostics)), sample);
        }
    }

    #[test]
    fn roundtrip_preserves_key_order() {
        let sample = json!({"z": 1, "a": 2, "m": 3});
        let keys: Vec<String> = reverse(&forward(&sample))
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn reverse_nested_struct() {
        let wire = json!({
            "kind": "structValue",
            "structValue": {"fields": {"a": {"kind": "numberValue", "numberValue": 1}}}
        });
        assert_eq!(reverse(&wire), json!({"a": 1}));
    }

    #[test]
    fn reverse_tolerates_omitted_empty_payloads() {
        assert_eq!(reverse(&json!({"kind": "listValue", "listValue": {}})), json!([]));
        assert_eq!(reverse(&json!({"kind": "structValue", "structValue": {}})), json!({}));
        assert_eq!(reverse(&json!({"kind": "nullValue"})), json!(null));
    }

    #[test]
    fn reverse_absent_or_falsy_is_null() {
        let mut diagnostics = Diagnostics::new();
        assert_eq!(from_wire_json(&json!(null), &mut diagnostics), json!(null));
        assert_eq!(from_wire_json(&json!({}), &mut diagnostics), json!(null));
        assert_eq!(from_wire_json(&json!({"kind": ""}), &mut diagnostics), json!(null));
        assert_eq!(from_wire_json(&json!(7), &mut diagnostics), json!(null));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn reverse_unknown_kind_is_null_with_diagnostic() {
        let mut diagnostics = Diagnostics::new();
        let out = from_wire_json(&json!({"kind": "bytesValue", "bytesValue": "AA=="}), &mut diagnostics);
        assert_eq!(out, json!(null));
        assert_eq!(
            diagnostics.into_vec(),
            vec![Diagnostic::UnknownKind {
                location: String::new(),
                kind: "bytesValue".into()
            }]
        );
    }

    #[test]
    fn reverse_mismatched_payload_is_null_with_diagnostic() {
        let mut diagnostics = Diagnostics::new();
        let wire = json!({
            "kind": "listValue",
            "listValue": {"values": [{"kind": "numberValue", "stringValue": "oops"}]}
        });
        assert_eq!(from_wire_json(&wire, &mut diagnostics), json!([null]));
        assert_eq!(
            diagnostics.into_vec(),
            vec![Diagnostic::MalformedWireValue {
                location: "0".into(),
                kind: "numberValue".into()
            }]
        );
    }

    #[test]
    fn forward_reports_integers_beyond_double_precision() {
        let mut diagnostics = Diagnostics::new();
        let wire = to_wire(&json!({"id": u64::MAX, "ok": 9007199254740992u64}), &mut diagnostics);
        assert_eq!(wire.kind(), Kind::Struct);
        assert_eq!(
            diagnostics.into_vec(),
            vec![Diagnostic::UnsupportedValue {
                location: "id".into(),
                detail: format!("integer {} exceeds double precision", u64::MAX),
            }]
        );
    }

    #[test]
    fn is_wire_value_checks_known_kinds() {
        assert!(is_wire_value(&json!({"kind": "boolValue", "boolValue": true})));
        assert!(!is_wire_value(&json!({"kind": "widget"})));
        assert!(!is_wire_value(&json!({"name": "x"})));
        assert!(!is_wire_value(&json!("numberValue")));
    }
}
