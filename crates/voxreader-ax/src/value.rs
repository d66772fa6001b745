//! The closed value taxonomy of element attributes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::error::AxCode;

/// An integer range. `end = start + length`; `length` may be zero (a caret).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxRange {
    pub start: i64,
    pub length: i64,
}

impl AxRange {
    pub fn new(start: i64, length: i64) -> Self {
        AxRange { start, length }
    }

    /// Build from half-open endpoints.
    pub fn span(start: i64, end: i64) -> Self {
        AxRange { start, length: end - start }
    }

    pub fn end(&self) -> i64 {
        self.start + self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Tagged union over everything an attribute slot can hold.
///
/// The OS returns dynamically-typed values under one API; call sites
/// pattern-match on this enum, so adding a variant is a compile-time
/// reminder to revisit every consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AxValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Rich text, already flattened to its character content.
    AttributedString(String),
    Url(String),
    Range(AxRange),
    Point(AxPoint),
    Size(AxSize),
    Rect(AxRect),
    Element(Element),
    Array(Vec<AxValue>),
    Dict(BTreeMap<String, AxValue>),
    Error(AxCode),
    Null,
}

impl AxValue {
    /// Character content of string-like values (plain or attributed).
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AxValue::String(s) | AxValue::AttributedString(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AxValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AxValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<Element> {
        match self {
            AxValue::Element(e) => Some(*e),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<AxRange> {
        match self {
            AxValue::Range(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[AxValue]> {
        match self {
            AxValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The flat encoding used by element dumps: primitives pass through,
    /// urls and rich text flatten to strings,
    /// geometry becomes flat dicts, element references become placeholder
    /// strings, and error values become `"Error: <description>"`.
    pub fn to_dump_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            AxValue::Bool(b) => json!(b),
            AxValue::Int(i) => json!(i),
            AxValue::Float(f) => json!(f),
            AxValue::String(s) | AxValue::AttributedString(s) | AxValue::Url(s) => json!(s),
            AxValue::Range(r) => json!({ "start": r.start, "end": r.end() }),
            AxValue::Point(p) => json!({ "x": p.x, "y": p.y }),
            AxValue::Size(s) => json!({ "width": s.width, "height": s.height }),
            AxValue::Rect(r) => {
                json!({ "x": r.x, "y": r.y, "width": r.width, "height": r.height })
            }
            AxValue::Element(e) => json!(e.to_string()),
            AxValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(AxValue::to_dump_json).collect())
            }
            AxValue::Dict(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_dump_json())).collect(),
            ),
            AxValue::Error(code) => json!(format!("Error: {}", code.description())),
            AxValue::Null => serde_json::Value::Null,
        }
    }
}
