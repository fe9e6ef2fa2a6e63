//! Dynamic value model
//!
//! [`Value`] is a closed tagged union over every shape the comparator knows
//! how to walk. Callers build values directly, through the
//! [`Reflect`](crate::reflect::Reflect) trait, or through the serde bridge in
//! [`convert`](crate::convert).

use crate::types::{Key, Kind, Type, Width};
use serde::ser::{SerializeMap, SerializeSeq, SerializeTuple};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A dynamically typed value
///
/// Container payloads are `Option`s where the source model allows a nil
/// container of a known type (nil slice, nil map, nil pointer, nil interface).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,
    Bool(bool),
    Int { width: Width, value: i64 },
    Uint { width: Width, value: u64 },
    Float { width: Width, value: f64 },
    Complex { width: Width, re: f64, im: f64 },
    String(String),
    /// Fixed-size sequence; the length is part of the type
    Array { elem: Type, items: Vec<Value> },
    /// Growable sequence, possibly nil
    Slice {
        elem: Type,
        items: Option<Vec<Value>>,
    },
    /// Keyed collection, possibly nil
    Map {
        key: Type,
        value: Type,
        entries: Option<BTreeMap<Key, Value>>,
    },
    /// Named record with fields in declaration order
    Struct {
        name: String,
        fields: Vec<(String, Value)>,
    },
    Pointer {
        elem: Type,
        target: Option<Box<Value>>,
    },
    /// Dynamic value boxed behind an interface type
    Interface {
        name: String,
        inner: Option<Box<Value>>,
    },
    /// Function reference; never compared by value
    Func { signature: String, defined: bool },
    /// Opaque value compared through its representation
    Other { name: String, repr: String },
}

impl Value {
    /// 64-bit signed integer
    pub fn int(value: i64) -> Self {
        Value::Int {
            width: Width::W64,
            value,
        }
    }

    /// 64-bit unsigned integer
    pub fn uint(value: u64) -> Self {
        Value::Uint {
            width: Width::W64,
            value,
        }
    }

    /// 64-bit float
    pub fn float(value: f64) -> Self {
        Value::Float {
            width: Width::W64,
            value,
        }
    }

    /// Complex number with 64-bit components
    pub fn complex(re: f64, im: f64) -> Self {
        Value::Complex {
            width: Width::W64,
            re,
            im,
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Byte buffer (a slice of `u8`)
    pub fn bytes(data: impl AsRef<[u8]>) -> Self {
        Value::Slice {
            elem: Type::Uint(Width::W8),
            items: Some(
                data.as_ref()
                    .iter()
                    .map(|b| Value::Uint {
                        width: Width::W8,
                        value: u64::from(*b),
                    })
                    .collect(),
            ),
        }
    }

    /// Typed slice
    pub fn slice(elem: Type, items: Vec<Value>) -> Self {
        Value::Slice {
            elem,
            items: Some(items),
        }
    }

    /// Nil slice of the given element type
    pub fn nil_slice(elem: Type) -> Self {
        Value::Slice { elem, items: None }
    }

    /// Heterogeneous list: every item is boxed behind `any`
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::slice(Type::any(), items.into_iter().map(Value::boxed).collect())
    }

    /// Fixed-size array
    pub fn array(elem: Type, items: Vec<Value>) -> Self {
        Value::Array { elem, items }
    }

    /// Typed map
    pub fn map(key: Type, value: Type, entries: BTreeMap<Key, Value>) -> Self {
        Value::Map {
            key,
            value,
            entries: Some(entries),
        }
    }

    /// Nil map of the given key/value types
    pub fn nil_map(key: Type, value: Type) -> Self {
        Value::Map {
            key,
            value,
            entries: None,
        }
    }

    /// String-keyed map of heterogeneous values boxed behind `any`
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::map(
            Type::String,
            Type::any(),
            entries
                .into_iter()
                .map(|(k, v)| (Key::Str(k.into()), Value::boxed(v)))
                .collect(),
        )
    }

    /// Named struct with fields in declaration order
    pub fn structure<N, F>(name: impl Into<String>, fields: F) -> Self
    where
        N: Into<String>,
        F: IntoIterator<Item = (N, Value)>,
    {
        Value::Struct {
            name: name.into(),
            fields: fields.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }
    }

    /// Pointer to a value of the given element type
    pub fn pointer(elem: Type, target: Value) -> Self {
        Value::Pointer {
            elem,
            target: Some(Box::new(target)),
        }
    }

    pub fn nil_pointer(elem: Type) -> Self {
        Value::Pointer { elem, target: None }
    }

    /// Box a value behind the `any` interface
    pub fn boxed(inner: Value) -> Self {
        let inner = match inner {
            Value::Null => None,
            other => Some(Box::new(other)),
        };
        Value::Interface {
            name: "any".into(),
            inner,
        }
    }

    pub fn func(signature: impl Into<String>) -> Self {
        Value::Func {
            signature: signature.into(),
            defined: true,
        }
    }

    pub fn other(name: impl Into<String>, repr: impl Into<String>) -> Self {
        Value::Other {
            name: name.into(),
            repr: repr.into(),
        }
    }

    /// Runtime kind of this value
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Invalid,
            Value::Bool(_) => Kind::Bool,
            Value::Int { .. } => Kind::Int,
            Value::Uint { .. } => Kind::Uint,
            Value::Float { .. } => Kind::Float,
            Value::Complex { .. } => Kind::Complex,
            Value::String(_) => Kind::String,
            Value::Array { .. } => Kind::Array,
            Value::Slice { .. } => Kind::Slice,
            Value::Map { .. } => Kind::Map,
            Value::Struct { .. } => Kind::Struct,
            Value::Pointer { .. } => Kind::Pointer,
            Value::Interface { .. } => Kind::Interface,
            Value::Func { .. } => Kind::Func,
            Value::Other { .. } => Kind::Other,
        }
    }

    /// Exact runtime type, `None` for [`Value::Null`]
    pub fn ty(&self) -> Option<Type> {
        let ty = match self {
            Value::Null => return None,
            Value::Bool(_) => Type::Bool,
            Value::Int { width, .. } => Type::Int(*width),
            Value::Uint { width, .. } => Type::Uint(*width),
            Value::Float { width, .. } => Type::Float(*width),
            Value::Complex { width, .. } => Type::Complex(*width),
            Value::String(_) => Type::String,
            Value::Array { elem, items } => Type::Array(Box::new(elem.clone()), items.len()),
            Value::Slice { elem, .. } => Type::Slice(Box::new(elem.clone())),
            Value::Map { key, value, .. } => {
                Type::Map(Box::new(key.clone()), Box::new(value.clone()))
            }
            Value::Struct { name, fields } => Type::Struct {
                name: name.clone(),
                fields: fields.iter().map(|(n, _)| n.clone()).collect(),
            },
            Value::Pointer { elem, .. } => Type::Pointer(Box::new(elem.clone())),
            Value::Interface { name, .. } => Type::Interface(name.clone()),
            Value::Func { signature, .. } => Type::Func(signature.clone()),
            Value::Other { name, .. } => Type::Other(name.clone()),
        };
        Some(ty)
    }

    /// Check if a nillable container holds nil
    pub fn is_nil(&self) -> bool {
        match self {
            Value::Slice { items, .. } => items.is_none(),
            Value::Map { entries, .. } => entries.is_none(),
            Value::Pointer { target, .. } => target.is_none(),
            Value::Interface { inner, .. } => inner.is_none(),
            Value::Func { defined, .. } => !defined,
            _ => false,
        }
    }

    /// Contents of a byte slice
    ///
    /// `None` for anything else, or when an item is not a `u8` value.
    pub fn as_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Value::Slice { elem, items } if elem.is_byte() => items
                .iter()
                .flatten()
                .map(|item| match item {
                    Value::Uint { value, .. } => u8::try_from(*value).ok(),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int { value, .. } => write!(f, "{value}"),
            Value::Uint { value, .. } => write!(f, "{value}"),
            Value::Float { value, .. } => write!(f, "{value}"),
            Value::Complex { re, im, .. } => write!(f, "({re}{im:+}i)"),
            Value::String(s) => f.write_str(s),
            Value::Slice { .. } if self.as_bytes().is_some() => {
                let bytes = self.as_bytes().unwrap_or_default();
                write!(f, "0x{}", hex::encode(bytes))
            }
            Value::Array { items, .. } => write_list(f, items),
            Value::Slice { items, .. } => write_list(f, items.as_deref().unwrap_or_default()),
            Value::Map { entries, .. } => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().flatten().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Struct { name, fields } => {
                write!(f, "{name} {{")?;
                for (i, (n, v)) in fields.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{sep}{n}: {v}")?;
                }
                if !fields.is_empty() {
                    f.write_str(" ")?;
                }
                f.write_str("}")
            }
            Value::Pointer { target, .. } => match target {
                Some(t) => write!(f, "&{t}"),
                None => f.write_str("nil"),
            },
            Value::Interface { inner, .. } => match inner {
                Some(v) => write!(f, "{v}"),
                None => f.write_str("nil"),
            },
            Value::Func {
                signature, defined, ..
            } => {
                if *defined {
                    write!(f, "fn {signature}")
                } else {
                    f.write_str("nil")
                }
            }
            Value::Other { repr, .. } => f.write_str(repr),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int { value, .. } => serializer.serialize_i64(*value),
            Value::Uint { value, .. } => serializer.serialize_u64(*value),
            Value::Float { value, .. } => serializer.serialize_f64(*value),
            Value::Complex { re, im, .. } => {
                let mut tuple = serializer.serialize_tuple(2)?;
                tuple.serialize_element(re)?;
                tuple.serialize_element(im)?;
                tuple.end()
            }
            Value::String(s) => serializer.serialize_str(s),
            Value::Array { items, .. } => serialize_items(serializer, items),
            Value::Slice { items, .. } => match items {
                Some(items) => serialize_items(serializer, items),
                None => serializer.serialize_none(),
            },
            Value::Map { entries, .. } => match entries {
                Some(entries) => {
                    let mut map = serializer.serialize_map(Some(entries.len()))?;
                    for (k, v) in entries {
                        map.serialize_entry(k, v)?;
                    }
                    map.end()
                }
                None => serializer.serialize_none(),
            },
            Value::Struct { fields, .. } => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (n, v) in fields {
                    map.serialize_entry(n, v)?;
                }
                map.end()
            }
            Value::Pointer { target: inner, .. } | Value::Interface { inner, .. } => match inner {
                Some(v) => v.serialize(serializer),
                None => serializer.serialize_none(),
            },
            Value::Func { .. } | Value::Other { .. } => serializer.collect_str(self),
        }
    }
}

fn serialize_items<S: Serializer>(serializer: S, items: &[Value]) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(items.len()))?;
    for item in items {
        seq.serialize_element(item)?;
    }
    seq.end()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_type() {
        let v = Value::int(5);
        assert_eq!(v.kind(), Kind::Int);
        assert_eq!(v.ty(), Some(Type::Int(Width::W64)));
        assert_eq!(Value::Null.ty(), None);
    }

    #[test]
    fn test_bytes_roundtrip() {
        let v = Value::bytes([1u8, 2, 3]);
        assert_eq!(v.kind(), Kind::Slice);
        assert_eq!(v.as_bytes(), Some(vec![1, 2, 3]));
        assert_eq!(v.to_string(), "0x010203");
        assert_eq!(Value::list([Value::int(1)]).as_bytes(), None);

        let oversized = Value::slice(
            Type::Uint(Width::W8),
            vec![Value::Uint {
                width: Width::W8,
                value: 256,
            }],
        );
        assert_eq!(oversized.as_bytes(), None);
        assert_eq!(oversized.to_string(), "[256]");
    }

    #[test]
    fn test_struct_type_includes_field_names() {
        let a = Value::structure("Rec", [("name", Value::string("a"))]);
        let b = Value::structure("Rec", [("label", Value::string("a"))]);
        assert_eq!(a.kind(), b.kind());
        assert_ne!(a.ty(), b.ty());
    }

    #[test]
    fn test_nil_containers() {
        assert!(Value::nil_slice(Type::String).is_nil());
        assert!(Value::nil_map(Type::String, Type::any()).is_nil());
        assert!(Value::boxed(Value::Null).is_nil());
        assert!(!Value::list([]).is_nil());
    }

    #[test]
    fn test_display() {
        let rec = Value::structure(
            "Rec",
            [("name", Value::string("a")), ("count", Value::int(1))],
        );
        assert_eq!(rec.to_string(), "Rec { name: a, count: 1 }");
        assert_eq!(Value::list([Value::int(1), Value::Null]).to_string(), "[1, nil]");
        assert_eq!(Value::complex(1.0, -2.0).to_string(), "(1-2i)");
    }

    #[test]
    fn test_serialize() {
        let v = Value::object([
            ("a", Value::list([Value::int(1), Value::string("x")])),
            ("b", Value::Null),
        ]);
        assert_eq!(
            serde_json::to_string(&v).unwrap(),
            r#"{"a":[1,"x"],"b":null}"#
        );
    }
}
