//! Serde bridge into the dynamic value model
//!
//! [`to_value`] walks any `Serialize` type with a custom serializer and
//! produces a [`Value`]. The layout follows serde's externally tagged data
//! model: sequences become slices, tuples become arrays, enums with payloads
//! become single-entry maps keyed by the variant name.
//!
//! Serde does not carry element types, so they are read off the items: a
//! sequence whose items all share one type is typed by it, a mixed one boxes
//! its items behind `any`. Sequences of `u8` and empty sequences are byte
//! buffers. Map keys are always `any` and map values are always boxed, so two
//! maps of the same Rust type get the same runtime type whatever they hold.
//!
//! [`map_from_json`] turns a decoded JSON document into the mapping shape
//! expected by [`compare_maps`](crate::compare::compare_maps).

use crate::errors::{CompareError, Result};
use crate::types::{Key, Type, Width};
use crate::value::Value;
use serde::ser::{self, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Convert any serializable value into a [`Value`]
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value.serialize(ValueSerializer)
}

/// Convert a serializable value into a top-level mapping
///
/// `None` is returned when the value serializes to null, which compares as an
/// absent mapping.
pub fn map_from_serialize<T: Serialize + ?Sized>(
    value: &T,
) -> Result<Option<HashMap<Key, Value>>> {
    match to_value(value)? {
        Value::Null => Ok(None),
        Value::Map { entries, .. } => Ok(entries.map(|entries| {
            entries
                .into_iter()
                .map(|(k, v)| (k, unbox(v)))
                .collect()
        })),
        Value::Struct { fields, .. } => Ok(Some(
            fields
                .into_iter()
                .map(|(n, v)| (Key::Field(n), v))
                .collect(),
        )),
        other => Err(CompareError::InvalidDocument(format!(
            "expected a map or struct, found {}",
            other.kind()
        ))),
    }
}

/// Convert a JSON document into a top-level mapping
///
/// A `null` document is an absent mapping; any other non-object root is
/// rejected.
pub fn map_from_json(doc: serde_json::Value) -> Result<Option<HashMap<String, Value>>> {
    match doc {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(object) => Ok(Some(
            object
                .into_iter()
                .map(|(k, v)| (k, Value::from(v)))
                .collect(),
        )),
        other => Err(CompareError::InvalidDocument(format!(
            "root must be an object or null, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn unbox(v: Value) -> Value {
    match v {
        Value::Interface {
            inner: Some(inner), ..
        } => *inner,
        Value::Interface { inner: None, .. } => Value::Null,
        other => other,
    }
}

/// JSON numbers decode as `i64` when they fit, then `u64`, then `f64`
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::uint(u)
                } else {
                    Value::float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::list(items.into_iter().map(Value::from)),
            serde_json::Value::Object(object) => {
                Value::object(object.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

fn key_from_value(v: Value) -> Result<Key> {
    match v {
        Value::Bool(b) => Ok(Key::Bool(b)),
        Value::Int { value, .. } => Ok(Key::Int(value)),
        Value::Uint { value, .. } => Ok(Key::Uint(value)),
        Value::String(s) => Ok(Key::Str(s)),
        other => Err(CompareError::UnsupportedKey(format!(
            "{} key `{other}`",
            other.kind()
        ))),
    }
}

fn tagged(variant: &'static str, value: Value) -> Value {
    Value::object([(variant, value)])
}

struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = CompareError;

    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = SeqBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = StructBuilder;
    type SerializeStructVariant = StructBuilder;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::Int {
            width: Width::W8,
            value: i64::from(v),
        })
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::Int {
            width: Width::W16,
            value: i64::from(v),
        })
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::Int {
            width: Width::W32,
            value: i64::from(v),
        })
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::int(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::Uint {
            width: Width::W8,
            value: u64::from(v),
        })
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::Uint {
            width: Width::W16,
            value: u64::from(v),
        })
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::Uint {
            width: Width::W32,
            value: u64::from(v),
        })
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::uint(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Float {
            width: Width::W32,
            value: f64::from(v),
        })
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::string(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::bytes(v))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Value> {
        Ok(Value::Struct {
            name: name.to_owned(),
            fields: Vec::new(),
        })
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::string(variant))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value> {
        Ok(tagged(variant, to_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder> {
        Ok(SeqBuilder::new(len, false, None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder> {
        Ok(SeqBuilder::new(Some(len), true, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SeqBuilder> {
        Ok(SeqBuilder::new(Some(len), true, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SeqBuilder> {
        Ok(SeqBuilder::new(Some(len), true, Some(variant)))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapBuilder> {
        Ok(MapBuilder::default())
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<StructBuilder> {
        Ok(StructBuilder::new(name, len, None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<StructBuilder> {
        Ok(StructBuilder::new(variant, len, Some(variant)))
    }
}

struct SeqBuilder {
    items: Vec<Value>,
    fixed: bool,
    variant: Option<&'static str>,
}

impl SeqBuilder {
    fn new(len: Option<usize>, fixed: bool, variant: Option<&'static str>) -> Self {
        Self {
            items: Vec::with_capacity(len.unwrap_or(0)),
            fixed,
            variant,
        }
    }

    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn finish(self) -> Value {
        let (elem, items) = match element_type(&self.items) {
            Some(elem) => (elem, self.items),
            None if self.items.is_empty() && !self.fixed => (Type::Uint(Width::W8), self.items),
            None => (
                Type::any(),
                self.items.into_iter().map(Value::boxed).collect(),
            ),
        };
        let value = if self.fixed {
            Value::array(elem, items)
        } else {
            Value::slice(elem, items)
        };
        match self.variant {
            Some(variant) => tagged(variant, value),
            None => value,
        }
    }
}

/// Shared type of all items, `None` when empty, mixed or holding nulls
fn element_type(items: &[Value]) -> Option<Type> {
    let (first, rest) = items.split_first()?;
    let elem = first.ty()?;
    rest.iter()
        .all(|item| item.ty().as_ref() == Some(&elem))
        .then_some(elem)
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = Value;
    type Error = CompareError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = Value;
    type Error = CompareError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = Value;
    type Error = CompareError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SeqBuilder {
    type Ok = Value;
    type Error = CompareError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

#[derive(Default)]
struct MapBuilder {
    entries: BTreeMap<Key, Value>,
    next_key: Option<Key>,
}

impl ser::SerializeMap for MapBuilder {
    type Ok = Value;
    type Error = CompareError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<()> {
        self.next_key = Some(key_from_value(to_value(key)?)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let key = self.next_key.take().ok_or_else(|| {
            CompareError::Serialization("map value serialized before its key".into())
        })?;
        self.entries.insert(key, Value::boxed(to_value(value)?));
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::map(Type::any(), Type::any(), self.entries))
    }
}

struct StructBuilder {
    name: &'static str,
    fields: Vec<(String, Value)>,
    variant: Option<&'static str>,
}

impl StructBuilder {
    fn new(name: &'static str, len: usize, variant: Option<&'static str>) -> Self {
        Self {
            name,
            fields: Vec::with_capacity(len),
            variant,
        }
    }

    fn push<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.fields.push((key.to_owned(), to_value(value)?));
        Ok(())
    }

    fn finish(self) -> Value {
        let value = Value::Struct {
            name: self.name.to_owned(),
            fields: self.fields,
        };
        match self.variant {
            Some(variant) => tagged(variant, value),
            None => value,
        }
    }
}

impl ser::SerializeStruct for StructBuilder {
    type Ok = Value;
    type Error = CompareError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.push(key, value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for StructBuilder {
    type Ok = Value;
    type Error = CompareError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.push(key, value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}
