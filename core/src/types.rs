//! Core type definitions for mapdiff
//!
//! `Kind` is the coarse category of a dynamic value, `Type` its exact runtime
//! identity and `Key` the identity under which a value was found.

use core::fmt;
use serde::{Serialize, Serializer};

/// Coarse runtime category of a [`Value`](crate::value::Value)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Absent value (null, nil interface contents)
    Invalid,
    Bool,
    Int,
    Uint,
    Float,
    Complex,
    String,
    Array,
    Slice,
    Map,
    Struct,
    Pointer,
    Interface,
    Func,
    Other,
}

impl Kind {
    /// Kinds for which a nil payload on only one side is not reported.
    ///
    /// Pointers are excluded: a nil pointer is dereferenced into an absent
    /// value and then reported as a kind mismatch.
    pub fn ignores_nil_difference(&self) -> bool {
        matches!(self, Kind::Map | Kind::Slice | Kind::Interface | Kind::Func)
    }

    /// Kinds that are short-circuited on reference identity
    pub fn has_identity(&self) -> bool {
        matches!(self, Kind::Map | Kind::Slice | Kind::Pointer)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Invalid => "invalid",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::Complex => "complex",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Slice => "slice",
            Kind::Map => "map",
            Kind::Struct => "struct",
            Kind::Pointer => "pointer",
            Kind::Interface => "interface",
            Kind::Func => "func",
            Kind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Bit width of a numeric value
///
/// For complex numbers this is the width of each component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Width {
    W8,
    W16,
    W32,
    W64,
    /// Platform pointer size (`isize` / `usize`)
    Size,
}

impl Width {
    fn suffix(&self) -> &'static str {
        match self {
            Width::W8 => "8",
            Width::W16 => "16",
            Width::W32 => "32",
            Width::W64 => "64",
            Width::Size => "size",
        }
    }
}

/// Exact runtime type identity of a dynamic value
///
/// Two values of the same [`Kind`] but different `Type` never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    Int(Width),
    Uint(Width),
    Float(Width),
    Complex(Width),
    String,
    /// Fixed-size array: element type and length
    Array(Box<Type>, usize),
    Slice(Box<Type>),
    /// Map: key type and value type
    Map(Box<Type>, Box<Type>),
    /// Struct: name and ordered field names
    Struct {
        name: String,
        fields: Vec<String>,
    },
    Pointer(Box<Type>),
    /// Boxed dynamic value behind a named interface (e.g. `any`)
    Interface(String),
    Func(String),
    Other(String),
}

impl Type {
    /// The `any` interface, used for heterogeneous containers
    pub fn any() -> Self {
        Type::Interface("any".into())
    }

    /// Check if this is the byte type (`u8`)
    pub fn is_byte(&self) -> bool {
        matches!(self, Type::Uint(Width::W8))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => f.write_str("bool"),
            Type::Int(w) => write!(f, "i{}", w.suffix()),
            Type::Uint(w) => write!(f, "u{}", w.suffix()),
            Type::Float(w) => write!(f, "f{}", w.suffix()),
            Type::Complex(w) => write!(f, "complex<f{}>", w.suffix()),
            Type::String => f.write_str("String"),
            Type::Array(elem, len) => write!(f, "[{elem}; {len}]"),
            Type::Slice(elem) => write!(f, "Vec<{elem}>"),
            Type::Map(k, v) => write!(f, "Map<{k}, {v}>"),
            Type::Struct { name, .. } => f.write_str(name),
            Type::Pointer(elem) => write!(f, "*{elem}"),
            Type::Interface(name) => write!(f, "dyn {name}"),
            Type::Func(sig) => write!(f, "fn {sig}"),
            Type::Other(name) => f.write_str(name),
        }
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Identity of a compared entry: a map key, struct field name or sequence index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Str(String),
    Index(usize),
    Field(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Bool(b) => write!(f, "{b}"),
            Key::Int(i) => write!(f, "{i}"),
            Key::Uint(u) => write!(f, "{u}"),
            Key::Str(s) | Key::Field(s) => f.write_str(s),
            Key::Index(i) => write!(f, "{i}"),
        }
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Key::Bool(b) => serializer.serialize_bool(*b),
            Key::Int(i) => serializer.serialize_i64(*i),
            Key::Uint(u) => serializer.serialize_u64(*u),
            Key::Str(s) | Key::Field(s) => serializer.serialize_str(s),
            Key::Index(i) => serializer.serialize_u64(*i as u64),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_owned())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::Str(s.clone())
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Key::Bool(b)
    }
}

macro_rules! key_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Key {
            fn from(v: $t) -> Self {
                Key::Int(v as i64)
            }
        })*
    };
}

macro_rules! key_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Key {
            fn from(v: $t) -> Self {
                Key::Uint(v as u64)
            }
        })*
    };
}

key_from_signed!(i8, i16, i32, i64, isize);
key_from_unsigned!(u8, u16, u32, u64);
