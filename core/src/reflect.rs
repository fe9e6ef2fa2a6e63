//! Conversion of ordinary Rust values into [`Value`]
//!
//! `Reflect` is the only place static Rust types meet the dynamic model. The
//! comparator itself only ever sees `Value`s.

use crate::types::{Key, Type, Width};
use crate::value::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Types that can describe themselves as a dynamic [`Value`]
pub trait Reflect {
    /// Static type of every value of `Self`
    fn static_type() -> Type
    where
        Self: Sized;

    /// Dynamic view of this value
    ///
    /// Implementations that already hold a `Value` return it borrowed, which
    /// keeps reference identity intact for the comparator.
    fn reflect(&self) -> Cow<'_, Value>;
}

/// Reflect a value stored in a container whose element type is `T`
///
/// Elements typed as an interface are boxed, mirroring how a heterogeneous
/// container stores them.
pub fn element<T: Reflect>(value: &T) -> Value {
    let inner = value.reflect().into_owned();
    match T::static_type() {
        Type::Interface(name) => Value::Interface {
            name,
            inner: match inner {
                Value::Null => None,
                other => Some(Box::new(other)),
            },
        },
        _ => inner,
    }
}

impl Reflect for Value {
    fn static_type() -> Type {
        Type::any()
    }

    fn reflect(&self) -> Cow<'_, Value> {
        Cow::Borrowed(self)
    }
}

impl Reflect for bool {
    fn static_type() -> Type {
        Type::Bool
    }

    fn reflect(&self) -> Cow<'_, Value> {
        Cow::Owned(Value::Bool(*self))
    }
}

macro_rules! reflect_numeric {
    ($variant:ident, $repr:ty, $($t:ty => $width:ident),*) => {
        $(impl Reflect for $t {
            fn static_type() -> Type {
                Type::$variant(Width::$width)
            }

            fn reflect(&self) -> Cow<'_, Value> {
                Cow::Owned(Value::$variant {
                    width: Width::$width,
                    value: *self as $repr,
                })
            }
        })*
    };
}

reflect_numeric!(Int, i64, i8 => W8, i16 => W16, i32 => W32, i64 => W64, isize => Size);
reflect_numeric!(Uint, u64, u8 => W8, u16 => W16, u32 => W32, u64 => W64, usize => Size);
reflect_numeric!(Float, f64, f32 => W32, f64 => W64);

impl Reflect for String {
    fn static_type() -> Type {
        Type::String
    }

    fn reflect(&self) -> Cow<'_, Value> {
        Cow::Owned(Value::String(self.clone()))
    }
}

impl Reflect for &str {
    fn static_type() -> Type {
        Type::String
    }

    fn reflect(&self) -> Cow<'_, Value> {
        Cow::Owned(Value::String((*self).to_owned()))
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn static_type() -> Type {
        Type::Slice(Box::new(T::static_type()))
    }

    fn reflect(&self) -> Cow<'_, Value> {
        Cow::Owned(Value::slice(
            T::static_type(),
            self.iter().map(element).collect(),
        ))
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn static_type() -> Type {
        Type::Array(Box::new(T::static_type()), N)
    }

    fn reflect(&self) -> Cow<'_, Value> {
        Cow::Owned(Value::array(
            T::static_type(),
            self.iter().map(element).collect(),
        ))
    }
}

/// `Option<T>` behaves like a nullable pointer to `T`
impl<T: Reflect> Reflect for Option<T> {
    fn static_type() -> Type {
        Type::Pointer(Box::new(T::static_type()))
    }

    fn reflect(&self) -> Cow<'_, Value> {
        let value = match self {
            Some(v) => Value::pointer(T::static_type(), element(v)),
            None => Value::nil_pointer(T::static_type()),
        };
        Cow::Owned(value)
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn static_type() -> Type {
        Type::Pointer(Box::new(T::static_type()))
    }

    fn reflect(&self) -> Cow<'_, Value> {
        Cow::Owned(Value::pointer(T::static_type(), element(self.as_ref())))
    }
}

impl<K, V, S> Reflect for HashMap<K, V, S>
where
    K: Reflect + Clone + Into<Key>,
    V: Reflect,
    S: BuildHasher,
{
    fn static_type() -> Type {
        Type::Map(Box::new(K::static_type()), Box::new(V::static_type()))
    }

    fn reflect(&self) -> Cow<'_, Value> {
        let entries = self
            .iter()
            .map(|(k, v)| (k.clone().into(), element(v)))
            .collect();
        Cow::Owned(Value::map(K::static_type(), V::static_type(), entries))
    }
}

impl<K, V> Reflect for BTreeMap<K, V>
where
    K: Reflect + Clone + Into<Key>,
    V: Reflect,
{
    fn static_type() -> Type {
        Type::Map(Box::new(K::static_type()), Box::new(V::static_type()))
    }

    fn reflect(&self) -> Cow<'_, Value> {
        let entries = self
            .iter()
            .map(|(k, v)| (k.clone().into(), element(v)))
            .collect::<BTreeMap<Key, Value>>();
        Cow::Owned(Value::map(K::static_type(), V::static_type(), entries))
    }
}

/// Implement [`Reflect`] for a plain struct by listing its fields
///
/// ```rust,ignore
/// struct Rec { name: String, count: i64 }
/// mapdiff_core::reflect_struct!(Rec { name, count });
/// ```
#[macro_export]
macro_rules! reflect_struct {
    ($ty:ident { $($field:ident),+ $(,)? }) => {
        impl $crate::reflect::Reflect for $ty {
            fn static_type() -> $crate::types::Type {
                $crate::types::Type::Struct {
                    name: stringify!($ty).to_string(),
                    fields: vec![$(stringify!($field).to_string()),+],
                }
            }

            fn reflect(&self) -> ::std::borrow::Cow<'_, $crate::value::Value> {
                ::std::borrow::Cow::Owned($crate::value::Value::structure(
                    stringify!($ty),
                    [$((stringify!($field), $crate::reflect::element(&self.$field))),+],
                ))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Kind;

    #[derive(Clone)]
    struct Rec {
        name: String,
        count: i64,
    }

    reflect_struct!(Rec { name, count });

    #[test]
    fn test_scalars() {
        assert_eq!(*5i32.reflect(), Value::Int { width: Width::W32, value: 5 });
        assert_eq!(true.reflect().kind(), Kind::Bool);
        assert_eq!("a".reflect().into_owned(), Value::string("a"));
    }

    #[test]
    fn test_byte_vec_is_byte_slice() {
        let v = vec![1u8, 2, 3];
        assert_eq!(v.reflect().as_bytes(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_value_is_borrowed() {
        let v = Value::int(1);
        assert!(matches!(v.reflect(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_vec_of_values_boxes_items() {
        let v = vec![Value::int(1), Value::Null];
        let reflected = v.reflect();
        match reflected.as_ref() {
            Value::Slice {
                elem,
                items: Some(items),
            } => {
                assert_eq!(*elem, Type::any());
                assert_eq!(items[0].kind(), Kind::Interface);
                assert!(items[1].is_nil());
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn test_option_is_pointer() {
        let some: Option<u64> = Some(3);
        let none: Option<u64> = None;
        assert_eq!(some.reflect().kind(), Kind::Pointer);
        assert!(none.reflect().is_nil());
        assert_eq!(some.reflect().ty(), none.reflect().ty());
    }

    #[test]
    fn test_struct_macro() {
        let rec = Rec {
            name: "a".into(),
            count: 1,
        };
        let value = rec.reflect().into_owned();
        assert_eq!(value.ty(), Some(Rec::static_type()));
        assert_eq!(value.to_string(), "Rec { name: a, count: 1 }");
    }

    #[test]
    fn test_hash_map() {
        let mut m = HashMap::new();
        m.insert("x".to_string(), 1i64);
        let value = m.reflect();
        assert_eq!(
            value.ty(),
            Some(Type::Map(
                Box::new(Type::String),
                Box::new(Type::Int(Width::W64))
            ))
        );
    }
}
