//! Structural comparison of dynamic values
//!
//! The walk never stops at the first difference: every mismatching key at
//! every level is collected into a sparse diff tree. Only keys that differ
//! are recorded; a parent whose nested keys differ carries an
//! [`InnerKeyMismatch`](MismatchKind::InnerKeyMismatch) marker and keeps the
//! details in its children.
//!
//! Inputs are assumed to be finite trees. [`Value`] owns its children, so a
//! cyclic input cannot be constructed in the first place.

use crate::errors::{CompareError, Detail, Mismatch, MismatchKind, Result};
use crate::reflect::Reflect;
use crate::types::{Key, Kind};
use crate::value::Value;
use log::{debug, trace};
use serde::Serialize;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::ptr;

static NULL: Value = Value::Null;

/// Comparison outcome for a single key
///
/// `error` is `None` when the subtree matched. `children` is only populated
/// when the mismatch comes from nested keys, and holds one entry per
/// offending inner key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyComparisonResult {
    pub key: Key,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Mismatch>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<KeyComparisonResult>,
}

impl KeyComparisonResult {
    /// Matching result for `key`
    pub fn new(key: Key) -> Self {
        Self {
            key,
            error: None,
            children: Vec::new(),
        }
    }

    /// Leaf result carrying a mismatch
    pub fn with_error(key: Key, error: impl Into<Mismatch>) -> Self {
        Self {
            key,
            error: Some(error.into()),
            children: Vec::new(),
        }
    }

    pub fn is_match(&self) -> bool {
        self.error.is_none()
    }

    pub fn mismatch_kind(&self) -> Option<MismatchKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// Direct child recorded under `key`
    pub fn child(&self, key: &Key) -> Option<&KeyComparisonResult> {
        self.children.iter().find(|c| &c.key == key)
    }

    /// Keep the error-bearing children and mark this node if any remain
    fn aggregate(&mut self, children: impl IntoIterator<Item = KeyComparisonResult>) {
        self.children
            .extend(children.into_iter().filter(|c| c.error.is_some()));
        if !self.children.is_empty() {
            self.error = Some(Mismatch::new(MismatchKind::InnerKeyMismatch));
        }
    }
}

/// Result of comparing two mappings
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonResult {
    /// One entry per top-level key that is missing, extra or valued differently
    pub mismatching_keys: Vec<KeyComparisonResult>,
}

impl ComparisonResult {
    /// Check if the two mappings matched
    pub fn is_empty(&self) -> bool {
        self.mismatching_keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mismatching_keys.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyComparisonResult> {
        self.mismatching_keys.iter()
    }

    /// Entry recorded for a top-level key
    pub fn get(&self, key: &Key) -> Option<&KeyComparisonResult> {
        self.mismatching_keys.iter().find(|r| &r.key == key)
    }
}

/// Snapshot of a collection attached to a slice size mismatch
#[derive(Serialize)]
struct CollectionSnapshot<'a> {
    size: usize,
    elements: &'a [Value],
}

impl CollectionSnapshot<'_> {
    fn render(items: &[Value]) -> Detail {
        let snapshot = CollectionSnapshot {
            size: items.len(),
            elements: items,
        };
        Detail::Text(serde_json::to_string(&snapshot).unwrap_or_else(|err| err.to_string()))
    }
}

/// Compare two mappings key by key
///
/// `None` stands for an absent mapping. Two absent mappings are equal; a
/// single absent side is a hard error since nothing can be compared.
///
/// Source keys are visited first (shared keys are compared, unshared keys are
/// reported as missing), then target keys absent from the source are
/// reported as extra. The order inside each pass follows the map's iteration
/// order and carries no meaning.
pub fn compare_maps<K, V, S>(
    source: Option<&HashMap<K, V, S>>,
    target: Option<&HashMap<K, V, S>>,
) -> Result<ComparisonResult>
where
    K: Eq + Hash + Clone + Into<Key>,
    V: Reflect,
    S: BuildHasher,
{
    let mut result = ComparisonResult::default();
    let (source, target) = match (source, target) {
        (None, None) => return Ok(result),
        (None, Some(_)) => return Err(CompareError::SourceMapIsNil),
        (Some(_), None) => return Err(CompareError::TargetMapIsNil),
        (Some(source), Some(target)) => (source, target),
    };

    for (key, source_value) in source {
        let entry = match target.get(key) {
            Some(target_value) => compare_values(
                &source_value.reflect(),
                &target_value.reflect(),
                key.clone().into(),
            ),
            None => KeyComparisonResult::with_error(key.clone().into(), MismatchKind::MissingKey),
        };
        if let Some(error) = &entry.error {
            trace!("key `{}` mismatched: {}", entry.key, error);
            result.mismatching_keys.push(entry);
        }
    }

    for key in target.keys() {
        if !source.contains_key(key) {
            let entry = KeyComparisonResult::with_error(key.clone().into(), MismatchKind::ExtraKey);
            trace!("key `{}` only present in target", entry.key);
            result.mismatching_keys.push(entry);
        }
    }

    debug!(
        "compared {} source keys with {} target keys: {} mismatching",
        source.len(),
        target.len(),
        result.len()
    );
    Ok(result)
}

/// Compare two dynamic values found under `key`
///
/// Checks run in a fixed order: kind, absence, exact type, one-sided nil,
/// reference identity, slice length, then a per-kind walk.
pub fn compare_values(source: &Value, target: &Value, key: Key) -> KeyComparisonResult {
    let mut node = KeyComparisonResult::new(key);

    let kind = source.kind();
    if kind != target.kind() {
        node.error = Some(Mismatch::with_details(
            MismatchKind::KindMismatch,
            present(source),
            present(target),
        ));
        return node;
    }

    if kind == Kind::Invalid {
        return node;
    }

    let (source_type, target_type) = (source.ty(), target.ty());
    if source_type != target_type {
        node.error = Some(Mismatch::with_details(
            MismatchKind::TypeMismatch,
            source_type.map(Detail::Type),
            target_type.map(Detail::Type),
        ));
        return node;
    }

    // A nil container on one side only is not reported once kind and type
    // agree. Kept as observable behaviour.
    if kind.ignores_nil_difference() && source.is_nil() != target.is_nil() {
        return node;
    }

    if kind.has_identity() && (ptr::eq(source, target) || (source.is_nil() && target.is_nil())) {
        return node;
    }

    if let (Value::Slice { items: Some(s), .. }, Value::Slice { items: Some(t), .. }) =
        (source, target)
    {
        if s.len() != t.len() {
            node.error = Some(Mismatch::with_details(
                MismatchKind::SliceSizeMismatch,
                Some(CollectionSnapshot::render(s)),
                Some(CollectionSnapshot::render(t)),
            ));
            return node;
        }
    }

    match (source, target) {
        (Value::Array { items: s, .. }, Value::Array { items: t, .. }) => {
            node.aggregate(compare_indexed(s, t));
        }
        (Value::Slice { items: s, .. }, Value::Slice { items: t, .. }) => {
            match (source.as_bytes(), target.as_bytes()) {
                (Some(s), Some(t)) => {
                    if s != t {
                        let mismatch = Mismatch::with_details(
                            MismatchKind::ByteSliceMismatch,
                            Some(Detail::Text(format!("0x{}", hex::encode(&s)))),
                            Some(Detail::Text(format!("0x{}", hex::encode(&t)))),
                        );
                        let key = node.key.clone();
                        node.aggregate([KeyComparisonResult::with_error(key, mismatch)]);
                    }
                }
                // Byte slices holding out-of-range items fall back to an element walk.
                _ => {
                    let (s, t) = (s.as_deref().unwrap_or_default(), t.as_deref().unwrap_or_default());
                    node.aggregate(compare_indexed(s, t));
                }
            }
        }
        (Value::Struct { fields: s, .. }, Value::Struct { fields: t, .. }) => {
            node.aggregate(
                s.iter()
                    .zip(t)
                    .map(|((name, sv), (_, tv))| compare_values(sv, tv, Key::Field(name.clone()))),
            );
        }
        (
            Value::Map {
                entries: Some(s), ..
            },
            Value::Map {
                entries: Some(t), ..
            },
        ) => {
            let shared_or_missing = s.iter().map(|(k, sv)| match t.get(k) {
                Some(tv) => compare_values(sv, tv, k.clone()),
                None => KeyComparisonResult::with_error(k.clone(), MismatchKind::MissingKey),
            });
            let extra = t
                .keys()
                .filter(|k| !s.contains_key(*k))
                .map(|k| KeyComparisonResult::with_error(k.clone(), MismatchKind::ExtraKey));
            node.aggregate(shared_or_missing.chain(extra));
        }
        (Value::Pointer { target: s, .. }, Value::Pointer { target: t, .. })
        | (Value::Interface { inner: s, .. }, Value::Interface { inner: t, .. }) => {
            let key = node.key;
            return compare_values(deref(s), deref(t), key);
        }
        (Value::Func { .. }, Value::Func { .. }) => {}
        (Value::Bool(s), Value::Bool(t)) => scalar(&mut node, s == t, source, target),
        (Value::Int { value: s, .. }, Value::Int { value: t, .. }) => {
            scalar(&mut node, s == t, source, target)
        }
        (Value::Uint { value: s, .. }, Value::Uint { value: t, .. }) => {
            scalar(&mut node, s == t, source, target)
        }
        (Value::Float { value: s, .. }, Value::Float { value: t, .. }) => {
            scalar(&mut node, s == t, source, target)
        }
        (
            Value::Complex {
                re: sr, im: si, ..
            },
            Value::Complex {
                re: tr, im: ti, ..
            },
        ) => scalar(&mut node, sr == tr && si == ti, source, target),
        (Value::String(s), Value::String(t)) => scalar(&mut node, s == t, source, target),
        (Value::Other { repr: s, .. }, Value::Other { repr: t, .. }) => {
            scalar(&mut node, s == t, source, target)
        }
        _ => scalar(&mut node, source == target, source, target),
    }

    node
}

fn compare_indexed<'a>(
    source: &'a [Value],
    target: &'a [Value],
) -> impl Iterator<Item = KeyComparisonResult> + 'a {
    source
        .iter()
        .zip(target)
        .enumerate()
        .map(|(i, (s, t))| compare_values(s, t, Key::Index(i)))
}

fn scalar(node: &mut KeyComparisonResult, equal: bool, source: &Value, target: &Value) {
    if !equal {
        node.error = Some(Mismatch::values(
            MismatchKind::ValueMismatch,
            source.clone(),
            target.clone(),
        ));
    }
}

fn present(v: &Value) -> Option<Detail> {
    match v {
        Value::Null => None,
        other => Some(Detail::Value(other.clone())),
    }
}

fn deref(v: &Option<Box<Value>>) -> &Value {
    v.as_deref().unwrap_or(&NULL)
}
