//! # mapdiff Core
//!
//! Structural comparison of two arbitrarily nested dynamic mappings.
//!
//! Rather than answering "equal or not", the comparator produces a sparse
//! diff tree naming every key whose value is missing, extra or different,
//! down to the innermost field, index or map entry.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ source / target │ ── HashMap<K, V: Reflect>, serde types, JSON
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │      Value      │ ── closed tagged dynamic value
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  compare_maps   │ ── kind / type / nil / identity / per-kind walk
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ComparisonResult │ ── KeyComparisonResult tree, mismatches only
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │    Reporter     │ ── text sink, test log, JSON
//! └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mapdiff_core::prelude::*;
//! use std::collections::HashMap;
//!
//! let expected = HashMap::from([("balance", Value::int(10))]);
//! let actual = HashMap::from([("balance", Value::int(12))]);
//!
//! let result = compare_maps(Some(&expected), Some(&actual))?;
//! WriterReporter::new(std::io::stdout()).generate_report(&result)?;
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Kind, runtime type identity and keys
//! - [`value`] - Dynamic value model
//! - [`reflect`] - Conversion of Rust values into `Value`
//! - [`convert`] - Serde and JSON bridge
//! - [`errors`] - Fatal errors and the mismatch taxonomy
//! - [`compare`] - The comparator
//! - [`report`] - Reporters

pub mod compare;
pub mod convert;
pub mod errors;
pub mod reflect;
pub mod report;
pub mod types;
pub mod value;

// Re-exports for convenience
pub use compare::{compare_maps, compare_values, ComparisonResult, KeyComparisonResult};
pub use convert::{map_from_json, map_from_serialize, to_value};
pub use errors::{CompareError, Detail, Mismatch, MismatchKind, Result};
pub use reflect::Reflect;
pub use report::{
    assert_no_mismatches, render, CapturedLog, JsonReporter, LogSink, Reporter, TestReporter,
    TestSink, WriterReporter,
};
pub use types::{Key, Kind, Type, Width};
pub use value::Value;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        assert_no_mismatches, compare_maps, compare_values, map_from_json, to_value,
        CompareError, ComparisonResult, Detail, Key, KeyComparisonResult, Kind, Mismatch,
        MismatchKind, Reflect, Reporter, Result, TestReporter, Type, Value, WriterReporter,
    };
}
