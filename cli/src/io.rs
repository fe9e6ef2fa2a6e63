//! I/O utilities for the CLI
//!
//! Loads JSON documents into comparable mappings and opens report sinks.

use anyhow::{Context, Result};
use mapdiff_core::prelude::*;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Decoded top-level mapping; `None` when the document is `null`
pub type Document = Option<HashMap<String, Value>>;

/// Parse a JSON document from a string
pub fn parse_document(json: &str) -> Result<Document> {
    let doc: serde_json::Value = serde_json::from_str(json).context("Failed to parse JSON")?;
    Ok(map_from_json(doc)?)
}

/// Load a JSON document from a file
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    parse_document(&json).with_context(|| format!("Invalid document {:?}", path))
}

/// Save a serializable value as pretty JSON
pub fn save_json<T: serde::Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Open the report sink: a buffered file, or stdout
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}
