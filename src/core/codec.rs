//! Purpose: Encode/decode the on-disk representation of a record sequence.
//! Exports: `Record`, `Style`, `decode`, `encode`.
//! Role: Single seam for the serialization format; callers never touch serde_json directly.
//! Invariants: Round trips preserve record order and key order within each record.
//! Invariants: Absent content (empty text, JSON null) decodes to `None`, never an error.
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value};

use crate::core::error::{Error, ErrorKind};

/// One data point: an ordered mapping from property names to arbitrary values.
///
/// `serde_json` is built with `preserve_order`, so the underlying map keeps
/// insertion order and a load/save cycle reproduces the file key-for-key.
pub type Record = Map<String, Value>;

/// Formatting preferences applied on every save.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Style {
    /// Spaces of indentation per nesting level.
    pub indent: usize,
}

impl Style {
    pub fn new() -> Self {
        Self { indent: 4 }
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode file text into a record sequence.
///
/// Returns `Ok(None)` when the content is absent (blank text or a JSON
/// `null`). Errors carry no path; the caller that knows the file attaches it.
pub fn decode(text: &str) -> Result<Option<Vec<Record>>, Error> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(text).map_err(|err| {
        Error::new(ErrorKind::Parse)
            .with_message("invalid JSON in store file")
            .with_source(err)
    })?;

    match value {
        Value::Null => Ok(None),
        Value::Array(items) => {
            let mut records = Vec::with_capacity(items.len());
            for (idx, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(record) => records.push(record),
                    other => {
                        return Err(Error::new(ErrorKind::Config).with_message(format!(
                            "element {idx} is {}, not a record mapping",
                            kind_name(&other)
                        )));
                    }
                }
            }
            Ok(Some(records))
        }
        other => Err(Error::new(ErrorKind::Config).with_message(format!(
            "top level is {}, but a sequence of records is required",
            kind_name(&other)
        ))),
    }
}

/// Encode a record sequence as pretty-printed JSON with a trailing newline.
pub fn encode(records: &[Record], style: &Style) -> Result<String, Error> {
    let indent = vec![b' '; style.indent];
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(&indent);
    let mut serializer = Serializer::with_formatter(&mut out, formatter);
    records.serialize(&mut serializer).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode records")
            .with_source(err)
    })?;
    out.push(b'\n');
    String::from_utf8(out).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("encoded records are not valid UTF-8")
            .with_source(err)
    })
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
