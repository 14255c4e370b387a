//! Reply extraction: recover the JSON payload from free-form model output.
//!
//! Models do not reliably honor formatting instructions, so extraction is
//! best-effort with a fixed precedence:
//!
//! 1. the first ```` ```json ```` fenced block, interior trimmed;
//! 2. otherwise the whole reply;
//! 3. otherwise a [`FailureKind::InvalidResponseFormat`] failure.
//!
//! A fence whose interior does not parse is a failure; it never falls back
//! to parsing the whole reply. Failures always carry the raw reply.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::error::Category;

/// First JSON-tagged code fence. Lazy match so only the first block is taken.
static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json\n(.*?)\n```").expect("valid fence pattern"));

/// Why a reply could not be turned into structured data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Neither the fenced block nor the whole reply is valid JSON.
    InvalidResponseFormat,
    /// Anything else went wrong (e.g. the reply was not valid UTF-8).
    ParsingError,
}

/// A failed extraction, with the reply that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionFailure {
    pub kind: FailureKind,
    /// Human-readable message; this is the `error` field on the wire.
    pub message: String,
    /// The reply exactly as received.
    pub raw: String,
}

impl ExtractionFailure {
    fn invalid_format(raw: &str) -> Self {
        Self {
            kind: FailureKind::InvalidResponseFormat,
            message: "Invalid response format".to_string(),
            raw: raw.to_string(),
        }
    }

    fn parsing(detail: impl fmt::Display, raw: String) -> Self {
        Self {
            kind: FailureKind::ParsingError,
            message: format!("Parsing error: {}", detail),
            raw,
        }
    }
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of one extraction attempt: exactly one of parsed data or a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    /// Valid JSON; shape is whatever the model produced.
    Parsed(serde_json::Value),
    Failed(ExtractionFailure),
}

impl ExtractionResult {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ExtractionResult::Parsed(_))
    }

    pub fn parsed(&self) -> Option<&serde_json::Value> {
        match self {
            ExtractionResult::Parsed(value) => Some(value),
            ExtractionResult::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ExtractionFailure> {
        match self {
            ExtractionResult::Parsed(_) => None,
            ExtractionResult::Failed(failure) => Some(failure),
        }
    }

    /// JSON rendering: the parsed value itself, or `{"error", "raw"}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExtractionResult::Parsed(value) => value.serialize(serializer),
            ExtractionResult::Failed(failure) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("error", &failure.message)?;
                map.serialize_entry("raw", &failure.raw)?;
                map.end()
            }
        }
    }
}

/// Extract the structured payload from a model reply.
pub fn extract(raw: &str) -> ExtractionResult {
    let candidate = match JSON_FENCE.captures(raw).and_then(|c| c.get(1)) {
        Some(interior) => interior.as_str().trim(),
        None => raw,
    };

    match serde_json::from_str::<serde_json::Value>(candidate) {
        Ok(value) => ExtractionResult::Parsed(value),
        Err(e) => match e.classify() {
            Category::Syntax | Category::Eof => {
                ExtractionResult::Failed(ExtractionFailure::invalid_format(raw))
            }
            Category::Io | Category::Data => {
                ExtractionResult::Failed(ExtractionFailure::parsing(e, raw.to_string()))
            }
        },
    }
}

/// Extract from raw bytes, e.g. a reply saved to disk.
///
/// Bytes that are not UTF-8 yield a [`FailureKind::ParsingError`] whose raw
/// text is the lossy decoding.
pub fn extract_bytes(raw: &[u8]) -> ExtractionResult {
    match std::str::from_utf8(raw) {
        Ok(text) => extract(text),
        Err(e) => ExtractionResult::Failed(ExtractionFailure::parsing(
            e,
            String::from_utf8_lossy(raw).into_owned(),
        )),
    }
}
