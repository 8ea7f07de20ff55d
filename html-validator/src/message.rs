//! Checker messages and the normalizer that turns raw checker responses into them.
//!
//! The checker's response shape has drifted over time. Current Nu checkers
//! answer `{"messages": [...]}` with `lastLine`/`lastColumn` positions; older
//! clients handed back a bare array, used `line`/`col`, or reported plain
//! strings. Everything is folded into [`ValidationMessage`] here so the
//! stages downstream only ever see one shape.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message severity as reported by the checker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    /// A conformance error. Entries without a type are treated as errors.
    #[default]
    Error,
    /// Informational output, including warnings (`subType: "warning"`).
    Info,
    /// The checker could not process the document at all.
    NonDocumentError,
    /// Any other type string the checker may invent.
    Other(String),
}

impl MessageType {
    /// The wire spelling of this type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Error => "error",
            Self::Info => "info",
            Self::NonDocumentError => "non-document-error",
            Self::Other(other) => other,
        }
    }

    /// Informational messages never affect success.
    #[must_use]
    pub fn is_info(&self) -> bool {
        matches!(self, Self::Info)
    }
}

impl From<String> for MessageType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Self::Error,
            "info" => Self::Info,
            "non-document-error" => Self::NonDocumentError,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for MessageType {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<MessageType> for String {
    fn from(value: MessageType) -> Self {
        match value {
            MessageType::Other(other) => other,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message from the checker.
///
/// Only `type` and `message` carry meaning for the pipeline. Positions and
/// extracts are kept for reporting; any other field is preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ValidationMessage {
    /// Severity of the message.
    #[serde(rename = "type", default)]
    pub kind: MessageType,
    /// Human-readable message text.
    #[serde(default)]
    pub message: String,
    /// Refinement of `type`, e.g. `warning` or `fatal`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    /// First line of the offending range (1-indexed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_line: Option<u64>,
    /// First column of the offending range (1-indexed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_column: Option<u64>,
    /// Last line of the offending range (1-indexed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_line: Option<u64>,
    /// Last column of the offending range (1-indexed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_column: Option<u64>,
    /// Source excerpt around the offending range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<String>,
    /// Offset of the highlighted part within `extract`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hilite_start: Option<u64>,
    /// Length of the highlighted part within `extract`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hilite_length: Option<u64>,
    /// Checker-supplied fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ValidationMessage {
    /// Create a message with only a type and text.
    #[must_use]
    pub fn new(kind: impl Into<MessageType>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            sub_type: None,
            first_line: None,
            first_column: None,
            last_line: None,
            last_column: None,
            extract: None,
            hilite_start: None,
            hilite_length: None,
            extra: Map::new(),
        }
    }

    /// Attach a position to the message.
    #[must_use]
    pub fn at(mut self, line: u64, column: u64) -> Self {
        self.last_line = Some(line);
        self.last_column = Some(column);
        self
    }

    /// Format the message for human-readable output.
    ///
    /// `{file}:{line}:{column}: {type}: {message}`, dropping the position when
    /// the checker did not report one.
    #[must_use]
    pub fn format_human_readable(&self, file: &Path) -> String {
        let kind = match &self.sub_type {
            Some(sub) if self.kind.is_info() => sub.as_str(),
            _ => self.kind.as_str(),
        };
        match (self.last_line, self.last_column) {
            (Some(line), Some(column)) => format!(
                "{}:{line}:{column}: {kind}: {}",
                file.display(),
                self.message
            ),
            (Some(line), None) => {
                format!("{}:{line}: {kind}: {}", file.display(), self.message)
            }
            _ => format!("{}: {kind}: {}", file.display(), self.message),
        }
    }
}

/// Legacy key spellings and their current names.
const LEGACY_KEYS: &[(&str, &str)] = &[("line", "lastLine"), ("col", "lastColumn")];

/// Normalize a raw checker response into an ordered message list.
///
/// Accepts `{"messages": [...]}`, a bare array, or anything else (treated as
/// "no messages"). Order is preserved; entries that are neither objects nor
/// strings are dropped.
#[must_use]
pub fn normalize_response(raw: &Value) -> Vec<ValidationMessage> {
    let entries: &[Value] = match raw {
        Value::Object(fields) => match fields.get("messages") {
            Some(Value::Array(items)) => items,
            _ => &[],
        },
        Value::Array(items) => items,
        _ => &[],
    };

    entries.iter().filter_map(normalize_entry).collect()
}

fn normalize_entry(entry: &Value) -> Option<ValidationMessage> {
    match entry {
        Value::String(text) => Some(ValidationMessage::new(MessageType::Error, text.as_str())),
        Value::Object(fields) => Some(normalize_fields(fields.clone())),
        other => {
            tracing::debug!(entry = %other, "Skipping checker message with unsupported shape");
            None
        }
    }
}

fn normalize_fields(mut fields: Map<String, Value>) -> ValidationMessage {
    let kind = match fields.remove("type") {
        Some(Value::String(kind)) => MessageType::from(kind),
        _ => MessageType::Error,
    };
    let message = match fields.remove("message") {
        Some(Value::String(text)) => text,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    for (legacy, current) in LEGACY_KEYS {
        if !fields.contains_key(*current)
            && let Some(value) = fields.remove(*legacy)
        {
            fields.insert((*current).to_owned(), value);
        }
    }

    fields.insert("type".to_owned(), Value::String(kind.as_str().to_owned()));
    fields.insert("message".to_owned(), Value::String(message));

    match ValidationMessage::deserialize(&fields) {
        Ok(normalized) => normalized,
        Err(e) => {
            // Positions of the wrong JSON type: keep everything, untyped.
            tracing::debug!(error = %e, "Checker message fields kept untyped");
            fields.remove("type");
            let message = match fields.remove("message") {
                Some(Value::String(text)) => text,
                _ => String::new(),
            };
            let mut fallback = ValidationMessage::new(kind, message);
            fallback.extra = fields;
            fallback
        }
    }
}
