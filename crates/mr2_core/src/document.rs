use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use crate::core_api::{CoreError, CoreErrorCode, StructureEntry};

const RAW_TEXT_INDENT: &[u8] = b"    ";
const ROOT_LABEL: &str = "<root>";

/// Tag of a single document node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Mapping,
    Sequence,
    String,
    Integer,
    Float,
    Boolean,
    Null,
}

impl NodeKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::Mapping,
            Value::Array(_) => Self::Sequence,
            Value::String(_) => Self::String,
            Value::Number(n) if n.is_f64() => Self::Float,
            Value::Number(_) => Self::Integer,
            Value::Bool(_) => Self::Boolean,
            Value::Null => Self::Null,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Mapping => "mapping",
            Self::Sequence => "sequence",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded save contents. Mapping key order is kept as it appeared in the
/// source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaveDocument {
    root: Value,
}

impl SaveDocument {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }

    pub fn into_root(self) -> Value {
        self.root
    }

    /// Parse user-supplied document text (the raw-text editing path).
    pub fn from_text(text: &str) -> Result<Self, CoreError> {
        serde_json::from_str(text).map(Self::new).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Parse,
                format!("invalid document text at line {} column {}: {e}", e.line(), e.column()),
            )
        })
    }

    /// Compact document text, as stored inside a save blob.
    pub fn to_vec(&self) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(&self.root).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Serialization,
                format!("failed to serialize document: {e}"),
            )
        })
    }

    /// Pretty document text with four-space indentation for raw editing.
    pub fn to_text_pretty(&self) -> Result<String, CoreError> {
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(
            &mut out,
            PrettyFormatter::with_indent(RAW_TEXT_INDENT),
        );
        self.root.serialize(&mut serializer).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Serialization,
                format!("failed to render document text: {e}"),
            )
        })?;
        String::from_utf8(out).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Serialization,
                format!("document text is not UTF-8: {e}"),
            )
        })
    }

    /// Top-level keys and the kind of value each one holds. A non-mapping
    /// root is reported as a single `<root>` entry.
    pub fn structure(&self) -> Vec<StructureEntry> {
        match &self.root {
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| StructureEntry {
                    key: key.clone(),
                    kind: NodeKind::of(value),
                })
                .collect(),
            other => vec![StructureEntry {
                key: ROOT_LABEL.to_string(),
                kind: NodeKind::of(other),
            }],
        }
    }
}

impl From<Value> for SaveDocument {
    fn from(root: Value) -> Self {
        Self::new(root)
    }
}
