//! Template documents
//!
//! [`Document`] wraps a root [`Value`] and owns the YAML/JSON ingress and
//! egress. Validation and migration only ever see the parsed tree.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DocumentError, PathError};
use crate::path::FieldPath;
use crate::value::Value;

/// Serialization format of a document on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    /// YAML (the default for templates)
    #[default]
    Yaml,
    /// JSON
    Json,
}

impl DocumentFormat {
    /// Pick the format from a file extension (`.json` → JSON, anything else → YAML)
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// A registry project template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    root: Value,
}

impl Document {
    /// Create from a root value
    #[inline]
    #[must_use]
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Parse from YAML string
    ///
    /// # Errors
    /// Returns error if YAML is invalid
    pub fn from_yaml(yaml: &str) -> Result<Self, DocumentError> {
        // An empty stream has no document at all; treat it as null
        if yaml.trim().is_empty() {
            return Ok(Self::new(Value::Null));
        }
        let root: Value = serde_yaml::from_str(yaml)?;
        Ok(Self::new(root))
    }

    /// Parse from JSON string
    ///
    /// # Errors
    /// Returns error if JSON is invalid
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let root: Value = serde_json::from_str(json)?;
        Ok(Self::new(root))
    }

    /// Parse text in the given format
    ///
    /// # Errors
    /// Returns error if the text is not valid in that format
    pub fn parse(text: &str, format: DocumentFormat) -> Result<Self, DocumentError> {
        match format {
            DocumentFormat::Yaml => Self::from_yaml(text),
            DocumentFormat::Json => Self::from_json(text),
        }
    }

    /// Read and parse a template file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| DocumentError::read_error(path, e))?;
        Self::parse(&text, DocumentFormat::from_path(path))
            .map_err(|e| DocumentError::syntax_error(path, e.to_string()))
    }

    /// Serialize to YAML string
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_yaml(&self) -> Result<String, DocumentError> {
        serde_yaml::to_string(&self.root).map_err(|e| DocumentError::Serialization(e.to_string()))
    }

    /// Serialize to pretty JSON string
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(&self.root)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .map_err(|e| DocumentError::Serialization(e.to_string()))
    }

    /// Serialize in the given format
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn render(&self, format: DocumentFormat) -> Result<String, DocumentError> {
        match format {
            DocumentFormat::Yaml => self.to_yaml(),
            DocumentFormat::Json => self.to_json(),
        }
    }

    /// Write to a file, choosing the format from its extension
    ///
    /// # Errors
    /// Returns error if serialization or the write fails
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let text = self.render(DocumentFormat::from_path(path))?;
        fs::write(path, text).map_err(|e| DocumentError::write_error(path, e))
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    #[inline]
    pub fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }

    /// Read the value at `path`
    #[inline]
    #[must_use]
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        self.root.get_path(path)
    }

    /// Check whether a value exists at `path`
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &FieldPath) -> bool {
        self.get(path).is_some()
    }

    /// Write `value` at `path`, creating intermediate maps
    ///
    /// # Errors
    /// Returns error if an intermediate value is not a map
    #[inline]
    pub fn insert(&mut self, path: &FieldPath, value: Value) -> Result<Option<Value>, PathError> {
        self.root.insert_path(path, value)
    }

    /// Remove the value at `path` (no-op if absent)
    #[inline]
    pub fn remove(&mut self, path: &FieldPath) -> Option<Value> {
        self.root.remove_path(path)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Value::empty_map())
    }
}

impl From<Value> for Document {
    fn from(root: Value) -> Self {
        Self::new(root)
    }
}
