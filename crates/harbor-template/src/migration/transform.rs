//! Value transforms for `modify_field`
//!
//! A [`Transform`] rewrites one value:
//! - `map`: dictionary lookup, identity when the value is not a key
//! - `format`: render a template with `{value}` replaced by the value

use std::fmt::{self, Display, Formatter};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::value::Value;

/// Value rewriting rule
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transform {
    /// Replace string values found in `mapping`
    ///
    /// Mapping keys are strings, so only string values can match; every
    /// other value passes through unchanged.
    Map { mapping: IndexMap<String, Value> },

    /// Replace the value with a rendered template
    Format { format: FormatTemplate },
}

impl Transform {
    /// Compute the replacement for `value`
    #[must_use]
    pub fn apply(&self, value: &Value) -> Value {
        match self {
            Self::Map { mapping } => value
                .as_str()
                .and_then(|key| mapping.get(key))
                .cloned()
                .unwrap_or_else(|| value.clone()),
            Self::Format { format } => Value::String(format.render(value)),
        }
    }

    /// Transform type name as written in migration records
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Map { .. } => "map",
            Self::Format { .. } => "format",
        }
    }
}

/// Parsed `format` template
///
/// Supports the `{value}` placeholder (any number of times) and `{{`/`}}`
/// escapes for literal braces.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct FormatTemplate {
    source: String,
    pieces: Vec<Piece>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Value,
}

impl FormatTemplate {
    /// Placeholder substituted with the current value
    pub const PLACEHOLDER: &'static str = "value";

    /// Parse a template string
    ///
    /// # Errors
    /// Returns error on unknown placeholders or unbalanced braces
    pub fn parse(source: &str) -> Result<Self, TransformError> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => name.push(ch),
                            None => {
                                return Err(TransformError::UnterminatedPlaceholder {
                                    template: source.to_string(),
                                })
                            }
                        }
                    }
                    if name != Self::PLACEHOLDER {
                        return Err(TransformError::UnsupportedPlaceholder {
                            template: source.to_string(),
                            placeholder: name,
                        });
                    }
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(Piece::Value);
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(TransformError::UnmatchedBrace {
                        template: source.to_string(),
                    })
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            pieces,
        })
    }

    /// Render with `value` substituted for every placeholder
    #[must_use]
    pub fn render(&self, value: &Value) -> String {
        let mut out = String::with_capacity(self.source.len());
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Value => out.push_str(&value.to_string()),
            }
        }
        out
    }

    /// Original template text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl TryFrom<String> for FormatTemplate {
    type Error = TransformError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::parse(&source)
    }
}

impl Display for FormatTemplate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Errors in transform definitions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    /// Placeholder other than `{value}`
    #[error("unsupported placeholder '{{{placeholder}}}' in format '{template}' (only {{value}} is available)")]
    UnsupportedPlaceholder { template: String, placeholder: String },

    /// `{` without a closing `}`
    #[error("unterminated placeholder in format '{template}'")]
    UnterminatedPlaceholder { template: String },

    /// Lone `}`
    #[error("unmatched '}}' in format '{template}' (use '}}}}' for a literal brace)")]
    UnmatchedBrace { template: String },
}
