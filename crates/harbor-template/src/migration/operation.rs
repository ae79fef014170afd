//! Migration operations
//!
//! An [`Operation`] is one field-level edit. Records are parsed eagerly so a
//! malformed migration set fails before any document is touched.

use std::fmt::{self, Display, Formatter};

use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::transform::Transform;
use crate::error::{MigrationError, PathError};
use crate::path::FieldPath;
use crate::value::Value;

/// Field-level edit applied by a migration
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Write `value` at `path`, creating parents and overwriting the leaf
    AddField { path: FieldPath, value: Value },

    /// Move the value at `old_path` to `new_path`
    RenameField { old_path: FieldPath, new_path: FieldPath },

    /// Delete the value at `path`
    RemoveField { path: FieldPath },

    /// Rewrite the value at `path` in place
    ModifyField { path: FieldPath, transform: Transform },

    /// Record with a missing or unrecognised `operation`
    ///
    /// Kept so newer migration sets still load in older tools; skipped when
    /// applied.
    Unknown { kind: Option<String> },
}

/// Result of applying one operation
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// The operation ran
    Changed,
    /// The operation left the document untouched
    Skipped(SkipReason),
}

/// Why an operation was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Source or target path does not exist
    PathAbsent(FieldPath),
    /// Operation kind not understood by this tool
    UnknownOperation(Option<String>),
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::PathAbsent(path) => write!(f, "path '{path}' not found"),
            Self::UnknownOperation(Some(kind)) => write!(f, "unknown operation '{kind}'"),
            Self::UnknownOperation(None) => f.write_str("record has no operation"),
        }
    }
}

#[derive(Deserialize)]
struct AddFieldRecord {
    path: FieldPath,
    value: Value,
}

#[derive(Deserialize)]
struct RenameFieldRecord {
    old_path: FieldPath,
    new_path: FieldPath,
}

#[derive(Deserialize)]
struct RemoveFieldRecord {
    path: FieldPath,
}

#[derive(Deserialize)]
struct ModifyFieldRecord {
    path: FieldPath,
    transform: Transform,
}

impl Operation {
    /// Parse one migration record
    ///
    /// `origin` and `index` only feed error messages.
    ///
    /// # Errors
    /// Returns [`MigrationError::InvalidRecord`] if the record is not an
    /// object, or if a known operation has missing or invalid parameters.
    pub fn from_record(origin: &str, index: usize, record: JsonValue) -> Result<Self, MigrationError> {
        let Some(fields) = record.as_object() else {
            return Err(MigrationError::invalid_record(
                origin,
                index,
                "expected an object with an 'operation' key",
            ));
        };

        let kind = fields
            .get("operation")
            .and_then(JsonValue::as_str)
            .map(str::to_owned);

        let parsed = match kind.as_deref() {
            Some("add_field") => serde_json::from_value::<AddFieldRecord>(record)
                .map(|r| Self::AddField {
                    path: r.path,
                    value: r.value,
                }),
            Some("rename_field") => serde_json::from_value::<RenameFieldRecord>(record)
                .map(|r| Self::RenameField {
                    old_path: r.old_path,
                    new_path: r.new_path,
                }),
            Some("remove_field") => serde_json::from_value::<RemoveFieldRecord>(record)
                .map(|r| Self::RemoveField { path: r.path }),
            Some("modify_field") => serde_json::from_value::<ModifyFieldRecord>(record)
                .map(|r| Self::ModifyField {
                    path: r.path,
                    transform: r.transform,
                }),
            _ => return Ok(Self::Unknown { kind }),
        };

        parsed.map_err(|e| MigrationError::invalid_record(origin, index, e.to_string()))
    }

    /// Operation name as written in migration records
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::AddField { .. } => "add_field",
            Self::RenameField { .. } => "rename_field",
            Self::RemoveField { .. } => "remove_field",
            Self::ModifyField { .. } => "modify_field",
            Self::Unknown { kind } => kind.as_deref().unwrap_or("<missing>"),
        }
    }

    /// Apply to a document tree
    ///
    /// Absent source paths and unknown kinds leave `root` untouched and
    /// report [`Applied::Skipped`].
    ///
    /// # Errors
    /// Returns [`PathError::NotAMap`] if a write would have to descend
    /// through a scalar or a sequence. `root` is unchanged in that case,
    /// including for renames.
    pub fn apply(&self, root: &mut Value) -> Result<Applied, PathError> {
        match self {
            Self::AddField { path, value } => {
                root.insert_path(path, value.clone())?;
                Ok(Applied::Changed)
            }
            Self::RemoveField { path } => Ok(match root.remove_path(path) {
                Some(_) => Applied::Changed,
                None => Applied::Skipped(SkipReason::PathAbsent(path.clone())),
            }),
            Self::RenameField { old_path, new_path } => rename(root, old_path, new_path),
            Self::ModifyField { path, transform } => Ok(match root.get_path_mut(path) {
                Some(current) => {
                    *current = transform.apply(current);
                    Applied::Changed
                }
                None => Applied::Skipped(SkipReason::PathAbsent(path.clone())),
            }),
            Self::Unknown { kind } => Ok(Applied::Skipped(SkipReason::UnknownOperation(kind.clone()))),
        }
    }
}

/// Move a value between paths
///
/// The value is detached first, so moving a field into its own former
/// location (`a` → `a.b`) works. A leaf renamed within the same parent keeps
/// its position.
fn rename(root: &mut Value, old_path: &FieldPath, new_path: &FieldPath) -> Result<Applied, PathError> {
    let Some((index, value)) = root.detach_path(old_path) else {
        return Ok(Applied::Skipped(SkipReason::PathAbsent(old_path.clone())));
    };

    if let Err(err) = root.check_writable(new_path) {
        root.reattach_path(old_path, index, value);
        return Err(err);
    }

    let same_parent = old_path.parent() == new_path.parent() && !new_path.is_empty();
    if same_parent && root.get_path(new_path).is_none() {
        root.reattach_path(new_path, index, value);
    } else {
        root.insert_path(new_path, value)?;
    }
    Ok(Applied::Changed)
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddField { path, .. } | Self::RemoveField { path } => {
                write!(f, "{} {path}", self.kind())
            }
            Self::RenameField { old_path, new_path } => {
                write!(f, "rename_field {old_path} -> {new_path}")
            }
            Self::ModifyField { path, transform } => {
                write!(f, "modify_field {path} ({})", transform.kind())
            }
            Self::Unknown { .. } => f.write_str(self.kind()),
        }
    }
}
