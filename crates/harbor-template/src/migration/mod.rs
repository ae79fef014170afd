//! Versioned template migrations
//!
//! A migration set is an ordered list of [`Operation`]s registered under a
//! version identifier. Applying it rewrites a copy of the document; the
//! caller's document is never modified.
//!
//! # Example
//!
//! ```
//! use harbor_template::{Document, InMemorySource, Migrator};
//!
//! let mut source = InMemorySource::new();
//! source
//!     .insert_json(
//!         "2.0",
//!         r#"[{"operation": "rename_field", "old_path": "foo.bar", "new_path": "foo.baz"}]"#,
//!     )
//!     .unwrap();
//!
//! let migrator = Migrator::new(source);
//! let document = Document::from_yaml("foo:\n  bar: 1\n").unwrap();
//! let outcome = migrator.migrate(&document, "2.0").unwrap();
//!
//! assert_eq!(outcome.document, Document::from_yaml("foo:\n  baz: 1\n").unwrap());
//! ```

pub mod operation;
pub mod source;
pub mod transform;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::{HarborResult, MigrationError};

pub use operation::{Applied, Operation, SkipReason};
pub use source::{DirectorySource, InMemorySource, MigrationSource};
pub use transform::{FormatTemplate, Transform};

/// How skipped operations are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationMode {
    /// Skips are expected; logged at debug level only
    #[default]
    Lenient,
    /// Skips are surfaced as warnings (catches typos in migration paths)
    Strict,
}

/// Migrator configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigratorConfig {
    /// Skip reporting mode
    pub mode: MigrationMode,
}

impl MigratorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With skip reporting mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: MigrationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Shorthand for strict mode
    #[inline]
    #[must_use]
    pub fn strict(self) -> Self {
        self.with_mode(MigrationMode::Strict)
    }
}

/// Ordered operations for one target version
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationSet {
    version: String,
    operations: Vec<Operation>,
    /// Where the set was loaded from; `None` when no set exists for the version
    origin: Option<String>,
}

impl MigrationSet {
    /// Create set from operations
    #[inline]
    #[must_use]
    pub fn new(version: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            version: version.into(),
            operations,
            origin: None,
        }
    }

    /// Placeholder for a version with no registered migrations
    #[inline]
    #[must_use]
    pub fn missing(version: impl Into<String>) -> Self {
        Self::new(version, Vec::new())
    }

    /// Record where the set came from
    #[inline]
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[inline]
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    #[inline]
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Whether the set was found in a source
    #[inline]
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.origin.is_some()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Apply every operation, in order, to a copy of `document`
    ///
    /// # Errors
    /// Returns [`MigrationError::Apply`] if an operation has to write through
    /// a non-map value. No partial result is returned.
    pub fn apply(&self, document: &Document, mode: MigrationMode) -> HarborResult<MigrationOutcome> {
        let mut migrated = document.clone();
        let mut applied = 0;
        let mut skipped = Vec::new();

        for (index, operation) in self.operations.iter().enumerate() {
            let result = operation
                .apply(migrated.root_mut())
                .map_err(|source| MigrationError::Apply {
                    version: self.version.clone(),
                    index,
                    operation: operation.to_string(),
                    source,
                })?;

            match result {
                Applied::Changed => {
                    tracing::debug!(index, %operation, "applied");
                    applied += 1;
                }
                Applied::Skipped(reason) => {
                    match mode {
                        MigrationMode::Lenient => tracing::debug!(index, %operation, %reason, "skipped"),
                        MigrationMode::Strict => tracing::warn!(index, %operation, %reason, "skipped"),
                    }
                    skipped.push(SkippedOperation {
                        index,
                        operation: operation.to_string(),
                        reason,
                    });
                }
            }
        }

        tracing::info!(
            version = %self.version,
            applied,
            skipped = skipped.len(),
            "migration set applied"
        );

        Ok(MigrationOutcome {
            document: migrated,
            version: self.version.clone(),
            applied,
            skipped,
            mode,
        })
    }
}

/// An operation that left the document unchanged
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedOperation {
    /// Position in the migration set
    pub index: usize,
    /// Rendered operation, e.g. `remove_field a.b`
    pub operation: String,
    /// Why it was skipped
    pub reason: SkipReason,
}

/// Result of applying a migration set
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationOutcome {
    /// Migrated document
    pub document: Document,
    /// Version that was applied
    pub version: String,
    /// Number of operations that ran
    pub applied: usize,
    /// Operations that were skipped, in order
    pub skipped: Vec<SkippedOperation>,
    /// Mode the set was applied in
    pub mode: MigrationMode,
}

impl MigrationOutcome {
    /// Skipped operations as operator-facing warnings
    ///
    /// Always empty in [`MigrationMode::Lenient`].
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        if self.mode == MigrationMode::Lenient {
            return Vec::new();
        }
        self.skipped
            .iter()
            .map(|s| format!("Operation #{} ({}) skipped: {}", s.index, s.operation, s.reason))
            .collect()
    }
}

/// Loads migration sets from a source and applies them
#[derive(Debug, Clone)]
pub struct Migrator<S> {
    source: S,
    config: MigratorConfig,
}

impl<S: MigrationSource> Migrator<S> {
    /// Create migrator with default configuration
    #[inline]
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            config: MigratorConfig::default(),
        }
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: MigratorConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load the set for `version`
    ///
    /// A version with no migrations yields an empty set for which
    /// [`MigrationSet::is_found`] is false.
    ///
    /// # Errors
    /// Returns error if the source fails to read or parse the set
    pub fn load(&self, version: &str) -> HarborResult<MigrationSet> {
        match self.source.lookup(version)? {
            Some(set) => {
                tracing::info!(
                    version,
                    operations = set.len(),
                    origin = set.origin().unwrap_or_default(),
                    "loaded migration set"
                );
                Ok(set)
            }
            None => {
                tracing::warn!(version, "no migrations found");
                Ok(MigrationSet::missing(version))
            }
        }
    }

    /// Load and apply the set for `version`
    ///
    /// # Errors
    /// Returns error if loading or applying the set fails
    pub fn migrate(&self, document: &Document, version: &str) -> HarborResult<MigrationOutcome> {
        self.load(version)?.apply(document, self.config.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::FieldPath;
    use crate::value::Value;

    fn path(s: &str) -> FieldPath {
        s.parse().unwrap()
    }

    fn doc(yaml: &str) -> Document {
        Document::from_yaml(yaml).unwrap()
    }

    fn source(version: &str, json: &str) -> InMemorySource {
        let mut source = InMemorySource::new();
        source.insert_json(version, json).unwrap();
        source
    }

    #[test]
    fn rename_scenario() {
        let migrator = Migrator::new(source(
            "2",
            r#"[{"operation": "rename_field", "old_path": "foo.bar", "new_path": "foo.baz"}]"#,
        ));
        let outcome = migrator.migrate(&doc("foo:\n  bar: 1\n"), "2").unwrap();
        assert_eq!(outcome.document, doc("foo:\n  baz: 1\n"));
        assert_eq!(outcome.applied, 1);
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn unknown_version_is_identity() {
        let migrator = Migrator::new(InMemorySource::new());
        let original = doc("project: p\nrepositories: []\n");

        let set = migrator.load("7").unwrap();
        assert!(!set.is_found());
        assert!(set.is_empty());

        let outcome = migrator.migrate(&original, "7").unwrap();
        assert_eq!(outcome.document, original);
        assert_eq!(outcome.applied, 0);
    }

    #[test]
    fn operations_apply_in_order() {
        let migrator = Migrator::new(source(
            "2",
            r#"[
                {"operation": "add_field", "path": "settings.level", "value": "low"},
                {"operation": "rename_field", "old_path": "settings.level", "new_path": "settings.severity"},
                {"operation": "modify_field", "path": "settings.severity",
                 "transform": {"type": "map", "mapping": {"low": "LOW"}}}
            ]"#,
        ));
        let outcome = migrator.migrate(&doc("project: p\n"), "2").unwrap();
        assert_eq!(outcome.document, doc("project: p\nsettings:\n  severity: LOW\n"));
        assert_eq!(outcome.applied, 3);
    }

    #[test]
    fn skipped_operations_are_recorded() {
        let migrator = Migrator::new(source(
            "2",
            r#"[
                {"operation": "remove_field", "path": "absent"},
                {"operation": "explode_field", "path": "a"},
                {"operation": "add_field", "path": "a", "value": 1}
            ]"#,
        ));
        let outcome = migrator.migrate(&doc("{}"), "2").unwrap();

        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.skipped.len(), 2);
        assert_eq!(outcome.skipped[0].index, 0);
        assert_eq!(outcome.skipped[0].reason, SkipReason::PathAbsent(path("absent")));
        assert_eq!(
            outcome.skipped[1].reason,
            SkipReason::UnknownOperation(Some("explode_field".to_string()))
        );
        // Lenient mode keeps skips out of operator warnings
        assert!(outcome.warnings().is_empty());
    }

    #[test]
    fn strict_mode_surfaces_warnings() {
        let migrator = Migrator::new(source(
            "2",
            r#"[{"operation": "remove_field", "path": "typo.path"}]"#,
        ))
        .with_config(MigratorConfig::new().strict());

        let outcome = migrator.migrate(&doc("a: 1\n"), "2").unwrap();
        assert_eq!(
            outcome.warnings(),
            vec!["Operation #0 (remove_field typo.path) skipped: path 'typo.path' not found"]
        );
    }

    #[test]
    fn failed_operation_leaves_input_untouched() {
        let migrator = Migrator::new(source(
            "2",
            r#"[
                {"operation": "add_field", "path": "fresh", "value": true},
                {"operation": "add_field", "path": "project.name", "value": "x"}
            ]"#,
        ));
        let original = doc("project: flat-string\n");

        let err = migrator.migrate(&original, "2").unwrap_err();
        assert!(matches!(err, MigrationError::Apply { index: 1, .. }));
        assert_eq!(original, doc("project: flat-string\n"));
    }

    #[test]
    fn apply_does_not_mutate_input() {
        let set = MigrationSet::new(
            "1",
            vec![Operation::AddField {
                path: path("added"),
                value: Value::Bool(true),
            }],
        );
        let original = doc("a: 1\n");
        let outcome = set.apply(&original, MigrationMode::Lenient).unwrap();

        assert_eq!(original, doc("a: 1\n"));
        assert_eq!(outcome.document, doc("a: 1\nadded: true\n"));
    }

    #[test]
    fn migration_set_origin() {
        let set = MigrationSet::new("1", vec![]).with_origin("memory:1");
        assert!(set.is_found());
        assert_eq!(set.origin(), Some("memory:1"));
        assert!(!MigrationSet::missing("1").is_found());
    }

    #[test]
    fn migrator_config_builder() {
        let config = MigratorConfig::new().with_mode(MigrationMode::Strict);
        assert_eq!(config.mode, MigrationMode::Strict);
        assert_eq!(MigratorConfig::default().mode, MigrationMode::Lenient);
    }
}
