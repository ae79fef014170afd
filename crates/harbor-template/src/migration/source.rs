//! Migration set sources
//!
//! A [`MigrationSource`] resolves a version identifier to its ordered
//! operations. `Ok(None)` means "no migrations for this version", which
//! callers treat as an empty set rather than a failure.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;

use super::operation::Operation;
use super::MigrationSet;
use crate::error::{HarborResult, MigrationError};

/// Per-version store of migration sets
pub trait MigrationSource {
    /// Look up the migration set for `version`
    ///
    /// # Errors
    /// Returns error if the version is invalid or the stored set cannot be
    /// read or parsed. A missing set is `Ok(None)`.
    fn lookup(&self, version: &str) -> HarborResult<Option<MigrationSet>>;
}

impl<S: MigrationSource + ?Sized> MigrationSource for &S {
    fn lookup(&self, version: &str) -> HarborResult<Option<MigrationSet>> {
        (**self).lookup(version)
    }
}

/// Check that a version identifier is safe to use as part of a file name
///
/// # Errors
/// Returns [`MigrationError::InvalidVersion`] for empty identifiers,
/// characters outside `[A-Za-z0-9._-]` or any `..`.
pub fn validate_version(version: &str) -> HarborResult<()> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    if version.is_empty() || version.contains("..") || !version.chars().all(allowed) {
        return Err(MigrationError::InvalidVersion(version.to_string()));
    }
    Ok(())
}

/// Parse a list of raw records into operations
///
/// # Errors
/// Returns error for the first malformed record.
pub fn parse_records(origin: &str, records: Vec<JsonValue>) -> HarborResult<Vec<Operation>> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| Operation::from_record(origin, index, record))
        .collect()
}

/// Migration sets stored as `v{version}.json` / `v{version}.yaml` files
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// File extensions tried, in order
    pub const EXTENSIONS: [&'static str; 3] = ["json", "yaml", "yml"];

    /// Create source reading from `root`
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Migrations directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate file paths for a version
    #[must_use]
    pub fn candidates(&self, version: &str) -> Vec<PathBuf> {
        Self::EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("v{version}.{ext}")))
            .collect()
    }

    fn read_set(path: &Path, version: &str, text: &str) -> HarborResult<MigrationSet> {
        let origin = path.display().to_string();
        let records: Vec<JsonValue> = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(text)
                .map_err(|e| MigrationError::invalid_set(&origin, e.to_string()))?,
            _ => serde_yaml::from_str(text)
                .map_err(|e| MigrationError::invalid_set(&origin, e.to_string()))?,
        };
        let operations = parse_records(&origin, records)?;
        Ok(MigrationSet::new(version, operations).with_origin(origin))
    }
}

impl MigrationSource for DirectorySource {
    fn lookup(&self, version: &str) -> HarborResult<Option<MigrationSet>> {
        validate_version(version)?;

        for path in self.candidates(version) {
            match fs::read_to_string(&path) {
                Ok(text) => {
                    tracing::debug!(path = %path.display(), "reading migration set");
                    return Self::read_set(&path, version, &text).map(Some);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => return Err(MigrationError::Read { path, source }),
            }
        }

        Ok(None)
    }
}

/// Migration sets held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    sets: HashMap<String, Vec<Operation>>,
}

impl InMemorySource {
    /// Create empty source
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register operations for a version, returning the source
    #[must_use]
    pub fn with_set(mut self, version: impl Into<String>, operations: Vec<Operation>) -> Self {
        self.insert(version, operations);
        self
    }

    /// Register operations for a version
    pub fn insert(&mut self, version: impl Into<String>, operations: Vec<Operation>) {
        self.sets.insert(version.into(), operations);
    }

    /// Register a version from JSON record text
    ///
    /// # Errors
    /// Returns error if the text is not a list of valid records
    pub fn insert_json(&mut self, version: impl Into<String>, json: &str) -> HarborResult<()> {
        let version = version.into();
        let origin = format!("memory:{version}");
        let records: Vec<JsonValue> =
            serde_json::from_str(json).map_err(|e| MigrationError::invalid_set(&origin, e.to_string()))?;
        let operations = parse_records(&origin, records)?;
        self.insert(version, operations);
        Ok(())
    }

    /// Number of registered versions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl MigrationSource for InMemorySource {
    fn lookup(&self, version: &str) -> HarborResult<Option<MigrationSet>> {
        Ok(self.sets.get(version).map(|operations| {
            MigrationSet::new(version, operations.clone()).with_origin(format!("memory:{version}"))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_version_accepts_common_forms() {
        for version in ["2", "2.0", "2.1.0-rc1", "next_gen"] {
            assert!(validate_version(version).is_ok(), "{version}");
        }
    }

    #[test]
    fn validate_version_rejects_traversal() {
        for version in ["", "../etc", "a/b", "1..2", "v 1", "a\\b"] {
            assert!(
                matches!(validate_version(version), Err(MigrationError::InvalidVersion(_))),
                "{version}"
            );
        }
    }

    #[test]
    fn directory_source_missing_version() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path());
        assert!(source.lookup("9.9").unwrap().is_none());
    }

    #[test]
    fn directory_source_missing_directory() {
        let source = DirectorySource::new("/no/such/migrations");
        assert!(source.lookup("1").unwrap().is_none());
    }

    #[test]
    fn directory_source_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("v2.0.json"),
            r#"[{"operation": "remove_field", "path": "legacy"}]"#,
        )
        .unwrap();

        let set = DirectorySource::new(dir.path()).lookup("2.0").unwrap().unwrap();
        assert_eq!(set.version(), "2.0");
        assert_eq!(set.len(), 1);
        assert!(set.origin().unwrap().ends_with("v2.0.json"));
    }

    #[test]
    fn directory_source_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("v3.yml"),
            "- operation: add_field\n  path: global_policies\n  value: []\n",
        )
        .unwrap();

        let set = DirectorySource::new(dir.path()).lookup("3").unwrap().unwrap();
        assert_eq!(set.operations()[0].kind(), "add_field");
    }

    #[test]
    fn directory_source_prefers_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("v1.json"), "[]").unwrap();
        fs::write(
            dir.path().join("v1.yaml"),
            "- operation: remove_field\n  path: a\n",
        )
        .unwrap();

        let set = DirectorySource::new(dir.path()).lookup("1").unwrap().unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn directory_source_rejects_non_list() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("v1.json"), r#"{"operation": "add_field"}"#).unwrap();

        let err = DirectorySource::new(dir.path()).lookup("1").unwrap_err();
        assert!(matches!(err, MigrationError::InvalidSet { .. }));
    }

    #[test]
    fn directory_source_reports_record_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("v1.json"),
            r#"[{"operation": "remove_field", "path": "a"}, {"operation": "add_field", "path": "b"}]"#,
        )
        .unwrap();

        let err = DirectorySource::new(dir.path()).lookup("1").unwrap_err();
        assert!(matches!(err, MigrationError::InvalidRecord { index: 1, .. }));
    }

    #[test]
    fn directory_source_rejects_bad_version_before_io() {
        let source = DirectorySource::new("/tmp");
        assert!(source.lookup("../../etc/passwd").is_err());
    }

    #[test]
    fn in_memory_source_lookup() {
        let mut source = InMemorySource::new();
        source
            .insert_json("2", r#"[{"operation": "remove_field", "path": "a"}]"#)
            .unwrap();

        assert_eq!(source.len(), 1);
        assert!(source.lookup("2").unwrap().is_some());
        assert!(source.lookup("3").unwrap().is_none());
    }

    #[test]
    fn source_by_reference() {
        let source = InMemorySource::new().with_set("1", vec![]);
        let by_ref = &source;
        assert!(by_ref.lookup("1").unwrap().is_some());
    }
}
