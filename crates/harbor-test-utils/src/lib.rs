//! Testing utilities for the harbor template workspace
//!
//! Shared template fixtures and migration-directory helpers.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use harbor_template::{Document, FieldPath, Value};
use tempfile::TempDir;

/// Template exercising every validator rule group without findings
pub const CLEAN_TEMPLATE: &str = "\
project:
  name: payments
  public: false
global_policies:
  - type: cve_allowlist
repositories:
  - name: api
    policies:
      - type: tag_immutability
    webhooks:
      - url: http://hooks.internal/api
        events: [PUSH_ARTIFACT]
    vulnerability_scanning:
      enabled: true
      severity: high
    retention:
      days: 30
monitoring:
  webhooks:
    - url: http://alerts.internal
      events: [SCANNING_FAILED]
";

/// Smallest valid template
pub const MINIMAL_TEMPLATE: &str = "project: p\nrepositories:\n  - name: r1\n";

/// Template with one problem in every rule group
pub const BROKEN_TEMPLATE: &str = "\
repositories:
  - policies:
      - type: scan
  - name: api
    policies:
      - scope: all
    webhooks:
      - url: http://hooks.internal/api
monitoring:
  webhooks:
    - events: [PUSH_ARTIFACT]
";

/// Parse a YAML fixture
pub fn doc(yaml: &str) -> Document {
    Document::from_yaml(yaml).unwrap()
}

/// Parse a dotted path
pub fn path(dotted: &str) -> FieldPath {
    dotted.parse().unwrap()
}

/// Value at `dotted` in `document`, if any
pub fn value_at<'a>(document: &'a Document, dotted: &str) -> Option<&'a Value> {
    document.get(&path(dotted))
}

/// Write `v{version}.json` into `dir`
pub fn write_migration_set(dir: &Path, version: &str, json: &str) -> PathBuf {
    let file = dir.join(format!("v{version}.json"));
    fs::write(&file, json).unwrap();
    file
}

/// Temporary workspace holding a template file and a `migrations` directory
#[derive(Debug)]
pub struct TemplateWorkspace {
    dir: TempDir,
}

impl TemplateWorkspace {
    /// Create workspace with `template.yaml` containing `yaml`
    pub fn new(yaml: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("migrations")).unwrap();
        fs::write(dir.path().join("template.yaml"), yaml).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn migrations(&self) -> PathBuf {
        self.dir.path().join("migrations")
    }

    /// Add a migration set to the `migrations` directory
    pub fn with_migration(self, version: &str, json: &str) -> Self {
        write_migration_set(&self.migrations(), version, json);
        self
    }

    /// Read a file in the workspace as a document
    pub fn load(&self, name: &str) -> Document {
        Document::load(self.dir.path().join(name)).unwrap()
    }
}
