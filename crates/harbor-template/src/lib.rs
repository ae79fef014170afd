//! Harbor Template Toolkit
//!
//! Validation and declarative field migrations for container-registry
//! project templates.
//!
//! # Core Concepts
//!
//! - [`Document`]: a parsed template (YAML or JSON) over the [`Value`] tree
//! - [`FieldPath`]: dotted address into a document (`a.b.c`)
//! - [`TemplateValidator`]: structural checks and best-practice advisories
//! - [`Operation`]: one field-level edit (add, rename, remove, modify)
//! - [`MigrationSet`]: ordered operations registered under a version
//! - [`Migrator`]: loads sets from a [`MigrationSource`] and applies them
//!
//! # Example
//!
//! ```
//! use harbor_template::{Document, TemplateValidator};
//!
//! let document = Document::from_yaml("repositories: []\n").unwrap();
//! let report = TemplateValidator::new().validate(&document);
//!
//! assert!(!report.is_valid());
//! assert_eq!(report.errors(), ["Missing required field: project"]);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod document;
pub mod error;
pub mod migration;
pub mod path;
pub mod validation;
pub mod value;

pub use document::{Document, DocumentFormat};
pub use error::{DocumentError, HarborResult, MigrationError, PathError, TransformError};
pub use migration::{
    Applied, DirectorySource, FormatTemplate, InMemorySource, MigrationMode, MigrationOutcome,
    MigrationSet, MigrationSource, Migrator, MigratorConfig, Operation, SkipReason,
    SkippedOperation, Transform,
};
pub use path::FieldPath;
pub use validation::{TemplateValidator, ValidationReport};
pub use value::{Map, Value};

/// Common imports
pub mod prelude {
    pub use crate::{
        Document, FieldPath, HarborResult, MigrationError, MigrationMode, MigrationSource,
        Migrator, MigratorConfig, TemplateValidator, ValidationReport, Value,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    const TEMPLATE: &str = "\
project:
  name: payments
repositories:
  - name: api
    policies:
      - type: tag_retention
        severity: low
    webhooks:
      - url: http://hooks.internal/api
        events: [PUSH_ARTIFACT]
  - name: worker
    vulnerability_scanning:
      enabled: true
";

    const MIGRATION: &str = r#"[
        {"operation": "add_field", "path": "global_policies", "value": []},
        {"operation": "rename_field", "old_path": "project.name", "new_path": "project.display_name"},
        {"operation": "modify_field", "path": "project.display_name",
         "transform": {"type": "format", "format": "team-{value}"}},
        {"operation": "remove_field", "path": "legacy.settings"}
    ]"#;

    #[test]
    fn validate_migrate_validate() {
        let document = Document::from_yaml(TEMPLATE).unwrap();
        let validator = TemplateValidator::new();

        let before = validator.validate(&document);
        assert!(before.is_valid());
        assert!(before
            .warnings()
            .contains(&"Consider adding global policies".to_string()));

        let mut source = InMemorySource::new();
        source.insert_json("2.0", MIGRATION).unwrap();
        let outcome = Migrator::new(source).migrate(&document, "2.0").unwrap();

        assert_eq!(outcome.applied, 3);
        assert_eq!(outcome.skipped.len(), 1);

        let migrated = &outcome.document;
        let display_name: FieldPath = "project.display_name".parse().unwrap();
        assert_eq!(migrated.get(&display_name), Some(&Value::from("team-payments")));

        let after = validator.validate(migrated);
        assert!(after.is_valid());
        assert!(!after
            .warnings()
            .contains(&"Consider adding global policies".to_string()));
    }

    #[test]
    fn migrated_yaml_keeps_key_order() {
        let document = Document::from_yaml("b: 1\na: 2\nc: 3\n").unwrap();
        let mut source = InMemorySource::new();
        source
            .insert_json("1", r#"[{"operation": "rename_field", "old_path": "a", "new_path": "z"}]"#)
            .unwrap();

        let outcome = Migrator::new(source).migrate(&document, "1").unwrap();
        assert_eq!(outcome.document.to_yaml().unwrap(), "b: 1\nz: 2\nc: 3\n");
    }

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
