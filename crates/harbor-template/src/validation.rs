//! Template validation
//!
//! [`TemplateValidator`] checks a registry project template and collects
//! findings into a [`ValidationReport`]. Errors make the template invalid;
//! warnings are best-practice advisories and never affect validity.
//!
//! Rule groups run independently:
//! 1. structure: required top-level fields
//! 2. repositories: names, policy types, webhook shape
//! 3. monitoring: webhook shape
//! 4. best practices (warnings only)

use std::path::Path;

use serde::Serialize;

use crate::document::Document;
use crate::value::{Map, Value};

/// Top-level fields every template must carry, checked in order
pub const REQUIRED_FIELDS: [&str; 2] = ["project", "repositories"];

/// Name used in advisories for repositories without a `name`
const UNKNOWN_REPOSITORY: &str = "unknown";

/// Findings from one validation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationReport {
    /// Report for a template that could not be loaded
    #[must_use]
    pub fn load_failure(cause: impl std::fmt::Display) -> Self {
        Self {
            errors: vec![format!("Failed to load template: {cause}")],
            warnings: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    #[inline]
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// True when no errors were found
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// True when neither errors nor warnings were found
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Validator for registry project templates
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateValidator;

impl TemplateValidator {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Load and validate a template file
    ///
    /// Load failures are reported as a single error rather than returned.
    #[must_use]
    pub fn validate_file(&self, path: impl AsRef<Path>) -> ValidationReport {
        let path = path.as_ref();
        match Document::load(path) {
            Ok(document) => self.validate(&document),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "template load failed");
                ValidationReport::load_failure(e)
            }
        }
    }

    /// Validate a loaded template
    #[must_use]
    pub fn validate(&self, document: &Document) -> ValidationReport {
        let mut report = ValidationReport::default();

        let root = match document.root() {
            Value::Null => {
                report.error("Template is empty");
                return report;
            }
            Value::Map(map) => map,
            _ => {
                report.error("Template root must be a mapping");
                return report;
            }
        };

        check_structure(root, &mut report);
        check_repositories(root, &mut report);
        check_monitoring(root, &mut report);
        check_best_practices(root, &mut report);

        tracing::debug!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "template validated"
        );
        report
    }
}

fn check_structure(root: &Map, report: &mut ValidationReport) {
    if let Some(field) = REQUIRED_FIELDS.iter().find(|f| !root.contains_key(**f)) {
        report.error(format!("Missing required field: {field}"));
    }
}

fn check_repositories(root: &Map, report: &mut ValidationReport) {
    let Some(repositories) = root.get("repositories") else {
        return;
    };
    let Some(repositories) = repositories.as_sequence() else {
        report.error("Field repositories must be a list");
        return;
    };

    for repository in repositories {
        let Some(name) = repository.get("name") else {
            report.error("Repository missing name field");
            continue;
        };

        if let Some(policies) = repository.get("policies") {
            match policies.as_sequence() {
                Some(policies) => {
                    for _ in policies.iter().filter(|p| !p.contains_key("type")) {
                        report.error(format!("Policy in {name} missing type"));
                    }
                }
                None => report.error(format!("Policies in {name} must be a list")),
            }
        }

        if let Some(webhooks) = repository.get("webhooks") {
            match webhooks.as_sequence() {
                Some(webhooks) => {
                    for _ in webhooks.iter().filter(|w| !is_valid_webhook(w)) {
                        report.error(format!("Invalid webhook in {name}"));
                    }
                }
                None => report.error(format!("Webhooks in {name} must be a list")),
            }
        }
    }
}

fn check_monitoring(root: &Map, report: &mut ValidationReport) {
    let Some(webhooks) = root.get("monitoring").and_then(|m| m.get("webhooks")) else {
        return;
    };
    match webhooks.as_sequence() {
        Some(webhooks) => {
            for _ in webhooks.iter().filter(|w| !is_valid_webhook(w)) {
                report.error("Invalid monitoring webhook configuration");
            }
        }
        None => report.error("Monitoring webhooks must be a list"),
    }
}

fn check_best_practices(root: &Map, report: &mut ValidationReport) {
    if !root.contains_key("global_policies") {
        report.warning("Consider adding global policies");
    }

    let repositories = root
        .get("repositories")
        .and_then(Value::as_sequence)
        .unwrap_or_default();

    for repository in repositories {
        if !repository.contains_key("vulnerability_scanning") {
            let name = repository
                .get("name")
                .map_or_else(|| UNKNOWN_REPOSITORY.to_string(), ToString::to_string);
            report.warning(format!("Repository {name} missing vulnerability scanning"));
        }
    }

    if !repositories.iter().any(|r| r.contains_key("retention")) {
        report.warning("Consider adding retention policies");
    }
}

/// Webhooks need both a target and the events that trigger it
fn is_valid_webhook(webhook: &Value) -> bool {
    webhook.contains_key("url") && webhook.contains_key("events")
}
