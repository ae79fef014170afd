//! Command implementations
//!
//! Each command returns a [`Status`]; hard failures (unreadable template,
//! bad migration set, I/O) come back as errors instead.

use std::path::{Path, PathBuf};

use anyhow::Context;
use harbor_template::{
    DirectorySource, Document, DocumentFormat, MigrationMode, Migrator, MigratorConfig,
    TemplateValidator,
};

use crate::cli::{MigrateArgs, ValidateArgs};
use crate::config::ToolConfig;
use crate::report;

/// Directory name searched next to the template when none is configured
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Command result that is not a hard failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Everything succeeded
    Success,
    /// Invalid template, strict-mode skip or gated write
    Failure,
}

/// Validate a template and print the report to stdout
///
/// # Errors
/// Returns error if the report cannot be rendered
pub fn run_validate(args: &ValidateArgs) -> anyhow::Result<Status> {
    let report = TemplateValidator::new().validate_file(&args.template);
    print!("{}", report::render(&args.template, &report, args.format)?);
    if args.format == report::ReportFormat::Json {
        println!();
    }

    Ok(if report.is_valid() {
        Status::Success
    } else {
        Status::Failure
    })
}

/// Settings for one migrate run after merging config and flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratePlan {
    pub template: PathBuf,
    pub version: String,
    pub output: PathBuf,
    pub migrations_dir: PathBuf,
    pub mode: MigrationMode,
    pub require_valid: bool,
    pub dry_run: bool,
}

impl MigratePlan {
    /// Merge flags over configuration
    #[must_use]
    pub fn resolve(args: &MigrateArgs, config: &ToolConfig) -> Self {
        let migrations_dir = args
            .migrations_dir
            .clone()
            .or_else(|| config.migrations_dir.clone())
            .unwrap_or_else(|| default_migrations_dir(&args.template));

        let mode = if args.strict || config.strict {
            MigrationMode::Strict
        } else {
            MigrationMode::Lenient
        };

        Self {
            template: args.template.clone(),
            version: args.version.clone(),
            output: args.output.clone().unwrap_or_else(|| args.template.clone()),
            migrations_dir,
            mode,
            require_valid: args.require_valid || config.require_valid,
            dry_run: args.dry_run,
        }
    }
}

fn default_migrations_dir(template: &Path) -> PathBuf {
    template
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(DEFAULT_MIGRATIONS_DIR)
}

/// Migrate a template and write the result
///
/// # Errors
/// Returns error if the template or migration set cannot be loaded, an
/// operation fails, or the output cannot be written
pub fn run_migrate(args: &MigrateArgs, config: &ToolConfig) -> anyhow::Result<Status> {
    let plan = MigratePlan::resolve(args, config);
    tracing::debug!(?plan, "migrate");

    // Dry runs own stdout for the document
    let notice = |message: &str| {
        if plan.dry_run {
            eprintln!("{message}");
        } else {
            println!("{message}");
        }
    };

    let document = Document::load(&plan.template)
        .with_context(|| format!("failed to load template {}", plan.template.display()))?;

    let migrator = Migrator::new(DirectorySource::new(&plan.migrations_dir))
        .with_config(MigratorConfig::new().with_mode(plan.mode));
    let set = migrator
        .load(&plan.version)
        .with_context(|| format!("failed to load migrations for version {}", plan.version))?;
    if !set.is_found() {
        notice(&format!("No migrations found for version {}", plan.version));
    }

    let outcome = set
        .apply(&document, migrator.config().mode)
        .with_context(|| format!("failed to apply migrations for version {}", plan.version))?;
    for warning in outcome.warnings() {
        eprintln!("Warning: {warning}");
    }

    let report = TemplateValidator::new().validate(&outcome.document);
    for error in report.errors() {
        eprintln!("Error: {error}");
    }
    for warning in report.warnings() {
        eprintln!("Warning: {warning}");
    }

    if plan.require_valid && !report.is_valid() {
        eprintln!(
            "Migrated template is invalid; not writing {}",
            plan.output.display()
        );
        return Ok(Status::Failure);
    }

    if plan.dry_run {
        let text = outcome
            .document
            .render(DocumentFormat::from_path(&plan.output))
            .context("failed to render migrated template")?;
        print!("{text}");
    } else {
        outcome
            .document
            .save(&plan.output)
            .with_context(|| format!("failed to write {}", plan.output.display()))?;
        notice(&format!(
            "Template migrated successfully to {}",
            plan.output.display()
        ));
    }
    notice(&format!(
        "Applied {} operation(s), skipped {}",
        outcome.applied,
        outcome.skipped.len()
    ));

    if outcome.mode == MigrationMode::Strict && !outcome.skipped.is_empty() {
        return Ok(Status::Failure);
    }
    Ok(Status::Success)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(template: &str) -> MigrateArgs {
        MigrateArgs {
            template: PathBuf::from(template),
            version: "2".to_string(),
            output: None,
            migrations_dir: None,
            strict: false,
            require_valid: false,
            dry_run: false,
        }
    }

    #[test]
    fn defaults_next_to_template() {
        let plan = MigratePlan::resolve(&args("conf/template.yaml"), &ToolConfig::default());
        assert_eq!(plan.migrations_dir, PathBuf::from("conf/migrations"));
        assert_eq!(plan.output, PathBuf::from("conf/template.yaml"));
        assert_eq!(plan.mode, MigrationMode::Lenient);
        assert!(!plan.require_valid);
    }

    #[test]
    fn bare_file_name_uses_relative_migrations() {
        let plan = MigratePlan::resolve(&args("template.yaml"), &ToolConfig::default());
        assert_eq!(plan.migrations_dir, PathBuf::from("migrations"));
    }

    #[test]
    fn flags_override_config() {
        let config = ToolConfig {
            migrations_dir: Some(PathBuf::from("from-config")),
            ..ToolConfig::default()
        };
        let mut flags = args("t.yaml");
        assert_eq!(
            MigratePlan::resolve(&flags, &config).migrations_dir,
            PathBuf::from("from-config")
        );

        flags.migrations_dir = Some(PathBuf::from("from-flag"));
        assert_eq!(
            MigratePlan::resolve(&flags, &config).migrations_dir,
            PathBuf::from("from-flag")
        );
    }

    #[test]
    fn config_enables_strict_and_gate() {
        let config = ToolConfig {
            strict: true,
            require_valid: true,
            ..ToolConfig::default()
        };
        let plan = MigratePlan::resolve(&args("t.yaml"), &config);
        assert_eq!(plan.mode, MigrationMode::Strict);
        assert!(plan.require_valid);
    }
}
