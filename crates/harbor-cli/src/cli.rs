//! Command-line definition

use std::path::PathBuf;

use anyhow::Context;
use clap::{crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::report::ReportFormat;

/// Parsed invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub config: Option<PathBuf>,
    pub log_json: bool,
    pub verbose: u8,
    pub command: CliCommand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Validate(ValidateArgs),
    Migrate(MigrateArgs),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateArgs {
    pub template: PathBuf,
    pub format: ReportFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateArgs {
    pub template: PathBuf,
    pub version: String,
    pub output: Option<PathBuf>,
    pub migrations_dir: Option<PathBuf>,
    pub strict: bool,
    pub require_valid: bool,
    pub dry_run: bool,
}

/// Build the clap command tree
#[must_use]
pub fn command() -> Command {
    Command::new("harbor-template")
        .version(crate_version!())
        .about("Validate registry project templates and migrate them between versions")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Config file (default: ./harbor-template.toml if present)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v info, -vv debug)"),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate a template and print a report")
                .arg(template_arg())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .default_value("text")
                        .value_parser(["text", "json"])
                        .help("Report format"),
                ),
        )
        .subcommand(
            Command::new("migrate")
                .about("Apply the migration set for a version")
                .arg(template_arg())
                .arg(
                    Arg::new("to")
                        .long("to")
                        .required(true)
                        .value_name("VERSION")
                        .help("Target version; reads v<VERSION>.json from the migrations directory"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_name("FILE")
                        .value_parser(value_parser!(PathBuf))
                        .help("Where to write the migrated template (default: overwrite input)"),
                )
                .arg(
                    Arg::new("migrations-dir")
                        .long("migrations-dir")
                        .value_name("DIR")
                        .value_parser(value_parser!(PathBuf))
                        .help("Migration sets directory (default: migrations/ next to the template)"),
                )
                .arg(
                    Arg::new("strict")
                        .long("strict")
                        .action(ArgAction::SetTrue)
                        .help("Report skipped operations and exit non-zero if any"),
                )
                .arg(
                    Arg::new("require-valid")
                        .long("require-valid")
                        .action(ArgAction::SetTrue)
                        .help("Do not write the result unless it validates"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Print the migrated template instead of writing it"),
                ),
        )
}

fn template_arg() -> Arg {
    Arg::new("template")
        .required(true)
        .value_name("TEMPLATE")
        .value_parser(value_parser!(PathBuf))
        .help("Path to the template file (YAML, or JSON with a .json extension)")
}

impl Cli {
    /// Parse process arguments, exiting on usage errors
    ///
    /// # Errors
    /// Returns error if matches are missing a required value
    pub fn parse() -> anyhow::Result<Self> {
        Self::from_matches(&command().get_matches())
    }

    /// Parse an explicit argument list
    ///
    /// # Errors
    /// Returns error on usage errors
    pub fn try_parse_from<I, T>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::from_matches(&command().try_get_matches_from(args)?)
    }

    fn from_matches(matches: &ArgMatches) -> anyhow::Result<Self> {
        let command = match matches.subcommand() {
            Some(("validate", args)) => {
                let format = args
                    .get_one::<String>("format")
                    .and_then(|name| ReportFormat::from_name(name))
                    .unwrap_or_default();
                CliCommand::Validate(ValidateArgs {
                    template: required_path(args, "template")?,
                    format,
                })
            }
            Some(("migrate", args)) => CliCommand::Migrate(MigrateArgs {
                template: required_path(args, "template")?,
                version: args
                    .get_one::<String>("to")
                    .cloned()
                    .context("missing --to")?,
                output: args.get_one::<PathBuf>("output").cloned(),
                migrations_dir: args.get_one::<PathBuf>("migrations-dir").cloned(),
                strict: args.get_flag("strict"),
                require_valid: args.get_flag("require-valid"),
                dry_run: args.get_flag("dry-run"),
            }),
            Some((other, _)) => anyhow::bail!("unknown command '{other}'"),
            None => anyhow::bail!("no command given"),
        };

        Ok(Self {
            config: matches.get_one::<PathBuf>("config").cloned(),
            log_json: matches.get_flag("log-json"),
            verbose: matches.get_count("verbose"),
            command,
        })
    }
}

fn required_path(args: &ArgMatches, id: &str) -> anyhow::Result<PathBuf> {
    args.get_one::<PathBuf>(id)
        .cloned()
        .with_context(|| format!("missing <{}>", id.to_uppercase()))
}
