// crates/gce-builder-cli/src/main.rs
// ============================================================================
// Module: GCE Builder CLI Entry Point
// Description: Command dispatcher for builder configuration workflows.
// Purpose: Validate layered builder configuration from the command line.
// Dependencies: clap, gce-builder-config, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! The `gce-builder` CLI loads a base configuration layer plus optional
//! override files and inline `--set` assignments, runs the validator, and
//! reports the resolved configuration or every violation found. Security
//! posture: all inputs are untrusted and validation fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use gce_builder_config::CONFIG_ENV_VAR;
use gce_builder_config::ConfigValidator;
use gce_builder_config::GoogleComputeConfig;
use gce_builder_config::RawConfig;
use gce_builder_config::ValidatedConfig;
use gce_builder_config::ValidationErrors;
use gce_builder_config::load_raw_config;
use gce_builder_config::recognized_keys;
use gce_builder_config::resolve_config_path;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "gce-builder", version, disable_help_subcommand = true)]
struct Cli {
    /// Enable debug logging when `RUST_LOG` is unset.
    #[arg(short, long, action = ArgAction::SetTrue, global = true)]
    verbose: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a layered builder configuration.
    Validate(ConfigValidateCommand),
    /// List every recognized configuration key.
    Keys,
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Base config file (defaults to gce-builder.toml or `GCE_BUILDER_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Override layer files, applied in order after the base layer.
    #[arg(long = "override", value_name = "PATH")]
    overrides: Vec<PathBuf>,
    /// Inline `KEY=VALUE` assignments, applied last.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    assignments: Vec<(String, Value)>,
    /// Output format for the validation report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Output formats for validation reports.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable summary.
    Text,
    /// Pretty-printed JSON.
    Json,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Installs the stderr tracing subscriber.
///
/// A valid `RUST_LOG` is used as-is; otherwise `verbose` picks DEBUG or WARN.
fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(command),
        ConfigCommand::Keys => command_config_keys(),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: ConfigValidateCommand) -> CliResult<ExitCode> {
    let base_path =
        resolve_config_path(command.config.as_deref(), std::env::var(CONFIG_ENV_VAR).ok());
    let base = load_raw_config(&base_path)
        .map_err(|err| CliError::new(format!("failed to load {}: {err}", base_path.display())))?;

    let mut layers = Vec::with_capacity(command.overrides.len() + 1);
    for path in &command.overrides {
        let layer = load_raw_config(path)
            .map_err(|err| CliError::new(format!("failed to load {}: {err}", path.display())))?;
        layers.push(layer);
    }
    if !command.assignments.is_empty() {
        layers.push(assignment_layer(command.assignments));
    }
    tracing::debug!(
        base = %base_path.display(),
        overrides = layers.len(),
        "validating builder config"
    );

    match ConfigValidator::new().validate(&base, &layers) {
        Ok(validated) => {
            let output = match command.format {
                OutputFormat::Text => render_config_text(&validated.config),
                OutputFormat::Json => render_config_json(&validated)?,
            };
            write_stdout(&output)?;
            for warning in &validated.warnings {
                tracing::warn!(warning = %warning, "config warning");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(errors) => {
            if command.format == OutputFormat::Json {
                write_stdout(&render_errors_json(&errors)?)?;
            }
            Err(CliError::new(errors.to_string()))
        }
    }
}

/// Executes the config keys command.
fn command_config_keys() -> CliResult<ExitCode> {
    let mut output = String::new();
    for key in recognized_keys() {
        output.push_str(key);
        output.push('\n');
    }
    write_stdout(&output)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Inline Assignments
// ============================================================================

/// Parses a `KEY=VALUE` assignment.
///
/// Values starting with `[` or `{` are parsed as JSON; anything else is kept
/// as a string so weak coercion applies during validation.
fn parse_assignment(input: &str) -> Result<(String, Value), String> {
    let (key, value) =
        input.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got {input}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("assignment key must not be empty".to_string());
    }
    let trimmed = value.trim_start();
    let value = if trimmed.starts_with('[') || trimmed.starts_with('{') {
        serde_json::from_str(trimmed).map_err(|err| format!("invalid JSON for {key}: {err}"))?
    } else {
        Value::String(value.to_string())
    };
    Ok((key.to_string(), value))
}

/// Collects assignments into a raw layer; later duplicates win.
fn assignment_layer(assignments: Vec<(String, Value)>) -> RawConfig {
    let mut layer = RawConfig::new();
    for (key, value) in assignments {
        layer.insert(key, value);
    }
    layer
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders a validated config as a short text summary.
fn render_config_text(config: &GoogleComputeConfig) -> String {
    let mut output = String::from("Config valid\n");
    let rows = [
        ("project_id", config.project_id.as_str()),
        ("zone", config.zone.as_str()),
        ("region", config.region.as_str()),
        ("source_image", config.source_image.as_str()),
        ("machine_type", config.machine_type.as_str()),
        ("image_name", config.image_name.as_str()),
        ("on_host_maintenance", config.on_host_maintenance.as_str()),
        ("communicator", config.comm.kind.as_str()),
    ];
    for (key, value) in rows {
        let _ = writeln!(output, "  {key}: {value}");
    }
    output
}

/// Renders a validated config and its warnings as JSON.
fn render_config_json(validated: &ValidatedConfig) -> CliResult<String> {
    let config = serde_json::to_value(&validated.config)
        .map_err(|err| CliError::new(format!("failed to render JSON: {err}")))?;
    let document = json!({
        "valid": true,
        "config": config,
        "warnings": validated.warnings,
    });
    to_pretty_json(&document)
}

/// Renders validation errors as JSON.
fn render_errors_json(errors: &ValidationErrors) -> CliResult<String> {
    let entries: Vec<Value> = errors
        .errors()
        .iter()
        .map(|error| {
            json!({
                "field": error.field(),
                "message": error.to_string(),
            })
        })
        .collect();
    to_pretty_json(&json!({ "valid": false, "errors": entries }))
}

/// Serializes a JSON document with a trailing newline.
fn to_pretty_json(document: &Value) -> CliResult<String> {
    let mut text = serde_json::to_string_pretty(document)
        .map_err(|err| CliError::new(format!("failed to render JSON: {err}")))?;
    text.push('\n');
    Ok(text)
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Writes text to stdout.
fn write_stdout(text: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    stdout
        .write_all(text.as_bytes())
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
