mod logging;
mod output;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use dbscaffold_core::{Database, DotNetNaming, Error as CoreError, validate_schema};
use dbscaffold_settings::{
    ProjectConfig, SettingsError, ValidationReport, load_project_value, project_json_schema,
    validate_project,
};
use dbscaffold_synth::{NoHooks, Scaffolder, SynthesisError};
use logging::init_logging;
use output::{print_json, write_json_atomic};
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_PROJECT_NAME: &str = "Database";

#[derive(Debug, Error)]
enum CliError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid project config: {0} error(s)")]
    InvalidConfig(usize),
}

#[derive(Parser, Debug)]
#[command(name = "dbscaffold", version, about = "Scaffold ORM code models from a database schema")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build definitions for every table and view.
    Scaffold(ScaffoldArgs),
    /// Validate a project config against a schema snapshot.
    Check(CheckArgs),
    /// Print a JSON Schema for one of the input documents.
    Schema(SchemaArgs),
}

#[derive(Args, Debug)]
struct ScaffoldArgs {
    /// Path to schema.json.
    #[arg(long)]
    schema: PathBuf,
    /// Project config (`.toml` or `.json`).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output path for definitions JSON; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Write logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[arg(long)]
    schema: PathBuf,
    #[arg(long)]
    config: PathBuf,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    #[arg(long, value_enum)]
    kind: SchemaKind,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SchemaKind {
    Database,
    Project,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Scaffold(args) => run_scaffold(args),
        Command::Check(args) => run_check(args),
        Command::Schema(args) => run_schema(args),
    }
}

fn run_scaffold(args: ScaffoldArgs) -> Result<(), CliError> {
    init_logging(args.log_file.as_deref())?;
    let timer = Instant::now();

    let database = load_database(&args.schema)?;
    info!(
        event = "schema_loaded",
        path = %args.schema.display(),
        tables = database.tables.len(),
        views = database.views.len()
    );

    let config = match &args.config {
        Some(path) => load_config(path, &database)?,
        None => {
            let name = database.name.as_deref().unwrap_or(DEFAULT_PROJECT_NAME);
            ProjectConfig::new(name, name)
        }
    };

    let naming = DotNetNaming::new();
    let mut scaffolder = Scaffolder::from_config(&database, &naming, &config)?;
    let output = scaffolder.run(&mut NoHooks);

    for error in &output.report.errors {
        warn!(
            event = "object_failed",
            object = error.object.as_deref().unwrap_or_default(),
            code = %error.code,
            message = %error.message
        );
    }

    match &args.out {
        Some(path) => {
            write_json_atomic(path, &output)?;
            info!(event = "definitions_written", path = %path.display());
        }
        None => print_json(&output)?,
    }

    info!(
        event = "run_finished",
        definitions = output.definitions.len(),
        failed = output.report.objects_failed,
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<(), CliError> {
    let database = load_database(&args.schema)?;
    let project = load_project_value(&args.config)?;
    let report = match validate_project(&project, &database) {
        Ok((_, report)) => report,
        Err(report) => report,
    };
    print_json(&report)?;

    if report.is_ok() {
        Ok(())
    } else {
        Err(CliError::InvalidConfig(report.errors.len()))
    }
}

fn run_schema(args: SchemaArgs) -> Result<(), CliError> {
    match args.kind {
        SchemaKind::Database => print_json(&schemars::schema_for!(Database))?,
        SchemaKind::Project => print_json(&project_json_schema())?,
    }
    Ok(())
}

fn load_database(path: &Path) -> Result<Database, CliError> {
    let contents = std::fs::read_to_string(path)?;
    let database = Database::from_json(&contents)?;
    validate_schema(&database)?;
    Ok(database)
}

fn load_config(path: &Path, database: &Database) -> Result<ProjectConfig, CliError> {
    let project = load_project_value(path)?;
    match validate_project(&project, database) {
        Ok((config, report)) => {
            log_warnings(&report);
            Ok(config)
        }
        Err(report) => {
            for issue in &report.errors {
                warn!(
                    event = "config_error",
                    code = %issue.code,
                    path = %issue.path,
                    message = %issue.message
                );
            }
            Err(CliError::InvalidConfig(report.errors.len()))
        }
    }
}

fn log_warnings(report: &ValidationReport) {
    for issue in &report.warnings {
        warn!(
            event = "config_warning",
            code = %issue.code,
            path = %issue.path,
            message = %issue.message
        );
    }
}
