//! Command-line interface for mongotask
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and merging with arguments
//! - Dispatching to the export task, the build file runner and helpers

pub mod completion;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::build::{BuildFile, BuildRunner, ExportEntry};
use crate::config::{Config, LogLevel};
use crate::error::{BuildError, ConfigError, MongoTaskError, Result};
use crate::process::SystemRunner;
use crate::task::{ExportTask, TaskLog, TracingLog, is_tool_available};

/// Run the MongoDB database tools as build tasks
#[derive(Parser, Debug)]
#[command(
    name = "mongotask",
    version,
    about = "Run mongoexport and the other MongoDB tools as build tasks",
    long_about = "Validates task attributes, builds the mongo tool command line, runs it and
reports a one-line summary. Tasks run one at a time, either from flags or from a TOML build file."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Directory containing the mongo tools (defaults to PATH lookup)
    #[arg(long, value_name = "DIR", global = true)]
    pub bin_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv", global = true)]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for mongotask
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a collection with mongoexport
    Export(ExportArgs),

    /// Run every task of a TOML build file in order
    Run {
        /// Build file listing the tasks
        #[arg(value_name = "BUILD_FILE")]
        build_file: PathBuf,

        /// Continue with the remaining tasks after a failure
        #[arg(long)]
        keep_going: bool,

        /// Print the task reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether a mongo tool can be executed
    Probe {
        /// Tool name (mongoimport, mongoexport, mongorestore, mongodump, mongofiles)
        #[arg(value_name = "TOOL")]
        tool: String,
    },

    /// Show or validate configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish)
        #[arg(value_name = "SHELL")]
        shell: String,
    },

    /// Show version information
    Version,
}

/// Attributes of a single export task
#[derive(Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// Server to export from
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Database name
    #[arg(long, value_name = "NAME")]
    pub db: Option<String>,

    /// Collection name
    #[arg(long, value_name = "NAME")]
    pub collection: Option<String>,

    /// Username for authentication
    #[arg(long, value_name = "USERNAME")]
    pub username: Option<String>,

    /// Password for authentication
    #[arg(
        long,
        value_name = "PASSWORD",
        env = "MONGOTASK_PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// mongod data directory
    #[arg(long, value_name = "PATH")]
    pub dbpath: Option<PathBuf>,

    /// Export type (json, csv)
    #[arg(long = "type", value_name = "TYPE")]
    pub export_type: Option<String>,

    /// Comma separated field names (required for csv)
    #[arg(long, value_name = "FIELDS")]
    pub fields: Option<String>,

    /// Query filter as a JSON string
    #[arg(long, value_name = "JSON")]
    pub query: Option<String>,

    /// Output file (defaults to <collection>.<type>)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output_file: Option<String>,

    /// Print the task report as JSON
    #[arg(long)]
    pub json: bool,
}

impl From<&ExportArgs> for ExportEntry {
    fn from(args: &ExportArgs) -> Self {
        ExportEntry {
            name: None,
            host: args.host.clone(),
            db: args.db.clone(),
            collection: args.collection.clone(),
            username: args.username.clone(),
            password: args.password.clone(),
            dbpath: args.dbpath.clone(),
            export_type: args.export_type.clone(),
            fields: args.fields.clone(),
            query: args.query.clone(),
            output_file: args.output_file.clone(),
        }
    }
}

/// Task log that prints messages for the user
pub struct ConsoleLog;

impl TaskLog for ConsoleLog {
    fn log(&mut self, message: &str) {
        println!("{}", message);
    }
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Parse the process arguments and load configuration
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Build the interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    /// Load configuration from file and merge with arguments
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load_from_file(args.config_file.as_deref())?;
        Self::apply_args_to_config(&mut config, args);
        Ok(config)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Override configuration values with CLI arguments where provided
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        if let Some(dir) = &args.bin_dir {
            config.tools.bin_dir = Some(dir.clone());
        }

        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };

        if let Commands::Run {
            keep_going: true, ..
        } = &args.command
        {
            config.runner.keep_going = true;
        }
    }

    /// Build the export task from flags and connection defaults
    pub fn export_task(&self, args: &ExportArgs) -> ExportTask {
        ExportEntry::from(args).to_task(&self.config.connection)
    }

    /// Execute the selected subcommand
    pub fn execute(&self) -> Result<()> {
        match &self.args.command {
            Commands::Export(args) => self.run_export(args),
            Commands::Run {
                build_file, json, ..
            } => self.run_build(build_file, *json),
            Commands::Probe { tool } => self.probe(tool),
            Commands::Config { show, validate } => self.handle_config_command(*show, *validate),
            Commands::Completion { shell } => completion::generate_completion(shell),
            Commands::Version => {
                self.show_version();
                Ok(())
            }
        }
    }

    fn task_log(&self, json: bool) -> Box<dyn TaskLog> {
        if json || self.args.quiet {
            Box::new(TracingLog)
        } else {
            Box::new(ConsoleLog)
        }
    }

    fn run_export(&self, args: &ExportArgs) -> Result<()> {
        let task = self.export_task(args);
        let mut log = self.task_log(args.json);
        let report = task.run(&self.config.tool_locator(), &SystemRunner, &mut *log)?;

        if args.json {
            println!("{}", to_json(&report)?);
        }
        Ok(())
    }

    fn run_build(&self, path: &std::path::Path, json: bool) -> Result<()> {
        let file = BuildFile::load(path)?;
        if file.is_empty() {
            tracing::warn!("Build file {} contains no tasks", path.display());
        }

        let runner = BuildRunner::new(
            self.config.tool_locator(),
            self.config.connection.clone(),
            self.config.runner.keep_going,
        );
        let mut log = self.task_log(json);
        let outcome = runner.run(&file, &SystemRunner, &mut *log)?;

        if json {
            println!("{}", to_json(&outcome)?);
        }

        if outcome.is_success() {
            Ok(())
        } else {
            Err(MongoTaskError::Generic(format!(
                "Build failed: {} of {} tasks failed ({})",
                outcome.failures.len(),
                file.len(),
                outcome
                    .failures
                    .iter()
                    .map(|f| f.task.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }

    fn probe(&self, tool: &str) -> Result<()> {
        if is_tool_available(tool, &self.config.tool_locator(), &SystemRunner) {
            if !self.args.quiet {
                println!("{} is available", tool);
            }
            Ok(())
        } else {
            Err(BuildError::ToolUnavailable(tool.to_string()).into())
        }
    }

    /// Handle config subcommand
    fn handle_config_command(&self, show: bool, validate: bool) -> Result<()> {
        if validate {
            self.validate_config_file()?;
        }

        if show || !validate {
            self.show_config()?;
        }

        Ok(())
    }

    /// Validate configuration file
    fn validate_config_file(&self) -> Result<()> {
        let path = self.get_config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("❌ Configuration file does not exist");
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        match self.config.validate() {
            Ok(()) => {
                println!("✅ Configuration is valid");
                Ok(())
            }
            Err(e) => {
                println!("❌ Configuration validation failed: {}", e);
                Err(e)
            }
        }
    }

    /// Show effective configuration
    fn show_config(&self) -> Result<()> {
        println!("Configuration file: {}", self.get_config_path().display());
        println!();
        println!("{}", self.config.to_toml()?);
        Ok(())
    }

    /// Get configuration file path (from args or default)
    fn get_config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_config_path)
    }

    /// Show version information
    fn show_version(&self) {
        println!("mongotask version {}", env!("CARGO_PKG_VERSION"));
        println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| MongoTaskError::Generic(format!("Failed to encode report: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(argv: &[&str]) -> CliInterface {
        let args = CliArgs::try_parse_from(argv).unwrap();
        let mut config = Config::default();
        CliInterface::apply_args_to_config(&mut config, &args);
        CliInterface { args, config }
    }

    fn export_args(cli: &CliInterface) -> &ExportArgs {
        match &cli.args().command {
            Commands::Export(args) => args,
            other => panic!("expected export, got {other:?}"),
        }
    }

    #[test]
    fn test_export_args_parsing() {
        let cli = cli(&[
            "mongotask",
            "export",
            "--db",
            "mydb",
            "--collection",
            "mycol",
            "--type",
            "CSV",
            "--fields",
            "a,b",
            "--query",
            "{\"x\": 1}",
            "-o",
            "out.csv",
        ]);
        let args = export_args(&cli);
        assert_eq!(args.db.as_deref(), Some("mydb"));
        assert_eq!(args.export_type.as_deref(), Some("CSV"));
        assert_eq!(args.output_file.as_deref(), Some("out.csv"));

        let task = cli.export_task(args);
        assert_eq!(task.export_type(), "csv");
        assert_eq!(task.fields(), Some("a,b"));
        assert_eq!(task.query(), Some("{\"x\": 1}"));
        assert_eq!(task.output_file(), "out.csv");
    }

    #[test]
    fn test_export_task_uses_config_defaults() {
        let mut cli = cli(&["mongotask", "export", "--db", "d", "--collection", "c"]);
        cli.config.connection.host = "mongo.ci".to_string();
        cli.config.connection.username = Some("ci".to_string());
        cli.config.connection.password = Some("pw".to_string());

        let task = cli.export_task(export_args(&cli));
        let conn = crate::task::ToolTask::connection(&task);
        assert_eq!(conn.host(), Some("mongo.ci"));
        assert_eq!(conn.credentials(), Some(("ci", "pw")));
        assert_eq!(task.output_file(), "c.json");
    }

    #[test]
    fn test_username_flag_alone_does_not_take_config_password() {
        let mut cli = cli(&[
            "mongotask",
            "export",
            "--db",
            "d",
            "--collection",
            "c",
            "--username",
            "alice",
        ]);
        cli.config.connection.username = Some("ci".to_string());
        cli.config.connection.password = Some("pw".to_string());

        let task = cli.export_task(export_args(&cli));
        let conn = crate::task::ToolTask::connection(&task);
        assert_eq!(conn.username(), Some("alice"));
        assert_eq!(conn.password(), None);
        assert!(matches!(
            conn.validate(),
            Err(MongoTaskError::Build(BuildError::PasswordMissing))
        ));
    }

    #[test]
    fn test_flags_override_config() {
        let cli = cli(&[
            "mongotask",
            "--bin-dir",
            "/opt/mongo/bin",
            "-v",
            "run",
            "build.toml",
            "--keep-going",
        ]);
        assert_eq!(
            cli.config().tools.bin_dir,
            Some(PathBuf::from("/opt/mongo/bin"))
        );
        assert_eq!(cli.config().logging.level, LogLevel::Debug);
        assert!(cli.config().runner.keep_going);
    }

    #[test]
    fn test_quiet_lowers_log_level() {
        let cli = cli(&["mongotask", "probe", "mongodump", "-q"]);
        assert_eq!(cli.config().logging.level, LogLevel::Error);
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(CliArgs::try_parse_from(["mongotask"]).is_err());
    }

    #[test]
    fn test_from_args_reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[connection]\nhost = \"db.local\"\n").unwrap();

        let args = CliArgs::try_parse_from([
            "mongotask",
            "--config",
            path.to_str().unwrap(),
            "version",
        ])
        .unwrap();
        let cli = CliInterface::from_args(args).unwrap();
        assert_eq!(cli.config().connection.host, "db.local");
    }

    #[test]
    fn test_validate_missing_config_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let cli = cli(&[
            "mongotask",
            "--config",
            path.to_str().unwrap(),
            "config",
            "--validate",
        ]);

        let err = cli.execute().unwrap_err();
        assert!(matches!(
            err,
            MongoTaskError::Config(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_probe_unknown_tool_fails() {
        let cli = cli(&["mongotask", "probe", "mongo"]);
        let err = cli.execute().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Required mongo tool 'mongo' is not available."
        );
    }
}
