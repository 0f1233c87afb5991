//! Build tasks that drive the MongoDB database tools
//!
//! This module holds what every tool task shares:
//! - The fixed set of supported tools and the availability probe
//! - Connection attributes and their validation
//! - The [`ToolTask`] trait that runs the common checks before a task's own
//! - The [`TaskLog`] sink tasks report their summary to
//!
//! Concrete tasks live in submodules; only `mongoexport` is implemented.

pub mod export;


use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{BuildError, Result};
use crate::process::{CommandLine, CommandRunner};

pub use export::{ExportFormat, ExportReport, ExportTask, ExportTaskBuilder};

/// Host used when none is configured
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// The MongoDB command-line tools a task may invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MongoTool {
    Import,
    Export,
    Restore,
    Dump,
    Files,
}

impl MongoTool {
    /// Every supported tool
    pub const ALL: [MongoTool; 5] = [
        MongoTool::Import,
        MongoTool::Export,
        MongoTool::Restore,
        MongoTool::Dump,
        MongoTool::Files,
    ];

    /// Executable name of the tool
    pub fn name(&self) -> &'static str {
        match self {
            MongoTool::Import => "mongoimport",
            MongoTool::Export => "mongoexport",
            MongoTool::Restore => "mongorestore",
            MongoTool::Dump => "mongodump",
            MongoTool::Files => "mongofiles",
        }
    }

    /// Look up a tool by its exact executable name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for MongoTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolves tool names to the program that gets executed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolLocator {
    bin_dir: Option<PathBuf>,
}

impl ToolLocator {
    /// Locator that looks tools up in `bin_dir`, or on `PATH` when `None`
    pub fn new(bin_dir: Option<PathBuf>) -> Self {
        Self { bin_dir }
    }

    /// Program path for `tool`
    pub fn program(&self, tool: MongoTool) -> PathBuf {
        match &self.bin_dir {
            Some(dir) => dir.join(tool.name()),
            None => PathBuf::from(tool.name()),
        }
    }

    /// Command line that runs `tool` with no arguments yet
    pub fn command(&self, tool: MongoTool) -> CommandLine {
        CommandLine::new(self.program(tool))
    }
}

/// Check whether a mongo tool can be executed
///
/// Unknown tool names are never available. Known ones are invoked with
/// `--help`; the tool is available when that exits with status zero.
pub fn is_tool_available<R: CommandRunner>(name: &str, locator: &ToolLocator, runner: &R) -> bool {
    let Some(tool) = MongoTool::from_name(name) else {
        debug!("'{}' is not a supported mongo tool", name);
        return false;
    };

    let probe = locator.command(tool).arg("--help");
    match runner.run(&probe) {
        Ok(output) => {
            debug!(
                "Probe of {} exited with {:?} (resolved to {:?})",
                tool,
                output.exit_code,
                which::which(locator.program(tool)).ok()
            );
            output.success()
        }
        Err(e) => {
            debug!("Probe of {} could not start: {}", tool, e);
            false
        }
    }
}

/// Connection attributes shared by every tool task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    host: Option<String>,
    db: Option<String>,
    collection: Option<String>,
    username: Option<String>,
    password: Option<String>,
    dbpath: Option<PathBuf>,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            host: Some(DEFAULT_HOST.to_string()),
            db: None,
            collection: None,
            username: None,
            password: None,
            dbpath: None,
        }
    }
}

impl ConnectionParams {
    pub fn builder() -> ConnectionParamsBuilder {
        ConnectionParamsBuilder::default()
    }

    /// Host to pass to the tool; an empty host counts as unset
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref().filter(|h| !h.is_empty())
    }

    pub fn db(&self) -> Option<&str> {
        self.db.as_deref()
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn dbpath(&self) -> Option<&Path> {
        self.dbpath.as_deref()
    }

    /// Username and password, only when both are set
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.username().zip(self.password())
    }

    /// Validate the connection attributes
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// collection, db, data path readability, then the credential pair.
    pub fn validate(&self) -> Result<()> {
        if self.collection().is_none_or(str::is_empty) {
            return Err(BuildError::MissingAttribute("collection").into());
        }
        if self.db().is_none_or(str::is_empty) {
            return Err(BuildError::MissingAttribute("db").into());
        }
        if let Some(path) = self.dbpath() {
            if !is_readable(path) {
                return Err(BuildError::UnreadableDbPath(path.to_path_buf()).into());
            }
        }
        match (self.username(), self.password()) {
            (Some(_), None) => Err(BuildError::PasswordMissing.into()),
            (None, Some(_)) => Err(BuildError::UsernameMissing.into()),
            _ => Ok(()),
        }
    }
}

/// Builder for [`ConnectionParams`]
#[derive(Debug, Clone, Default)]
pub struct ConnectionParamsBuilder {
    params: ConnectionParams,
}

impl ConnectionParamsBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.params.host = Some(host.into());
        self
    }

    pub fn db(mut self, db: impl Into<String>) -> Self {
        self.params.db = Some(db.into());
        self
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.params.collection = Some(collection.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.params.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.params.password = Some(password.into());
        self
    }

    pub fn dbpath(mut self, dbpath: impl Into<PathBuf>) -> Self {
        self.params.dbpath = Some(dbpath.into());
        self
    }

    pub fn build(self) -> ConnectionParams {
        self.params
    }
}

/// A readable file, or a directory whose entries can be listed
fn is_readable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => fs::read_dir(path).is_ok(),
        Ok(_) => File::open(path).is_ok(),
        Err(_) => false,
    }
}

/// A task that runs one of the mongo tools
///
/// Implementors supply their tool, their connection attributes and a hook
/// for task-specific validation. [`ToolTask::preflight`] runs everything
/// that has to pass before the tool itself is spawned, and hands back what
/// the task's own validation produced.
pub trait ToolTask {
    /// Outcome of task validation that the run goes on to use
    type Checked;

    /// Tool this task invokes
    fn tool(&self) -> MongoTool;

    /// Connection attributes of the task
    fn connection(&self) -> &ConnectionParams;

    /// Validation specific to this task
    fn validate_task_properties(&self) -> Result<Self::Checked>;

    /// Probe the tool, then run common and task validation
    fn preflight<R: CommandRunner>(
        &self,
        locator: &ToolLocator,
        runner: &R,
    ) -> Result<Self::Checked> {
        let tool = self.tool();
        if !is_tool_available(tool.name(), locator, runner) {
            return Err(BuildError::ToolUnavailable(tool.name().to_string()).into());
        }
        self.connection().validate()?;
        self.validate_task_properties()
    }
}

/// Sink for the one-line messages a task reports
pub trait TaskLog {
    fn log(&mut self, message: &str);
}

impl TaskLog for Vec<String> {
    fn log(&mut self, message: &str) {
        self.push(message.to_string());
    }
}

/// Forwards task messages to `tracing` at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl TaskLog for TracingLog {
    fn log(&mut self, message: &str) {
        info!("{}", message);
    }
}
