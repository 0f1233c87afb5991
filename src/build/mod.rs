//! Build file runner
//!
//! A build file is a TOML document listing tasks to run in order:
//!
//! ```toml
//! [[export]]
//! db = "app"
//! collection = "users"
//! type = "csv"
//! fields = "name,email"
//! output_file = "build/users.csv"
//! ```
//!
//! Each entry takes the same attributes as a single task. Connection
//! attributes left out fall back to the `[connection]` section of the
//! configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ConnectionDefaults;
use crate::error::{ConfigError, Result};
use crate::process::CommandRunner;
use crate::task::{ExportReport, ExportTask, TaskLog, ToolLocator};

/// Parsed build file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildFile {
    #[serde(default)]
    pub export: Vec<ExportEntry>,
}

/// Attributes of one `[[export]]` entry
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportEntry {
    /// Label used in logs; defaults to `<db>.<collection>`
    pub name: Option<String>,
    pub host: Option<String>,
    pub db: Option<String>,
    pub collection: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub dbpath: Option<PathBuf>,
    #[serde(rename = "type")]
    pub export_type: Option<String>,
    pub fields: Option<String>,
    pub query: Option<String>,
    pub output_file: Option<String>,
}

impl BuildFile {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            ConfigError::InvalidFormat(format!("{}: {}", path.display(), e)).into()
        })
    }

    /// Number of tasks in the file
    pub fn len(&self) -> usize {
        self.export.len()
    }

    pub fn is_empty(&self) -> bool {
        self.export.is_empty()
    }
}

impl ExportEntry {
    /// Label for logs and failure reports
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            format!(
                "{}.{}",
                self.db.as_deref().unwrap_or("?"),
                self.collection.as_deref().unwrap_or("?")
            )
        })
    }

    /// Build the task, filling unset connection attributes from `defaults`
    pub fn to_task(&self, defaults: &ConnectionDefaults) -> ExportTask {
        let mut builder = ExportTask::builder().host(
            self.host
                .clone()
                .unwrap_or_else(|| defaults.host.clone()),
        );

        if let Some(db) = &self.db {
            builder = builder.db(db);
        }
        if let Some(collection) = &self.collection {
            builder = builder.collection(collection);
        }
        // Credentials are inherited as a pair, and only when the entry sets neither
        let (username, password) = match (&self.username, &self.password) {
            (None, None) => (&defaults.username, &defaults.password),
            own => own,
        };
        if let Some(username) = username {
            builder = builder.username(username);
        }
        if let Some(password) = password {
            builder = builder.password(password);
        }
        if let Some(dbpath) = self.dbpath.as_ref().or(defaults.dbpath.as_ref()) {
            builder = builder.dbpath(dbpath);
        }
        if let Some(export_type) = &self.export_type {
            builder = builder.export_type(export_type);
        }
        if let Some(fields) = &self.fields {
            builder = builder.fields(fields);
        }
        if let Some(query) = &self.query {
            builder = builder.query(query);
        }
        if let Some(output_file) = &self.output_file {
            builder = builder.output_file(output_file);
        }

        builder.build()
    }
}

/// A task that failed while the build kept going
#[derive(Debug, Clone, Serialize)]
pub struct TaskFailure {
    pub task: String,
    pub error: String,
}

/// Result of running a build file
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildOutcome {
    pub reports: Vec<ExportReport>,
    pub failures: Vec<TaskFailure>,
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs the tasks of a build file in order
#[derive(Debug, Clone)]
pub struct BuildRunner {
    locator: ToolLocator,
    defaults: ConnectionDefaults,
    keep_going: bool,
}

impl BuildRunner {
    pub fn new(locator: ToolLocator, defaults: ConnectionDefaults, keep_going: bool) -> Self {
        Self {
            locator,
            defaults,
            keep_going,
        }
    }

    /// Run every task of `file`
    ///
    /// Without `keep_going` the first failing task's error is returned as
    /// is. With it, failures are collected in the outcome and the remaining
    /// tasks still run.
    pub fn run<R, L>(&self, file: &BuildFile, runner: &R, log: &mut L) -> Result<BuildOutcome>
    where
        R: CommandRunner,
        L: TaskLog + ?Sized,
    {
        let mut outcome = BuildOutcome::default();
        let total = file.len();

        for (index, entry) in file.export.iter().enumerate() {
            let label = entry.label();
            info!("[{}/{}] export {}", index + 1, total, label);

            match entry.to_task(&self.defaults).run(&self.locator, runner, log) {
                Ok(report) => outcome.reports.push(report),
                Err(e) if self.keep_going => {
                    warn!("Task {} failed: {}", label, e);
                    outcome.failures.push(TaskFailure {
                        task: label,
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outcome)
    }
}
