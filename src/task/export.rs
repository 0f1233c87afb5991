//! Export task driving `mongoexport`
//!
//! An [`ExportTask`] is assembled from attributes with [`ExportTaskBuilder`]
//! and run exactly once:
//!
//! 1. Resolve the output file (`<collection>.<type>` unless set)
//! 2. Probe `mongoexport`, then validate connection and export attributes
//! 3. Build the `mongoexport` command line and run it
//! 4. Turn the first line the tool prints into the logged summary

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::error::{BuildError, Result};
use crate::process::{CommandLine, CommandRunner};

use super::{ConnectionParams, ConnectionParamsBuilder, MongoTool, TaskLog, ToolLocator, ToolTask};

/// Export types accepted by `mongoexport`
pub const SUPPORTED_TYPES: [&str; 2] = ["csv", "json"];

/// Output format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Parse a type name, ignoring case
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a successful export reports back
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub db: String,
    pub collection: String,
    pub output_file: String,
    /// First line printed by the tool, capitalized
    pub summary: String,
    /// The full message handed to the task log
    pub message: String,
}

/// A single `mongoexport` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTask {
    connection: ConnectionParams,
    export_type: String,
    fields: Option<String>,
    query: Option<String>,
    output_file: Option<String>,
}

impl ExportTask {
    pub fn builder() -> ExportTaskBuilder {
        ExportTaskBuilder::default()
    }

    /// Requested export type, lowercased but not yet validated
    pub fn export_type(&self) -> &str {
        &self.export_type
    }

    pub fn fields(&self) -> Option<&str> {
        self.fields.as_deref()
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Output file, defaulting to `<collection>.<type>`
    pub fn output_file(&self) -> String {
        match &self.output_file {
            Some(file) => file.clone(),
            None => format!(
                "{}.{}",
                self.connection.collection().unwrap_or_default(),
                self.export_type
            ),
        }
    }

    /// Check the export type and its field requirement
    pub fn validate_export(&self) -> Result<ExportFormat> {
        let format = ExportFormat::parse(&self.export_type).ok_or_else(|| {
            BuildError::UnsupportedType {
                found: self.export_type.clone(),
                supported: SUPPORTED_TYPES.iter().map(|t| t.to_string()).collect(),
            }
        })?;

        if format == ExportFormat::Csv && self.fields().is_none_or(|f| f.trim().is_empty()) {
            return Err(BuildError::MissingFields.into());
        }

        Ok(format)
    }

    /// Assemble the `mongoexport` invocation
    ///
    /// Optional flags are appended in a fixed order: host, credentials,
    /// data path, query, fields, then `--csv`.
    pub fn command_line(
        &self,
        locator: &ToolLocator,
        format: ExportFormat,
        output_file: &str,
    ) -> CommandLine {
        let conn = &self.connection;
        let mut cmd = locator
            .command(MongoTool::Export)
            .flag("-d", conn.db().unwrap_or_default())
            .flag("-c", conn.collection().unwrap_or_default())
            .flag("-o", output_file);

        if let Some(host) = conn.host() {
            cmd = cmd.flag("-h", host);
        }
        if let Some((username, password)) = conn.credentials() {
            cmd = cmd.flag("-u", username).flag("-p", password);
        }
        if let Some(dbpath) = conn.dbpath() {
            cmd = cmd.flag("--dbpath", dbpath);
        }
        if let Some(query) = self.query() {
            cmd = cmd.flag("-q", query);
        }
        if let Some(fields) = self.fields() {
            cmd = cmd.flag("-f", fields);
        }
        if format == ExportFormat::Csv {
            cmd = cmd.arg("--csv");
        }

        cmd
    }

    /// Run the export and log its summary
    ///
    /// Nothing is spawned besides the availability probe until every
    /// validation step has passed. Any failure ends the run with a
    /// [`BuildError`] and nothing is logged.
    pub fn run<R, L>(&self, locator: &ToolLocator, runner: &R, log: &mut L) -> Result<ExportReport>
    where
        R: CommandRunner,
        L: TaskLog + ?Sized,
    {
        let output_file = self.output_file();

        let format = self.preflight(locator, runner)?;

        let command = self.command_line(locator, format, &output_file);
        let rendered = command.redacted();
        debug!("Exporting with: {}", rendered);

        let output = runner.run(&command).map_err(|source| BuildError::SpawnFailed {
            command: rendered.clone(),
            source,
        })?;

        if !output.success() {
            return Err(BuildError::CommandFailed { command: rendered }.into());
        }

        let summary = output
            .first_line()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(capitalize_first)
            .ok_or(BuildError::EmptyOutput { command: rendered })?;

        let db = self.connection.db().unwrap_or_default().to_string();
        let collection = self.connection.collection().unwrap_or_default().to_string();
        let message = format!("{summary} from '{db}.{collection}' into '{output_file}'.");
        log.log(&message);

        Ok(ExportReport {
            db,
            collection,
            output_file,
            summary,
            message,
        })
    }
}

impl ToolTask for ExportTask {
    type Checked = ExportFormat;

    fn tool(&self) -> MongoTool {
        MongoTool::Export
    }

    fn connection(&self) -> &ConnectionParams {
        &self.connection
    }

    fn validate_task_properties(&self) -> Result<ExportFormat> {
        self.validate_export()
    }
}

/// Uppercase the first character, leaving the rest untouched
fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Builder for [`ExportTask`], one setter per task attribute
#[derive(Debug, Clone)]
pub struct ExportTaskBuilder {
    connection: ConnectionParamsBuilder,
    export_type: String,
    fields: Option<String>,
    query: Option<String>,
    output_file: Option<String>,
}

impl Default for ExportTaskBuilder {
    fn default() -> Self {
        Self {
            connection: ConnectionParams::builder(),
            export_type: ExportFormat::Json.as_str().to_string(),
            fields: None,
            query: None,
            output_file: None,
        }
    }
}

impl ExportTaskBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.connection = self.connection.host(host);
        self
    }

    pub fn db(mut self, db: impl Into<String>) -> Self {
        self.connection = self.connection.db(db);
        self
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.connection = self.connection.collection(collection);
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.connection = self.connection.username(username);
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.connection = self.connection.password(password);
        self
    }

    pub fn dbpath(mut self, dbpath: impl Into<PathBuf>) -> Self {
        self.connection = self.connection.dbpath(dbpath);
        self
    }

    /// Export type; stored lowercased and validated when the task runs
    pub fn export_type(mut self, export_type: impl AsRef<str>) -> Self {
        self.export_type = export_type.as_ref().to_lowercase();
        self
    }

    /// Comma separated list of field names
    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    /// Query filter as a JSON string, passed through untouched
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn output_file(mut self, output_file: impl Into<String>) -> Self {
        self.output_file = Some(output_file.into());
        self
    }

    pub fn build(self) -> ExportTask {
        ExportTask {
            connection: self.connection.build(),
            export_type: self.export_type,
            fields: self.fields,
            query: self.query,
            output_file: self.output_file,
        }
    }
}
