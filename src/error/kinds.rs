use std::path::PathBuf;
use std::{fmt, io};

/// Crate-wide `Result` type using [`MongoTaskError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, MongoTaskError>;

/// Top-level error type for mongotask operations.
#[derive(Debug)]
pub enum MongoTaskError {
    /// Task validation or execution failures.
    Build(BuildError),

    /// Configuration and build file errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Failures raised by a task while it validates or runs.
///
/// Every variant is fatal to the task that raised it; the caller decides
/// whether the surrounding build continues.
#[derive(Debug)]
pub enum BuildError {
    /// A mandatory attribute is unset or empty.
    MissingAttribute(&'static str),

    /// The data directory does not exist or cannot be read.
    UnreadableDbPath(PathBuf),

    /// Username given without a password.
    PasswordMissing,

    /// Password given without a username.
    UsernameMissing,

    /// The export type is not one of the supported types.
    UnsupportedType { found: String, supported: Vec<String> },

    /// CSV export requested without a field list.
    MissingFields,

    /// The required tool is unknown or cannot be executed.
    ToolUnavailable(String),

    /// The tool could not be started at all.
    SpawnFailed { command: String, source: io::Error },

    /// The tool exited with a non-zero status.
    CommandFailed { command: String },

    /// The tool succeeded but printed nothing to summarize.
    EmptyOutput { command: String },
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config or build file not found.
    FileNotFound(String),

    /// Invalid TOML or schema mismatch.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },

    /// Anything else that went wrong while handling configuration.
    Generic(String),
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for MongoTaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MongoTaskError::Build(e) => write!(f, "{e}"),
            MongoTaskError::Config(e) => write!(f, "Configuration error: {e}"),
            MongoTaskError::Io(e) => write!(f, "I/O error: {e}"),
            MongoTaskError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::MissingAttribute(name) => {
                write!(f, "Mandatory attribute {name} not set.")
            }
            BuildError::UnreadableDbPath(path) => write!(
                f,
                "Specified mongod data path '{}' does not exist or is not readable.",
                path.display()
            ),
            BuildError::PasswordMissing => {
                write!(f, "No password set while username specified.")
            }
            BuildError::UsernameMissing => {
                write!(f, "No username set while password specified.")
            }
            BuildError::UnsupportedType { found, supported } => write!(
                f,
                "Specified export type '{found}' is not supported. Supported types are {}.",
                supported.join(", ")
            ),
            BuildError::MissingFields => write!(
                f,
                "Export type 'csv' requires fields to be set via the fields attribute."
            ),
            BuildError::ToolUnavailable(tool) => {
                write!(f, "Required mongo tool '{tool}' is not available.")
            }
            BuildError::SpawnFailed { command, source } => {
                write!(f, "Failed to start the mongo tool '{command}': {source}")
            }
            BuildError::CommandFailed { command } => {
                write!(f, "Export failed for the mongo tool '{command}'.")
            }
            BuildError::EmptyOutput { command } => write!(
                f,
                "Export for the mongo tool '{command}' produced no summary output."
            ),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "File not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
            ConfigError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for MongoTaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MongoTaskError::Build(e) => Some(e),
            MongoTaskError::Config(e) => Some(e),
            MongoTaskError::Io(e) => Some(e),
            MongoTaskError::Generic(_) => None,
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::SpawnFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}

/* ========================= Conversions to MongoTaskError ========================= */

impl From<io::Error> for MongoTaskError {
    fn from(err: io::Error) -> Self {
        MongoTaskError::Io(err)
    }
}

impl From<BuildError> for MongoTaskError {
    fn from(err: BuildError) -> Self {
        MongoTaskError::Build(err)
    }
}

impl From<ConfigError> for MongoTaskError {
    fn from(err: ConfigError) -> Self {
        MongoTaskError::Config(err)
    }
}

impl From<toml::de::Error> for MongoTaskError {
    fn from(err: toml::de::Error) -> Self {
        MongoTaskError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_messages() {
        assert_eq!(
            BuildError::MissingAttribute("collection").to_string(),
            "Mandatory attribute collection not set."
        );
        assert_eq!(
            BuildError::UnsupportedType {
                found: "xml".to_string(),
                supported: vec!["csv".to_string(), "json".to_string()],
            }
            .to_string(),
            "Specified export type 'xml' is not supported. Supported types are csv, json."
        );
        assert_eq!(
            BuildError::ToolUnavailable("mongoexport".to_string()).to_string(),
            "Required mongo tool 'mongoexport' is not available."
        );
    }

    #[test]
    fn test_build_error_displays_unwrapped() {
        let err: MongoTaskError = BuildError::MissingFields.into();
        assert_eq!(
            err.to_string(),
            "Export type 'csv' requires fields to be set via the fields attribute."
        );
    }

    #[test]
    fn test_config_error_is_prefixed() {
        let err: MongoTaskError = ConfigError::FileNotFound("x.toml".to_string()).into();
        assert_eq!(err.to_string(), "Configuration error: File not found: x.toml");
    }
}
