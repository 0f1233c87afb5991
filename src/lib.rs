//! mongotask library
//!
//! Runs the MongoDB database tools as build tasks: attributes are validated,
//! the tool command line is assembled and run once, and the tool's first
//! output line becomes a one-line summary.
//!
//! # Modules
//!
//! - `build`: TOML build files running several tasks in order
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `error`: Error types and handling
//! - `process`: Command lines and the subprocess runner
//! - `task`: Connection attributes, tool probe and the export task
//!
//! # Example
//!
//! ```no_run
//! use mongotask::process::SystemRunner;
//! use mongotask::task::{ExportTask, ToolLocator};
//!
//! let task = ExportTask::builder()
//!     .db("mydb")
//!     .collection("mycol")
//!     .export_type("csv")
//!     .fields("name,email")
//!     .build();
//!
//! let mut log: Vec<String> = Vec::new();
//! let report = task.run(&ToolLocator::default(), &SystemRunner, &mut log)?;
//! assert_eq!(report.output_file, "mycol.csv");
//! # Ok::<(), mongotask::MongoTaskError>(())
//! ```

pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod process;
pub mod task;

// Re-export commonly used types
pub use build::{BuildFile, BuildRunner};
pub use config::Config;
pub use error::{BuildError, MongoTaskError, Result};
pub use process::{CommandLine, CommandRunner, SystemRunner};
pub use task::{ExportTask, MongoTool};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}
