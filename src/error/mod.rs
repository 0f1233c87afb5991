//! Error handling module for mongotask.
//!
//! All task failures surface as [`BuildError`], wrapped in the crate-wide
//! [`MongoTaskError`]. Configuration and build-file loading problems are
//! reported as [`ConfigError`].
//!
//! # Example
//!
//! ```rust
//! use mongotask::error::{BuildError, MongoTaskError, Result};
//!
//! fn require_db(db: Option<&str>) -> Result<&str> {
//!     db.filter(|d| !d.is_empty())
//!         .ok_or_else(|| BuildError::MissingAttribute("db").into())
//! }
//!
//! let err = require_db(None).unwrap_err();
//! assert!(matches!(err, MongoTaskError::Build(_)));
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{BuildError, ConfigError, MongoTaskError, Result};
