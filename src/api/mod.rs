//! Purpose: Define the stable public Rust API boundary for pointbase.
//! Exports: Store, query, codec, and error types needed by callers and the CLI.
//! Role: Public, additive-only surface; callers do not reach into `core` paths.
//! Invariants: Everything a consumer needs is re-exported here.

pub use crate::core::codec::{Record, Style};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::query::{Criteria, Criterion, filter, filter_indexed};
pub use crate::core::store::{Backup, DEFAULT_BACKUP_SUFFIX, SaveOptions, Store};
