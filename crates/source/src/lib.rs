//! Read-only access to the repositories holding the raw registration XML and
//! renewal TSV files.

pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::SourceFetcher;
pub use crate::models::{EntryKind, SourceEntry};
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type SourceHandle = Arc<dyn SourceFetcher + Send + Sync>;
