//! SQLite store for imported registration entries and renewals.
//!
//! # Architecture
//! - **Volumes**: one per registration file, keyed by the file's path in the
//!   source repository.
//! - **Entries (CCE)**: keyed by the uuid from the source XML, owning their
//!   registrations, authors, publishers, LCCNs and raw XML snapshots.
//! - **Quarantined entries**: append-only records of entries that failed to
//!   parse.
//! - **Renewals (CCR)**: keyed by the row id of the renewal file, owning their
//!   claimants and linked to any number of registrations.
//!
//! Imports write through a [`Session`]; the indexer reads through a
//! [`Repository`].

mod db;
pub mod error;
mod load;
pub mod models;
mod repo;
mod session;

pub use crate::db::Database;
pub use crate::repo::Repository;
pub use crate::session::{Session, saved_id};
