//! Parsing of the raw catalog files.
//!
//! - [`parse_registrations`]: one year's registration XML into a volume
//!   header plus one parsed (or rejected) item per `copyrightEntry`.
//! - [`parse_renewals`]: one year's renewal TSV into rows.
//!
//! Nothing here touches storage; reconciling parsed records against what was
//! imported before is the importer's job.

pub mod claimant;
mod consts;
pub mod date;
pub mod error;
pub mod lccn;
pub mod models;
pub mod regnum;
mod registration;
mod renewal;

pub use crate::registration::{RegistrationDocument, parse_registrations};
pub use crate::renewal::parse_renewals;
