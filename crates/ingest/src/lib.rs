//! Discovery and import of registration (CCE) and renewal (CCR) files.
//!
//! Both importers are exposed as streams of [`ImportEvent`]s. Files are
//! imported one at a time in discovery order, each inside its own store
//! session; the first failing file ends the stream with an error after its
//! session was rolled back.

pub mod error;
mod discover;
mod registration;
mod renewal;
mod stats;
mod sync;

pub use crate::discover::{registration_files, renewal_files};
pub use crate::registration::{import_registration_file, import_registrations};
pub use crate::renewal::{import_renewal_file, import_renewals};
pub use crate::stats::ImportStats;
use time::UtcDateTime;

/// Which files a run should consider.
#[derive(Debug, Clone, Copy, Default)]
pub struct Context {
    /// Only files changed at or after this instant; `None` imports everything.
    pub since: Option<UtcDateTime>,
    /// Only files for this catalog year.
    pub year: Option<u16>,
}

/// Progress events emitted by [`import_registrations`] and
/// [`import_renewals`].
///
/// [`Started`](Self::Started) and [`DiscoveryComplete`](Self::DiscoveryComplete)
/// come first, then one [`Imported`](Self::Imported) per file, then
/// [`Complete`](Self::Complete) with the run totals. An error ends the stream
/// early and `Complete` is never emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportEvent {
    Started,
    DiscoveryComplete(u64),
    Imported { path: String, stats: ImportStats },
    Complete(ImportStats),
}
