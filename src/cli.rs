use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use time::{Duration, UtcDateTime};

/// Load CCE registration XML and CCR renewal TSV into SQLite, then index
/// what changed.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Only import files changed within this many seconds; also the index
    /// checkpoint.
    #[arg(short = 't', long = "time", value_name = "SECONDS")]
    pub time: Option<u32>,
    /// Only import files for this catalog year.
    #[arg(short, long)]
    pub year: Option<u16>,
    /// Skip registrations (`cce`) or renewals (`ccr`) for this run.
    #[arg(short = 'x', long, value_enum)]
    pub exclude: Option<Exclude>,
    /// Drop and recreate every table before importing.
    #[arg(long)]
    pub reinitialize: bool,
    /// Explicit configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Exclude {
    Cce,
    Ccr,
}

impl Cli {
    /// The instant files must have changed after, relative to `now`.
    pub fn lookback(&self, now: UtcDateTime) -> Option<UtcDateTime> {
        self.time.map(|seconds| now - Duration::seconds(i64::from(seconds)))
    }

    pub fn registrations(&self) -> bool {
        self.exclude != Some(Exclude::Cce)
    }

    pub fn renewals(&self) -> bool {
        self.exclude != Some(Exclude::Ccr)
    }
}
