use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Which stage of the run failed.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open source repository")]
    Source,
    #[display("could not open database")]
    Database,
    #[display("import of {_0} failed")]
    Import(#[error(not(source))] &'static str),
    #[display("indexing failed")]
    Index,
}
