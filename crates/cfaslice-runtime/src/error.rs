use cfaslice_core::IrError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Ir(#[from] IrError),
    #[error("Cannot read configuration {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Cannot write timing table: {0}")]
    Csv(#[from] csv::Error),
    #[error("Timing tables are only recorded in sequential mode")]
    TimingRequiresSequential,
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
