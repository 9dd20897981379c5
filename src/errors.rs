use thiserror::Error;

use crate::observations::mpc_80col::ParseObsError;
use crate::observations::TrackletError;

#[derive(Error, Debug)]
pub enum Digest2Error {
    #[error("Error parsing 80 column file: {0}")]
    Parsing80ColumnFileError(#[from] ParseObsError),

    #[error("Invalid tracklet: {0}")]
    InvalidTracklet(#[from] TrackletError),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP ureq error: {0}")]
    UreqHttpError(#[from] Box<ureq::Error>),

    #[error("Data unreadable in observatory code file: {0}")]
    UnreadableObsCodeFile(String),

    #[error("Unknown observatory code: {0}")]
    UnknownObservatory(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Observational error > 10 arc seconds not allowed (got {0})")]
    ObsErrTooLarge(f64),

    #[error("Population model encoding error: {0}")]
    ModelEncoding(#[from] bincode::Error),

    #[error("Inconsistent population model: {0}")]
    InvalidModel(String),

    #[error("Invalid solver parameter: {0}")]
    InvalidSolverParameter(String),

    #[error("Observations do not resolve a great circle")]
    DegenerateGreatCircle,
}

impl From<ureq::Error> for Digest2Error {
    fn from(e: ureq::Error) -> Self {
        Digest2Error::UreqHttpError(Box::new(e))
    }
}
