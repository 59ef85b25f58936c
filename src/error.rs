use std::num::ParseIntError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("PES packet length {0} does not fit in 16 bits")]
    UnrepresentableLength(usize),

    #[error("missing codec configuration")]
    MissingConfiguration,

    #[error("invalid PES start code: {0:02x?}")]
    InvalidStartCode([u8; 3]),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("parse int error: {0}")]
    ParseInt(#[from] ParseIntError),
}

pub type Result<T> = std::result::Result<T, TsError>;
