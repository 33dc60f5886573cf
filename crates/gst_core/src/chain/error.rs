use gst_chainbase::ChainbaseError;
use gst_serialization::{ReadError, WriteError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("internal error")]
    InternalError(Option<String>),
    #[error("database error: {0}")]
    DatabaseError(String),
    #[error("serialization error: {0}")]
    SerializationError(String),
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("account already exists: {0}")]
    AccountAlreadyExists(String),
    #[error("transaction cpu usage exceeded: {0}")]
    TxCpuUsageExceeded(String),
    #[error("transaction net usage exceeded: {0}")]
    TxNetUsageExceeded(String),
    #[error("block resource exhausted: {0}")]
    BlockResourceExhausted(String),
    #[error("ram usage exceeded: {0}")]
    RamUsageExceeded(String),
    #[error("ram usage overflow: {0}")]
    RamUsageOverflow(String),
    #[error("ram usage underflow: {0}")]
    RamUsageUnderflow(String),
    #[error("insufficient gas: {0}")]
    InsufficientGas(String),
    #[error("gas not provisioned: {0}")]
    GasNotProvisioned(String),
    #[error("rate limiting state inconsistent: {0}")]
    RateLimitingStateInconsistent(String),
}

impl From<ChainbaseError> for ChainError {
    fn from(err: ChainbaseError) -> Self {
        ChainError::DatabaseError(err.to_string())
    }
}

impl From<ReadError> for ChainError {
    fn from(err: ReadError) -> Self {
        ChainError::SerializationError(err.to_string())
    }
}

impl From<WriteError> for ChainError {
    fn from(err: WriteError) -> Self {
        ChainError::SerializationError(err.to_string())
    }
}
