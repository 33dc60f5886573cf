use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainbaseError {
    #[error("item not found")]
    NotFound,
    #[error("item already exists")]
    AlreadyExists,
    #[error("invalid data provided")]
    InvalidData,
    #[error("error reading data")]
    ReadError,
    #[error("internal error: {0}")]
    InternalError(String),
}
