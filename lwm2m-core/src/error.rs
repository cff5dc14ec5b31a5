use crate::coap::CoapStatus;
use thiserror::Error;

/// Main error type for LWM2M server operations
#[derive(Error, Debug)]
pub enum Lwm2mError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Submission rejected: {0}")]
    Submission(String),

    #[error("Transaction failed with {0}")]
    Transaction(CoapStatus),

    #[error("Timeout")]
    Timeout,

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unknown client: {0}")]
    UnknownClient(String),

    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    #[error("Server is not running")]
    NotRunning,

    #[error("Target is not observed")]
    NotObserved,
}

/// Result type alias for LWM2M operations
pub type Lwm2mResult<T> = Result<T, Lwm2mError>;
