use thiserror::Error;

#[derive(Error, Debug)]
pub enum UsmError {
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid device selector: {0:?}")]
    InvalidSelector(String),

    #[error("No device matches selector: {0}")]
    NoDeviceFound(String),

    #[error("No queue available")]
    NoQueueAvailable,

    #[error("Out of memory")]
    OutOfMemory,

    #[error("Copy of {requested} bytes does not fit allocation of {nbytes} bytes")]
    CopyOutOfBounds { requested: usize, nbytes: usize },
}

// A convenient alias
pub type UsmResult<T> = Result<T, UsmError>;
