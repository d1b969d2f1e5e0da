use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuroraLinkError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("message is {len} bytes, maximum is {max}")]
    MessageTooLong { len: usize, max: usize },

    #[error("no packet in progress")]
    NoSequence,

    #[error("insufficient frames: {collected} collected, {required} required, missing {missing:?}")]
    InsufficientFrames {
        collected: usize,
        required: usize,
        missing: Vec<u8>,
    },

    #[error("Reed-Solomon decode failed for byte column {column}")]
    FecDecodeFailure { column: usize },

    #[error("recovered payload is not valid UTF-8")]
    InvalidUtf8,
}

pub type Result<T> = std::result::Result<T, AuroraLinkError>;
