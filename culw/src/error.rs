//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] culw_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] culw_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] culw_types::Error),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),
}

impl Error {
    /// Check if error is a bus command refused before anything was written
    pub fn is_rejection(&self) -> bool {
        match self {
            Self::Core(e) => e.is_rejection(),
            Self::Types(_) | Self::NotSupported(_) => true,
            _ => false,
        }
    }
}
