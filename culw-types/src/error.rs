pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Unsupported body kind: {0}")]
    UnsupportedBody(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),
}
