use thiserror::Error;

pub type CapsuleResult<T> = Result<T, CapsuleError>;

#[derive(Debug, Error)]
pub enum CapsuleError {
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
