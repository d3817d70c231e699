use thiserror::Error;

#[derive(Error, Debug)]
pub enum TdError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Locale error: {0}")]
    Locale(String),

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("Write-back worker stopped")]
    WorkerGone,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TdError>;
