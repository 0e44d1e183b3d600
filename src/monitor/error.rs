use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No targets available to monitor")]
    NoTargets,

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("Concurrency gate closed")]
    GateClosed,
}

pub type Result<T> = std::result::Result<T, MonitorError>;
