use thiserror::Error;

pub type Result<T> = std::result::Result<T, BreakpointError>;

#[derive(Debug, Error)]
pub enum BreakpointError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse CSS: {0}")]
    CssParse(String),

    #[error("failed to fetch stylesheet: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("invalid URL `{0}`")]
    InvalidUrl(String),
}
