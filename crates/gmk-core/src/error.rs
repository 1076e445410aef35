use thiserror::Error;

#[derive(Debug, Error)]
pub enum GmkError {
    #[error("Construction error: {0}")]
    Construction(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Topology error: {0}")]
    Topology(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, GmkError>;
