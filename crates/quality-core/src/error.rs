use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Malformed or out-of-range input that could not be clamped
    #[error("Validation error: {0}")]
    Validation(String),

    /// The data provider returned nothing for the requested scope
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// Missing or invalid constant, raised when a component is constructed
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Data provider error: {0}")]
    Provider(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Report formatting failed")]
    Format(#[from] std::fmt::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
