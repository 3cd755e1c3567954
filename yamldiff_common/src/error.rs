use thiserror::Error;

#[derive(Error, Debug)]
pub enum YamlDiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {source_name} at line {line}, column {column}: {message}")]
    Parse {
        source_name: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Report error: {0}")]
    Report(String),
}

impl YamlDiffError {
    /// Returns true for errors raised because an input document is malformed
    pub fn is_parse_error(&self) -> bool {
        matches!(self, YamlDiffError::Parse { .. })
    }
}

pub type Result<T> = std::result::Result<T, YamlDiffError>;
