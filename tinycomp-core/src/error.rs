use thiserror::Error;

use crate::span::Position;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{message}")]
    Parse { position: Position, message: String },
    #[error("{message}")]
    Analysis { position: Position, message: String },
    #[error("{0}")]
    Generation(String),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn parse(position: Position, message: impl Into<String>) -> Self {
        CoreError::Parse {
            position,
            message: message.into(),
        }
    }

    pub fn analysis(position: Position, message: impl Into<String>) -> Self {
        CoreError::Analysis {
            position,
            message: message.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        CoreError::Generation(message.into())
    }

    /// Position the error refers to, `(0, 0)` for errors without one.
    pub fn position(&self) -> Position {
        match self {
            CoreError::Parse { position, .. } | CoreError::Analysis { position, .. } => *position,
            CoreError::Generation(_) | CoreError::Io(_) => Position::default(),
        }
    }
}

/// The first error of a compilation, located in the input file.
#[derive(Debug, Error)]
#[error("{path}:{}:{}: {source}", .source.position().line, .source.position().col)]
pub struct CompileError {
    pub path: String,
    #[source]
    pub source: CoreError,
}

impl CompileError {
    pub fn new(path: impl Into<String>, source: CoreError) -> Self {
        CompileError {
            path: path.into(),
            source,
        }
    }
}
