use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineErrorKind {
    TooManyOperators,
    InvalidBandwidth,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

pub fn too_many_operators(count: usize, max_operators: usize) -> EngineError {
    EngineError::new(
        EngineErrorKind::TooManyOperators,
        format!("{count} operators exceed the enumeration limit of {max_operators}"),
    )
}

pub fn invalid_bandwidth(message: impl Into<String>) -> EngineError {
    EngineError::new(EngineErrorKind::InvalidBandwidth, message)
}
