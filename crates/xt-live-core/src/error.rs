#![forbid(unsafe_code)]

use thiserror::Error;

/// Errors surfaced by the live-editor core.
///
/// Most protocol "failures" (foreign-origin messages, missing anchors,
/// declined confirmations) are ordinary outcomes and never reach this type.
#[derive(Debug, Error)]
pub enum LiveError {
    #[error("failed to parse live-editor config JSON: {0}")]
    Config(#[from] serde_json::Error),
    #[error("live-editor config is missing `{0}`")]
    MissingConfig(&'static str),
    #[error("invalid layout coordinate {field}={value:?}")]
    InvalidCoordinate { field: &'static str, value: String },
    #[error("command `{command}` requires parameter `{param}`")]
    MissingParam {
        command: &'static str,
        param: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, LiveError>;
