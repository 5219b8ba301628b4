#![forbid(unsafe_code)]

use thiserror::Error;
use xt_live_core::LiveError;

/// Failures of the browser shell.
#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Live(#[from] LiveError),
    #[error("no global `window`")]
    NoWindow,
    #[error("window has no document")]
    NoDocument,
    #[error("element `{0}` not found")]
    MissingElement(String),
    #[error("unexpected JS type, expected `{0}`")]
    UnexpectedType(&'static str),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("javascript error: {0}")]
    Js(String),
}

pub type Result<T> = core::result::Result<T, WebError>;
