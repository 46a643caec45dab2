use thiserror::Error;

use crate::{control::ParseError, metadata::ValidationError, signing::SignError};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid package metadata: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to render descriptor: {0}")]
    Render(#[from] RenderError),

    #[error("Signing failed: {0}")]
    Signing(#[from] SignError),

    #[error("Control file parsing failed: {0}")]
    Parse(#[from] ParseError),

    #[error("YAML parsing failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Fault reported by the descriptor formatting routine.
#[derive(Error, Debug)]
#[error("formatter error")]
pub struct RenderError(#[from] pub std::fmt::Error);

pub type Result<T> = std::result::Result<T, Error>;
