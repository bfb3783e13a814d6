//! Error types for brush compilation.
//!
//! Geometry that degenerates during compilation is dropped rather than
//! reported; these errors cover input that cannot describe geometry at all.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Brush {brush} side {side} has an invalid plane (zero or non-finite normal or distance)")]
    InvalidPlane { brush: usize, side: usize },

    #[error("Invalid compile options: {0}")]
    Config(#[from] serde_json::Error),
}
