use thiserror::Error;

use crate::model::Rect;

#[derive(Debug, Error)]
pub enum TexCombineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid canvas dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Unknown {kind}: {value:?}")]
    UnknownOption { kind: &'static str, value: String },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Sprite regions overlap: {first:?} and {second:?}")]
    OverlappingRegions { first: Rect, second: Rect },
    #[error("Canvas is {actual:?}, expected {expected:?}")]
    BufferMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

pub type Result<T> = std::result::Result<T, TexCombineError>;
