pub mod animation;
pub mod bird;
pub mod canvas;
pub mod frame;
pub mod palette;
pub mod sheet;

use std::path::PathBuf;

use thiserror::Error;

pub use canvas::{PixelCanvas, RenderTarget};
pub use frame::Facing;
pub use palette::Variant;

/// Fatal errors while building sprite data. None of these have a partial fallback.
#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("frame has no layers")]
    NoLayers,

    #[error("first layer of a frame must be tagged base")]
    FirstLayerNotBase,

    #[error("animation has no frames")]
    EmptyAnimation,

    #[error("animation has {frames} frames but {durations} durations")]
    DurationMismatch { frames: usize, durations: usize },

    #[error("animation frame durations must be positive")]
    ZeroDuration,

    #[error("failed to read sprite sheet at {path}: {source}")]
    SheetRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode sprite sheet: {0}")]
    SheetDecode(#[from] image::ImageError),

    #[error("bad sprite sheet geometry: {0}")]
    SheetGeometry(String),

    #[error("slice {index} out of range (sheet has {count})")]
    SliceOutOfRange { index: usize, count: usize },
}
