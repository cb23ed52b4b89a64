use thiserror::Error;

use crate::types::Rgb;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanvasError {
    #[error(
        "brush width {} is outside {}..={}",
        .0,
        crate::stroke::MIN_BRUSH_WIDTH,
        crate::stroke::MAX_BRUSH_WIDTH
    )]
    BrushWidthOutOfRange(u32),
    #[error("colour #{:06x} is not in the palette", .0.hex())]
    ColorNotInPalette(Rgb),
    #[error("frame is {got_w}x{got_h}, canvas is {want_w}x{want_h}")]
    FrameSizeMismatch {
        got_w: u32,
        got_h: u32,
        want_w: u32,
        want_h: u32,
    },
    #[error("frame buffer holds {got} bytes, expected {expected}")]
    BufferLength { got: usize, expected: usize },
}
