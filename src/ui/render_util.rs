use super::{Arc, ImageBuffer, ImageFrame, RenderImage, Rgba};
use crate::types::DisplayFrame;

/// Wraps an already BGRA-ordered frame for GPUI without going through the
/// async asset pipeline.
pub(super) fn display_to_image(frame: DisplayFrame) -> Option<Arc<RenderImage>> {
    // GPUI reads the bytes as BGRA even though the buffer type says RGBA.
    let buffer = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(frame.width, frame.height, frame.bgra)?;
    Some(Arc::new(RenderImage::new(vec![ImageFrame::new(buffer)])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_buffers_are_rejected() {
        let frame = DisplayFrame {
            bgra: vec![0; 4 * 3],
            width: 2,
            height: 2,
        };
        assert!(display_to_image(frame).is_none());
    }

    #[test]
    fn full_buffers_become_images() {
        let frame = DisplayFrame {
            bgra: vec![0; 4 * 4],
            width: 2,
            height: 2,
        };
        assert!(display_to_image(frame).is_some());
    }
}
