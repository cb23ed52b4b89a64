mod common;
mod ort;
mod palm;

use anyhow::Result;

use crate::types::{Frame, LandmarkSet};

pub use self::ort::OrtLandmarkProvider;

/// Finds at most one hand in a frame.
pub trait LandmarkProvider: Send {
    /// `Ok(None)` means no hand; errors are per-frame and not fatal.
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>>;
}

impl<P: LandmarkProvider + ?Sized> LandmarkProvider for Box<P> {
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>> {
        (**self).detect(frame)
    }
}
