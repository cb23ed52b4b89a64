pub mod camera;
pub mod landmarks;
pub mod rgb_converter;
pub mod skeleton;

// Re-exports for convenience
pub use camera::{CameraCapture, FrameSource, probe_camera};
pub use landmarks::{LandmarkProvider, OrtLandmarkProvider};
pub use skeleton::draw_skeleton;
