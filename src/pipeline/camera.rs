use anyhow::{Context, Result, anyhow};
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    query,
    utils::{
        ApiBackend, CameraFormat, CameraIndex, CameraInfo, FrameFormat, RequestedFormat,
        RequestedFormatType, Resolution,
    },
};

use super::rgb_converter;
use crate::{config::CaptureConfig, types::Frame};

const TARGET_FPS: u32 = 30;

// Prefer pixel formats that are widely supported on macOS (the built-in cameras
// often reject YUYV even though Nokhwa reports it).
const PREFERRED_PIXEL_FORMATS: &[FrameFormat] = &[
    FrameFormat::RAWRGB,
    FrameFormat::RAWBGR,
    FrameFormat::GRAY,
    FrameFormat::YUYV,
    FrameFormat::NV12,
    FrameFormat::MJPEG,
];

fn requested_formats(width: u32, height: u32) -> [RequestedFormat<'static>; 4] {
    let closest = CameraFormat::new(Resolution::new(width, height), FrameFormat::MJPEG, TARGET_FPS);
    [
        RequestedFormat::with_formats(
            RequestedFormatType::Closest(closest),
            PREFERRED_PIXEL_FORMATS,
        ),
        RequestedFormat::with_formats(
            RequestedFormatType::AbsoluteHighestFrameRate,
            PREFERRED_PIXEL_FORMATS,
        ),
        // Fall back to any format Nokhwa can decode, but prefer higher FPS to
        // avoid very low default rates (e.g. 15 FPS) that some drivers reject.
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
    ]
}

/// Anything that can hand the session loop one frame at a time.
pub trait FrameSource {
    /// Blocks until the next frame is available. An error means this frame
    /// is lost, not that the source is finished.
    fn next_frame(&mut self) -> Result<Frame>;
}

#[derive(Clone, Debug)]
pub struct CameraDevice {
    pub index: CameraIndex,
    pub label: String,
}

pub fn available_cameras() -> Result<Vec<CameraDevice>> {
    let cameras = query(ApiBackend::Auto)?;
    Ok(cameras
        .into_iter()
        .map(|info| CameraDevice {
            index: info.index().clone(),
            label: format_camera_label(&info),
        })
        .collect())
}

fn format_camera_label(info: &CameraInfo) -> String {
    info.human_name()
}

fn build_camera(index: CameraIndex, width: u32, height: u32) -> Result<Camera> {
    let mut last_err = None;

    for requested in requested_formats(width, height) {
        match Camera::new(index.clone(), requested) {
            Ok(mut camera) => match camera.open_stream() {
                Ok(()) => return Ok(camera),
                Err(err) => last_err = Some(err.into()),
            },
            Err(err) => last_err = Some(err.into()),
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("failed to open camera with any supported format")))
}

/// Opens and immediately releases the device, so start-up problems surface
/// before any session state exists.
pub fn probe_camera(config: &CaptureConfig) -> Result<()> {
    let camera = CameraCapture::open(config)?;
    drop(camera);
    Ok(())
}

/// Open camera stream. The stream is closed when this is dropped.
pub struct CameraCapture {
    camera: Camera,
    mirror: bool,
}

impl CameraCapture {
    pub fn open(config: &CaptureConfig) -> Result<Self> {
        let camera = build_camera(
            CameraIndex::Index(config.camera_index),
            config.width,
            config.height,
        )
        .with_context(|| format!("camera {} is unavailable", config.camera_index))?;

        let actual = camera.resolution();
        log::info!(
            "camera {} streaming at {}x{} ({:?})",
            config.camera_index,
            actual.width(),
            actual.height(),
            camera.frame_format()
        );

        Ok(Self {
            camera,
            mirror: config.mirror,
        })
    }
}

impl FrameSource for CameraCapture {
    fn next_frame(&mut self) -> Result<Frame> {
        let buffer = self.camera.frame().context("camera frame read failed")?;
        let mut frame =
            rgb_converter::convert_camera_frame(&buffer).context("failed to decode camera frame")?;
        if !frame.has_valid_len() {
            return Err(anyhow!(
                "decoded frame is {} bytes for {}x{}",
                frame.rgb.len(),
                frame.width,
                frame.height
            ));
        }
        if self.mirror {
            frame.mirror_horizontally();
        }
        Ok(frame)
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        if let Err(err) = self.camera.stop_stream() {
            log::warn!("failed to stop camera stream: {err:?}");
        } else {
            log::debug!("camera stream released");
        }
    }
}
