use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::stroke::{BrushConfig, DEFAULT_BRUSH_WIDTH};
use crate::types::DEFAULT_COLOR;

#[derive(Parser, Debug)]
#[command(name = "air-canvas")]
#[command(about = "Draw in the air: pinch to paint, close your fist to erase")]
#[command(version)]
pub struct Cli {
    /// Camera index to open
    #[arg(long, default_value_t = 0)]
    pub camera: u32,

    /// Requested capture width (the device may pick another)
    #[arg(long, default_value_t = 1280)]
    pub capture_width: u32,

    /// Requested capture height
    #[arg(long, default_value_t = 720)]
    pub capture_height: u32,

    /// Width of the picture shown in the window
    #[arg(long, default_value_t = 960)]
    pub display_width: u32,

    /// Height of the picture shown in the window
    #[arg(long, default_value_t = 540)]
    pub display_height: u32,

    /// Initial brush width (1-35)
    #[arg(long, default_value_t = DEFAULT_BRUSH_WIDTH)]
    pub brush_width: u32,

    /// Show the camera image as-is instead of mirrored
    #[arg(long)]
    pub no_mirror: bool,

    /// Hide the hand skeleton overlay
    #[arg(long)]
    pub no_skeleton: bool,

    /// Palm detections scoring below this are discarded
    #[arg(long, default_value_t = 0.8)]
    pub min_detection_confidence: f32,

    /// Hand landmarks scoring below this count as "no hand"
    #[arg(long, default_value_t = 0.8)]
    pub min_tracking_confidence: f32,

    /// Directory holding (or receiving) the ONNX models
    #[arg(long, default_value = "models")]
    pub models_dir: PathBuf,

    /// Print the cameras that can be opened and exit
    #[arg(long)]
    pub list_cameras: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CaptureConfig {
    pub camera_index: u32,
    pub width: u32,
    pub height: u32,
    pub mirror: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub show_skeleton: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetectorConfig {
    pub models_dir: PathBuf,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub capture: CaptureConfig,
    pub display: DisplayConfig,
    pub detector: DetectorConfig,
    pub brush: BrushConfig,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let brush = BrushConfig::new(DEFAULT_COLOR, cli.brush_width)
            .context("invalid --brush-width")?;
        anyhow::ensure!(
            cli.display_width > 0 && cli.display_height > 0,
            "display size must be non-zero, got {}x{}",
            cli.display_width,
            cli.display_height
        );
        for (flag, value) in [
            ("--min-detection-confidence", cli.min_detection_confidence),
            ("--min-tracking-confidence", cli.min_tracking_confidence),
        ] {
            anyhow::ensure!(
                (0.0..=1.0).contains(&value),
                "{flag} must be within 0..=1, got {value}"
            );
        }

        Ok(Self {
            capture: CaptureConfig {
                camera_index: cli.camera,
                width: cli.capture_width,
                height: cli.capture_height,
                mirror: !cli.no_mirror,
            },
            display: DisplayConfig {
                width: cli.display_width,
                height: cli.display_height,
                show_skeleton: !cli.no_skeleton,
            },
            detector: DetectorConfig {
                models_dir: cli.models_dir,
                min_detection_confidence: cli.min_detection_confidence,
                min_tracking_confidence: cli.min_tracking_confidence,
            },
            brush,
        })
    }
}
