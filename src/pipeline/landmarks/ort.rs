use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use super::{
    LandmarkProvider,
    common::{self, HandposeOutput},
    palm::{PalmDetector, PalmDetectorConfig, crop_from_palm, pick_primary_region},
};
use crate::{
    config::DetectorConfig,
    model_download::{ModelKind, model_path},
    types::{Frame, LandmarkSet},
};

/// Each model's score is held to its own threshold; the scores are never
/// combined.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct ConfidenceGate {
    pub min_detection: f32,
    pub min_tracking: f32,
}

impl ConfidenceGate {
    pub fn accepts(&self, output: &HandposeOutput) -> bool {
        output.palm_score >= self.min_detection && output.hand_score >= self.min_tracking
    }

    pub fn hand(&self, output: &HandposeOutput) -> Option<LandmarkSet> {
        if !self.accepts(output) {
            return None;
        }
        LandmarkSet::from_projected(&output.projected_landmarks)
    }
}

/// Palm detector followed by the hand-pose estimator on a rotated crop.
pub struct OrtLandmarkProvider {
    handpose: Session,
    palm_detector: PalmDetector,
    gate: ConfidenceGate,
}

impl OrtLandmarkProvider {
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        let handpose_path = model_path(&config.models_dir, ModelKind::HandposeEstimator);
        let palm_path = model_path(&config.models_dir, ModelKind::PalmDetector);

        let handpose = load_session(&handpose_path)?;
        let palm_config = PalmDetectorConfig {
            score_threshold: config.min_detection_confidence,
            ..PalmDetectorConfig::default()
        };
        let palm_detector = PalmDetector::new(&palm_path, palm_config)?;
        log::info!(
            "handpose ORT backend ready using {} and palm detector {}",
            handpose_path.display(),
            palm_path.display()
        );

        Ok(Self {
            handpose,
            palm_detector,
            gate: ConfidenceGate {
                min_detection: config.min_detection_confidence,
                min_tracking: config.min_tracking_confidence,
            },
        })
    }

    fn infer(&mut self, frame: &Frame) -> Result<HandposeOutput> {
        let palm_regions = self.palm_detector.detect(frame).unwrap_or_else(|err| {
            log::warn!("palm detection failed: {err:?}");
            Vec::new()
        });

        let Some(selected) = pick_primary_region(&palm_regions) else {
            return Ok(HandposeOutput::empty());
        };
        let (center, side, angle) = crop_from_palm(selected);

        let (input, transform) =
            common::prepare_rotated_crop(frame, center, side, angle, common::INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .handpose
            .run(ort::inputs![tensor])
            .context("failed to run ORT session")?;

        if outputs.len() < 1 {
            return Err(anyhow!("model returned no outputs"));
        }

        let coords = outputs[0].try_extract_array::<f32>()?;
        let flattened: Vec<f32> = coords.iter().copied().collect();
        let landmarks = common::decode_landmarks(&flattened)?;

        let hand_score = if outputs.len() > 1 {
            outputs[1]
                .try_extract_array::<f32>()
                .ok()
                .and_then(|arr| arr.iter().next().copied())
                .unwrap_or(0.0)
        } else {
            0.0
        };

        Ok(HandposeOutput {
            projected_landmarks: common::project_landmarks_with_transform(&landmarks, &transform),
            palm_score: selected.score,
            hand_score: hand_score.clamp(0.0, 1.0),
        })
    }
}

impl LandmarkProvider for OrtLandmarkProvider {
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>> {
        let output = self.infer(frame)?;
        Ok(self.gate.hand(&output))
    }
}

fn load_session(model_path: &Path) -> Result<Session> {
    Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(2)?
        .commit_from_file(model_path)
        .with_context(|| format!("failed to load ORT session from {}", model_path.display()))
}
