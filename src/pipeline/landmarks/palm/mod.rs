mod anchors;

use std::{cmp::Ordering, f32::consts::PI, path::Path};

use anyhow::{Context, Result, anyhow};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use super::common::{LetterboxInfo, PALM_INPUT_SIZE, prepare_frame_with_size};
use crate::types::Frame;

const PALM_LANDMARKS: usize = 7;
const BOX_FEATURES: usize = 4 + PALM_LANDMARKS * 2;

/// Crops are this much larger than the palm so the fingers fit.
const CROP_EXPANSION: f32 = 2.4;
const MIN_CROP_SIDE: f32 = 80.0;

#[derive(Clone, Debug)]
pub struct PalmDetectorConfig {
    pub score_threshold: f32,
    pub nms_threshold: f32,
    pub top_k: usize,
}

impl Default for PalmDetectorConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.5,
            nms_threshold: 0.3,
            top_k: 4,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PalmRegion {
    pub bbox: [f32; 4],
    pub landmarks: Vec<(f32, f32)>,
    pub score: f32,
}

pub struct PalmDetector {
    session: Session,
    anchors: Vec<[f32; 2]>,
    cfg: PalmDetectorConfig,
}

impl PalmDetector {
    pub fn new(model_path: &Path, cfg: PalmDetectorConfig) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(model_path)
            .with_context(|| {
                format!("failed to load palm detector from {}", model_path.display())
            })?;

        Ok(Self {
            session,
            anchors: anchors::generate_anchors(),
            cfg,
        })
    }

    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<PalmRegion>> {
        let (input, letterbox) = prepare_frame_with_size(frame, PALM_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("failed to run palm detector session")?;

        if outputs.len() < 2 {
            return Err(anyhow!(
                "palm detector returned {} outputs, expected at least 2",
                outputs.len()
            ));
        }

        let boxes = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let boxes = boxes
            .as_slice()
            .ok_or_else(|| anyhow!("palm boxes not contiguous"))?;
        let scores = scores
            .as_slice()
            .ok_or_else(|| anyhow!("palm scores not contiguous"))?;

        decode_palms(boxes, scores, &self.anchors, &letterbox, &self.cfg)
    }
}

/// Turns raw anchor regressions into frame-space palm regions, best first.
fn decode_palms(
    boxes: &[f32],
    scores: &[f32],
    anchors: &[[f32; 2]],
    letterbox: &LetterboxInfo,
    cfg: &PalmDetectorConfig,
) -> Result<Vec<PalmRegion>> {
    if scores.is_empty() || boxes.len() % scores.len() != 0 {
        return Err(anyhow!(
            "palm outputs disagree: {} box values for {} scores",
            boxes.len(),
            scores.len()
        ));
    }
    let feature_dim = boxes.len() / scores.len();
    if feature_dim < BOX_FEATURES {
        return Err(anyhow!("palm box feature dimension too small: {feature_dim}"));
    }

    let input = PALM_INPUT_SIZE as f32;
    let scale = letterbox.orig_w.max(letterbox.orig_h) as f32;
    let bias_x = letterbox.pad_x / letterbox.scale;
    let bias_y = letterbox.pad_y / letterbox.scale;
    let to_frame = |nx: f32, ny: f32| (nx * scale - bias_x, ny * scale - bias_y);

    let mut candidates = Vec::new();
    for (idx, (&raw_score, anchor)) in scores.iter().zip(anchors).enumerate() {
        let score = sigmoid(raw_score);
        if score < cfg.score_threshold {
            continue;
        }

        let f = &boxes[idx * feature_dim..idx * feature_dim + BOX_FEATURES];
        let cx = f[0] / input + anchor[0];
        let cy = f[1] / input + anchor[1];
        let hw = f[2] / input / 2.0;
        let hh = f[3] / input / 2.0;

        let (x1, y1) = to_frame(cx - hw, cy - hh);
        let (x2, y2) = to_frame(cx + hw, cy + hh);
        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        let landmarks = f[4..]
            .chunks_exact(2)
            .map(|p| to_frame(p[0] / input + anchor[0], p[1] / input + anchor[1]))
            .collect();

        candidates.push(PalmRegion {
            bbox: clamp_box([x1, y1, x2, y2], letterbox.orig_w, letterbox.orig_h),
            landmarks,
            score,
        });
    }

    Ok(nms(candidates, cfg.nms_threshold, cfg.top_k))
}

pub fn pick_primary_region(regions: &[PalmRegion]) -> Option<&PalmRegion> {
    regions
        .iter()
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal))
}

/// Centre, side length and rotation of the hand-pose crop for a palm.
pub fn crop_from_palm(region: &PalmRegion) -> ((f32, f32), f32, f32) {
    let [x1, y1, x2, y2] = region.bbox;
    let center = mean(&region.landmarks).unwrap_or(((x1 + x2) * 0.5, (y1 + y2) * 0.5));

    let landmark_span = region
        .landmarks
        .iter()
        .fold(None, |acc: Option<(f32, f32, f32, f32)>, &(x, y)| {
            Some(match acc {
                None => (x, x, y, y),
                Some((lx, hx, ly, hy)) => (lx.min(x), hx.max(x), ly.min(y), hy.max(y)),
            })
        })
        .map(|(lx, hx, ly, hy)| (hx - lx).max(hy - ly))
        .unwrap_or(0.0);

    let side = (x2 - x1)
        .abs()
        .max((y2 - y1).abs())
        .max(landmark_span)
        .max(MIN_CROP_SIDE)
        * CROP_EXPANSION;

    (center, side, estimate_orientation(region))
}

/// Principal axis of the palm keypoints, turned so the fingers point up.
pub fn estimate_orientation(region: &PalmRegion) -> f32 {
    let Some(center) = mean(&region.landmarks) else {
        return 0.0;
    };
    if region.landmarks.len() < 2 {
        return 0.0;
    }

    let n = region.landmarks.len() as f32;
    let (mut xx, mut xy, mut yy) = (0.0, 0.0, 0.0);
    for (x, y) in &region.landmarks {
        let dx = x - center.0;
        let dy = y - center.1;
        xx += dx * dx;
        xy += dx * dy;
        yy += dy * dy;
    }
    let (xx, xy, yy) = (xx / n, xy / n, yy / n);

    let half_trace = (xx + yy) * 0.5;
    let det = xx * yy - xy * xy;
    let lambda = (half_trace + (half_trace * half_trace - det).max(0.0).sqrt()).max(1e-6);
    let (vx, vy) = if xy.abs() > 1e-6 {
        (lambda - yy, xy)
    } else if xx >= yy {
        (1.0, 0.0)
    } else {
        (0.0, 1.0)
    };

    vy.atan2(vx) - PI * 0.5
}

fn mean(points: &[(f32, f32)]) -> Option<(f32, f32)> {
    if points.is_empty() {
        return None;
    }
    let (sx, sy) = points
        .iter()
        .fold((0.0_f32, 0.0_f32), |acc, p| (acc.0 + p.0, acc.1 + p.1));
    let n = points.len() as f32;
    Some((sx / n, sy / n))
}

fn nms(mut candidates: Vec<PalmRegion>, threshold: f32, top_k: usize) -> Vec<PalmRegion> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut keep: Vec<PalmRegion> = Vec::new();
    for candidate in candidates {
        if keep.len() >= top_k {
            break;
        }
        if keep.iter().all(|k| iou(&candidate.bbox, &k.bbox) < threshold) {
            keep.push(candidate);
        }
    }
    keep
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let inter_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let inter_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = inter_w * inter_h;
    if inter <= 0.0 {
        return 0.0;
    }

    let area = |r: &[f32; 4]| (r[2] - r[0]).max(0.0) * (r[3] - r[1]).max(0.0);
    let union = area(a) + area(b) - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn clamp_box(bbox: [f32; 4], w: u32, h: u32) -> [f32; 4] {
    let max_w = (w.saturating_sub(1)) as f32;
    let max_h = (h.saturating_sub(1)) as f32;
    [
        bbox[0].clamp(0.0, max_w),
        bbox[1].clamp(0.0, max_h),
        bbox[2].clamp(0.0, max_w),
        bbox[3].clamp(0.0, max_h),
    ]
}
