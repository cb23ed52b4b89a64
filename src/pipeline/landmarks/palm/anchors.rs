use super::super::common::PALM_INPUT_SIZE;

/// SSD layer strides of the palm detector. Consecutive layers with the same
/// stride share one feature map.
const STRIDES: [u32; 4] = [8, 16, 16, 16];
const ANCHORS_PER_LAYER: usize = 2;
const ANCHOR_OFFSET: f32 = 0.5;

/// Anchor centres, normalised to the model input, in the order the model
/// emits its boxes.
pub fn generate_anchors() -> Vec<[f32; 2]> {
    let mut anchors = Vec::new();
    let mut layer = 0;
    while layer < STRIDES.len() {
        let stride = STRIDES[layer];
        let mut per_cell = 0;
        while layer < STRIDES.len() && STRIDES[layer] == stride {
            per_cell += ANCHORS_PER_LAYER;
            layer += 1;
        }

        let cells = PALM_INPUT_SIZE.div_ceil(stride);
        for y in 0..cells {
            for x in 0..cells {
                let cx = (x as f32 + ANCHOR_OFFSET) / cells as f32;
                let cy = (y as f32 + ANCHOR_OFFSET) / cells as f32;
                for _ in 0..per_cell {
                    anchors.push([cx, cy]);
                }
            }
        }
    }
    anchors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_layout_matches_the_model() {
        let anchors = generate_anchors();
        assert_eq!(anchors.len(), 24 * 24 * 2 + 12 * 12 * 6);
        assert_eq!(anchors[0], [0.5 / 24.0, 0.5 / 24.0]);
        assert_eq!(anchors[1], anchors[0]);
        assert_eq!(anchors[2], [1.5 / 24.0, 0.5 / 24.0]);
        let second_map = 24 * 24 * 2;
        assert_eq!(anchors[second_map], [0.5 / 12.0, 0.5 / 12.0]);
        assert_eq!(anchors[second_map + 6], [1.5 / 12.0, 0.5 / 12.0]);
    }
}
