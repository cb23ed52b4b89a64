use crate::{
    raster::RgbRaster,
    types::{Frame, LandmarkSet},
};

pub const CONNECTIONS: &[(usize, usize)] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (0, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (0, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
    (5, 9),
    (9, 13),
    (13, 17),
];

const LINE_COLOR: [u8; 3] = [255, 255, 255];
const POINT_COLOR: [u8; 3] = [220, 38, 38];
const LINE_RADIUS: i32 = 1;
const POINT_RADIUS: i32 = 4;

/// Draws the hand skeleton straight onto the live frame.
pub fn draw_skeleton(frame: &mut Frame, hand: &LandmarkSet) {
    let mut raster = RgbRaster::new(&mut frame.rgb, frame.width, frame.height);
    let points = hand.points();
    for &(a, b) in CONNECTIONS {
        raster.draw_line(points[a], points[b], LINE_COLOR, LINE_RADIUS);
    }
    for &p in points {
        raster.fill_disc(p, POINT_RADIUS, POINT_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NUM_LANDMARKS, Point, Rgb};

    #[test]
    fn skeleton_marks_landmarks_and_bones() {
        let mut frame = Frame::filled(100, 100, Rgb::BLACK);
        let mut points = [Point::new(50, 90); NUM_LANDMARKS];
        points[8] = Point::new(50, 10);
        draw_skeleton(&mut frame, &LandmarkSet::new(points));

        assert_eq!(frame.pixel(50, 10), Some(POINT_COLOR));
        // Bone 7-8 runs from the wrist cluster up to the index tip.
        assert_eq!(frame.pixel(50, 50), Some(LINE_COLOR));
        assert_eq!(frame.pixel(5, 5), Some([0, 0, 0]));
    }

    #[test]
    fn off_frame_landmarks_are_clipped() {
        let mut frame = Frame::filled(10, 10, Rgb::BLACK);
        let points = [Point::new(-50, 500); NUM_LANDMARKS];
        draw_skeleton(&mut frame, &LandmarkSet::new(points));
        assert!(frame.rgb.iter().all(|&b| b == 0));
    }

    #[test]
    fn bones_use_the_shared_thick_line() {
        let mut frame = Frame::filled(40, 40, Rgb::BLACK);
        let mut points = [Point::new(5, 20); NUM_LANDMARKS];
        points[1] = Point::new(35, 20);
        draw_skeleton(&mut frame, &LandmarkSet::new(points));

        // Bone 0-1 is horizontal; the radius-1 stamp widens it to three rows.
        for y in 19..=21 {
            assert_eq!(frame.pixel(20, y), Some(LINE_COLOR));
        }
        assert_eq!(frame.pixel(20, 23), Some([0, 0, 0]));
    }
}
