use crate::types::{INDEX_TIP, LandmarkSet, MIDDLE_TIP, PINKY_TIP, Point, RING_TIP};

/// Thumb-to-index distance (pixels) below which the hand counts as "pen down".
pub const PINCH_THRESHOLD: f32 = 35.0;
/// Closed fingers (out of four) needed for the erase gesture.
pub const MIN_CLOSED_FINGERS: usize = 3;

const FINGER_TIPS: [usize; 4] = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Draw,
    Erase,
}

impl GestureState {
    pub fn label(&self) -> &'static str {
        match self {
            GestureState::Idle => "Idle",
            GestureState::Draw => "Draw",
            GestureState::Erase => "Erase",
        }
    }
}

/// Classification of one frame. `point` is the index fingertip whenever a hand
/// was found, even if the hand is idle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gesture {
    pub state: GestureState,
    pub point: Option<Point>,
}

impl Gesture {
    pub const NO_HAND: Gesture = Gesture {
        state: GestureState::Idle,
        point: None,
    };
}

pub fn classify(landmarks: Option<&LandmarkSet>) -> Gesture {
    let Some(hand) = landmarks else {
        return Gesture::NO_HAND;
    };

    let index_tip = hand.index_tip();
    let pinch_distance = hand.thumb_tip().distance(index_tip);

    // Pinch is checked first; a pinched fist still draws.
    let state = if pinch_distance < PINCH_THRESHOLD {
        GestureState::Draw
    } else if closed_fingers(hand) >= MIN_CLOSED_FINGERS {
        GestureState::Erase
    } else {
        GestureState::Idle
    };

    Gesture {
        state,
        point: Some(index_tip),
    }
}

/// A finger is closed when its tip sits lower in the image than the joint two
/// landmarks before it. Only holds for an upright hand facing the camera.
pub fn closed_fingers(hand: &LandmarkSet) -> usize {
    FINGER_TIPS
        .iter()
        .filter(|&&tip| hand.get(tip).y > hand.get(tip - 2).y)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NUM_LANDMARKS, THUMB_TIP};

    /// Open hand: fingertips well above their joints, thumb far from index.
    fn open_hand() -> [Point; NUM_LANDMARKS] {
        let mut points = [Point::new(200, 400); NUM_LANDMARKS];
        points[THUMB_TIP] = Point::new(100, 300);
        for (i, &tip) in FINGER_TIPS.iter().enumerate() {
            let x = 180 + i as i32 * 30;
            points[tip - 2] = Point::new(x, 250);
            points[tip] = Point::new(x, 150);
        }
        points
    }

    fn close_finger(points: &mut [Point; NUM_LANDMARKS], tip: usize) {
        let joint = points[tip - 2];
        points[tip] = Point::new(points[tip].x, joint.y + 20);
    }

    #[test]
    fn no_hand_is_idle_without_point() {
        assert_eq!(classify(None), Gesture::NO_HAND);
    }

    #[test]
    fn open_hand_is_idle_with_point() {
        let hand = LandmarkSet::new(open_hand());
        let gesture = classify(Some(&hand));
        assert_eq!(gesture.state, GestureState::Idle);
        assert_eq!(gesture.point, Some(hand.index_tip()));
    }

    #[test]
    fn pinch_draws_at_index_tip() {
        let mut points = open_hand();
        points[THUMB_TIP] = Point::new(100, 100);
        points[INDEX_TIP] = Point::new(105, 102);
        let gesture = classify(Some(&LandmarkSet::new(points)));
        assert_eq!(gesture.state, GestureState::Draw);
        assert_eq!(gesture.point, Some(Point::new(105, 102)));
    }

    #[test]
    fn pinch_threshold_is_strict() {
        let mut points = open_hand();
        points[THUMB_TIP] = Point::new(100, 100);
        points[INDEX_TIP] = Point::new(135, 100);
        let gesture = classify(Some(&LandmarkSet::new(points)));
        assert_eq!(gesture.state, GestureState::Idle);

        points[INDEX_TIP] = Point::new(134, 100);
        let gesture = classify(Some(&LandmarkSet::new(points)));
        assert_eq!(gesture.state, GestureState::Draw);
    }

    #[test]
    fn pinch_wins_over_fist() {
        for closed in 0..=4 {
            let mut points = open_hand();
            for &tip in FINGER_TIPS.iter().take(closed) {
                close_finger(&mut points, tip);
            }
            let index = points[INDEX_TIP];
            points[THUMB_TIP] = Point::new(index.x + 3, index.y + 4);
            let hand = LandmarkSet::new(points);
            assert_eq!(closed_fingers(&hand), closed);
            assert_eq!(classify(Some(&hand)).state, GestureState::Draw);
        }
    }

    #[test]
    fn three_closed_fingers_erase() {
        let mut points = open_hand();
        for &tip in &FINGER_TIPS[1..] {
            close_finger(&mut points, tip);
        }
        let hand = LandmarkSet::new(points);
        assert_eq!(closed_fingers(&hand), 3);
        let gesture = classify(Some(&hand));
        assert_eq!(gesture.state, GestureState::Erase);
        assert_eq!(gesture.point, Some(hand.index_tip()));
    }

    #[test]
    fn two_closed_fingers_stay_idle() {
        let mut points = open_hand();
        close_finger(&mut points, RING_TIP);
        close_finger(&mut points, PINKY_TIP);
        assert_eq!(
            classify(Some(&LandmarkSet::new(points))).state,
            GestureState::Idle
        );
    }

    #[test]
    fn tip_level_with_joint_is_not_closed() {
        let mut points = open_hand();
        for &tip in &FINGER_TIPS {
            points[tip] = Point::new(points[tip].x, points[tip - 2].y);
        }
        assert_eq!(closed_fingers(&LandmarkSet::new(points)), 0);
    }

    #[test]
    fn scenario_fist_away_from_thumb_erases() {
        let mut points = open_hand();
        for &tip in &FINGER_TIPS {
            close_finger(&mut points, tip);
        }
        points[THUMB_TIP] = Point::new(100, 100);
        points[INDEX_TIP] = Point::new(140, 100);
        points[INDEX_TIP - 2] = Point::new(140, 80);
        let gesture = classify(Some(&LandmarkSet::new(points)));
        assert_eq!(gesture.state, GestureState::Erase);
        assert_eq!(gesture.point, Some(Point::new(140, 100)));
    }
}
