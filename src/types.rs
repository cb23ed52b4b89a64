use std::time::Instant;

pub const NUM_LANDMARKS: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;
pub const PINKY_TIP: usize = 20;

/// Packed RGB camera frame, 3 bytes per pixel, row-major.
#[derive(Clone, Debug)]
pub struct Frame {
    pub rgb: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: Instant,
}

impl Frame {
    pub fn new(rgb: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            rgb,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    /// A frame filled with a single colour.
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        let len = pixel_len(width, height);
        let mut rgb = Vec::with_capacity(len * 3);
        for _ in 0..len {
            rgb.extend_from_slice(&color.to_bytes());
        }
        Self::new(rgb, width, height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 3;
        self.rgb.get(idx..idx + 3).map(|px| [px[0], px[1], px[2]])
    }

    pub fn has_valid_len(&self) -> bool {
        self.rgb.len() == pixel_len(self.width, self.height) * 3
    }

    /// Flip left/right in place so the preview behaves like a mirror.
    pub fn mirror_horizontally(&mut self) {
        let stride = self.width as usize * 3;
        if stride == 0 {
            return;
        }
        for row in self.rgb.chunks_exact_mut(stride) {
            let (mut left, mut right) = (0usize, self.width as usize - 1);
            while left < right {
                for c in 0..3 {
                    row.swap(left * 3 + c, right * 3 + c);
                }
                left += 1;
                right -= 1;
            }
        }
    }
}

/// Composited output in the byte order the window expects (BGRA).
#[derive(Clone, Debug)]
pub struct DisplayFrame {
    pub bgra: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub fn pixel_len(width: u32, height: u32) -> usize {
    (width as usize).saturating_mul(height as usize)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = (other.x - self.x) as f32;
        let dy = (other.y - self.y) as f32;
        dx.hypot(dy)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// 0xRRGGBB, the form `gpui::rgb` takes.
    pub const fn hex(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

pub const PALETTE: [Rgb; 5] = [
    Rgb::new(255, 0, 255),
    Rgb::new(0, 255, 255),
    Rgb::new(0, 255, 0),
    Rgb::new(255, 140, 0),
    Rgb::new(255, 0, 0),
];

pub const DEFAULT_COLOR: Rgb = PALETTE[0];

/// One hand's 21 landmarks in frame pixel coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LandmarkSet {
    points: [Point; NUM_LANDMARKS],
}

impl LandmarkSet {
    pub fn new(points: [Point; NUM_LANDMARKS]) -> Self {
        Self { points }
    }

    /// Truncates sub-pixel positions toward zero. Returns `None` unless there
    /// are at least 21 points.
    pub fn from_projected(projected: &[(f32, f32)]) -> Option<Self> {
        if projected.len() < NUM_LANDMARKS {
            return None;
        }
        let mut points = [Point::new(0, 0); NUM_LANDMARKS];
        for (slot, &(x, y)) in points.iter_mut().zip(projected) {
            *slot = Point::new(x as i32, y as i32);
        }
        Some(Self { points })
    }

    pub fn get(&self, idx: usize) -> Point {
        self.points[idx]
    }

    pub fn points(&self) -> &[Point; NUM_LANDMARKS] {
        &self.points
    }

    pub fn thumb_tip(&self) -> Point {
        self.points[THUMB_TIP]
    }

    pub fn index_tip(&self) -> Point {
        self.points[INDEX_TIP]
    }
}
