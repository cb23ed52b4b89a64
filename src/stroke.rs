use crate::{
    error::CanvasError,
    gesture::{Gesture, GestureState},
    raster::RgbRaster,
    types::{DEFAULT_COLOR, PALETTE, Point, Rgb, pixel_len},
};

pub const MIN_BRUSH_WIDTH: u32 = 1;
pub const MAX_BRUSH_WIDTH: u32 = 35;
pub const DEFAULT_BRUSH_WIDTH: u32 = 7;
pub const ERASER_RADIUS: i32 = 60;

const BACKGROUND: [u8; 3] = [0, 0, 0];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrushConfig {
    color: Rgb,
    width: u32,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR,
            width: DEFAULT_BRUSH_WIDTH,
        }
    }
}

impl BrushConfig {
    pub fn new(color: Rgb, width: u32) -> Result<Self, CanvasError> {
        let mut brush = Self::default();
        brush.set_color(color)?;
        brush.set_width(width)?;
        Ok(brush)
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn set_color(&mut self, color: Rgb) -> Result<(), CanvasError> {
        if !PALETTE.contains(&color) {
            return Err(CanvasError::ColorNotInPalette(color));
        }
        self.color = color;
        Ok(())
    }

    pub fn set_width(&mut self, width: u32) -> Result<(), CanvasError> {
        if !(MIN_BRUSH_WIDTH..=MAX_BRUSH_WIDTH).contains(&width) {
            return Err(CanvasError::BrushWidthOutOfRange(width));
        }
        self.width = width;
        Ok(())
    }
}

/// Persistent RGB drawing surface. Zero bytes are background.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    rgb: Vec<u8>,
    width: u32,
    height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            rgb: vec![0u8; pixel_len(width, height) * 3],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.rgb
    }

    pub fn clear(&mut self) {
        self.rgb.fill(0);
    }

    pub fn is_blank(&self) -> bool {
        self.rgb.iter().all(|&b| b == 0)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 3;
        Some([self.rgb[idx], self.rgb[idx + 1], self.rgb[idx + 2]])
    }

    /// Count of pixels that are not background.
    pub fn painted_pixels(&self) -> usize {
        self.rgb
            .chunks_exact(3)
            .filter(|px| px.iter().any(|&c| c != 0))
            .count()
    }

    /// Thick segment: a disc of radius `thickness / 2` stamped along the
    /// Bresenham centre line, which gives round caps.
    pub fn draw_line(&mut self, p0: Point, p1: Point, color: [u8; 3], thickness: u32) {
        let radius = (thickness.max(1) / 2) as i32;
        self.raster().draw_line(p0, p1, color, radius);
    }

    pub fn fill_disc(&mut self, center: Point, radius: i32, color: [u8; 3]) {
        self.raster().fill_disc(center, radius, color);
    }

    fn raster(&mut self) -> RgbRaster<'_> {
        RgbRaster::new(&mut self.rgb, self.width, self.height)
    }
}

/// Canvas plus the state that links consecutive frames of one gesture.
#[derive(Debug)]
pub struct StrokeSession {
    canvas: Option<Canvas>,
    continuation: Option<Point>,
    brush: BrushConfig,
}

impl StrokeSession {
    pub fn new(brush: BrushConfig) -> Self {
        Self {
            canvas: None,
            continuation: None,
            brush,
        }
    }

    /// Make sure the canvas matches the incoming frame. Created blank on the
    /// first frame; a resolution change starts over with a blank canvas.
    pub fn prepare(&mut self, width: u32, height: u32) -> &Canvas {
        let stale = self
            .canvas
            .as_ref()
            .is_some_and(|c| c.width != width || c.height != height);
        if stale {
            log::warn!("frame size changed to {width}x{height}; starting a blank canvas");
            self.canvas = None;
            self.continuation = None;
        }
        self.canvas.get_or_insert_with(|| Canvas::new(width, height))
    }

    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    pub fn continuation(&self) -> Option<Point> {
        self.continuation
    }

    pub fn brush(&self) -> BrushConfig {
        self.brush
    }

    pub fn apply(&mut self, gesture: Gesture) {
        let (state, point) = match (gesture.state, gesture.point) {
            (GestureState::Idle, _) | (_, None) => {
                self.continuation = None;
                return;
            }
            (state, Some(point)) => (state, point),
        };

        let Some(canvas) = self.canvas.as_mut() else {
            log::debug!("gesture before first frame ignored");
            return;
        };

        if state == GestureState::Erase {
            canvas.fill_disc(point, ERASER_RADIUS, BACKGROUND);
        } else {
            // A fresh stroke starts where the finger is, not where the last
            // one ended.
            let from = self.continuation.unwrap_or(point);
            canvas.draw_line(
                from,
                point,
                self.brush.color().to_bytes(),
                self.brush.width(),
            );
        }
        self.continuation = Some(point);
    }

    /// Blank the canvas in place. A stroke in progress carries on.
    pub fn clear(&mut self) {
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.clear();
        }
    }

    pub fn configure(&mut self, color: Rgb, width: u32) -> Result<(), CanvasError> {
        self.brush = BrushConfig::new(color, width)?;
        Ok(())
    }

    pub fn set_color(&mut self, color: Rgb) -> Result<(), CanvasError> {
        self.brush.set_color(color)
    }

    pub fn set_brush_width(&mut self, width: u32) -> Result<(), CanvasError> {
        self.brush.set_width(width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PALETTE;

    const W: u32 = 320;
    const H: u32 = 240;

    fn session() -> StrokeSession {
        let mut session = StrokeSession::new(BrushConfig::default());
        session.prepare(W, H);
        session
    }

    fn draw(point: Point) -> Gesture {
        Gesture {
            state: GestureState::Draw,
            point: Some(point),
        }
    }

    fn erase(point: Point) -> Gesture {
        Gesture {
            state: GestureState::Erase,
            point: Some(point),
        }
    }

    fn idle() -> Gesture {
        Gesture {
            state: GestureState::Idle,
            point: Some(Point::new(10, 10)),
        }
    }

    fn painted_points(canvas: &Canvas) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                if canvas.pixel(x, y) != Some([0, 0, 0]) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn canvas_is_created_blank_on_first_frame() {
        let mut session = StrokeSession::new(BrushConfig::default());
        assert!(session.canvas().is_none());
        let canvas = session.prepare(W, H);
        assert_eq!((canvas.width(), canvas.height()), (W, H));
        assert!(canvas.is_blank());
    }

    #[test]
    fn fresh_draw_marks_a_single_dot() {
        let mut session = session();
        session.apply(draw(Point::new(105, 102)));

        assert_eq!(session.continuation(), Some(Point::new(105, 102)));
        let canvas = session.canvas().unwrap();
        let painted = painted_points(canvas);
        let radius = (DEFAULT_BRUSH_WIDTH / 2) as i64;
        assert!(!painted.is_empty());
        for (x, y) in painted {
            let dx = x as i64 - 105;
            let dy = y as i64 - 102;
            assert!(dx * dx + dy * dy <= radius * radius);
        }
        assert_eq!(canvas.pixel(105, 102), Some(DEFAULT_COLOR.to_bytes()));
    }

    #[test]
    fn consecutive_draws_connect() {
        let mut session = session();
        session.apply(draw(Point::new(50, 50)));
        session.apply(draw(Point::new(150, 50)));
        let canvas = session.canvas().unwrap();
        for x in 50..=150 {
            assert_eq!(canvas.pixel(x, 50), Some(DEFAULT_COLOR.to_bytes()));
        }
        assert_eq!(session.continuation(), Some(Point::new(150, 50)));
    }

    #[test]
    fn idle_breaks_the_stroke() {
        let mut session = session();
        session.apply(draw(Point::new(50, 50)));
        session.apply(idle());
        assert_eq!(session.continuation(), None);
        session.apply(draw(Point::new(250, 50)));

        let canvas = session.canvas().unwrap();
        assert_eq!(canvas.pixel(150, 50), Some([0, 0, 0]));
        assert_eq!(canvas.pixel(250, 50), Some(DEFAULT_COLOR.to_bytes()));
    }

    #[test]
    fn missing_hand_breaks_the_stroke() {
        let mut session = session();
        session.apply(draw(Point::new(50, 50)));
        session.apply(Gesture::NO_HAND);
        assert_eq!(session.continuation(), None);
        let before = session.canvas().unwrap().clone();
        session.apply(Gesture::NO_HAND);
        assert_eq!(session.canvas().unwrap(), &before);
    }

    #[test]
    fn erase_disc_ignores_brush_width() {
        for width in [MIN_BRUSH_WIDTH, MAX_BRUSH_WIDTH] {
            let mut session = session();
            session.set_brush_width(width).unwrap();
            // Paint everything so the erased region is visible.
            session.canvas.as_mut().unwrap().rgb.fill(255);
            session.apply(erase(Point::new(140, 100)));

            let canvas = session.canvas().unwrap();
            let mut erased = 0;
            for y in 0..H {
                for x in 0..W {
                    let dx = x as i32 - 140;
                    let dy = y as i32 - 100;
                    let inside = dx * dx + dy * dy <= ERASER_RADIUS * ERASER_RADIUS;
                    let blank = canvas.pixel(x, y) == Some([0, 0, 0]);
                    assert_eq!(inside, blank, "pixel ({x},{y}) width {width}");
                    if blank {
                        erased += 1;
                    }
                }
            }
            assert!(erased > 11_000);
            assert_eq!(session.continuation(), Some(Point::new(140, 100)));
        }
    }

    #[test]
    fn erase_keeps_continuity_for_a_following_draw() {
        let mut session = session();
        session.apply(erase(Point::new(200, 200)));
        session.apply(draw(Point::new(200, 120)));
        let canvas = session.canvas().unwrap();
        // The segment runs from the eraser position to the new point.
        assert_eq!(canvas.pixel(200, 160), Some(DEFAULT_COLOR.to_bytes()));
    }

    #[test]
    fn clear_is_idempotent_and_keeps_continuation() {
        let mut session = session();
        session.apply(draw(Point::new(10, 10)));
        session.apply(draw(Point::new(60, 60)));

        session.clear();
        let once = session.canvas().unwrap().clone();
        session.clear();
        assert_eq!(session.canvas().unwrap(), &once);
        assert!(once.is_blank());
        assert_eq!((once.width(), once.height()), (W, H));
        assert_eq!(session.continuation(), Some(Point::new(60, 60)));
    }

    #[test]
    fn draw_after_clear_without_continuation_is_a_dot() {
        let mut session = session();
        session.apply(draw(Point::new(10, 10)));
        session.apply(Gesture::NO_HAND);
        session.clear();
        session.apply(draw(Point::new(105, 102)));
        let canvas = session.canvas().unwrap();
        assert!(canvas.painted_pixels() <= 49);
        assert_eq!(canvas.pixel(10, 10), Some([0, 0, 0]));
    }

    #[test]
    fn configure_leaves_canvas_alone() {
        let mut session = session();
        session.apply(draw(Point::new(30, 30)));
        let before = session.canvas().unwrap().clone();

        session.configure(PALETTE[2], 20).unwrap();
        assert_eq!(session.canvas().unwrap(), &before);
        assert_eq!(session.brush().color(), PALETTE[2]);
        assert_eq!(session.brush().width(), 20);
    }

    #[test]
    fn brush_validation() {
        let mut brush = BrushConfig::default();
        assert_eq!(
            brush.set_width(0),
            Err(CanvasError::BrushWidthOutOfRange(0))
        );
        assert_eq!(
            brush.set_width(36),
            Err(CanvasError::BrushWidthOutOfRange(36))
        );
        assert!(brush.set_width(35).is_ok());
        let odd = Rgb::new(1, 2, 3);
        assert_eq!(brush.set_color(odd), Err(CanvasError::ColorNotInPalette(odd)));
        assert_eq!(brush.color(), DEFAULT_COLOR);
    }

    #[test]
    fn resolution_change_starts_blank() {
        let mut session = session();
        session.apply(draw(Point::new(30, 30)));
        let canvas = session.prepare(160, 120);
        assert_eq!((canvas.width(), canvas.height()), (160, 120));
        assert!(canvas.is_blank());
        assert_eq!(session.continuation(), None);
    }

    #[test]
    fn drawing_off_canvas_is_clipped() {
        let mut session = session();
        session.apply(draw(Point::new(-20, -20)));
        session.apply(draw(Point::new(W as i32 + 20, 5)));
        assert!(session.canvas().unwrap().painted_pixels() > 0);
    }
}
