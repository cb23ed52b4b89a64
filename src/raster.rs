use crate::types::Point;

/// Drawing primitives over a borrowed packed-RGB buffer. Everything outside
/// the buffer is clipped.
pub struct RgbRaster<'a> {
    rgb: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> RgbRaster<'a> {
    pub fn new(rgb: &'a mut [u8], width: u32, height: u32) -> Self {
        Self { rgb, width, height }
    }

    pub fn put_pixel(&mut self, x: i32, y: i32, color: [u8; 3]) {
        if x < 0 || y < 0 {
            return;
        }
        let (ux, uy) = (x as u32, y as u32);
        if ux >= self.width || uy >= self.height {
            return;
        }
        let idx = ((uy as usize) * (self.width as usize) + ux as usize) * 3;
        if let Some(px) = self.rgb.get_mut(idx..idx + 3) {
            px.copy_from_slice(&color);
        }
    }

    pub fn fill_disc(&mut self, center: Point, radius: i32, color: [u8; 3]) {
        let r2 = radius * radius;
        let y_start = (center.y - radius).max(0);
        let y_end = (center.y + radius).min(self.height as i32 - 1);
        let x_start = (center.x - radius).max(0);
        let x_end = (center.x + radius).min(self.width as i32 - 1);

        for y in y_start..=y_end {
            let dy = y - center.y;
            for x in x_start..=x_end {
                let dx = x - center.x;
                if dx * dx + dy * dy <= r2 {
                    self.put_pixel(x, y, color);
                }
            }
        }
    }

    /// Bresenham centre line with a disc of `radius` stamped at every step,
    /// which gives round caps. Radius 0 is a one-pixel line.
    pub fn draw_line(&mut self, p0: Point, p1: Point, color: [u8; 3], radius: i32) {
        let (mut x0, mut y0) = (p0.x, p0.y);
        let (x1, y1) = (p1.x, p1.y);
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.fill_disc(Point::new(x0, y0), radius, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 3] = [255, 0, 0];

    fn lit(buf: &[u8]) -> usize {
        buf.chunks_exact(3).filter(|px| px.iter().any(|&c| c != 0)).count()
    }

    #[test]
    fn thin_line_covers_both_endpoints() {
        let mut buf = vec![0u8; 10 * 10 * 3];
        RgbRaster::new(&mut buf, 10, 10).draw_line(Point::new(1, 1), Point::new(8, 4), RED, 0);
        assert_eq!(&buf[(10 + 1) * 3..(10 + 1) * 3 + 3], &RED);
        assert_eq!(&buf[(4 * 10 + 8) * 3..(4 * 10 + 8) * 3 + 3], &RED);
        assert_eq!(lit(&buf), 8);
    }

    #[test]
    fn discs_are_clipped_at_the_edges() {
        let mut buf = vec![0u8; 5 * 5 * 3];
        RgbRaster::new(&mut buf, 5, 5).fill_disc(Point::new(0, 0), 1, RED);
        assert_eq!(lit(&buf), 3);
    }

    #[test]
    fn short_buffers_are_not_overrun() {
        let mut buf = vec![0u8; 4 * 3];
        let mut raster = RgbRaster::new(&mut buf, 4, 4);
        raster.draw_line(Point::new(0, 0), Point::new(3, 3), RED, 1);
        assert_eq!(buf.len(), 12);
    }
}
