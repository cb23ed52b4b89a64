use anyhow::{Context, Result};
use fast_image_resize as fir;
use rayon::prelude::*;

use crate::{
    error::CanvasError,
    stroke::Canvas,
    types::{DisplayFrame, Frame, pixel_len},
};

/// Canvas intensity at or below this counts as empty.
pub const EMPTY_THRESHOLD: u8 = 20;

/// BT.601 luma in 14-bit fixed point, same rounding as the usual
/// RGB-to-gray conversion.
#[inline]
pub fn intensity(px: &[u8]) -> u8 {
    let r = px[0] as u32;
    let g = px[1] as u32;
    let b = px[2] as u32;
    ((r * 4899 + g * 9617 + b * 1868 + (1 << 13)) >> 14) as u8
}

/// 255 where the canvas is empty (live video shows through), 0 where it has
/// content.
pub fn inverse_mask(canvas: &Canvas) -> Vec<u8> {
    canvas
        .as_bytes()
        .par_chunks_exact(3)
        .map(|px| {
            if intensity(px) > EMPTY_THRESHOLD {
                0
            } else {
                255
            }
        })
        .collect()
}

/// Lay the canvas over the live frame: `(live & mask) | canvas` per channel.
/// Drawn pixels replace the video outright instead of mixing with it.
pub fn composite(live: &Frame, canvas: &Canvas) -> Result<Frame, CanvasError> {
    if live.width != canvas.width() || live.height != canvas.height() {
        return Err(CanvasError::FrameSizeMismatch {
            got_w: live.width,
            got_h: live.height,
            want_w: canvas.width(),
            want_h: canvas.height(),
        });
    }
    let expected = pixel_len(live.width, live.height) * 3;
    if live.rgb.len() != expected {
        return Err(CanvasError::BufferLength {
            got: live.rgb.len(),
            expected,
        });
    }

    let mask = inverse_mask(canvas);
    let mut out = vec![0u8; expected];
    out.par_chunks_exact_mut(3)
        .zip(live.rgb.par_chunks_exact(3))
        .zip(canvas.as_bytes().par_chunks_exact(3))
        .zip(mask.par_iter())
        .for_each(|(((dst, src), paint), &m)| {
            for c in 0..3 {
                dst[c] = (src[c] & m) | paint[c];
            }
        });

    Ok(Frame {
        rgb: out,
        width: live.width,
        height: live.height,
        timestamp: live.timestamp,
    })
}

/// Scale to the display resolution and reorder to BGRA for the window.
pub fn to_display(frame: &Frame, width: u32, height: u32) -> Result<DisplayFrame> {
    let rgb = if frame.width == width && frame.height == height {
        frame.rgb.clone()
    } else {
        let src_image = fir::images::Image::from_vec_u8(
            frame.width,
            frame.height,
            frame.rgb.clone(),
            fir::PixelType::U8x3,
        )?;
        let mut dst_image = fir::images::Image::new(width, height, fir::PixelType::U8x3);
        let mut resizer = fir::Resizer::new();
        let resize_options = fir::ResizeOptions::new()
            .resize_alg(fir::ResizeAlg::Interpolation(fir::FilterType::Bilinear));
        resizer
            .resize(&src_image, &mut dst_image, Some(&resize_options))
            .context("display resize failed")?;
        dst_image.into_vec()
    };

    let mut bgra = vec![0u8; pixel_len(width, height) * 4];
    bgra.par_chunks_mut(4)
        .zip(rgb.par_chunks_exact(3))
        .for_each(|(dst, src)| {
            dst[0] = src[2];
            dst[1] = src[1];
            dst[2] = src[0];
            dst[3] = 255;
        });

    Ok(DisplayFrame {
        bgra,
        width,
        height,
    })
}
