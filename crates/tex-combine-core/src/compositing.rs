use image::RgbaImage;

use crate::model::Rect;

/// Copy the sub-rectangle `source` of `src` into `canvas` with its top-left at (dx, dy).
///
/// Pixels that would land outside the canvas are skipped.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32, source: Rect) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    let Some(source) = source.clip(sw, sh) else {
        return;
    };
    for yy in 0..source.h {
        if dy + yy >= ch {
            break;
        }
        for xx in 0..source.w {
            if dx + xx >= cw {
                break;
            }
            let px = *src.get_pixel(source.x + xx, source.y + yy);
            canvas.put_pixel(dx + xx, dy + yy, px);
        }
    }
}

/// Smallest rectangle holding every pixel with alpha above zero.
///
/// `None` when the image is fully transparent (or empty).
pub fn compute_trim_rect(rgba: &RgbaImage) -> Option<Rect> {
    let (w, h) = rgba.dimensions();
    let mut x1 = u32::MAX;
    let mut y1 = u32::MAX;
    let mut x2 = 0u32;
    let mut y2 = 0u32;
    for (x, y, px) in rgba.enumerate_pixels() {
        if px[3] == 0 {
            continue;
        }
        x1 = x1.min(x);
        y1 = y1.min(y);
        x2 = x2.max(x);
        y2 = y2.max(y);
    }
    if x1 >= w || y1 >= h {
        return None;
    }
    Some(Rect::new(x1, y1, x2 - x1 + 1, y2 - y1 + 1))
}
