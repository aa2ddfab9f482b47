//! Flat-color scanline polygon rasterizer.
//!
//! Fills a shape directly into an RGBA8 buffer under the non-zero winding
//! rule, one horizontal span at a time.  This is the non-distance-field
//! path used for flat sprite previews; the MSDF pipeline never touches it.

use vexel_geometry::{Crossing, Shape};

use crate::packer::Rect;

/// An RGBA8 pixel buffer the rasterizer and atlas builder write into.
pub struct PixelBuffer {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 4],
        }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let i = 4 * (y * self.width + x);
        &self.data[i..i + 4]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [u8] {
        let i = 4 * (y * self.width + x);
        &mut self.data[i..i + 4]
    }

    /// Write `src` over the pixel at (x, y).  Opaque sources and transparent
    /// destinations replace outright; everything else is source-over.
    pub fn blend(&mut self, x: usize, y: usize, src: [u8; 4]) {
        let dst = self.pixel_mut(x, y);
        if src[3] == 255 || dst[3] == 0 {
            dst.copy_from_slice(&src);
            return;
        }
        let sa = src[3] as f32 / 255.0;
        let da = dst[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            dst.copy_from_slice(&[0, 0, 0, 0]);
            return;
        }
        for c in 0..3 {
            let s = src[c] as f32 / 255.0;
            let d = dst[c] as f32 / 255.0;
            dst[c] = (((s * sa + d * da * (1.0 - sa)) / out_a) * 255.0 + 0.5) as u8;
        }
        dst[3] = (out_a * 255.0 + 0.5) as u8;
    }
}

/// First pixel column (relative to `rect_x`) whose center lies at or beyond
/// `x`.  Both ends of every span use this same rounding, so two shapes
/// sharing an edge fill complementary pixels with no seam or overlap.
#[inline]
fn span_edge(x: f64, rect_x: i32) -> i32 {
    (x - rect_x as f64 - 0.5).ceil() as i32
}

/// Fill `shape` into `target`, clipped to `rect`.  Shape coordinates are in
/// buffer pixel space.
pub fn fill_shape(target: &mut PixelBuffer, rect: Rect, shape: &Shape, color: [u8; 4]) {
    let x_min = rect.x.max(0);
    let y_min = rect.y.max(0);
    let x_max = (rect.x + rect.width).min(target.width as i32);
    let y_max = (rect.y + rect.height).min(target.height as i32);
    if x_min >= x_max || y_min >= y_max {
        return;
    }

    let mut crossings: Vec<Crossing> = Vec::new();
    for y in y_min..y_max {
        crossings.clear();
        shape.scanline_intersections(y as f64 + 0.5, &mut crossings);
        if crossings.is_empty() {
            continue;
        }
        let mut winding = 0;
        let mut span_start = 0.0;
        for crossing in &crossings {
            let was_filled = winding != 0;
            winding += crossing.direction;
            let now_filled = winding != 0;
            if !was_filled && now_filled {
                span_start = crossing.x;
            } else if was_filled && !now_filled {
                let begin = (rect.x + span_edge(span_start, rect.x)).max(x_min);
                let end = (rect.x + span_edge(crossing.x, rect.x)).min(x_max);
                for x in begin..end {
                    target.blend(x as usize, y as usize, color);
                }
            }
        }
    }
}
