//! Scanline sign correction.
//!
//! The distance selectors can get the sign wrong where contours overlap in
//! degenerate ways (coincident edges, self-intersections).  This pass
//! re-derives each texel's fill state from exact scanline crossings and
//! flips texels that disagree.  Texels whose median sits exactly on the
//! 0.5 isoline carry no sign of their own; they are resolved afterwards by
//! majority vote over their already-decided neighbors.

use glam::DVec2;
use vexel_geometry::{median, Shape};

use crate::bitmap::MsdfBitmap;
use crate::generate::MsdfConfig;
use crate::scanline::Scanline;

const UNDECIDED: u8 = 0;
const KEPT: u8 = 1;
const FLIPPED: u8 = 2;

/// Flip every texel whose median sign disagrees with the non-zero-winding
/// fill state of its sample point.
pub fn correct_signs(bitmap: &mut MsdfBitmap, shape: &Shape, config: &MsdfConfig) {
    let (width, height) = (bitmap.width, bitmap.height);
    if width == 0 || height == 0 {
        return;
    }
    let flip_rows = shape.inverse_y_axis;
    let mut flags = vec![UNDECIDED; width * height];
    let mut ambiguous = false;

    for out_row in 0..height {
        let sample_row = if flip_rows { height - 1 - out_row } else { out_row };
        let y = config
            .unproject(DVec2::new(0.0, sample_row as f64 + 0.5))
            .y;
        let line = Scanline::of(shape, y);
        for x in 0..width {
            let px = config
                .unproject(DVec2::new(x as f64 + 0.5, 0.0))
                .x;
            let filled = line.filled(px);
            let texel = bitmap.pixel_mut(x, out_row);
            let m = median(texel[0] as f64, texel[1] as f64, texel[2] as f64);
            if m == 0.5 {
                ambiguous = true;
            } else if (m > 0.5) != filled {
                texel[0] = 1.0 - texel[0];
                texel[1] = 1.0 - texel[1];
                texel[2] = 1.0 - texel[2];
                flags[out_row * width + x] = FLIPPED;
            } else {
                flags[out_row * width + x] = KEPT;
            }
        }
    }

    if !ambiguous {
        return;
    }
    // Second pass: a texel pinned at exactly 0.5 follows its neighbors.  If
    // more decided neighbors were flipped than kept, flip it too so the
    // field stays locally consistent.
    for y in 0..height {
        for x in 0..width {
            if flags[y * width + x] != UNDECIDED {
                continue;
            }
            let mut vote = 0i32;
            if x > 0 {
                vote += neighbor_vote(flags[y * width + x - 1]);
            }
            if x + 1 < width {
                vote += neighbor_vote(flags[y * width + x + 1]);
            }
            if y > 0 {
                vote += neighbor_vote(flags[(y - 1) * width + x]);
            }
            if y + 1 < height {
                vote += neighbor_vote(flags[(y + 1) * width + x]);
            }
            if vote > 0 {
                let texel = bitmap.pixel_mut(x, y);
                texel[0] = 1.0 - texel[0];
                texel[1] = 1.0 - texel[1];
                texel[2] = 1.0 - texel[2];
            }
        }
    }
}

#[inline]
fn neighbor_vote(flag: u8) -> i32 {
    match flag {
        FLIPPED => 1,
        KEPT => -1,
        _ => 0,
    }
}
