//! MSDF bitmap generation.

use glam::DVec2;
use rayon::prelude::*;
use vexel_geometry::Shape;

use crate::bitmap::MsdfBitmap;
use crate::combiner::ContourCombiner;
use crate::selector::{EdgeList, MultiSelector};

/// Mapping between bitmap pixel space and shape space, plus the width of
/// the encoded distance band.
///
/// A pixel center `(x + 0.5, y + 0.5)` samples shape point
/// `(pixel + 0.5) / scale - translate`; a raw signed distance `d` (in shape
/// units) encodes as `d / range + 0.5`, so the band spans `±range/2` around
/// the edge.
#[derive(Debug, Clone, Copy)]
pub struct MsdfConfig {
    /// Full width of the encoded distance band, in shape units.
    pub range: f64,
    /// Pixels per shape unit, per axis.
    pub scale: DVec2,
    /// Shape-space offset applied before scaling.
    pub translate: DVec2,
    /// Invert winding classification; set when the producer pre-flipped the
    /// shape's Y axis so contour orientation reads reversed.
    pub invert_winding: bool,
}

impl MsdfConfig {
    pub fn new(range: f64, scale: DVec2, translate: DVec2) -> Self {
        Self {
            range,
            scale,
            translate,
            invert_winding: false,
        }
    }

    /// Shape-space position sampled by bitmap position `p` (pixels).
    #[inline]
    pub fn unproject(&self, p: DVec2) -> DVec2 {
        p / self.scale - self.translate
    }

    /// Bitmap-space position of shape point `p`.
    #[inline]
    pub fn project(&self, p: DVec2) -> DVec2 {
        self.scale * (p + self.translate)
    }

    /// Length in shape units of a bitmap-space step `v`.
    #[inline]
    pub fn unproject_vector(&self, v: DVec2) -> DVec2 {
        v / self.scale
    }

    #[inline]
    pub fn encode(&self, distance: f64) -> f32 {
        (distance / self.range + 0.5) as f32
    }
}

fn fill_row_overlapping(
    list: &EdgeList,
    config: &MsdfConfig,
    combiner: &mut ContourCombiner,
    row: &mut [f32],
    sample_y: f64,
) {
    let y = (sample_y + 0.5) / config.scale.y - config.translate.y;
    for (x, texel) in row.chunks_exact_mut(3).enumerate() {
        let p = DVec2::new(
            (x as f64 + 0.5) / config.scale.x - config.translate.x,
            y,
        );
        combiner.reset();
        for (i, &(start, end)) in list.contours.iter().enumerate() {
            let len = end - start;
            for j in 0..len {
                let cur = start + j;
                let prev = start + (j + len - 1) % len;
                let next = start + (j + 1) % len;
                combiner.selectors[i].add_edge(
                    &list.edges,
                    prev as u32,
                    cur as u32,
                    next as u32,
                    p,
                );
            }
        }
        let d = combiner.distance(list, p);
        texel[0] = config.encode(d[0]);
        texel[1] = config.encode(d[1]);
        texel[2] = config.encode(d[2]);
    }
}

/// Generate a multi-channel signed distance field with full support for
/// overlapping and nested contours.
///
/// Rows are independent and processed in parallel; each row owns its own
/// per-contour selector scratch, so no synchronization is needed.
pub fn generate_msdf(shape: &Shape, config: &MsdfConfig, width: usize, height: usize) -> MsdfBitmap {
    let mut bitmap = MsdfBitmap::new(width, height);
    if width == 0 || height == 0 {
        return bitmap;
    }
    if shape.edge_count() == 0 {
        // Nothing to measure; encode "far outside" everywhere.
        bitmap.data.fill(config.encode(-config.range));
        return bitmap;
    }
    log::trace!(
        "generating {}x{} msdf for shape with {} contours",
        width,
        height,
        shape.contours.len()
    );
    let list = EdgeList::new(shape, config.invert_winding);
    let flip = shape.inverse_y_axis;
    let contour_count = list.contours.len();
    bitmap
        .data
        .par_chunks_mut(width * 3)
        .enumerate()
        .for_each(|(out_row, row)| {
            let sample_row = if flip { height - 1 - out_row } else { out_row };
            let mut combiner = ContourCombiner::new(contour_count);
            fill_row_overlapping(&list, config, &mut combiner, row, sample_row as f64);
        });
    bitmap
}

/// Generate an MSDF with one shared selector per pixel, skipping the
/// per-contour combination.
///
/// Faster, but only correct for shapes that already obey a clean non-zero
/// winding (e.g. after an external boolean union): overlapping or nested
/// ambiguities are resolved arbitrarily.
pub fn generate_msdf_simple(
    shape: &Shape,
    config: &MsdfConfig,
    width: usize,
    height: usize,
) -> MsdfBitmap {
    let mut bitmap = MsdfBitmap::new(width, height);
    if width == 0 || height == 0 {
        return bitmap;
    }
    if shape.edge_count() == 0 {
        bitmap.data.fill(config.encode(-config.range));
        return bitmap;
    }
    let list = EdgeList::new(shape, config.invert_winding);
    let flip = shape.inverse_y_axis;
    bitmap
        .data
        .par_chunks_mut(width * 3)
        .enumerate()
        .for_each(|(out_row, row)| {
            let sample_row = if flip { height - 1 - out_row } else { out_row };
            let y = (sample_row as f64 + 0.5) / config.scale.y - config.translate.y;
            for (x, texel) in row.chunks_exact_mut(3).enumerate() {
                let p = DVec2::new(
                    (x as f64 + 0.5) / config.scale.x - config.translate.x,
                    y,
                );
                let mut selector = MultiSelector::default();
                for &(start, end) in &list.contours {
                    let len = end - start;
                    for j in 0..len {
                        let cur = start + j;
                        let prev = start + (j + len - 1) % len;
                        let next = start + (j + 1) % len;
                        selector.add_edge(
                            &list.edges,
                            prev as u32,
                            cur as u32,
                            next as u32,
                            p,
                        );
                    }
                }
                let d = selector.distance(p, &list.edges);
                texel[0] = config.encode(d[0]);
                texel[1] = config.encode(d[1]);
                texel[2] = config.encode(d[2]);
            }
        });
    bitmap
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;
    use vexel_geometry::{assign_colors, Contour, Edge};

    pub(crate) fn unit_square_shape() -> Shape {
        let pts = [
            dvec2(0.0, 0.0),
            dvec2(1.0, 0.0),
            dvec2(1.0, 1.0),
            dvec2(0.0, 1.0),
        ];
        let mut shape = Shape {
            contours: vec![Contour::new(
                (0..4)
                    .map(|i| Edge::line(pts[i], pts[(i + 1) % 4]))
                    .collect(),
            )],
            inverse_y_axis: false,
        };
        assign_colors(&mut shape, 3.0, 0);
        shape
    }

    #[test]
    fn unit_square_16x16_center_inside() {
        // Unit square rendered edge-to-edge: range 4 pixels worth of shape
        // space, scale 16, no translation.
        let shape = unit_square_shape();
        let config = MsdfConfig::new(4.0 / 16.0, dvec2(16.0, 16.0), dvec2(0.0, 0.0));
        let bitmap = generate_msdf(&shape, &config, 16, 16);
        assert!(bitmap.median_at(8, 8) > 0.5 + 0.05);
    }

    #[test]
    fn unit_square_with_margin_outside_below_half() {
        // Same square with a margin: scale 8, centered in a 16x16 bitmap.
        let shape = unit_square_shape();
        let config = MsdfConfig::new(4.0 / 8.0, dvec2(8.0, 8.0), dvec2(0.5, 0.5));
        let bitmap = generate_msdf(&shape, &config, 16, 16);
        assert!(bitmap.median_at(8, 8) > 0.5);
        assert!(bitmap.median_at(0, 0) < 0.5 - 0.05);
        assert!(bitmap.median_at(15, 15) < 0.5 - 0.05);
    }

    #[test]
    fn median_sign_matches_point_in_polygon() {
        // Convex polygon: at least 99% of pixels must classify like the
        // ground-truth fill test (boundary texels near 0.5 excluded by the
        // ambiguity margin).
        let pts = [
            dvec2(0.2, 0.1),
            dvec2(0.9, 0.3),
            dvec2(0.8, 0.9),
            dvec2(0.3, 0.8),
        ];
        let mut shape = Shape {
            contours: vec![Contour::new(
                (0..4)
                    .map(|i| Edge::line(pts[i], pts[(i + 1) % 4]))
                    .collect(),
            )],
            inverse_y_axis: false,
        };
        assign_colors(&mut shape, 3.0, 0);
        let size = 32;
        let config = MsdfConfig::new(4.0 / 32.0, dvec2(32.0, 32.0), dvec2(0.0, 0.0));
        let bitmap = generate_msdf(&shape, &config, size, size);
        let mut agree = 0;
        let mut total = 0;
        for y in 0..size {
            for x in 0..size {
                let m = bitmap.median_at(x, y);
                if (m - 0.5).abs() < 0.02 {
                    continue; // ambiguous boundary texel
                }
                let p = config.unproject(dvec2(x as f64 + 0.5, y as f64 + 0.5));
                let inside = shape.filled_at(p);
                total += 1;
                if (m > 0.5) == inside {
                    agree += 1;
                }
            }
        }
        assert!(total > 0);
        assert!(
            agree as f64 >= 0.99 * total as f64,
            "{agree}/{total} agreements"
        );
    }

    #[test]
    fn inverse_y_axis_flips_rows() {
        // A square occupying the lower half of shape space lands in the
        // upper rows of the bitmap when the shape is marked Y-up.
        let pts = [
            dvec2(0.0, 0.0),
            dvec2(1.0, 0.0),
            dvec2(1.0, 0.5),
            dvec2(0.0, 0.5),
        ];
        let mut shape = Shape {
            contours: vec![Contour::new(
                (0..4)
                    .map(|i| Edge::line(pts[i], pts[(i + 1) % 4]))
                    .collect(),
            )],
            inverse_y_axis: true,
        };
        assign_colors(&mut shape, 3.0, 0);
        let config = MsdfConfig::new(4.0 / 16.0, dvec2(16.0, 16.0), dvec2(0.0, 0.0));
        let bitmap = generate_msdf(&shape, &config, 16, 16);
        // Shape row 2 (inside) appears at bitmap row 13.
        assert!(bitmap.median_at(8, 13) > 0.5);
        assert!(bitmap.median_at(8, 2) < 0.5);
    }

    #[test]
    fn simple_variant_agrees_on_single_contour() {
        let shape = unit_square_shape();
        let config = MsdfConfig::new(4.0 / 8.0, dvec2(8.0, 8.0), dvec2(0.5, 0.5));
        let a = generate_msdf(&shape, &config, 16, 16);
        let b = generate_msdf_simple(&shape, &config, 16, 16);
        for (x, y) in [(8, 8), (2, 2), (13, 4), (0, 15)] {
            let pa = a.pixel(x, y);
            let pb = b.pixel(x, y);
            for c in 0..3 {
                assert!((pa[c] - pb[c]).abs() < 1e-6, "texel ({x},{y}) ch {c}");
            }
        }
    }

    #[test]
    fn degenerate_dimensions_yield_empty_bitmaps() {
        // Zero-sized targets degrade silently, like the correction passes.
        let shape = unit_square_shape();
        let config = MsdfConfig::new(4.0 / 16.0, dvec2(16.0, 16.0), dvec2(0.0, 0.0));
        for (w, h) in [(0, 8), (8, 0), (0, 0)] {
            assert!(generate_msdf(&shape, &config, w, h).data.is_empty());
            assert!(generate_msdf_simple(&shape, &config, w, h).data.is_empty());
        }
    }

    #[test]
    fn empty_shape_encodes_outside() {
        let shape = Shape::new();
        let config = MsdfConfig::new(0.25, dvec2(16.0, 16.0), dvec2(0.0, 0.0));
        let bitmap = generate_msdf(&shape, &config, 8, 8);
        assert!(bitmap.median_at(4, 4) < 0.5);
    }
}
