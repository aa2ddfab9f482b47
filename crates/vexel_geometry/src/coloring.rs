//! Edge-color assignment for multi-channel distance fields.
//!
//! Each edge gets a 2-of-3 channel mask so that at every genuine corner the
//! mask changes with at most one shared bit.  The error-correction pass uses
//! exactly that rule to tell real corners from interpolation artifacts, so
//! the invariant here is load-bearing: no two consecutive edges may share
//! all three channels.

use glam::DVec2;

use crate::edge::{Edge, EdgeColor};
use crate::{cross, Shape};

/// Pick the next color in the cycle.  `banned` bits are avoided so the color
/// wrapping around a contour never collides with the first spline's color.
fn switch_color(color: &mut EdgeColor, seed: &mut u64, banned: EdgeColor) {
    let combined = color.common(banned);
    if combined == EdgeColor::RED.0 || combined == EdgeColor::GREEN.0 || combined == EdgeColor::BLUE.0
    {
        *color = EdgeColor(combined ^ EdgeColor::WHITE.0);
        return;
    }
    if *color == EdgeColor::BLACK || *color == EdgeColor::WHITE {
        const START: [EdgeColor; 3] = [EdgeColor::CYAN, EdgeColor::MAGENTA, EdgeColor::YELLOW];
        *color = START[(*seed % 3) as usize];
        *seed /= 3;
        return;
    }
    let shifted = (color.0 as u32) << (1 + (*seed & 1));
    *color = EdgeColor(((shifted | (shifted >> 3)) & EdgeColor::WHITE.0 as u32) as u8);
    *seed >>= 1;
}

/// Incoming/outgoing direction pair turns sharply enough to count as a
/// corner: either it turns past 90 degrees, or past the sine threshold.
fn is_corner(a_dir: DVec2, b_dir: DVec2, cross_threshold: f64) -> bool {
    a_dir.dot(b_dir) <= 0.0 || cross(a_dir, b_dir).abs() > cross_threshold
}

/// Assign channel masks to every edge of `shape`.
///
/// `angle_threshold` is the maximum smooth joint angle in radians (3.0 is a
/// common choice); `seed` varies the color rotation between glyphs.
pub fn assign_colors(shape: &mut Shape, angle_threshold: f64, mut seed: u64) {
    let cross_threshold = angle_threshold.sin();
    let mut corners = Vec::new();

    for contour in &mut shape.contours {
        if contour.edges.is_empty() {
            continue;
        }

        // Find all corner positions.
        corners.clear();
        {
            let mut prev_direction = contour.edges.last().unwrap().segment.direction(1.0);
            for (index, edge) in contour.edges.iter().enumerate() {
                if is_corner(
                    prev_direction.normalize_or_zero(),
                    edge.segment.direction(0.0).normalize_or_zero(),
                    cross_threshold,
                ) {
                    corners.push(index);
                }
                prev_direction = edge.segment.direction(1.0);
            }
        }

        match corners.len() {
            // Smooth contour: a single channel set everywhere suffices.
            0 => {
                for edge in &mut contour.edges {
                    edge.color = EdgeColor::WHITE;
                }
            }
            // "Teardrop": one corner only, so the three colors must meet
            // back at that corner.
            1 => {
                let mut colors = [EdgeColor::WHITE; 3];
                switch_color(&mut colors[0], &mut seed, EdgeColor::BLACK);
                colors[2] = colors[0];
                switch_color(&mut colors[2], &mut seed, EdgeColor::BLACK);
                let corner = corners[0];
                let m = contour.edges.len();
                if m >= 3 {
                    for i in 0..m {
                        // Distribute the three colors over the loop starting
                        // at the corner.
                        let t = 3.5 + 2.875 * i as f64 / (m - 1) as f64 - 1.4375;
                        let idx = (t.floor() as usize).saturating_sub(2).min(2);
                        contour.edges[(corner + i) % m].color = colors[idx];
                    }
                } else if m == 2 {
                    let split0 = contour.edges[0].segment.split_in_thirds();
                    let split1 = contour.edges[1].segment.split_in_thirds();
                    let mut parts: Vec<Edge> = split0
                        .into_iter()
                        .chain(split1)
                        .map(Edge::new)
                        .collect();
                    // Rotate so the corner sits at the start of the list.
                    if corner == 1 {
                        parts.rotate_left(3);
                    }
                    parts[0].color = colors[0];
                    parts[1].color = colors[0];
                    parts[2].color = colors[1];
                    parts[3].color = colors[1];
                    parts[4].color = colors[2];
                    parts[5].color = colors[2];
                    contour.edges = parts;
                } else {
                    let split = contour.edges[0].segment.split_in_thirds();
                    let mut parts: Vec<Edge> = split.into_iter().map(Edge::new).collect();
                    parts[0].color = colors[0];
                    parts[1].color = colors[1];
                    parts[2].color = colors[2];
                    contour.edges = parts;
                }
            }
            // General case: rotate colors at every corner.
            _ => {
                let corner_count = corners.len();
                let m = contour.edges.len();
                let start = corners[0];
                let mut spline = 0;
                let mut color = EdgeColor::WHITE;
                switch_color(&mut color, &mut seed, EdgeColor::BLACK);
                let initial_color = color;
                for i in 0..m {
                    let index = (start + i) % m;
                    if spline + 1 < corner_count && corners[spline + 1] == index {
                        spline += 1;
                        let banned = if spline == corner_count - 1 {
                            initial_color
                        } else {
                            EdgeColor::BLACK
                        };
                        switch_color(&mut color, &mut seed, banned);
                    }
                    contour.edges[index].color = color;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::Contour;
    use crate::edge::Edge;
    use glam::dvec2;

    fn square_shape() -> Shape {
        let pts = [
            dvec2(0.0, 0.0),
            dvec2(1.0, 0.0),
            dvec2(1.0, 1.0),
            dvec2(0.0, 1.0),
        ];
        Shape {
            contours: vec![Contour::new(
                (0..4)
                    .map(|i| Edge::line(pts[i], pts[(i + 1) % 4]))
                    .collect(),
            )],
            inverse_y_axis: false,
        }
    }

    fn channel_count(c: EdgeColor) -> u32 {
        (c.0 as u32).count_ones()
    }

    #[test]
    fn every_edge_gets_two_channels() {
        let mut shape = square_shape();
        assign_colors(&mut shape, 3.0, 0);
        for contour in &shape.contours {
            for edge in &contour.edges {
                assert_eq!(channel_count(edge.color), 2, "mask {:?}", edge.color);
            }
        }
    }

    #[test]
    fn consecutive_edges_never_share_all_channels() {
        let mut shape = square_shape();
        assign_colors(&mut shape, 3.0, 14695981039346656037);
        let edges = &shape.contours[0].edges;
        for i in 0..edges.len() {
            let a = edges[i].color;
            let b = edges[(i + 1) % edges.len()].color;
            assert_ne!(a.common(b), EdgeColor::WHITE.0);
            // A corner junction keeps at most one shared bit.
            assert!(a.common(b).count_ones() <= 1);
        }
    }

    #[test]
    fn smooth_contour_is_all_white() {
        // A "circle" approximated by quadratics with smooth joints.
        let k = 0.5;
        let p = [
            dvec2(1.0, 0.0),
            dvec2(0.0, 1.0),
            dvec2(-1.0, 0.0),
            dvec2(0.0, -1.0),
        ];
        let c = [
            dvec2(1.0, k),
            dvec2(-k, 1.0),
            dvec2(-1.0, -k),
            dvec2(k, -1.0),
        ];
        // Joints are not perfectly tangent-continuous, so use a generous
        // threshold that treats them as smooth.
        let mut shape = Shape {
            contours: vec![Contour::new(
                (0..4)
                    .map(|i| Edge::quadratic(p[i], c[i], p[(i + 1) % 4]))
                    .collect(),
            )],
            inverse_y_axis: false,
        };
        assign_colors(&mut shape, 1.5, 0);
        for edge in &shape.contours[0].edges {
            assert_eq!(edge.color, EdgeColor::WHITE);
        }
    }

    #[test]
    fn teardrop_single_edge_splits_in_three() {
        // One quadratic loop meeting itself at a sharp point.
        let mut shape = Shape {
            contours: vec![Contour::new(vec![Edge::quadratic(
                dvec2(0.0, 0.0),
                dvec2(2.0, 3.0),
                dvec2(0.0, 0.0),
            )])],
            inverse_y_axis: false,
        };
        assign_colors(&mut shape, 3.0, 0);
        let edges = &shape.contours[0].edges;
        assert_eq!(edges.len(), 3);
        assert_ne!(edges[0].color, edges[1].color);
        assert_ne!(edges[1].color, edges[2].color);
    }
}
