//! MaxRects rectangle bin packing for atlas layout.
//!
//! The packer keeps two lists: rectangles already placed, and maximal free
//! rectangles still available.  Every insertion scores all free rectangles
//! under the chosen heuristic, places the new rectangle in the winner, then
//! splits every intersecting free rectangle into its up-to-four remainders
//! and prunes free rectangles contained in others.  Placement is stateful
//! and sequential; one packer instance must not be shared across threads.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    #[inline]
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    #[inline]
    fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.width <= self.x + self.width
            && other.y + other.height <= self.y + self.height
    }

    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Placement scoring strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackHeuristic {
    /// Minimize the shorter leftover side of the chosen free rectangle.
    BestShortSideFit,
    /// Minimize the longer leftover side.
    BestLongSideFit,
    /// Minimize leftover area.
    BestAreaFit,
    /// Lowest placement, ties broken towards the left.
    BottomLeft,
    /// Maximize shared perimeter with already-placed rectangles and the
    /// bin edges.
    ContactPoint,
}

/// A successful placement.  `rotated` is set when the rectangle was placed
/// with its sides swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedRect {
    pub rect: Rect,
    pub rotated: bool,
}

pub struct RectPacker {
    width: i32,
    height: i32,
    /// Allow 90° rotation of inserted rectangles.  On by default; atlas
    /// slots that carry oriented bitmaps turn it off.
    pub allow_rotation: bool,
    used: Vec<Rect>,
    free: Vec<Rect>,
}

impl RectPacker {
    /// A packer over a `width` × `height` area.  The usable region is inset
    /// by a one-pixel border so bilinear sampling at slot edges never reads
    /// across the atlas boundary.
    pub fn new(width: i32, height: i32) -> Self {
        let inner = Rect {
            x: 1,
            y: 1,
            width: (width - 2).max(0),
            height: (height - 2).max(0),
        };
        Self {
            width,
            height,
            allow_rotation: true,
            used: Vec::new(),
            free: vec![inner],
        }
    }

    pub fn used_rects(&self) -> &[Rect] {
        &self.used
    }

    /// Place a `width` × `height` rectangle, or `None` when no free
    /// rectangle can hold it in either orientation.
    pub fn insert(&mut self, width: i32, height: i32, heuristic: PackHeuristic) -> Option<PackedRect> {
        if width <= 0 || height <= 0 {
            return None;
        }
        let placed = self.find_position(width, height, heuristic)?;
        self.place(placed.rect);
        Some(placed)
    }

    fn place(&mut self, node: Rect) {
        let mut remainders = Vec::new();
        let mut i = 0;
        while i < self.free.len() {
            if split_free_rect(self.free[i], &node, &mut remainders) {
                self.free.remove(i);
            } else {
                i += 1;
            }
        }
        self.free.append(&mut remainders);
        self.prune_free_list();
        self.used.push(node);
    }

    fn find_position(&self, width: i32, height: i32, heuristic: PackHeuristic) -> Option<PackedRect> {
        let mut best: Option<PackedRect> = None;
        let mut best_score = (i64::MAX, i64::MAX);
        let mut orientations = vec![(width, height, false)];
        if self.allow_rotation && width != height {
            orientations.push((height, width, true));
        }
        for free in &self.free {
            for &(w, h, rotated) in &orientations {
                if free.width < w || free.height < h {
                    continue;
                }
                let score = self.score(free, w, h, heuristic);
                if score < best_score {
                    best_score = score;
                    best = Some(PackedRect {
                        rect: Rect {
                            x: free.x,
                            y: free.y,
                            width: w,
                            height: h,
                        },
                        rotated,
                    });
                }
            }
        }
        best
    }

    /// Primary and tie-break score for placing a `w` × `h` rectangle at the
    /// origin of `free`.  Lower wins; contact-point scores are negated so
    /// the same comparison applies.
    fn score(&self, free: &Rect, w: i32, h: i32, heuristic: PackHeuristic) -> (i64, i64) {
        let leftover_h = (free.width - w).abs() as i64;
        let leftover_v = (free.height - h).abs() as i64;
        let short_side = leftover_h.min(leftover_v);
        let long_side = leftover_h.max(leftover_v);
        match heuristic {
            PackHeuristic::BestShortSideFit => (short_side, long_side),
            PackHeuristic::BestLongSideFit => (long_side, short_side),
            PackHeuristic::BestAreaFit => {
                (free.area() - w as i64 * h as i64, short_side)
            }
            PackHeuristic::BottomLeft => ((free.y + h) as i64, free.x as i64),
            PackHeuristic::ContactPoint => {
                (-self.contact_point_score(free.x, free.y, w, h), 0)
            }
        }
    }

    fn contact_point_score(&self, x: i32, y: i32, w: i32, h: i32) -> i64 {
        let mut score = 0i64;
        // Walls of the usable region, which is inset by the border pixel.
        if x == 1 || x + w == self.width - 1 {
            score += h as i64;
        }
        if y == 1 || y + h == self.height - 1 {
            score += w as i64;
        }
        for used in &self.used {
            if used.x == x + w || used.x + used.width == x {
                score += common_interval(used.y, used.y + used.height, y, y + h) as i64;
            }
            if used.y == y + h || used.y + used.height == y {
                score += common_interval(used.x, used.x + used.width, x, x + w) as i64;
            }
        }
        score
    }

    fn prune_free_list(&mut self) {
        let mut i = 0;
        'outer: while i < self.free.len() {
            let mut j = i + 1;
            while j < self.free.len() {
                if self.free[j].contains(&self.free[i]) {
                    self.free.remove(i);
                    continue 'outer;
                }
                if self.free[i].contains(&self.free[j]) {
                    self.free.remove(j);
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
    }
}

#[inline]
fn common_interval(a_start: i32, a_end: i32, b_start: i32, b_end: i32) -> i32 {
    if a_end < b_start || b_end < a_start {
        0
    } else {
        a_end.min(b_end) - a_start.max(b_start)
    }
}

/// Split `free` against a newly placed `used` rectangle.  Appends the up to
/// four maximal remainders and returns true when `free` was consumed;
/// returns false when the two do not intersect.
fn split_free_rect(free: Rect, used: &Rect, out: &mut Vec<Rect>) -> bool {
    if !free.intersects(used) {
        return false;
    }
    if used.x < free.x + free.width && used.x + used.width > free.x {
        // Remainder above the used rectangle.
        if used.y > free.y && used.y < free.y + free.height {
            out.push(Rect {
                height: used.y - free.y,
                ..free
            });
        }
        // Remainder below.
        if used.y + used.height < free.y + free.height {
            out.push(Rect {
                y: used.y + used.height,
                height: free.y + free.height - (used.y + used.height),
                ..free
            });
        }
    }
    if used.y < free.y + free.height && used.y + used.height > free.y {
        // Remainder to the left.
        if used.x > free.x && used.x < free.x + free.width {
            out.push(Rect {
                width: used.x - free.x,
                ..free
            });
        }
        // Remainder to the right.
        if used.x + used.width < free.x + free.width {
            out.push(Rect {
                x: used.x + used.width,
                width: free.x + free.width - (used.x + used.width),
                ..free
            });
        }
    }
    true
}
