//! Clipping against a square tile window.
//!
//! All functions work on tile-local coordinates where the window spans
//! `min..=max` on both axes (the tile extent widened by its buffer).
//! Lines use Liang-Barsky per segment and remember how far along the input
//! each clipped piece starts and ends. Rings use Sutherland-Hodgman.

use super::geometry::path_length;

/// One piece of a clipped line.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippedLine {
    pub points: Vec<[f64; 2]>,
    /// Distance along the input line where this piece starts.
    pub start: f64,
    /// Distance along the input line where this piece ends.
    pub end: f64,
}

impl ClippedLine {
    /// Position of this piece along a line of `total` length, as fractions.
    pub fn range(&self, total: f64) -> (f64, f64) {
        if total > 0.0 {
            (self.start / total, self.end / total)
        } else {
            (0.0, 1.0)
        }
    }
}

fn inside(p: &[f64; 2], min: f64, max: f64) -> bool {
    p[0] >= min && p[0] <= max && p[1] >= min && p[1] <= max
}

/// Keeps the points that fall inside the window.
pub fn clip_points(points: &[[f64; 2]], min: f64, max: f64) -> Vec<[f64; 2]> {
    points
        .iter()
        .filter(|p| inside(p, min, max))
        .copied()
        .collect()
}

/// Cuts a polyline into the pieces that cross the window.
pub fn clip_polyline(points: &[[f64; 2]], min: f64, max: f64) -> Vec<ClippedLine> {
    let mut pieces = Vec::new();
    let mut current: Option<ClippedLine> = None;
    let mut travelled = 0.0;

    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let length = path_length(pair);

        match clip_segment(a, b, min, max) {
            Some((t0, t1)) => {
                let (p0, p1) = (lerp(a, b, t0), lerp(a, b, t1));
                let (d0, d1) = (travelled + length * t0, travelled + length * t1);

                match current.as_mut() {
                    // The previous segment left through `b`, which is where this one starts.
                    Some(piece) if t0 == 0.0 => {
                        piece.points.push(p1);
                        piece.end = d1;
                    }
                    _ => {
                        pieces.extend(current.take());
                        current = Some(ClippedLine {
                            points: vec![p0, p1],
                            start: d0,
                            end: d1,
                        });
                    }
                }
                if t1 < 1.0 {
                    pieces.extend(current.take());
                }
            }
            None => pieces.extend(current.take()),
        }
        travelled += length;
    }

    pieces.extend(current);
    pieces
}

/// Parametric range of `a`-`b` inside the window, or `None` if it misses.
fn clip_segment(a: [f64; 2], b: [f64; 2], min: f64, max: f64) -> Option<(f64, f64)> {
    let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);

    for (p, q) in [
        (-dx, a[0] - min),
        (dx, max - a[0]),
        (-dy, a[1] - min),
        (dy, max - a[1]),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((t0, t1))
}

fn lerp(a: [f64; 2], b: [f64; 2], t: f64) -> [f64; 2] {
    if t == 0.0 {
        a
    } else if t == 1.0 {
        b
    } else {
        [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
    }
}

#[derive(Debug, Clone, Copy)]
enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    fn inside(self, p: [f64; 2], min: f64, max: f64) -> bool {
        match self {
            Edge::Left => p[0] >= min,
            Edge::Right => p[0] <= max,
            Edge::Top => p[1] >= min,
            Edge::Bottom => p[1] <= max,
        }
    }

    fn intersect(self, a: [f64; 2], b: [f64; 2], min: f64, max: f64) -> [f64; 2] {
        match self {
            Edge::Left | Edge::Right => {
                let x = if matches!(self, Edge::Left) { min } else { max };
                let t = (x - a[0]) / (b[0] - a[0]);
                [x, a[1] + t * (b[1] - a[1])]
            }
            Edge::Top | Edge::Bottom => {
                let y = if matches!(self, Edge::Top) { min } else { max };
                let t = (y - a[1]) / (b[1] - a[1]);
                [a[0] + t * (b[0] - a[0]), y]
            }
        }
    }
}

/// Clips a ring to the window. The result is closed, or empty when nothing
/// of the ring is inside.
pub fn clip_ring(ring: &[[f64; 2]], min: f64, max: f64) -> Vec<[f64; 2]> {
    let mut open = ring.to_vec();
    if open.len() > 1 && open.first() == open.last() {
        open.pop();
    }

    for edge in [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom] {
        if open.is_empty() {
            break;
        }
        open = clip_against_edge(&open, edge, min, max);
    }

    if let Some(&first) = open.first() {
        open.push(first);
    }
    open
}

fn clip_against_edge(points: &[[f64; 2]], edge: Edge, min: f64, max: f64) -> Vec<[f64; 2]> {
    let mut output = Vec::with_capacity(points.len() + 4);
    let Some(&last) = points.last() else {
        return output;
    };

    let mut prev = last;
    for &cur in points {
        let (cur_in, prev_in) = (edge.inside(cur, min, max), edge.inside(prev, min, max));
        if cur_in {
            if !prev_in {
                output.push(edge.intersect(prev, cur, min, max));
            }
            output.push(cur);
        } else if prev_in {
            output.push(edge.intersect(prev, cur, min, max));
        }
        prev = cur;
    }
    output
}
