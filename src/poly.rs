// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Polygon zones and their rasterization.
//!
//! Filling uses an even-odd scanline rule: edges cover the half-open row
//! range `[min_y, max_y)` and each pair of crossings covers the half-open
//! column range `[x0, x1)`, so adjacent polygons sharing an edge never paint
//! the same pixel twice.

use crate::{
    error::{FrameError, Result},
    frame::Rect,
};
use std::ops::Range;

/// Pixel coordinate.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Coord { x, y }
    }
}

/// Non-horizontal polygon side prepared for scan conversion.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Edge {
    /// First row the edge crosses
    pub min_y: i32,
    /// Row after the last one the edge crosses
    pub max_y: i32,
    /// Column at `min_y`
    pub min_x: f64,
    /// Change in x per row
    pub inv_slope: f64,
}

impl Edge {
    fn between(a: Coord, b: Coord) -> Option<Edge> {
        if a.y == b.y {
            return None;
        }
        let (top, bottom) = if a.y < b.y { (a, b) } else { (b, a) };
        Some(Edge {
            min_y: top.y,
            max_y: bottom.y,
            min_x: top.x as f64,
            inv_slope: (i64::from(bottom.x) - i64::from(top.x)) as f64
                / (i64::from(bottom.y) - i64::from(top.y)) as f64,
        })
    }

    /// Column where the edge crosses row `y`.
    pub fn x_at(&self, y: i32) -> f64 {
        self.min_x + (i64::from(y) - i64::from(self.min_y)) as f64 * self.inv_slope
    }
}

/// Horizontal run `[x0, x1)` on row `y`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub y: i32,
    pub x0: i32,
    pub x1: i32,
}

/// Closed polygon of at least three vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    vertices: Vec<Coord>,
    extent: Rect,
}

impl Polygon {
    pub fn new(vertices: Vec<Coord>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(FrameError::Argument(format!(
                "a polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        let min_x = vertices.iter().map(|v| v.x).min().unwrap_or_default();
        let max_x = vertices.iter().map(|v| v.x).max().unwrap_or_default();
        let min_y = vertices.iter().map(|v| v.y).min().unwrap_or_default();
        let max_y = vertices.iter().map(|v| v.y).max().unwrap_or_default();
        let width = i64::from(max_x) - i64::from(min_x) + 1;
        let height = i64::from(max_y) - i64::from(min_y) + 1;
        let (Ok(width), Ok(height)) = (i32::try_from(width), i32::try_from(height)) else {
            return Err(FrameError::Argument(format!(
                "polygon extent {}x{} does not fit a frame coordinate",
                width, height
            )));
        };
        Ok(Polygon {
            vertices,
            extent: Rect::new(min_x, min_y, width, height),
        })
    }

    pub fn vertices(&self) -> &[Coord] {
        &self.vertices
    }

    /// Smallest rectangle containing every vertex.
    pub fn extent(&self) -> Rect {
        self.extent
    }

    /// Non-horizontal sides sorted by `min_y`, then `min_x`.
    pub fn edges(&self) -> Vec<Edge> {
        let n = self.vertices.len();
        let mut edges: Vec<Edge> = (0..n)
            .filter_map(|i| Edge::between(self.vertices[i], self.vertices[(i + 1) % n]))
            .collect();
        edges.sort_by(|a, b| a.min_y.cmp(&b.min_y).then(a.min_x.total_cmp(&b.min_x)));
        edges
    }

    /// Interior runs, top to bottom.
    pub fn spans(&self) -> Vec<Span> {
        self.spans_within(i32::MIN..i32::MAX)
    }

    /// Interior runs on the rows in `rows` only.
    pub fn spans_within(&self, rows: Range<i32>) -> Vec<Span> {
        let edges = self.edges();
        let Some(first) = edges.first() else {
            return Vec::new();
        };
        let top = first.min_y.max(rows.start);
        let bottom = edges
            .iter()
            .map(|e| e.max_y)
            .max()
            .unwrap_or(top)
            .min(rows.end);

        let mut spans = Vec::new();
        let mut crossings = Vec::with_capacity(edges.len());
        for y in top..bottom {
            crossings.clear();
            crossings.extend(
                edges
                    .iter()
                    .take_while(|e| e.min_y <= y)
                    .filter(|e| y < e.max_y)
                    .map(|e| e.x_at(y)),
            );
            crossings.sort_by(f64::total_cmp);
            for pair in crossings.chunks_exact(2) {
                let x0 = pair[0].round() as i32;
                let x1 = pair[1].round() as i32;
                if x1 > x0 {
                    spans.push(Span { y, x0, x1 });
                }
            }
        }
        spans
    }

    /// Points on every side, including the closing one, stepped one pixel
    /// at a time along the longer axis.
    pub fn outline(&self) -> Vec<Coord> {
        self.outline_within(&self.extent)
    }

    /// Outline points that fall inside `clip`. Sides are only walked over
    /// the part that can reach the rectangle.
    pub fn outline_within(&self, clip: &Rect) -> Vec<Coord> {
        let (lo_x, hi_x) = (i64::from(clip.x), i64::from(clip.x) + i64::from(clip.width) - 1);
        let (lo_y, hi_y) = (i64::from(clip.y), i64::from(clip.y) + i64::from(clip.height) - 1);
        let inside = |x: i64, y: i64| (lo_x..=hi_x).contains(&x) && (lo_y..=hi_y).contains(&y);

        let n = self.vertices.len();
        let mut points = Vec::new();
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let (ax, ay) = (i64::from(a.x), i64::from(a.y));
            let (dx, dy) = (i64::from(b.x) - ax, i64::from(b.y) - ay);
            let steps = dx.abs().max(dy.abs());
            if steps == 0 {
                if inside(ax, ay) {
                    points.push(a);
                }
                continue;
            }

            // Parameter range of the side that lies within half a pixel of
            // the rectangle on both axes.
            let (mut t0, mut t1) = (0.0f64, 1.0f64);
            for (start, delta, lo, hi) in [(ax, dx, lo_x, hi_x), (ay, dy, lo_y, hi_y)] {
                if delta == 0 {
                    if start < lo || start > hi {
                        t1 = -1.0;
                    }
                    continue;
                }
                let u = (lo as f64 - 0.5 - start as f64) / delta as f64;
                let v = (hi as f64 + 0.5 - start as f64) / delta as f64;
                t0 = t0.max(u.min(v));
                t1 = t1.min(u.max(v));
            }
            if t0 > t1 {
                continue;
            }

            let first = ((t0 * steps as f64).floor() as i64).max(0);
            let last = ((t1 * steps as f64).ceil() as i64).min(steps);
            for s in first..=last {
                let t = s as f64 / steps as f64;
                let x = (ax as f64 + dx as f64 * t).round() as i64;
                let y = (ay as f64 + dy as f64 * t).round() as i64;
                if inside(x, y) {
                    points.push(Coord::new(x as i32, y as i32));
                }
            }
        }
        points
    }

    /// Whether `point` lies in the filled interior.
    pub fn contains(&self, point: Coord) -> bool {
        self.spans_within(point.y..point.y.saturating_add(1))
            .iter()
            .any(|s| s.y == point.y && s.x0 <= point.x && point.x < s.x1)
    }
}
