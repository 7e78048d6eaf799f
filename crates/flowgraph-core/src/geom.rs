//! Geometry primitives: [`Point`] and [`Range`].
//!
//! Grid builders use a [`Range`] as their bounds and key the cells they
//! create by [`Point`]. Neighbor tables for square and hexagonal lattices
//! live here so that every consumer agrees on the same topology.

use std::fmt;

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// A 2D integer lattice coordinate. X grows right, Y grows down.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Offsets of the four orthogonal neighbours (up, right, down, left).
pub const ORTHOGONAL_OFFSETS: [Point; 4] = [
    Point::new(0, -1),
    Point::new(1, 0),
    Point::new(0, 1),
    Point::new(-1, 0),
];

/// Offsets of the four diagonal neighbours.
pub const DIAGONAL_OFFSETS: [Point; 4] = [
    Point::new(1, -1),
    Point::new(1, 1),
    Point::new(-1, 1),
    Point::new(-1, -1),
];

/// Hexagonal neighbour offsets in the odd-row ("pointy") layout, where odd
/// rows are shifted half a cell to the right. Index 0 is used for even rows,
/// index 1 for odd rows.
///
/// ```text
///    / \     / \
///  /     \ /     \
/// |  0,0  |  1,0  |
///  \     / \     / \
///    \ /     \ /     \
///     |  0,1  |  1,1  |
///    / \     / \     /
///  /     \ /     \ /
/// |  0,2  |  1,2  |
///  \     / \     /
///    \ /     \ /
/// ```
pub const HEX_OFFSETS: [[Point; 6]; 2] = [
    [
        Point::new(-1, -1),
        Point::new(0, -1),
        Point::new(-1, 0),
        Point::new(1, 0),
        Point::new(-1, 1),
        Point::new(0, 1),
    ],
    [
        Point::new(0, -1),
        Point::new(1, -1),
        Point::new(-1, 0),
        Point::new(1, 0),
        Point::new(0, 1),
        Point::new(1, 1),
    ],
];

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// `self + d`, or `None` if a coordinate leaves the `i32` range.
    #[inline]
    pub fn checked_add(self, d: Point) -> Option<Point> {
        Some(Self::new(self.x.checked_add(d.x)?, self.y.checked_add(d.y)?))
    }

    /// `self - d`, or `None` if a coordinate leaves the `i32` range.
    #[inline]
    pub fn checked_sub(self, d: Point) -> Option<Point> {
        Some(Self::new(self.x.checked_sub(d.x)?, self.y.checked_sub(d.y)?))
    }

    /// The orthogonal neighbours that exist in `i32` space.
    #[inline]
    pub fn neighbors_orthogonal(self) -> impl Iterator<Item = Point> {
        ORTHOGONAL_OFFSETS
            .into_iter()
            .filter_map(move |d| self.checked_add(d))
    }

    /// The diagonal neighbours that exist in `i32` space.
    #[inline]
    pub fn neighbors_diagonal(self) -> impl Iterator<Item = Point> {
        DIAGONAL_OFFSETS
            .into_iter()
            .filter_map(move |d| self.checked_add(d))
    }

    /// The hexagonal neighbours in the odd-row layout that exist in `i32`
    /// space.
    #[inline]
    pub fn neighbors_hex(self) -> impl Iterator<Item = Point> {
        let parity = self.y.rem_euclid(2) as usize;
        HEX_OFFSETS[parity]
            .into_iter()
            .filter_map(move |d| self.checked_add(d))
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Point {
    /// Row-major: rows first, then columns.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

/// A half-open rectangle \[min, max). `min` is inclusive, `max` is exclusive.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub min: Point,
    pub max: Point,
}

impl Range {
    /// Create a new range from two corners, canonicalized so that
    /// `min` ≤ `max` on each axis.
    #[inline]
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min: Point::new(x0.min(x1), y0.min(y1)),
            max: Point::new(x0.max(x1), y0.max(y1)),
        }
    }

    /// Width of the range, `0` when inverted.
    #[inline]
    pub fn width(self) -> u32 {
        if self.max.x > self.min.x {
            self.max.x.abs_diff(self.min.x)
        } else {
            0
        }
    }

    /// Height of the range, `0` when inverted.
    #[inline]
    pub fn height(self) -> u32 {
        if self.max.y > self.min.y {
            self.max.y.abs_diff(self.min.y)
        } else {
            0
        }
    }

    /// Total number of cells in the range.
    #[inline]
    pub fn len(self) -> usize {
        (self.width() as usize).saturating_mul(self.height() as usize)
    }

    /// Whether the range has zero or negative area.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    /// Whether `p` is inside the half-open range.
    #[inline]
    pub fn contains(self, p: Point) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Whether `p` lies on the outermost ring of cells.
    #[inline]
    pub fn on_border(self, p: Point) -> bool {
        self.contains(p)
            && (p.x == self.min.x
                || p.y == self.min.y
                || p.x == self.max.x - 1
                || p.y == self.max.y - 1)
    }

    /// Row-major iterator over every point in the range.
    #[inline]
    pub fn iter(self) -> RangeIter {
        RangeIter {
            range: self,
            cur: self.min,
        }
    }
}

impl IntoIterator for Range {
    type Item = Point;
    type IntoIter = RangeIter;
    #[inline]
    fn into_iter(self) -> RangeIter {
        self.iter()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}-{})", self.min, self.max)
    }
}

/// Row-major iterator over the points in a [`Range`].
#[derive(Clone, Debug)]
pub struct RangeIter {
    range: Range,
    cur: Point,
}

impl Iterator for RangeIter {
    type Item = Point;

    #[inline]
    fn next(&mut self) -> Option<Point> {
        if self.range.is_empty() || self.cur.y >= self.range.max.y {
            return None;
        }
        let p = self.cur;
        self.cur.x += 1;
        if self.cur.x >= self.range.max.x {
            self.cur.x = self.range.min.x;
            self.cur.y += 1;
        }
        Some(p)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.range.is_empty() || self.cur.y >= self.range.max.y {
            return (0, Some(0));
        }
        let w = self.range.width() as usize;
        let in_row = self.range.max.x.abs_diff(self.cur.x) as usize;
        let rows_after = self.range.max.y.abs_diff(self.cur.y) as usize - 1;
        let total = rows_after.saturating_mul(w).saturating_add(in_row);
        (total, Some(total))
    }
}

impl ExactSizeIterator for RangeIter {}
