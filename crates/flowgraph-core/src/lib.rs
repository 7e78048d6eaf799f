//! **flowgraph-core**: geometry shared by the *flowgraph* engine.
//!
//! Provides the lattice coordinate [`Point`], the half-open rectangle
//! [`Range`] used as grid bounds, and the square and hexagonal neighbour
//! tables the grid builders connect cells with.

pub mod geom;

pub use geom::{DIAGONAL_OFFSETS, HEX_OFFSETS, ORTHOGONAL_OFFSETS, Point, Range, RangeIter};
