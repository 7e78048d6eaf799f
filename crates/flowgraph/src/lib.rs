//! Multi-source shortest-path fields over weighted graphs.
//!
//! A [`FlowGraph`] holds points with a terrain kind, connected by weighted
//! directed edges. A recalculation runs a multi-source Dijkstra search from
//! a set of origins and stores a [`Field`]: for every reached point the
//! cheapest cost and the adjacent point along that path.
//!
//! - **Graph store**: points, terrain, enabled state and connections
//!   ([`FlowGraph::add_point`], [`FlowGraph::connect_points`], ...)
//! - **Grid builders**: square, hexagonal and masked custom-offset lattices
//!   ([`FlowGraph::add_square_grid`], [`FlowGraph::add_hexagonal_grid`],
//!   [`FlowGraph::add_custom_grid`])
//! - **Recalculation** ([`FlowGraph::recalculate`]) tuned by
//!   [`RecalcOptions`]: destination or source mode, cost cap, initial costs,
//!   terrain weights and early termination
//! - **Queries** over the last field ([`FlowGraph::get_cost_at_point`],
//!   [`FlowGraph::get_shortest_path_from_point`], ...)
//! - **Batches** of [`Operation`]s applied all-or-nothing
//!
//! Any successful mutation makes the current field stale: queries then fail
//! with [`GraphError::StaleOrAbsentField`] until the next recalculation.
//!
//! # Example
//!
//! ```
//! use flowgraph::{Direction, FlowGraph, PointId, RecalcOptions, Terrain};
//!
//! let mut g = FlowGraph::new();
//! for i in 0..3 {
//!     g.add_point(PointId(i), Terrain::Default).unwrap();
//! }
//! g.connect_points(PointId(0), PointId(1), 1.0, true).unwrap();
//! g.connect_points(PointId(1), PointId(2), 1.0, true).unwrap();
//!
//! g.recalculate(&[PointId(2)], &RecalcOptions::default()).unwrap();
//! assert_eq!(g.get_cost_at_point(PointId(0)), Ok(2.0));
//! assert_eq!(g.get_direction_at_point(PointId(0)), Ok(Direction::Next(PointId(1))));
//! assert_eq!(
//!     g.get_shortest_path_from_point(PointId(0)),
//!     Ok(vec![PointId(0), PointId(1), PointId(2)])
//! );
//! ```

mod error;
mod field;
mod grids;
mod operation;
mod options;
mod query;
mod recalc;
mod store;
mod types;

pub use error::{BatchError, EdgeFault, GraphError};
pub use field::{Field, FieldEntry};
pub use flowgraph_core::{Point, Range};
pub use grids::GridMap;
pub use operation::Operation;
pub use options::RecalcOptions;
pub use store::FlowGraph;
pub use types::{Direction, PointId, Terrain, UNREACHABLE, UNREACHABLE_ID};
