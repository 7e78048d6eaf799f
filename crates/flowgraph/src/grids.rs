//! Square, hexagonal and custom-offset lattice builders.

use std::collections::BTreeMap;

use flowgraph_core::{Point, Range};

use crate::error::{EdgeFault, GraphError};
use crate::store::{FlowGraph, check_weight};
use crate::types::{PointId, Terrain};

/// Coordinate to point id mapping returned by the grid builders.
///
/// The graph does not keep this mapping; callers that need coordinate
/// lookups hold on to it and pass it back when extending a grid.
pub type GridMap = BTreeMap<Point, PointId>;

/// Link enumeration for a lattice, with the weight of each link.
trait Lattice {
    /// Append the links leaving `p` into `buf` as `(target, weight)`.
    fn outgoing(&self, p: Point, buf: &mut Vec<(Point, f32)>);

    /// Append the links entering `p` into `buf` as `(source, weight)`.
    /// Symmetric lattices reuse their outgoing links.
    fn incoming(&self, p: Point, buf: &mut Vec<(Point, f32)>) {
        self.outgoing(p, buf);
    }
}

struct SquareLattice {
    orthogonal: Option<f32>,
    diagonal: Option<f32>,
}

impl Lattice for SquareLattice {
    fn outgoing(&self, p: Point, buf: &mut Vec<(Point, f32)>) {
        if let Some(w) = self.orthogonal {
            buf.extend(p.neighbors_orthogonal().map(|q| (q, w)));
        }
        if let Some(w) = self.diagonal {
            buf.extend(p.neighbors_diagonal().map(|q| (q, w)));
        }
    }
}

struct HexLattice {
    weight: Option<f32>,
}

impl Lattice for HexLattice {
    fn outgoing(&self, p: Point, buf: &mut Vec<(Point, f32)>) {
        if let Some(w) = self.weight {
            buf.extend(p.neighbors_hex().map(|q| (q, w)));
        }
    }
}

/// One-way links given as relative offsets. Not necessarily symmetric.
struct OffsetLattice {
    links: Vec<(Point, f32)>,
}

impl Lattice for OffsetLattice {
    fn outgoing(&self, p: Point, buf: &mut Vec<(Point, f32)>) {
        buf.extend(
            self.links
                .iter()
                .filter_map(|&(d, w)| p.checked_add(d).map(|q| (q, w))),
        );
    }

    fn incoming(&self, p: Point, buf: &mut Vec<(Point, f32)>) {
        buf.extend(
            self.links
                .iter()
                .filter_map(|&(d, w)| p.checked_sub(d).map(|q| (q, w))),
        );
    }
}

/// Interpret a lattice link cost: `+inf` and NaN switch the link class off,
/// anything else must be a valid edge weight.
fn link_weight(cost: f32) -> Result<Option<f32>, GraphError> {
    if cost.is_nan() || cost == f32::INFINITY {
        return Ok(None);
    }
    check_weight(cost)?;
    Ok(Some(cost))
}

impl FlowGraph {
    /// Add a square grid covering `bounds`.
    ///
    /// Each cell is linked both ways to its 4 orthogonal neighbours at
    /// `orthogonal_cost` and its 4 diagonal neighbours at `diagonal_cost`.
    /// Passing `f32::INFINITY` (or NaN) for a cost leaves that class of
    /// links out.
    ///
    /// New cells take the smallest free ids starting at `first_id` (`0`
    /// when `None`), in row-major order.
    ///
    /// `existing` is a mapping from earlier builder calls. Cells it maps to
    /// a live point are reused as is; new cells are linked to every
    /// neighbour found in the new region or in `existing`, so grids can be
    /// grown piece by piece. Returns the mapping for all of `bounds`.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidEdge`] for a finite cost that is not positive,
    /// [`GraphError::IdsExhausted`] if the id space runs out. The graph is
    /// left untouched in both cases.
    pub fn add_square_grid(
        &mut self,
        bounds: Range,
        terrain: Terrain,
        orthogonal_cost: f32,
        diagonal_cost: f32,
        first_id: Option<PointId>,
        existing: &GridMap,
    ) -> Result<GridMap, GraphError> {
        let lattice = SquareLattice {
            orthogonal: link_weight(orthogonal_cost)?,
            diagonal: link_weight(diagonal_cost)?,
        };
        let region = self.build_grid(bounds, terrain, first_id, existing, |_| true, &lattice)?;
        log::debug!("square grid {bounds}: {} cells", region.len());
        Ok(region)
    }

    /// Add a hexagonal grid covering `bounds`, every cell linked both ways
    /// to its 6 neighbours at `weight`.
    ///
    /// Uses the odd-row layout of [`HEX_OFFSETS`](flowgraph_core::HEX_OFFSETS).
    /// For a "flat" orientation swap the axes of `bounds` and of the
    /// returned coordinates. Ids, merging with `existing` and errors work as
    /// in [`add_square_grid`](Self::add_square_grid).
    pub fn add_hexagonal_grid(
        &mut self,
        bounds: Range,
        terrain: Terrain,
        weight: f32,
        first_id: Option<PointId>,
        existing: &GridMap,
    ) -> Result<GridMap, GraphError> {
        let lattice = HexLattice {
            weight: link_weight(weight)?,
        };
        let region = self.build_grid(bounds, terrain, first_id, existing, |_| true, &lattice)?;
        log::debug!("hexagonal grid {bounds}: {} cells", region.len());
        Ok(region)
    }

    /// Add a grid over the cells of `bounds` for which `walkable` holds,
    /// linked by a caller-defined table of relative offsets.
    ///
    /// Each `(offset, cost)` in `links` connects a cell one way to the cell
    /// at `cell + offset`; list both `d` and `-d` for two-way movement. A
    /// cost of `+inf` or NaN drops that entry. Cells left out by `walkable`
    /// get no point and no links, even if `existing` maps them. Ids and
    /// merging work as in [`add_square_grid`](Self::add_square_grid).
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidEdge`] for a finite cost that is not positive or
    /// a zero offset, [`GraphError::IdsExhausted`] if the id space runs out.
    /// The graph is left untouched in both cases.
    pub fn add_custom_grid(
        &mut self,
        bounds: Range,
        terrain: Terrain,
        walkable: impl Fn(Point) -> bool,
        links: &[(Point, f32)],
        first_id: Option<PointId>,
        existing: &GridMap,
    ) -> Result<GridMap, GraphError> {
        let mut table = Vec::with_capacity(links.len());
        for &(d, cost) in links {
            let Some(w) = link_weight(cost)? else {
                continue;
            };
            if d == Point::new(0, 0) {
                return Err(GraphError::InvalidEdge(EdgeFault::ZeroOffset));
            }
            table.push((d, w));
        }
        let lattice = OffsetLattice { links: table };
        let region = self.build_grid(bounds, terrain, first_id, existing, walkable, &lattice)?;
        log::debug!(
            "custom grid {bounds}: {} of {} cells walkable",
            region.len(),
            bounds.len()
        );
        Ok(region)
    }

    fn build_grid(
        &mut self,
        bounds: Range,
        terrain: Terrain,
        first_id: Option<PointId>,
        existing: &GridMap,
        walkable: impl Fn(Point) -> bool,
        lattice: &impl Lattice,
    ) -> Result<GridMap, GraphError> {
        // Plan every id before touching the graph so that running out of ids
        // leaves it unchanged. Fresh ids are strictly increasing, so they
        // never collide with one another.
        let mut region = GridMap::new();
        let mut fresh = Vec::new();
        let mut cursor = first_id.unwrap_or(PointId(0));
        for p in bounds.iter().filter(|&p| walkable(p)) {
            match existing.get(&p) {
                Some(&id) if self.has_point(id) => {
                    region.insert(p, id);
                }
                _ => {
                    let id = self.get_available_id(Some(cursor))?;
                    region.insert(p, id);
                    fresh.push((p, id));
                    if let Some(next) = id.0.checked_add(1) {
                        cursor = PointId(next);
                    }
                }
            }
        }
        // With the cursor pinned at i32::MAX the same id could be handed out
        // twice; refuse instead.
        if fresh.windows(2).any(|w| w[0].1 == w[1].1) {
            return Err(GraphError::IdsExhausted);
        }

        for &(_, id) in &fresh {
            self.add_point_replace(id, terrain);
        }

        // Inside `bounds` only this call's cells count; outside, the
        // caller's earlier mapping does.
        let live = |graph: &FlowGraph, p: Point| -> Option<PointId> {
            if bounds.contains(p) {
                region.get(&p).copied()
            } else {
                existing.get(&p).copied().filter(|&id| graph.has_point(id))
            }
        };

        let mut buf = Vec::with_capacity(8);
        for &(p, id) in &fresh {
            buf.clear();
            lattice.outgoing(p, &mut buf);
            for &(q, w) in &buf {
                if let Some(other) = live(self, q) {
                    self.insert_edge(id, other, w);
                }
            }
            buf.clear();
            lattice.incoming(p, &mut buf);
            for &(q, w) in &buf {
                if let Some(other) = live(self, q) {
                    self.insert_edge(other, id, w);
                }
            }
        }
        if !fresh.is_empty() {
            self.touch();
        }
        Ok(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RecalcOptions;

    fn square(g: &mut FlowGraph, bounds: Range, diagonal: f32, existing: &GridMap) -> GridMap {
        g.add_square_grid(bounds, Terrain::Default, 1.0, diagonal, None, existing)
            .unwrap()
    }

    fn custom(
        g: &mut FlowGraph,
        bounds: Range,
        walkable: impl Fn(Point) -> bool,
        links: &[(Point, f32)],
        existing: &GridMap,
    ) -> Result<GridMap, GraphError> {
        g.add_custom_grid(bounds, Terrain::Default, walkable, links, None, existing)
    }

    /// The four orthogonal offsets at cost 1.
    fn four_way() -> Vec<(Point, f32)> {
        [(1, 0), (-1, 0), (0, 1), (0, -1)]
            .into_iter()
            .map(|(x, y)| (Point::new(x, y), 1.0))
            .collect()
    }

    #[test]
    fn square_grid_covers_bounds() {
        let mut g = FlowGraph::new();
        let ids = square(&mut g, Range::new(0, 0, 5, 5), f32::INFINITY, &GridMap::new());
        assert_eq!(ids.len(), 25);
        assert_eq!(g.point_count(), 25);
        for p in Range::new(0, 0, 5, 5) {
            assert!(g.has_point(ids[&p]));
        }
    }

    #[test]
    fn square_grid_edge_counts() {
        let bounds = Range::new(0, 0, 4, 3);
        for (diagonal, interior) in [(1.5, 8), (f32::INFINITY, 4)] {
            let mut g = FlowGraph::new();
            let ids = square(&mut g, bounds, diagonal, &GridMap::new());
            assert_eq!(g.point_count(), 12);
            for (p, id) in &ids {
                if !bounds.on_border(*p) {
                    assert_eq!(g.connections_from(*id).count(), interior);
                }
            }
            let corner = ids[&Point::new(0, 0)];
            let expected = if diagonal.is_finite() { 3 } else { 2 };
            assert_eq!(g.connections_from(corner).count(), expected);
        }
    }

    #[test]
    fn square_grid_uses_costs() {
        let mut g = FlowGraph::new();
        let ids = g
            .add_square_grid(Range::new(0, 0, 2, 2), Terrain::Kind(2), 2.0, 3.0, None, &GridMap::new())
            .unwrap();
        let a = ids[&Point::new(0, 0)];
        assert_eq!(g.connection_weight(a, ids[&Point::new(1, 0)]), Some(2.0));
        assert_eq!(g.connection_weight(a, ids[&Point::new(1, 1)]), Some(3.0));
        assert_eq!(g.get_terrain_for_point(a), Ok(Terrain::Kind(2)));
    }

    #[test]
    fn square_grid_rejects_non_positive_cost() {
        let mut g = FlowGraph::new();
        let r = g.add_square_grid(Range::new(0, 0, 3, 3), Terrain::Default, 0.0, 1.0, None, &GridMap::new());
        assert!(matches!(r, Err(GraphError::InvalidEdge(_))));
        assert!(g.is_empty());
    }

    #[test]
    fn square_grid_can_disable_orthogonal_links() {
        let mut g = FlowGraph::new();
        let ids = g
            .add_square_grid(Range::new(0, 0, 3, 3), Terrain::Default, f32::NAN, 1.0, None, &GridMap::new())
            .unwrap();
        let center = ids[&Point::new(1, 1)];
        assert_eq!(g.connections_from(center).count(), 4);
        assert!(!g.has_connection(center, ids[&Point::new(1, 0)]));
    }

    #[test]
    fn grid_ids_skip_existing_points() {
        let mut g = FlowGraph::new();
        g.add_point(PointId(1), Terrain::Default).unwrap();
        let ids = square(&mut g, Range::new(0, 0, 3, 1), f32::INFINITY, &GridMap::new());
        let mut got: Vec<_> = ids.values().map(|id| id.0).collect();
        got.sort();
        assert_eq!(got, vec![0, 2, 3]);
        // The stray point is not wired into the grid.
        assert_eq!(g.connections_from(PointId(1)).count(), 0);
    }

    #[test]
    fn grid_ids_start_at_first_id() {
        let mut g = FlowGraph::new();
        g.add_point(PointId(101), Terrain::Default).unwrap();
        let ids = g
            .add_hexagonal_grid(Range::new(0, 0, 2, 2), Terrain::Default, 1.0, Some(PointId(100)), &GridMap::new())
            .unwrap();
        // Row-major: (0,0) (1,0) (0,1) (1,1).
        assert_eq!(ids[&Point::new(0, 0)], PointId(100));
        assert_eq!(ids[&Point::new(1, 0)], PointId(102));
        assert_eq!(ids[&Point::new(0, 1)], PointId(103));
        assert_eq!(ids[&Point::new(1, 1)], PointId(104));
        assert!(!g.has_point(PointId(0)));
    }

    #[test]
    fn incremental_square_grids_connect_seams() {
        let mut g = FlowGraph::new();
        let left = square(&mut g, Range::new(0, 0, 2, 2), f32::INFINITY, &GridMap::new());
        let right = square(&mut g, Range::new(2, 0, 4, 2), f32::INFINITY, &left);
        assert_eq!(g.point_count(), 8);
        let a = left[&Point::new(1, 0)];
        let b = right[&Point::new(2, 0)];
        assert!(g.has_connection(a, b));
        assert!(g.has_connection(b, a));

        let mut all = left.clone();
        all.extend(right);
        let far = all[&Point::new(3, 1)];
        let f = g
            .recalculate(&[all[&Point::new(0, 0)]], &RecalcOptions::default())
            .unwrap();
        assert_eq!(f.cost(far), 4.0);
    }

    #[test]
    fn overlapping_grid_reuses_points() {
        let mut g = FlowGraph::new();
        let first = square(&mut g, Range::new(0, 0, 3, 3), f32::INFINITY, &GridMap::new());
        let keep = first[&Point::new(1, 1)];
        g.set_terrain_for_point(keep, Terrain::Kind(9)).unwrap();

        let second = square(&mut g, Range::new(1, 1, 4, 4), f32::INFINITY, &first);
        assert_eq!(g.point_count(), 9 + 5);
        assert_eq!(second.len(), 9);
        assert_eq!(second[&Point::new(1, 1)], keep);
        assert_eq!(g.get_terrain_for_point(keep), Ok(Terrain::Kind(9)));
        // Reused interior cell keeps exactly 4 links, no duplicates.
        let shared = second[&Point::new(2, 2)];
        assert_eq!(g.connections_from(shared).count(), 4);
    }

    #[test]
    fn removed_points_are_recreated() {
        let mut g = FlowGraph::new();
        let first = square(&mut g, Range::new(0, 0, 2, 1), f32::INFINITY, &GridMap::new());
        g.remove_point(first[&Point::new(1, 0)]).unwrap();
        let again = square(&mut g, Range::new(0, 0, 2, 1), f32::INFINITY, &first);
        assert_eq!(g.point_count(), 2);
        assert!(g.has_connection(again[&Point::new(0, 0)], again[&Point::new(1, 0)]));
    }

    #[test]
    fn grids_at_the_edge_of_i32() {
        let mut g = FlowGraph::new();
        let low = Range::new(i32::MIN, 0, i32::MIN + 2, 2);
        let ids = square(&mut g, low, 1.0, &GridMap::new());
        assert_eq!(ids.len(), 4);
        for id in ids.values() {
            assert_eq!(g.connections_from(*id).count(), 3);
        }

        let high = Range::new(i32::MAX - 2, i32::MAX - 2, i32::MAX, i32::MAX);
        let ids = g
            .add_hexagonal_grid(high, Terrain::Default, 1.0, None, &GridMap::new())
            .unwrap();
        assert_eq!(ids.len(), 4);
        for (p, id) in &ids {
            for (other, _) in g.connections_from(*id) {
                assert!(g.has_connection(other, *id), "link from {p} is one way");
            }
        }
    }

    #[test]
    fn hexagonal_grid_topology() {
        let mut g = FlowGraph::new();
        let bounds = Range::new(0, 0, 5, 5);
        let ids = g
            .add_hexagonal_grid(bounds, Terrain::Default, 1.0, None, &GridMap::new())
            .unwrap();
        assert_eq!(ids.len(), 25);
        let center = ids[&Point::new(2, 2)];
        assert_eq!(g.connections_from(center).count(), 6);
        // Even row: up-left neighbour exists, up-right does not.
        assert!(g.has_connection(center, ids[&Point::new(1, 1)]));
        assert!(!g.has_connection(center, ids[&Point::new(3, 1)]));
        let odd = ids[&Point::new(2, 3)];
        assert!(g.has_connection(odd, ids[&Point::new(3, 2)]));
        for (p, id) in &ids {
            for (other, _) in g.connections_from(*id) {
                assert!(g.has_connection(other, *id), "link from {p} is one way");
            }
        }
    }

    #[test]
    fn hexagonal_grid_without_links() {
        let mut g = FlowGraph::new();
        let ids = g
            .add_hexagonal_grid(Range::new(0, 0, 3, 3), Terrain::Default, f32::INFINITY, None, &GridMap::new())
            .unwrap();
        assert_eq!(ids.len(), 9);
        assert_eq!(g.connection_count(), 0);
    }

    #[test]
    fn custom_grid_follows_mask() {
        // .#.
        // ...
        let mut g = FlowGraph::new();
        let wall = Point::new(1, 0);
        let ids = custom(&mut g, Range::new(0, 0, 3, 2), |p| p != wall, &four_way(), &GridMap::new())
            .unwrap();
        assert_eq!(ids.len(), 5);
        assert!(!ids.contains_key(&wall));
        let a = ids[&Point::new(0, 0)];
        let b = ids[&Point::new(2, 0)];
        let f = g.recalculate(&[a], &RecalcOptions::default()).unwrap();
        // Around the wall: down, right, right, up.
        assert_eq!(f.cost(b), 4.0);
    }

    #[test]
    fn custom_grid_links_are_one_way() {
        // Conveyor: every cell moves right only.
        let mut g = FlowGraph::new();
        let conveyor = [(Point::new(1, 0), 2.0)];
        let ids = custom(&mut g, Range::new(0, 0, 3, 1), |_| true, &conveyor, &GridMap::new()).unwrap();
        let (a, b, c) = (ids[&Point::new(0, 0)], ids[&Point::new(1, 0)], ids[&Point::new(2, 0)]);
        assert_eq!(g.connection_weight(a, b), Some(2.0));
        assert_eq!(g.connection_weight(b, c), Some(2.0));
        assert!(!g.has_connection(b, a));
        assert_eq!(g.connection_count(), 2);
    }

    #[test]
    fn custom_grid_extends_existing_one_way() {
        let mut g = FlowGraph::new();
        let right = [(Point::new(1, 0), 1.0)];
        let left = custom(&mut g, Range::new(0, 0, 1, 1), |_| true, &right, &GridMap::new()).unwrap();
        let more = custom(&mut g, Range::new(1, 0, 2, 1), |_| true, &right, &left).unwrap();
        let (a, b) = (left[&Point::new(0, 0)], more[&Point::new(1, 0)]);
        // The old cell gains the link into the new one, not the reverse.
        assert!(g.has_connection(a, b));
        assert!(!g.has_connection(b, a));
    }

    #[test]
    fn custom_grid_rejects_bad_tables() {
        let mut g = FlowGraph::new();
        let bounds = Range::new(0, 0, 2, 2);
        let none = GridMap::new();
        assert_eq!(
            custom(&mut g, bounds, |_| true, &[(Point::new(0, 0), 1.0)], &none),
            Err(GraphError::InvalidEdge(EdgeFault::ZeroOffset))
        );
        assert_eq!(
            custom(&mut g, bounds, |_| true, &[(Point::new(1, 0), -1.0)], &none),
            Err(GraphError::InvalidEdge(EdgeFault::BadWeight(-1.0)))
        );
        assert!(g.is_empty());
        // An infinite cost only drops its own entry.
        let ids = custom(&mut g, bounds, |_| true, &[(Point::new(0, 0), f32::INFINITY)], &none).unwrap();
        assert_eq!(ids.len(), 4);
        assert_eq!(g.connection_count(), 0);
    }

    #[test]
    fn empty_bounds() {
        let mut g = FlowGraph::new();
        let ids = square(&mut g, Range::new(0, 0, 0, 4), 1.0, &GridMap::new());
        assert!(ids.is_empty());
        assert!(g.is_empty());
    }
}
