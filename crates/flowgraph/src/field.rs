use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::GraphError;
use crate::types::{Direction, PointId, UNREACHABLE};

/// Cost and direction computed for one reached point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldEntry {
    /// Cumulative cost of the minimal path.
    pub cost: f32,
    /// Adjacent point along that path.
    pub direction: Direction,
}

/// Result of one recalculation: costs and directions for every reached
/// point.
///
/// Points missing from the field are unreached: their cost is
/// [`UNREACHABLE`] and their direction [`Direction::Unreachable`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Field {
    pub(crate) entries: FxHashMap<PointId, FieldEntry>,
    /// Reached points in the order they were finalized, i.e. by
    /// non-decreasing cost.
    pub(crate) order: Vec<PointId>,
    pub(crate) origins: Vec<PointId>,
    pub(crate) input_is_destination: bool,
    pub(crate) revision: u64,
}

impl Field {
    pub(crate) fn new(revision: u64, input_is_destination: bool) -> Self {
        Self {
            input_is_destination,
            revision,
            ..Self::default()
        }
    }

    /// Cost at `id`, [`UNREACHABLE`] if not reached.
    #[inline]
    pub fn cost(&self, id: PointId) -> f32 {
        self.entries.get(&id).map_or(UNREACHABLE, |e| e.cost)
    }

    /// Direction at `id`, [`Direction::Unreachable`] if not reached.
    #[inline]
    pub fn direction(&self, id: PointId) -> Direction {
        self.entries
            .get(&id)
            .map_or(Direction::Unreachable, |e| e.direction)
    }

    /// Entry for `id`, if reached.
    #[inline]
    pub fn entry(&self, id: PointId) -> Option<FieldEntry> {
        self.entries.get(&id).copied()
    }

    #[inline]
    pub fn is_reached(&self, id: PointId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of reached points, origins included.
    #[inline]
    pub fn reached_count(&self) -> usize {
        self.order.len()
    }

    /// Origins that were seeded into the search, in input order.
    #[inline]
    pub fn origins(&self) -> &[PointId] {
        &self.origins
    }

    /// Whether directions lead towards the origins (`true`) or away from
    /// them.
    #[inline]
    pub fn input_is_destination(&self) -> bool {
        self.input_is_destination
    }

    /// Reached points with their entry, cheapest first.
    pub fn iter(&self) -> impl Iterator<Item = (PointId, FieldEntry)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|e| (*id, *e)))
    }

    /// Reached points whose cost lies in `[min_cost, max_cost]`, cheapest
    /// first. Ties keep the order the search finalized them in.
    pub fn points_with_cost_between(&self, min_cost: f32, max_cost: f32) -> &[PointId] {
        if min_cost.is_nan() || max_cost.is_nan() || min_cost > max_cost {
            return &[];
        }
        let start = self.order.partition_point(|&id| self.cost(id) < min_cost);
        let end = self.order.partition_point(|&id| self.cost(id) <= max_cost);
        if end <= start {
            return &[];
        }
        &self.order[start..end]
    }

    /// Follow directions from `id` to an origin.
    ///
    /// The returned path starts with `id` and ends with the origin it leads
    /// to; an origin yields just itself and an unreached point yields an
    /// empty path. A walk longer than the number of reached points means the
    /// directions loop, which is reported as [`GraphError::CycleDetected`].
    pub fn path_from(&self, id: PointId) -> Result<Vec<PointId>, GraphError> {
        if !self.is_reached(id) {
            return Ok(Vec::new());
        }
        let mut path = vec![id];
        let mut current = id;
        loop {
            match self.direction(current) {
                Direction::Origin | Direction::Unreachable => return Ok(path),
                Direction::Next(next) => {
                    if path.len() > self.entries.len() {
                        return Err(GraphError::CycleDetected(next));
                    }
                    path.push(next);
                    current = next;
                }
            }
        }
    }

    /// Cost of every reached point.
    pub fn cost_map(&self) -> BTreeMap<PointId, f32> {
        self.entries.iter().map(|(&id, e)| (id, e.cost)).collect()
    }

    /// Next point for every reached point; origins map to themselves.
    pub fn direction_map(&self) -> BTreeMap<PointId, PointId> {
        self.entries
            .iter()
            .map(|(&id, e)| (id, PointId(e.direction.to_raw(id))))
            .collect()
    }

    /// Cost and direction of every reached point.
    pub fn direction_and_cost_map(&self) -> BTreeMap<PointId, FieldEntry> {
        self.entries.iter().map(|(&id, e)| (id, *e)).collect()
    }

    /// Record a finalized point.
    pub(crate) fn settle(&mut self, id: PointId) {
        self.order.push(id);
    }

    /// Drop tentative entries that were never finalized, after a search
    /// stopped early.
    ///
    /// Origins from `seeds` that were still queued keep their seeded cost
    /// and [`Direction::Origin`]. Their seeds were never popped, so they cost
    /// at least as much as every settled point and the finalization order
    /// stays sorted.
    pub(crate) fn retain_settled(&mut self, seeds: &[(PointId, f32)]) {
        let settled: FxHashSet<PointId> = self.order.iter().copied().collect();
        self.entries.retain(|id, _| settled.contains(id));

        let mut pending: Vec<(PointId, f32)> = seeds
            .iter()
            .copied()
            .filter(|(id, _)| !settled.contains(id))
            .collect();
        pending.sort_by(|a, b| a.1.total_cmp(&b.1));
        for (id, cost) in pending {
            self.entries.insert(
                id,
                FieldEntry {
                    cost,
                    direction: Direction::Origin,
                },
            );
            self.settle(id);
        }
    }
}
