use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use rustc_hash::FxHashSet;

use crate::error::GraphError;
use crate::field::{Field, FieldEntry};
use crate::options::RecalcOptions;
use crate::store::FlowGraph;
use crate::types::{Direction, PointId};

/// Open-list entry, ordered so that `BinaryHeap` (a max-heap) pops the
/// lowest cost first and, among equal costs, the earliest discovery.
#[derive(Clone, Copy)]
struct OpenEntry {
    id: PointId,
    cost: f32,
    seq: u64,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FlowGraph {
    /// Compute a multi-source cost and direction field.
    ///
    /// Every origin is seeded at once with its initial cost; the search then
    /// settles points cheapest first, relaxing each edge with
    /// `weight * terrain_factor(edge target)`. Disabled points are never
    /// entered and candidates above `maximum_cost` are dropped. The result
    /// replaces the previous field and is returned.
    ///
    /// # Errors
    ///
    /// - [`GraphError::UnknownPoint`] if an origin does not exist.
    /// - [`GraphError::DisabledOriginOrEndpoint`] if an origin is disabled.
    /// - [`GraphError::MalformedOptions`] if `options` are out of range.
    ///
    /// On error the previous field is left as it was.
    pub fn recalculate(
        &mut self,
        origins: &[PointId],
        options: &RecalcOptions,
    ) -> Result<&Field, GraphError> {
        for &id in origins {
            self.require(id)?;
            if self.is_point_disabled(id) {
                return Err(GraphError::DisabledOriginOrEndpoint(id));
            }
        }
        options.validate(self, origins.len())?;

        let field = self.search(origins, options);
        Ok(self.field.insert(field))
    }

    fn search(&self, origins: &[PointId], options: &RecalcOptions) -> Field {
        let destination = options.input_is_destination();
        let max_cost = options.maximum_cost();
        let mut field = Field::new(self.revision, destination);

        let capacity = ((self.points.len() as f64).sqrt() as usize * 6).max(origins.len());
        let mut open: BinaryHeap<OpenEntry> = BinaryHeap::with_capacity(capacity);
        let mut seq: u64 = 0;

        // Seed origins. A repeated origin keeps its cheapest initial cost.
        for (i, &id) in origins.iter().enumerate() {
            let cost = options.initial_cost(i);
            if cost > max_cost {
                log::warn!("origin {id} starts at {cost}, above maximum cost {max_cost}; skipped");
                continue;
            }
            if field.entries.get(&id).is_some_and(|e| e.cost <= cost) {
                continue;
            }
            if !field.origins.contains(&id) {
                field.origins.push(id);
            }
            field.entries.insert(
                id,
                FieldEntry {
                    cost,
                    direction: Direction::Origin,
                },
            );
            open.push(OpenEntry { id, cost, seq });
            seq += 1;
        }

        let seeds: Vec<(PointId, f32)> = field
            .origins
            .iter()
            .map(|&id| (id, field.cost(id)))
            .collect();

        let mut pending = options.termination_points().clone();
        let mut stopped_early = false;
        let mut settled: FxHashSet<PointId> = FxHashSet::default();

        while let Some(current) = open.pop() {
            let id = current.id;
            // Skip stale entries superseded by a cheaper relaxation.
            if settled.contains(&id) || field.cost(id) < current.cost {
                continue;
            }
            settled.insert(id);
            field.settle(id);

            if !pending.is_empty() && pending.remove(&id) && pending.is_empty() {
                stopped_early = !open.is_empty();
                break;
            }

            let Some(info) = self.points.get(&id) else {
                continue;
            };
            let links: &BTreeMap<PointId, f32> = if destination {
                &info.reverse_connections
            } else {
                &info.connections
            };

            for (&next, &weight) in links {
                if settled.contains(&next) || self.is_point_disabled(next) {
                    continue;
                }
                // Terrain is read from the point the real edge enters.
                let entered = if destination { id } else { next };
                let terrain = self
                    .points
                    .get(&entered)
                    .map(|p| p.terrain)
                    .unwrap_or_default();
                let candidate = current.cost + weight * options.terrain_factor(terrain);
                if !candidate.is_finite() || candidate > max_cost {
                    continue;
                }
                if candidate < field.cost(next) {
                    field.entries.insert(
                        next,
                        FieldEntry {
                            cost: candidate,
                            direction: Direction::Next(id),
                        },
                    );
                    open.push(OpenEntry {
                        id: next,
                        cost: candidate,
                        seq,
                    });
                    seq += 1;
                }
            }
        }

        if stopped_early {
            field.retain_settled(&seeds);
        }
        log::debug!(
            "recalculated from {} origin(s): {} of {} points reached{}",
            field.origins.len(),
            field.reached_count(),
            self.points.len(),
            if stopped_early {
                " (stopped at termination points)"
            } else {
                ""
            }
        );
        field
    }
}
