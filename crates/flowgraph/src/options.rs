//! Recalculation options.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::GraphError;
use crate::store::FlowGraph;
use crate::types::{PointId, Terrain};

/// Options for [`FlowGraph::recalculate`].
///
/// Built once with the `with_*` methods and validated when the
/// recalculation starts. With the `serde` feature the options can also be
/// read from a keyed map using the field names below; every key is
/// optional and unknown keys are rejected.
///
/// | option | default |
/// |---|---|
/// | `input_is_destination` | `true` |
/// | `maximum_cost` | `+inf` |
/// | `initial_costs` | empty (every origin starts at `0`) |
/// | `terrain_weights` | empty |
/// | `termination_points` | empty |
///
/// Terrain weights are opt-in: [`Terrain::Default`] always costs `1.0`, but
/// every [`Terrain::Kind`] without an entry in `terrain_weights` is
/// impassable. A grid built with `Terrain::Kind(k)` therefore needs
/// `with_terrain_weight(Terrain::Kind(k), 1.0)` to be walkable at its base
/// cost.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct RecalcOptions {
    input_is_destination: bool,
    maximum_cost: f32,
    initial_costs: Vec<f32>,
    terrain_weights: BTreeMap<Terrain, f32>,
    termination_points: BTreeSet<PointId>,
}

impl Default for RecalcOptions {
    fn default() -> Self {
        Self {
            input_is_destination: true,
            maximum_cost: f32::INFINITY,
            initial_costs: Vec::new(),
            terrain_weights: BTreeMap::new(),
            termination_points: BTreeSet::new(),
        }
    }
}

impl RecalcOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// When `true` the origins are destinations: costs and directions
    /// describe the way *towards* them. When `false` they describe the way
    /// *from* them.
    pub fn with_input_is_destination(mut self, yes: bool) -> Self {
        self.input_is_destination = yes;
        self
    }

    /// Points costing more than this are left unreached.
    pub fn with_maximum_cost(mut self, cost: f32) -> Self {
        self.maximum_cost = cost;
        self
    }

    /// Starting cost of each origin, paired by index with the origin list.
    /// Missing values default to `0`.
    pub fn with_initial_costs(mut self, costs: impl IntoIterator<Item = f32>) -> Self {
        self.initial_costs = costs.into_iter().collect();
        self
    }

    /// Factor applied to edges entering points of `terrain`.
    pub fn with_terrain_weight(mut self, terrain: Terrain, weight: f32) -> Self {
        self.terrain_weights.insert(terrain.normalized(), weight);
        self
    }

    pub fn with_terrain_weights(mut self, weights: impl IntoIterator<Item = (Terrain, f32)>) -> Self {
        for (terrain, weight) in weights {
            self.terrain_weights.insert(terrain.normalized(), weight);
        }
        self
    }

    /// Stop once this point has been finalized (together with any other
    /// termination point).
    pub fn with_termination_point(mut self, id: PointId) -> Self {
        self.termination_points.insert(id);
        self
    }

    pub fn with_termination_points(mut self, ids: impl IntoIterator<Item = PointId>) -> Self {
        self.termination_points.extend(ids);
        self
    }

    #[inline]
    pub fn input_is_destination(&self) -> bool {
        self.input_is_destination
    }

    #[inline]
    pub fn maximum_cost(&self) -> f32 {
        self.maximum_cost
    }

    #[inline]
    pub fn initial_costs(&self) -> &[f32] {
        &self.initial_costs
    }

    #[inline]
    pub fn terrain_weights(&self) -> &BTreeMap<Terrain, f32> {
        &self.terrain_weights
    }

    #[inline]
    pub fn termination_points(&self) -> &BTreeSet<PointId> {
        &self.termination_points
    }

    /// Starting cost for the origin at `index`.
    #[inline]
    pub(crate) fn initial_cost(&self, index: usize) -> f32 {
        self.initial_costs.get(index).copied().unwrap_or(0.0)
    }

    /// Multiplier for edges entering a point of `terrain`. Kinds without a
    /// weight are impassable.
    #[inline]
    pub(crate) fn terrain_factor(&self, terrain: Terrain) -> f32 {
        match terrain {
            Terrain::Default => 1.0,
            kind => self
                .terrain_weights
                .get(&kind)
                .copied()
                .unwrap_or(f32::INFINITY),
        }
    }

    /// Check every option against `graph` and the number of origins.
    pub(crate) fn validate(&self, graph: &FlowGraph, origins: usize) -> Result<(), GraphError> {
        let malformed = |msg: String| Err(GraphError::MalformedOptions(msg));

        if self.maximum_cost.is_nan() || self.maximum_cost < 0.0 {
            return malformed(format!(
                "maximum_cost must be a non-negative number, got {}",
                self.maximum_cost
            ));
        }
        if self.initial_costs.len() > origins {
            return malformed(format!(
                "{} initial_costs given for {origins} origins",
                self.initial_costs.len()
            ));
        }
        if let Some(c) = self
            .initial_costs
            .iter()
            .find(|c| !c.is_finite() || **c < 0.0)
        {
            return malformed(format!(
                "initial_costs must be finite and non-negative, got {c}"
            ));
        }
        for (&terrain, &weight) in &self.terrain_weights {
            if terrain == Terrain::Default {
                return malformed("the default terrain always has weight 1".to_string());
            }
            if weight.is_nan() || weight <= 0.0 {
                return malformed(format!(
                    "weight for {terrain} must be positive, got {weight}"
                ));
            }
        }
        if let Some(id) = self
            .termination_points
            .iter()
            .find(|id| !graph.has_point(**id))
        {
            return malformed(format!("termination point {id} does not exist"));
        }
        Ok(())
    }
}
