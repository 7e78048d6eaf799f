//! Queries over the most recent field.
//!
//! Every query first checks that a field exists and was computed against the
//! current graph; otherwise it fails with [`GraphError::StaleOrAbsentField`].

use std::collections::BTreeMap;

use crate::error::GraphError;
use crate::field::{Field, FieldEntry};
use crate::store::FlowGraph;
use crate::types::{Direction, PointId};

impl FlowGraph {
    /// The field computed by the last [`recalculate`](Self::recalculate),
    /// provided the graph has not changed since.
    pub fn field(&self) -> Result<&Field, GraphError> {
        match &self.field {
            Some(field) if field.revision == self.revision => Ok(field),
            _ => Err(GraphError::StaleOrAbsentField),
        }
    }

    /// Field checked against a known point.
    fn field_for(&self, id: PointId) -> Result<&Field, GraphError> {
        let field = self.field()?;
        self.require(id)?;
        Ok(field)
    }

    /// Field checked against a batch of known points.
    fn field_for_all(&self, ids: &[PointId]) -> Result<&Field, GraphError> {
        let field = self.field()?;
        for &id in ids {
            self.require(id)?;
        }
        Ok(field)
    }

    /// Cost of the minimal path at `id`, `+inf` if unreached.
    pub fn get_cost_at_point(&self, id: PointId) -> Result<f32, GraphError> {
        self.field_for(id).map(|f| f.cost(id))
    }

    /// Next point along the minimal path at `id`.
    pub fn get_direction_at_point(&self, id: PointId) -> Result<Direction, GraphError> {
        self.field_for(id).map(|f| f.direction(id))
    }

    /// Costs for each of `ids`, in the same order. Fails as a whole if any
    /// id is unknown.
    pub fn get_cost_at_points(&self, ids: &[PointId]) -> Result<Vec<f32>, GraphError> {
        let field = self.field_for_all(ids)?;
        Ok(ids.iter().map(|&id| field.cost(id)).collect())
    }

    /// Directions for each of `ids`, in the same order. Fails as a whole if
    /// any id is unknown.
    pub fn get_direction_at_points(&self, ids: &[PointId]) -> Result<Vec<Direction>, GraphError> {
        let field = self.field_for_all(ids)?;
        Ok(ids.iter().map(|&id| field.direction(id)).collect())
    }

    /// Points whose cost lies in `[min_cost, max_cost]`, cheapest first.
    pub fn get_all_points_with_cost_between(
        &self,
        min_cost: f32,
        max_cost: f32,
    ) -> Result<Vec<PointId>, GraphError> {
        Ok(self.field()?.points_with_cost_between(min_cost, max_cost).to_vec())
    }

    /// Path from `id` to the origin it leads to, both ends included.
    ///
    /// Empty when `id` was not reached. See [`Field::path_from`].
    pub fn get_shortest_path_from_point(&self, id: PointId) -> Result<Vec<PointId>, GraphError> {
        self.field_for(id)?.path_from(id)
    }

    /// Cost of every reached point.
    pub fn get_cost_map(&self) -> Result<BTreeMap<PointId, f32>, GraphError> {
        self.field().map(Field::cost_map)
    }

    /// Next point of every reached point; origins map to themselves.
    pub fn get_direction_map(&self) -> Result<BTreeMap<PointId, PointId>, GraphError> {
        self.field().map(Field::direction_map)
    }

    pub fn get_direction_and_cost_map(&self) -> Result<BTreeMap<PointId, FieldEntry>, GraphError> {
        self.field().map(Field::direction_and_cost_map)
    }
}
