//! Graph mutations as values, applied one at a time or as an all-or-nothing
//! batch.

use crate::error::{BatchError, GraphError};
use crate::store::FlowGraph;
use crate::types::{PointId, Terrain};

/// A single graph mutation. Each variant mirrors the [`FlowGraph`] method of
/// the same name.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operation {
    AddPoint {
        id: PointId,
        terrain: Terrain,
    },
    AddPointReplace {
        id: PointId,
        terrain: Terrain,
    },
    RemovePoint(PointId),
    SetTerrain {
        id: PointId,
        terrain: Terrain,
    },
    EnablePoint(PointId),
    DisablePoint(PointId),
    Connect {
        source: PointId,
        target: PointId,
        weight: f32,
        bidirectional: bool,
    },
    RemoveConnection {
        source: PointId,
        target: PointId,
        bidirectional: bool,
    },
}

impl FlowGraph {
    /// Apply one operation.
    pub fn apply_operation(&mut self, op: &Operation) -> Result<(), GraphError> {
        match *op {
            Operation::AddPoint { id, terrain } => self.add_point(id, terrain),
            Operation::AddPointReplace { id, terrain } => {
                self.add_point_replace(id, terrain);
                Ok(())
            }
            Operation::RemovePoint(id) => self.remove_point(id),
            Operation::SetTerrain { id, terrain } => self.set_terrain_for_point(id, terrain),
            Operation::EnablePoint(id) => self.enable_point(id),
            Operation::DisablePoint(id) => self.disable_point(id),
            Operation::Connect {
                source,
                target,
                weight,
                bidirectional,
            } => self.connect_points(source, target, weight, bidirectional),
            Operation::RemoveConnection {
                source,
                target,
                bidirectional,
            } => self.remove_connection(source, target, bidirectional),
        }
    }

    /// Apply `ops` in order. If one fails, every earlier operation of the
    /// batch is undone and the error reports the failing index.
    ///
    /// A field that was current before a failed batch stays current.
    pub fn apply_operations(&mut self, ops: &[Operation]) -> Result<(), BatchError> {
        if ops.is_empty() {
            return Ok(());
        }
        let points = self.points.clone();
        let disabled = self.disabled.clone();
        let revision = self.revision;
        for (index, op) in ops.iter().enumerate() {
            if let Err(source) = self.apply_operation(op) {
                log::debug!("batch rolled back at operation {index}: {source}");
                self.points = points;
                self.disabled = disabled;
                self.revision = revision;
                return Err(BatchError { index, source });
            }
        }
        Ok(())
    }
}
