use std::collections::{BTreeMap, BTreeSet};

use crate::error::{EdgeFault, GraphError};
use crate::field::Field;
use crate::types::{PointId, Terrain};

/// Per-point storage: terrain plus connections in both directions.
///
/// `reverse_connections` mirrors every other point's `connections` that
/// target this point, so destination-mode searches can walk edges backwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct PointInfo {
    pub(crate) terrain: Terrain,
    pub(crate) connections: BTreeMap<PointId, f32>,
    pub(crate) reverse_connections: BTreeMap<PointId, f32>,
}

impl PointInfo {
    fn new(terrain: Terrain) -> Self {
        Self {
            terrain: terrain.normalized(),
            ..Self::default()
        }
    }
}

/// A weighted directed graph of points plus the last field computed on it.
///
/// Points and connections are created and removed explicitly. Every
/// successful mutation bumps an internal revision; a [`Field`] is only
/// served while the revision it was computed against is current.
///
/// Ordered maps keep iteration, and therefore recalculation, deterministic.
///
/// With the `serde` feature a graph serializes its points (terrain and
/// outgoing connections) and disabled set. Deserializing rebuilds the
/// reverse connections and rejects input that breaks the store's
/// invariants; the result has no field.
#[derive(Clone, Debug, Default)]
pub struct FlowGraph {
    pub(crate) points: BTreeMap<PointId, PointInfo>,
    pub(crate) disabled: BTreeSet<PointId>,
    pub(crate) revision: u64,
    pub(crate) field: Option<Field>,
}

impl PartialEq for FlowGraph {
    /// Two graphs are equal when they hold the same points, connections,
    /// terrain and disabled set. Computed fields are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points && self.disabled == other.disabled
    }
}

impl FlowGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate any computed field.
    #[inline]
    pub(crate) fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Remove every point, connection and computed field.
    pub fn clear(&mut self) {
        self.points.clear();
        self.disabled.clear();
        self.field = None;
        self.touch();
    }

    /// Replace this graph with a deep copy of `other`.
    ///
    /// Points, connections, terrain and disabled flags are copied. The copy
    /// starts without a field, so it must be recalculated before querying.
    pub fn duplicate_graph_from(&mut self, other: &FlowGraph) {
        self.points.clone_from(&other.points);
        self.disabled.clone_from(&other.disabled);
        self.field = None;
        self.touch();
    }

    // -----------------------------------------------------------------------
    // Points
    // -----------------------------------------------------------------------

    /// Add an unconnected point.
    pub fn add_point(&mut self, id: PointId, terrain: Terrain) -> Result<(), GraphError> {
        if self.has_point(id) {
            return Err(GraphError::DuplicatePoint(id));
        }
        self.points.insert(id, PointInfo::new(terrain));
        self.touch();
        Ok(())
    }

    /// Add a point, replacing (and disconnecting) any point with the same id.
    pub fn add_point_replace(&mut self, id: PointId, terrain: Terrain) {
        if self.has_point(id) {
            self.detach(id);
            self.disabled.remove(&id);
        }
        self.points.insert(id, PointInfo::new(terrain));
        self.touch();
    }

    /// Remove a point together with every connection from or to it.
    pub fn remove_point(&mut self, id: PointId) -> Result<(), GraphError> {
        if !self.has_point(id) {
            return Err(GraphError::UnknownPoint(id));
        }
        self.detach(id);
        self.points.remove(&id);
        self.disabled.remove(&id);
        self.touch();
        Ok(())
    }

    /// Drop all edges touching `id` from its neighbours' maps and its own.
    fn detach(&mut self, id: PointId) {
        let Some(info) = self.points.get_mut(&id) else {
            return;
        };
        let outgoing = std::mem::take(&mut info.connections);
        let incoming = std::mem::take(&mut info.reverse_connections);
        for target in outgoing.keys() {
            if let Some(n) = self.points.get_mut(target) {
                n.reverse_connections.remove(&id);
            }
        }
        for source in incoming.keys() {
            if let Some(n) = self.points.get_mut(source) {
                n.connections.remove(&id);
            }
        }
    }

    /// Whether `id` is in the graph.
    #[inline]
    pub fn has_point(&self, id: PointId) -> bool {
        self.points.contains_key(&id)
    }

    /// Number of points, enabled or not.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Whether the graph has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All point ids in ascending order.
    pub fn point_ids(&self) -> impl Iterator<Item = PointId> + '_ {
        self.points.keys().copied()
    }

    pub(crate) fn require(&self, id: PointId) -> Result<&PointInfo, GraphError> {
        self.points.get(&id).ok_or(GraphError::UnknownPoint(id))
    }

    /// Smallest unused id that is `>= above` (or `>= 0` when `above` is
    /// `None`).
    pub fn get_available_id(&self, above: Option<PointId>) -> Result<PointId, GraphError> {
        let start = above.unwrap_or(PointId(0));
        let mut candidate = start.0;
        for used in self.points.range(start..).map(|(id, _)| id.0) {
            if used != candidate {
                break;
            }
            candidate = candidate.checked_add(1).ok_or(GraphError::IdsExhausted)?;
        }
        Ok(PointId(candidate))
    }

    // -----------------------------------------------------------------------
    // Terrain and enabled state
    // -----------------------------------------------------------------------

    /// Change the terrain of an existing point.
    pub fn set_terrain_for_point(&mut self, id: PointId, terrain: Terrain) -> Result<(), GraphError> {
        let info = self
            .points
            .get_mut(&id)
            .ok_or(GraphError::UnknownPoint(id))?;
        let terrain = terrain.normalized();
        if info.terrain != terrain {
            info.terrain = terrain;
            self.touch();
        }
        Ok(())
    }

    /// Terrain of an existing point.
    pub fn get_terrain_for_point(&self, id: PointId) -> Result<Terrain, GraphError> {
        self.require(id).map(|info| info.terrain)
    }

    /// Exclude a point from traversal. Its connections are kept.
    pub fn disable_point(&mut self, id: PointId) -> Result<(), GraphError> {
        self.require(id)?;
        if self.disabled.insert(id) {
            self.touch();
        }
        Ok(())
    }

    /// Make a previously disabled point traversable again.
    pub fn enable_point(&mut self, id: PointId) -> Result<(), GraphError> {
        self.require(id)?;
        if self.disabled.remove(&id) {
            self.touch();
        }
        Ok(())
    }

    /// Whether `id` exists and is disabled.
    #[inline]
    pub fn is_point_disabled(&self, id: PointId) -> bool {
        self.disabled.contains(&id)
    }

    // -----------------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------------

    /// Connect `source` to `target` with `weight`, and `target` back to
    /// `source` when `bidirectional` is set. Existing connections have their
    /// weight replaced.
    ///
    /// Nothing is modified when an error is returned.
    pub fn connect_points(
        &mut self,
        source: PointId,
        target: PointId,
        weight: f32,
        bidirectional: bool,
    ) -> Result<(), GraphError> {
        check_edge(self, source, target, weight)?;
        self.insert_edge(source, target, weight);
        if bidirectional {
            self.insert_edge(target, source, weight);
        }
        self.touch();
        Ok(())
    }

    /// Insert one directed edge. Both endpoints must exist.
    pub(crate) fn insert_edge(&mut self, source: PointId, target: PointId, weight: f32) {
        if let Some(info) = self.points.get_mut(&source) {
            info.connections.insert(target, weight);
        }
        if let Some(info) = self.points.get_mut(&target) {
            info.reverse_connections.insert(source, weight);
        }
    }

    /// Remove the connection from `source` to `target` (and back when
    /// `bidirectional`). Removing a connection that does not exist succeeds.
    pub fn remove_connection(
        &mut self,
        source: PointId,
        target: PointId,
        bidirectional: bool,
    ) -> Result<(), GraphError> {
        self.require(source)?;
        self.require(target)?;
        let mut removed = self.remove_edge(source, target);
        if bidirectional {
            removed |= self.remove_edge(target, source);
        }
        if removed {
            self.touch();
        }
        Ok(())
    }

    fn remove_edge(&mut self, source: PointId, target: PointId) -> bool {
        let removed = self
            .points
            .get_mut(&source)
            .and_then(|info| info.connections.remove(&target))
            .is_some();
        if let Some(info) = self.points.get_mut(&target) {
            info.reverse_connections.remove(&source);
        }
        removed
    }

    /// Whether both points exist and `source` connects to `target`.
    pub fn has_connection(&self, source: PointId, target: PointId) -> bool {
        self.points
            .get(&source)
            .is_some_and(|info| info.connections.contains_key(&target))
    }

    /// Weight of the connection from `source` to `target`, if any.
    pub fn connection_weight(&self, source: PointId, target: PointId) -> Option<f32> {
        self.points
            .get(&source)
            .and_then(|info| info.connections.get(&target).copied())
    }

    /// Outgoing connections of `id` as `(target, weight)`, ascending by
    /// target. Empty for unknown points.
    pub fn connections_from(&self, id: PointId) -> impl Iterator<Item = (PointId, f32)> + '_ {
        self.points
            .get(&id)
            .into_iter()
            .flat_map(|info| info.connections.iter().map(|(&t, &w)| (t, w)))
    }

    /// Total number of directed connections.
    pub fn connection_count(&self) -> usize {
        self.points.values().map(|info| info.connections.len()).sum()
    }
}

#[cfg(feature = "serde")]
mod stored {
    use std::collections::{BTreeMap, BTreeSet};

    use serde::{Deserialize, Serialize};

    use super::{FlowGraph, check_edge};
    use crate::error::GraphError;
    use crate::types::{PointId, Terrain};

    #[derive(Serialize)]
    struct PointRef<'a> {
        terrain: Terrain,
        connections: &'a BTreeMap<PointId, f32>,
    }

    #[derive(Serialize)]
    struct GraphRef<'a> {
        points: BTreeMap<PointId, PointRef<'a>>,
        disabled: &'a BTreeSet<PointId>,
    }

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct StoredPoint {
        #[serde(default)]
        terrain: Terrain,
        #[serde(default)]
        connections: BTreeMap<PointId, f32>,
    }

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct StoredGraph {
        #[serde(default)]
        points: BTreeMap<PointId, StoredPoint>,
        #[serde(default)]
        disabled: BTreeSet<PointId>,
    }

    impl StoredGraph {
        /// Rebuild a graph through the checked mutation paths.
        fn into_graph(self) -> Result<FlowGraph, GraphError> {
            let mut graph = FlowGraph::new();
            for (&id, point) in &self.points {
                graph.add_point(id, point.terrain)?;
            }
            for (&source, point) in &self.points {
                for (&target, &weight) in &point.connections {
                    check_edge(&graph, source, target, weight)?;
                    graph.insert_edge(source, target, weight);
                }
            }
            for id in self.disabled {
                graph.disable_point(id)?;
            }
            Ok(graph)
        }
    }

    impl Serialize for FlowGraph {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let points = self
                .points
                .iter()
                .map(|(&id, info)| {
                    let point = PointRef {
                        terrain: info.terrain,
                        connections: &info.connections,
                    };
                    (id, point)
                })
                .collect();
            GraphRef {
                points,
                disabled: &self.disabled,
            }
            .serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for FlowGraph {
        fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            StoredGraph::deserialize(deserializer)?
                .into_graph()
                .map_err(serde::de::Error::custom)
        }
    }
}

/// Validate a prospective edge without touching the graph.
pub(crate) fn check_edge(
    graph: &FlowGraph,
    source: PointId,
    target: PointId,
    weight: f32,
) -> Result<(), GraphError> {
    for id in [source, target] {
        if !graph.has_point(id) {
            return Err(GraphError::InvalidEdge(EdgeFault::MissingEndpoint(id)));
        }
    }
    if source == target {
        return Err(GraphError::InvalidEdge(EdgeFault::SelfLoop(source)));
    }
    check_weight(weight)
}

pub(crate) fn check_weight(weight: f32) -> Result<(), GraphError> {
    if weight.is_finite() && weight > 0.0 {
        Ok(())
    } else {
        Err(GraphError::InvalidEdge(EdgeFault::BadWeight(weight)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID0: PointId = PointId(0);
    const ID1: PointId = PointId(1);
    const ID2: PointId = PointId(2);
    const TERRAIN: Terrain = Terrain::Default;

    /// Three unconnected points.
    fn setup_012() -> FlowGraph {
        let mut g = FlowGraph::new();
        for id in [ID0, ID1, ID2] {
            g.add_point(id, TERRAIN).unwrap();
        }
        g
    }

    #[test]
    fn add_point_rejects_duplicates() {
        let mut g = setup_012();
        assert_eq!(g.add_point(ID0, TERRAIN), Err(GraphError::DuplicatePoint(ID0)));
        assert_eq!(g.point_count(), 3);
    }

    #[test]
    fn bidirectional_connect_creates_both_edges() {
        let mut g = setup_012();
        g.connect_points(ID0, ID1, 1.5, true).unwrap();
        assert!(g.has_connection(ID0, ID1));
        assert!(g.has_connection(ID1, ID0));
        assert_eq!(g.connection_weight(ID1, ID0), Some(1.5));
    }

    #[test]
    fn unidirectional_connect_creates_one_edge() {
        let mut g = setup_012();
        g.connect_points(ID0, ID1, 1.0, false).unwrap();
        assert!(g.has_connection(ID0, ID1));
        assert!(!g.has_connection(ID1, ID0));
        assert_eq!(g.connection_count(), 1);
    }

    #[test]
    fn reconnect_replaces_weight() {
        let mut g = setup_012();
        g.connect_points(ID0, ID1, 1.0, false).unwrap();
        g.connect_points(ID0, ID1, 3.0, false).unwrap();
        assert_eq!(g.connection_weight(ID0, ID1), Some(3.0));
        assert_eq!(g.connection_count(), 1);
    }

    #[test]
    fn connect_rejects_bad_edges_without_mutation() {
        let mut g = setup_012();
        let missing = PointId(9);
        assert_eq!(
            g.connect_points(ID0, missing, 1.0, true),
            Err(GraphError::InvalidEdge(EdgeFault::MissingEndpoint(missing)))
        );
        assert_eq!(
            g.connect_points(ID0, ID1, 0.0, true),
            Err(GraphError::InvalidEdge(EdgeFault::BadWeight(0.0)))
        );
        assert!(matches!(
            g.connect_points(ID0, ID1, f32::NAN, true),
            Err(GraphError::InvalidEdge(EdgeFault::BadWeight(_)))
        ));
        assert_eq!(
            g.connect_points(ID2, ID2, 1.0, false),
            Err(GraphError::InvalidEdge(EdgeFault::SelfLoop(ID2)))
        );
        assert_eq!(g.connection_count(), 0);
    }

    #[test]
    fn remove_point_drops_its_edges() {
        let mut g = setup_012();
        g.connect_points(ID0, ID1, 1.0, true).unwrap();
        g.connect_points(ID1, ID2, 1.0, true).unwrap();
        g.remove_point(ID1).unwrap();
        assert!(!g.has_point(ID1));
        assert_eq!(g.connection_count(), 0);
        assert!(g.points[&ID0].reverse_connections.is_empty());
        assert_eq!(g.remove_point(ID1), Err(GraphError::UnknownPoint(ID1)));
        // The id can be reused afterwards.
        g.add_point(ID1, TERRAIN).unwrap();
    }

    #[test]
    fn add_point_replace_disconnects() {
        let mut g = setup_012();
        g.connect_points(ID0, ID1, 1.0, true).unwrap();
        g.disable_point(ID1).unwrap();
        g.add_point_replace(ID1, Terrain::Kind(4));
        assert_eq!(g.get_terrain_for_point(ID1), Ok(Terrain::Kind(4)));
        assert!(!g.has_connection(ID0, ID1));
        assert!(!g.is_point_disabled(ID1));
    }

    #[test]
    fn remove_connection() {
        let mut g = setup_012();
        g.connect_points(ID0, ID1, 1.0, true).unwrap();
        g.remove_connection(ID0, ID1, false).unwrap();
        assert!(!g.has_connection(ID0, ID1));
        assert!(g.has_connection(ID1, ID0));
        g.remove_connection(ID0, ID1, true).unwrap();
        assert_eq!(g.connection_count(), 0);
        // Already gone: still fine.
        g.remove_connection(ID0, ID1, true).unwrap();
        assert_eq!(
            g.remove_connection(ID0, PointId(7), true),
            Err(GraphError::UnknownPoint(PointId(7)))
        );
    }

    #[test]
    fn enable_and_disable() {
        let mut g = setup_012();
        assert!(!g.is_point_disabled(ID0));
        g.disable_point(ID0).unwrap();
        assert!(g.is_point_disabled(ID0));
        assert!(!g.is_point_disabled(ID1));
        g.enable_point(ID0).unwrap();
        assert!(!g.is_point_disabled(ID0));
        assert_eq!(g.disable_point(PointId(5)), Err(GraphError::UnknownPoint(PointId(5))));
    }

    #[test]
    fn terrain_accessors() {
        let mut g = setup_012();
        assert_eq!(g.get_terrain_for_point(ID0), Ok(Terrain::Default));
        g.set_terrain_for_point(ID0, Terrain::Kind(5)).unwrap();
        assert_eq!(g.get_terrain_for_point(ID0), Ok(Terrain::Kind(5)));
        g.set_terrain_for_point(ID0, Terrain::Kind(-1)).unwrap();
        assert_eq!(g.get_terrain_for_point(ID0), Ok(Terrain::Default));
        assert_eq!(
            g.get_terrain_for_point(PointId(8)),
            Err(GraphError::UnknownPoint(PointId(8)))
        );
    }

    #[test]
    fn available_id_is_smallest_free() {
        let mut g = FlowGraph::new();
        for i in 0..20 {
            let id = g.get_available_id(None).unwrap();
            assert_eq!(id, PointId(i));
            g.add_point(id, TERRAIN).unwrap();
        }
        g.remove_point(PointId(4)).unwrap();
        assert_eq!(g.get_available_id(None), Ok(PointId(4)));
        assert_eq!(g.get_available_id(Some(PointId(5))), Ok(PointId(20)));
        assert_eq!(g.get_available_id(Some(PointId(-3))), Ok(PointId(-3)));
    }

    #[test]
    fn available_id_exhaustion() {
        let mut g = FlowGraph::new();
        g.add_point(PointId(i32::MAX), TERRAIN).unwrap();
        assert_eq!(
            g.get_available_id(Some(PointId(i32::MAX))),
            Err(GraphError::IdsExhausted)
        );
    }

    #[test]
    fn clear_and_duplicate() {
        let mut g = setup_012();
        g.connect_points(ID0, ID1, 2.0, true).unwrap();
        g.disable_point(ID2).unwrap();

        let mut copy = FlowGraph::new();
        copy.add_point(PointId(42), TERRAIN).unwrap();
        copy.duplicate_graph_from(&g);
        assert_eq!(copy, g);
        assert!(!copy.has_point(PointId(42)));

        // Deep copy: mutating the original leaves the copy alone.
        g.remove_point(ID0).unwrap();
        assert!(copy.has_connection(ID0, ID1));

        copy.clear();
        assert!(copy.is_empty());
        assert_eq!(copy.connection_count(), 0);
        assert!(!copy.is_point_disabled(ID2));
    }

    #[test]
    fn connections_from_is_ordered() {
        let mut g = setup_012();
        g.connect_points(ID1, ID2, 2.0, false).unwrap();
        g.connect_points(ID1, ID0, 1.0, false).unwrap();
        let out: Vec<_> = g.connections_from(ID1).collect();
        assert_eq!(out, vec![(ID0, 1.0), (ID2, 2.0)]);
        assert_eq!(g.connections_from(PointId(99)).count(), 0);
    }

    #[test]
    fn mutations_bump_revision() {
        let mut g = setup_012();
        let r = g.revision;
        g.disable_point(ID0).unwrap();
        assert_ne!(g.revision, r);
        let r = g.revision;
        // Already disabled: no change, no bump.
        g.disable_point(ID0).unwrap();
        assert_eq!(g.revision, r);
        // Failed mutation: no bump.
        let _ = g.add_point(ID0, TERRAIN);
        assert_eq!(g.revision, r);
    }
}
