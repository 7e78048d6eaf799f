use std::fmt;

use crate::types::PointId;

/// Why a connection could not be made.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeFault {
    /// One of the endpoints is not in the graph.
    MissingEndpoint(PointId),
    /// Weights must be finite and strictly positive.
    BadWeight(f32),
    /// Source and target are the same point.
    SelfLoop(PointId),
    /// A grid link offset of (0, 0) would link every cell to itself.
    ZeroOffset,
}

impl fmt::Display for EdgeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEndpoint(id) => write!(f, "endpoint {id} does not exist"),
            Self::BadWeight(w) => write!(f, "weight {w} is not a finite positive number"),
            Self::SelfLoop(id) => write!(f, "{id} cannot connect to itself"),
            Self::ZeroOffset => f.write_str("grid link offset (0, 0) connects a cell to itself"),
        }
    }
}

/// Errors returned by graph mutations, recalculation and field queries.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// The referenced point is not in the graph.
    UnknownPoint(PointId),
    /// A point with this id already exists.
    DuplicatePoint(PointId),
    /// A connection was rejected.
    InvalidEdge(EdgeFault),
    /// The operation needs an enabled point.
    DisabledOriginOrEndpoint(PointId),
    /// No recalculation has run since the last mutation.
    StaleOrAbsentField,
    /// A recalculation option is out of range.
    MalformedOptions(String),
    /// A direction walk revisited a point.
    CycleDetected(PointId),
    /// Every id from the requested start up to `i32::MAX` is taken.
    IdsExhausted,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPoint(id) => write!(f, "unknown point {id}"),
            Self::DuplicatePoint(id) => write!(f, "point {id} already exists"),
            Self::InvalidEdge(fault) => write!(f, "invalid connection: {fault}"),
            Self::DisabledOriginOrEndpoint(id) => write!(f, "point {id} is disabled"),
            Self::StaleOrAbsentField => {
                f.write_str("no up-to-date field; call recalculate after mutating the graph")
            }
            Self::MalformedOptions(msg) => write!(f, "malformed recalculation options: {msg}"),
            Self::CycleDetected(id) => write!(f, "direction cycle detected at {id}"),
            Self::IdsExhausted => f.write_str("no unused point id left"),
        }
    }
}

impl std::error::Error for GraphError {}

/// A batch of operations failed; the graph was restored to its state before
/// the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchError {
    /// Position of the failing operation in the batch.
    pub index: usize,
    /// Error returned by the failing operation.
    pub source: GraphError,
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation {} failed: {}", self.index, self.source)
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
