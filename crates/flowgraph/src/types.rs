use std::fmt;

/// Cost reported for points a recalculation never reached.
pub const UNREACHABLE: f32 = f32::INFINITY;

/// Raw id used for [`Direction::Unreachable`] in exported direction maps.
pub const UNREACHABLE_ID: i32 = -1;

/// Handle to a point of a [`FlowGraph`](crate::FlowGraph).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct PointId(pub i32);

impl From<i32> for PointId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl From<PointId> for i32 {
    fn from(id: PointId) -> Self {
        id.0
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a point is made of.
///
/// `Default` is written as `-1` in raw form and always has a traversal
/// factor of `1.0`. Other kinds are scaled by the terrain weights passed to
/// a recalculation. Use [`Terrain::from`] on raw values so that `-1` never
/// ends up inside `Kind`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "i32", into = "i32")
)]
pub enum Terrain {
    #[default]
    Default,
    Kind(i32),
}

impl Terrain {
    /// Maps a stray `Kind(-1)` onto `Default`.
    #[inline]
    pub fn normalized(self) -> Self {
        match self {
            Self::Kind(-1) => Self::Default,
            t => t,
        }
    }
}

impl From<i32> for Terrain {
    fn from(raw: i32) -> Self {
        if raw == -1 {
            Self::Default
        } else {
            Self::Kind(raw)
        }
    }
}

impl From<Terrain> for i32 {
    fn from(t: Terrain) -> Self {
        match t {
            Terrain::Default => -1,
            Terrain::Kind(k) => k,
        }
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default terrain"),
            Self::Kind(k) => write!(f, "terrain {k}"),
        }
    }
}

/// Where a point leads in a computed field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// The point is one of the recalculation's origins.
    Origin,
    /// The adjacent point along the minimal path.
    Next(PointId),
    /// No path within the search bounds.
    Unreachable,
}

impl Direction {
    /// The next point, if this is a [`Direction::Next`].
    #[inline]
    pub fn next(self) -> Option<PointId> {
        match self {
            Self::Next(id) => Some(id),
            _ => None,
        }
    }

    /// Raw form for a point `at`: origins point at themselves and unreachable
    /// points yield [`UNREACHABLE_ID`].
    #[inline]
    pub fn to_raw(self, at: PointId) -> i32 {
        match self {
            Self::Origin => at.0,
            Self::Next(id) => id.0,
            Self::Unreachable => UNREACHABLE_ID,
        }
    }
}
