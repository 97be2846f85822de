//! Strongly-typed identifiers.

use std::fmt;

/// Identifies one run (a batch of events sharing geometry and beam energy).
///
/// Assigned sequentially by the run controller starting at zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RunId(pub u32);

impl RunId {
    /// The run that follows this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RunId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a particle track within one event.
///
/// Track IDs come from the host toolkit. The primary photon is always
/// [`TrackId::PRIMARY`]; every other ID belongs to a secondary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u32);

impl TrackId {
    /// The track ID the host toolkit assigns to the injected primary.
    pub const PRIMARY: Self = Self(1);

    /// Whether this track is the injected primary.
    pub fn is_primary(self) -> bool {
        self == Self::PRIMARY
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TrackId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Position of an absorber layer in the slab stack, counted along +z.
///
/// `LayerIndex(0)` is the primary absorber (the foil); higher indices
/// are backing layers placed downstream of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerIndex(pub u16);

impl LayerIndex {
    /// The primary absorber.
    pub const PRIMARY: Self = Self(0);

    /// Whether this is the primary absorber.
    pub fn is_primary(self) -> bool {
        self.0 == 0
    }

    /// The index as a `usize`, for slice access.
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LayerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for LayerIndex {
    fn from(v: u16) -> Self {
        Self(v)
    }
}
