//! Region tags for deposited-energy bookkeeping.

use std::fmt;

use crate::id::LayerIndex;

/// Where an energy deposit happened.
///
/// Every absorber layer of the slab stack is its own region. Everything
/// else (the surrounding world volume, or any volume the tracking layer
/// does not recognise) is [`RegionTag::Outside`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionTag {
    /// Inside absorber layer `n`.
    Layer(LayerIndex),
    /// Outside the slab stack.
    Outside,
}

impl RegionTag {
    /// The primary absorber (the foil).
    pub const PRIMARY: Self = Self::Layer(LayerIndex::PRIMARY);

    /// The first backing layer.
    pub const BACKING: Self = Self::Layer(LayerIndex(1));

    /// Whether this tag names the primary absorber.
    pub fn is_primary(self) -> bool {
        matches!(self, Self::Layer(idx) if idx.is_primary())
    }

    /// Whether this tag names any backing layer (index ≥ 1).
    pub fn is_backing(self) -> bool {
        matches!(self, Self::Layer(idx) if !idx.is_primary())
    }

    /// The layer index, if this tag names a layer.
    pub fn layer(self) -> Option<LayerIndex> {
        match self {
            Self::Layer(idx) => Some(idx),
            Self::Outside => None,
        }
    }
}

impl fmt::Display for RegionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layer(idx) if idx.is_primary() => write!(f, "primary"),
            Self::Layer(idx) => write!(f, "backing[{idx}]"),
            Self::Outside => write!(f, "other"),
        }
    }
}
