//! Error types for geometry and material configuration.
//!
//! Geometry setters never panic. They return a [`GeometryError`] and
//! leave the previous, valid configuration in place.

use std::error::Error;
use std::fmt;

use crate::id::LayerIndex;

/// Rejection reasons for slab-stack and material changes.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryError {
    /// The primary absorber must have a strictly positive thickness.
    NonPositiveThickness {
        /// The rejected thickness, in mm.
        value_mm: f64,
    },
    /// Backing layers may be empty but never negative.
    NegativeThickness {
        /// The rejected thickness, in mm.
        value_mm: f64,
    },
    /// The stack would no longer fit inside the world volume.
    ExceedsWorld {
        /// Total stack thickness that was requested, in mm.
        stack_mm: f64,
        /// Current world half-length, in mm.
        world_half_mm: f64,
    },
    /// World half-length must be strictly positive and finite.
    NonPositiveWorld {
        /// The rejected half-length, in mm.
        value_mm: f64,
    },
    /// World half-length must exceed half the stack thickness.
    WorldTooSmall {
        /// The rejected half-length, in mm.
        value_mm: f64,
        /// Current total stack thickness, in mm.
        stack_mm: f64,
    },
    /// Material names must be non-empty.
    EmptyMaterialName,
    /// Densities must be finite and non-negative (zero means unknown).
    InvalidDensity {
        /// The rejected density, in g/cm³.
        value_g_cm3: f64,
    },
    /// The addressed layer does not exist.
    NoSuchLayer {
        /// The requested layer.
        index: LayerIndex,
        /// Number of layers currently in the stack.
        layer_count: usize,
    },
    /// The primary absorber cannot be removed.
    PrimaryLayerRequired,
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveThickness { value_mm } => {
                write!(f, "ignoring non-positive foil thickness: {} nm", value_mm * 1.0e6)
            }
            Self::NegativeThickness { value_mm } => {
                write!(f, "ignoring negative backing thickness: {value_mm} mm")
            }
            Self::ExceedsWorld {
                stack_mm,
                world_half_mm,
            } => write!(
                f,
                "stack thickness {stack_mm} mm exceeds world size {} mm; \
                 increase world half-length first",
                2.0 * world_half_mm
            ),
            Self::NonPositiveWorld { value_mm } => {
                write!(f, "ignoring non-positive world half-length: {value_mm} mm")
            }
            Self::WorldTooSmall { value_mm, stack_mm } => write!(
                f,
                "world half-length {value_mm} mm must exceed half the stack thickness \
                 ({} mm)",
                0.5 * stack_mm
            ),
            Self::EmptyMaterialName => write!(f, "ignoring empty material name"),
            Self::InvalidDensity { value_g_cm3 } => {
                write!(f, "density must be finite and >= 0, got {value_g_cm3} g/cm3")
            }
            Self::NoSuchLayer { index, layer_count } => {
                write!(f, "layer {index} does not exist (stack has {layer_count})")
            }
            Self::PrimaryLayerRequired => write!(f, "the primary absorber cannot be removed"),
        }
    }
}

impl Error for GeometryError {}
