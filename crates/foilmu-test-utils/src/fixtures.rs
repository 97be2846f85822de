//! Canned slab geometries.
//!
//! - [`bare_tungsten`]: the default 250 nm tungsten foil.
//! - [`tungsten_on_aluminium`]: the foil with a 50 µm aluminium backing.
//! - [`unknown_density_foil`]: a foil whose material density is unknown.

use foilmu_core::{Layer, MaterialSpec, SlabStack};

pub fn bare_tungsten() -> SlabStack {
    SlabStack::tungsten_foil()
}

pub fn tungsten_on_aluminium() -> SlabStack {
    let backing = Layer::new(
        0.05,
        MaterialSpec::new("G4_Al", 2.699).expect("valid material"),
    )
    .expect("valid layer");
    SlabStack::tungsten_foil()
        .with_backing(backing)
        .expect("backing fits in default world")
}

/// A foil of `thickness_mm` in a material with unknown density.
pub fn unknown_density_foil(thickness_mm: f64) -> SlabStack {
    let layer = Layer::new(
        thickness_mm,
        MaterialSpec::new("mystery", 0.0).expect("valid material"),
    )
    .expect("valid layer");
    SlabStack::new(SlabStack::DEFAULT_WORLD_HALF_MM, layer).expect("valid stack")
}

/// A tungsten foil of the given thickness in the default world.
pub fn tungsten_foil_mm(thickness_mm: f64) -> SlabStack {
    let mut stack = SlabStack::tungsten_foil();
    stack
        .set_primary_thickness(thickness_mm)
        .expect("thickness fits in default world");
    stack
}
