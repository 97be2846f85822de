//! Planar slab-stack geometry.
//!
//! The experiment is a stack of axis-aligned absorber layers centred in a
//! cubic world volume, with the beam travelling along +z at normal
//! incidence. Layer 0 is the primary absorber (the foil); any further
//! layers are backings placed directly downstream.
//!
//! All setters validate before mutating. A rejected change returns a
//! [`GeometryError`] and leaves the stack exactly as it was.

use smallvec::SmallVec;

use crate::error::GeometryError;
use crate::id::LayerIndex;
use crate::units::{MM_PER_CM, NM_PER_MM, UM_PER_MM};

// ── MaterialSpec ───────────────────────────────────────────────────

/// A named material with its bulk density.
///
/// The name is whatever the host toolkit uses to look up cross-sections
/// (e.g. `"G4_W"`). A density of `0.0` means "unknown"; every quantity
/// that needs it then degrades to zero instead of failing.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialSpec {
    name: String,
    density_g_cm3: f64,
}

impl MaterialSpec {
    /// Create a material, rejecting empty names and invalid densities.
    pub fn new(name: impl Into<String>, density_g_cm3: f64) -> Result<Self, GeometryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GeometryError::EmptyMaterialName);
        }
        if !density_g_cm3.is_finite() || density_g_cm3 < 0.0 {
            return Err(GeometryError::InvalidDensity {
                value_g_cm3: density_g_cm3,
            });
        }
        Ok(Self {
            name,
            density_g_cm3,
        })
    }

    /// Elemental tungsten (`G4_W`, 19.3 g/cm³), the default foil material.
    pub fn tungsten() -> Self {
        Self {
            name: "G4_W".to_string(),
            density_g_cm3: 19.3,
        }
    }

    /// Material name as understood by the cross-section source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Density in g/cm³; `0.0` when unknown.
    pub fn density_g_cm3(&self) -> f64 {
        self.density_g_cm3
    }

    /// Whether a usable (strictly positive) density is known.
    pub fn has_density(&self) -> bool {
        self.density_g_cm3 > 0.0
    }
}

// ── Layer ──────────────────────────────────────────────────────────

/// One absorber layer: a thickness along z and a material.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    thickness_mm: f64,
    material: MaterialSpec,
}

impl Layer {
    /// Create a layer. Thickness must be finite and non-negative.
    ///
    /// Whether zero is acceptable depends on the layer's position and is
    /// checked by [`SlabStack`].
    pub fn new(thickness_mm: f64, material: MaterialSpec) -> Result<Self, GeometryError> {
        if !thickness_mm.is_finite() || thickness_mm < 0.0 {
            return Err(GeometryError::NegativeThickness {
                value_mm: thickness_mm,
            });
        }
        Ok(Self {
            thickness_mm,
            material,
        })
    }

    /// Thickness in mm.
    pub fn thickness_mm(&self) -> f64 {
        self.thickness_mm
    }

    /// Thickness in cm.
    pub fn thickness_cm(&self) -> f64 {
        self.thickness_mm / MM_PER_CM
    }

    /// The layer material.
    pub fn material(&self) -> &MaterialSpec {
        &self.material
    }

    /// Areal density ρ·t in g/cm²; zero when the density is unknown.
    pub fn mass_path_g_cm2(&self) -> f64 {
        self.material.density_g_cm3 * self.thickness_cm()
    }
}

// ── SlabStack ──────────────────────────────────────────────────────

/// The absorber stack and its containing world.
///
/// Most runs use one or two layers, so the layers live inline in a
/// `SmallVec`.
#[derive(Clone, Debug, PartialEq)]
pub struct SlabStack {
    world_half_mm: f64,
    layers: SmallVec<[Layer; 2]>,
}

impl SlabStack {
    /// Default world half-length: 5 cm.
    pub const DEFAULT_WORLD_HALF_MM: f64 = 50.0;

    /// Default foil thickness: 250 nm.
    pub const DEFAULT_FOIL_THICKNESS_MM: f64 = 250.0 / NM_PER_MM;

    /// Create a single-layer stack around the given primary absorber.
    pub fn new(world_half_mm: f64, primary: Layer) -> Result<Self, GeometryError> {
        if !world_half_mm.is_finite() || world_half_mm <= 0.0 {
            return Err(GeometryError::NonPositiveWorld {
                value_mm: world_half_mm,
            });
        }
        if primary.thickness_mm <= 0.0 {
            return Err(GeometryError::NonPositiveThickness {
                value_mm: primary.thickness_mm,
            });
        }
        if primary.thickness_mm >= 2.0 * world_half_mm {
            return Err(GeometryError::ExceedsWorld {
                stack_mm: primary.thickness_mm,
                world_half_mm,
            });
        }
        let mut layers = SmallVec::new();
        layers.push(primary);
        Ok(Self {
            world_half_mm,
            layers,
        })
    }

    /// The default experiment: a 250 nm tungsten foil in a 10 cm world.
    pub fn tungsten_foil() -> Self {
        let mut layers = SmallVec::new();
        layers.push(Layer {
            thickness_mm: Self::DEFAULT_FOIL_THICKNESS_MM,
            material: MaterialSpec::tungsten(),
        });
        Self {
            world_half_mm: Self::DEFAULT_WORLD_HALF_MM,
            layers,
        }
    }

    /// Add a backing layer downstream of the current stack.
    pub fn with_backing(mut self, backing: Layer) -> Result<Self, GeometryError> {
        self.push_backing(backing)?;
        Ok(self)
    }

    // ── Accessors ──────────────────────────────────────────────

    /// World half-length in mm.
    pub fn world_half_mm(&self) -> f64 {
        self.world_half_mm
    }

    /// World half-length in cm.
    pub fn world_half_cm(&self) -> f64 {
        self.world_half_mm / MM_PER_CM
    }

    /// All layers, primary first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of layers (always ≥ 1).
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// The primary absorber.
    pub fn primary(&self) -> &Layer {
        &self.layers[0]
    }

    /// Backing layers, in downstream order. Empty for a bare foil.
    pub fn backing(&self) -> &[Layer] {
        &self.layers[1..]
    }

    /// Look up a layer by index.
    pub fn layer(&self, index: LayerIndex) -> Option<&Layer> {
        self.layers.get(index.get())
    }

    /// Sum of all layer thicknesses, in mm.
    pub fn total_thickness_mm(&self) -> f64 {
        self.layers.iter().map(|l| l.thickness_mm).sum()
    }

    /// Sum of backing-layer thicknesses, in mm.
    pub fn backing_thickness_mm(&self) -> f64 {
        self.backing().iter().map(|l| l.thickness_mm).sum()
    }

    /// Primary thickness in nm (the summary's foil column).
    pub fn primary_thickness_nm(&self) -> f64 {
        self.primary().thickness_mm * NM_PER_MM
    }

    /// Backing thickness in µm (the summary's backing column).
    pub fn backing_thickness_um(&self) -> f64 {
        self.backing_thickness_mm() * UM_PER_MM
    }

    /// Backing material names joined with `+`, or empty for a bare foil.
    pub fn backing_material_label(&self) -> String {
        let names: Vec<&str> = self.backing().iter().map(|l| l.material.name()).collect();
        names.join("+")
    }

    // ── Setters ────────────────────────────────────────────────

    /// Change the thickness of an existing layer.
    ///
    /// The primary must stay strictly positive; backings may be zero.
    pub fn set_layer_thickness(
        &mut self,
        index: LayerIndex,
        thickness_mm: f64,
    ) -> Result<(), GeometryError> {
        let current = self.layer(index).ok_or(GeometryError::NoSuchLayer {
            index,
            layer_count: self.layers.len(),
        })?;
        if index.is_primary() {
            if !thickness_mm.is_finite() || thickness_mm <= 0.0 {
                return Err(GeometryError::NonPositiveThickness {
                    value_mm: thickness_mm,
                });
            }
        } else if !thickness_mm.is_finite() || thickness_mm < 0.0 {
            return Err(GeometryError::NegativeThickness {
                value_mm: thickness_mm,
            });
        }
        let stack_mm = self.total_thickness_mm() - current.thickness_mm + thickness_mm;
        self.check_fits(stack_mm)?;
        self.layers[index.get()].thickness_mm = thickness_mm;
        Ok(())
    }

    /// Set the foil thickness.
    pub fn set_primary_thickness(&mut self, thickness_mm: f64) -> Result<(), GeometryError> {
        self.set_layer_thickness(LayerIndex::PRIMARY, thickness_mm)
    }

    /// Set the thickness of the first backing layer.
    ///
    /// A positive thickness creates the backing (in the primary material)
    /// if it does not exist yet. Zero removes all backing layers.
    pub fn set_backing_thickness(&mut self, thickness_mm: f64) -> Result<(), GeometryError> {
        if !thickness_mm.is_finite() || thickness_mm < 0.0 {
            return Err(GeometryError::NegativeThickness {
                value_mm: thickness_mm,
            });
        }
        if thickness_mm == 0.0 {
            self.layers.truncate(1);
            return Ok(());
        }
        if self.layers.len() == 1 {
            let material = self.primary().material.clone();
            return self.push_backing(Layer {
                thickness_mm,
                material,
            });
        }
        self.set_layer_thickness(LayerIndex(1), thickness_mm)
    }

    /// Append a backing layer downstream of the stack.
    pub fn push_backing(&mut self, layer: Layer) -> Result<(), GeometryError> {
        let stack_mm = self.total_thickness_mm() + layer.thickness_mm;
        self.check_fits(stack_mm)?;
        self.layers.push(layer);
        Ok(())
    }

    /// Remove the layer at `index`. The primary cannot be removed.
    pub fn remove_layer(&mut self, index: LayerIndex) -> Result<Layer, GeometryError> {
        if index.is_primary() {
            return Err(GeometryError::PrimaryLayerRequired);
        }
        if index.get() >= self.layers.len() {
            return Err(GeometryError::NoSuchLayer {
                index,
                layer_count: self.layers.len(),
            });
        }
        Ok(self.layers.remove(index.get()))
    }

    /// Replace the material of an existing layer.
    pub fn set_layer_material(
        &mut self,
        index: LayerIndex,
        material: MaterialSpec,
    ) -> Result<(), GeometryError> {
        let layer_count = self.layers.len();
        let layer = self
            .layers
            .get_mut(index.get())
            .ok_or(GeometryError::NoSuchLayer { index, layer_count })?;
        layer.material = material;
        Ok(())
    }

    /// Change the world half-length.
    pub fn set_world_half_mm(&mut self, world_half_mm: f64) -> Result<(), GeometryError> {
        if !world_half_mm.is_finite() || world_half_mm <= 0.0 {
            return Err(GeometryError::NonPositiveWorld {
                value_mm: world_half_mm,
            });
        }
        let stack_mm = self.total_thickness_mm();
        if world_half_mm <= 0.5 * stack_mm {
            return Err(GeometryError::WorldTooSmall {
                value_mm: world_half_mm,
                stack_mm,
            });
        }
        self.world_half_mm = world_half_mm;
        Ok(())
    }

    fn check_fits(&self, stack_mm: f64) -> Result<(), GeometryError> {
        if stack_mm >= 2.0 * self.world_half_mm {
            return Err(GeometryError::ExceedsWorld {
                stack_mm,
                world_half_mm: self.world_half_mm,
            });
        }
        Ok(())
    }
}

impl Default for SlabStack {
    fn default() -> Self {
        Self::tungsten_foil()
    }
}
