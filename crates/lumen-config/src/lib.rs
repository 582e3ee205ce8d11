//! Material, building, and sky light-property tables.
#![forbid(unsafe_code)]

pub mod schema;

use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use lumen_light::{LightCell, LightSource};

/// Composite key for material lookups: (material type, material index).
pub type MatKey = (i32, i32);
/// Composite key for building lookups: (building type, subtype, custom type).
pub type BuildingKey = (i32, i32, i32);

/// Light behavior of one material: how much light it passes per tile
/// crossed, and what it emits.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MatLightDef {
    pub transparent: bool,
    pub transparency: LightCell,
    pub emitting: bool,
    pub emit_color: LightCell,
    pub radius: i32,
    pub flicker: bool,
}

impl MatLightDef {
    pub fn transmitting(transparency: LightCell) -> Self {
        Self {
            transparent: true,
            transparency,
            ..Self::default()
        }
    }

    pub fn emitting(emit_color: LightCell, radius: i32) -> Self {
        Self {
            emitting: true,
            emit_color,
            radius,
            ..Self::default()
        }
    }

    pub fn new(transparency: LightCell, emit_color: LightCell, radius: i32) -> Self {
        Self {
            transparent: true,
            transparency,
            emitting: true,
            emit_color,
            radius,
            flicker: false,
        }
    }

    /// Builds the emitted source, scaled by `size` (spatter amount, flow
    /// depth, building size). Size one reuses color and radius unscaled.
    pub fn make_source(&self, size: f32) -> LightSource {
        let mut source = if (size - 1.0).abs() < 1e-3 {
            LightSource::new(self.emit_color, self.radius)
        } else {
            LightSource::new(self.emit_color * size, (self.radius as f32 * size) as i32)
        };
        source.flicker = self.flicker;
        source
    }
}

/// Light behavior of one building type, wrapping a material def.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildingLightDef {
    pub light: MatLightDef,
    /// Emit/occlude only while the building is powered.
    pub powered_only: bool,
    /// Derive light and transparency from the building's own construction
    /// material instead of `light`.
    pub use_material: bool,
    pub size: f32,
    pub thickness: f32,
}

impl Default for BuildingLightDef {
    fn default() -> Self {
        Self {
            light: MatLightDef::default(),
            powered_only: false,
            use_material: false,
            size: 1.0,
            thickness: 1.0,
        }
    }
}

/// The engine's whole declarative configuration: lookup tables, special
/// materials, and the day cycle. Owned by the engine; replaced wholesale on
/// reload.
#[derive(Clone, Debug, PartialEq)]
pub struct LightingConfig {
    pub materials: HashMap<MatKey, MatLightDef>,
    pub buildings: HashMap<BuildingKey, BuildingLightDef>,
    pub lava: MatLightDef,
    pub water: MatLightDef,
    pub ice: MatLightDef,
    pub ambience: MatLightDef,
    pub cursor: MatLightDef,
    pub citizen: MatLightDef,
    /// Fixed opaque fallback for unknown or non-transmitting materials.
    pub wall: MatLightDef,
    /// Ambient brightness inside the viewport before any light lands.
    pub level_dim: f32,
    /// Fixed hour of day; negative derives the day position from the world
    /// time tick instead.
    pub day_hour: f32,
    pub day_speed: f32,
    /// Sky color keyframes over one day, evenly spaced.
    pub day_colors: Vec<LightCell>,
}

impl Default for LightingConfig {
    fn default() -> Self {
        let mut cursor = MatLightDef::emitting(LightCell::new(0.96, 0.84, 0.03), 11);
        cursor.flicker = true;
        Self {
            materials: HashMap::new(),
            buildings: HashMap::new(),
            lava: MatLightDef::new(
                LightCell::new(0.8, 0.2, 0.2),
                LightCell::new(0.8, 0.2, 0.2),
                5,
            ),
            water: MatLightDef::transmitting(LightCell::new(0.6, 0.6, 0.8)),
            ice: MatLightDef::transmitting(LightCell::new(0.7, 0.7, 0.9)),
            ambience: MatLightDef::transmitting(LightCell::splat(0.85)),
            cursor,
            citizen: MatLightDef::emitting(LightCell::new(0.8, 0.8, 0.9), 6),
            wall: MatLightDef::transmitting(LightCell::DARK),
            level_dim: 0.2,
            day_hour: -1.0,
            day_speed: 1.0,
            day_colors: vec![LightCell::DARK, LightCell::BRIGHT, LightCell::DARK],
        }
    }
}

impl LightingConfig {
    #[inline]
    pub fn material(&self, key: MatKey) -> Option<MatLightDef> {
        self.materials.get(&key).copied()
    }

    /// Material lookup with the opaque-wall fallback applied the way the
    /// propagators need it: unknown and non-transmitting materials both
    /// resolve to the wall def.
    #[inline]
    pub fn transmitting_material(&self, key: MatKey) -> MatLightDef {
        match self.materials.get(&key) {
            Some(def) if def.transparent => *def,
            _ => self.wall,
        }
    }

    #[inline]
    pub fn building(&self, key: BuildingKey) -> Option<BuildingLightDef> {
        self.buildings.get(&key).copied()
    }

    /// Applies a TOML document on top of the current values. A document that
    /// does not parse at all leaves `self` untouched; a malformed section is
    /// reported and skipped while the other sections still apply.
    pub fn apply_toml_str(&mut self, src: &str) -> Result<(), Box<dyn Error>> {
        let doc: toml::Table = toml::from_str(src)?;
        schema::apply_document(self, &doc);
        Ok(())
    }

    pub fn apply_path(&mut self, path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        self.apply_toml_str(&s)
    }

    /// Built-in defaults plus one TOML document.
    pub fn from_toml_str(src: &str) -> Result<Self, Box<dyn Error>> {
        let mut cfg = Self::default();
        cfg.apply_toml_str(src)?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// Serializes the full configuration; reloading the result reproduces
    /// the same tables.
    pub fn to_toml_string(&self) -> Result<String, Box<dyn Error>> {
        Ok(toml::to_string(&schema::document_from(self))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_builtin_table() {
        let cfg = LightingConfig::default();
        assert_eq!(cfg.ambience.transparency, LightCell::splat(0.85));
        assert!(cfg.cursor.flicker);
        assert_eq!(cfg.cursor.radius, 11);
        assert!(cfg.wall.transparency.is_dark());
        assert_eq!(cfg.level_dim, 0.2);
        assert_eq!(cfg.day_colors.len(), 3);
    }

    #[test]
    fn unknown_material_falls_back_to_opaque_wall() {
        let cfg = LightingConfig::default();
        let def = cfg.transmitting_material((42, 42));
        assert_eq!(def, cfg.wall);
        assert!(def.transparency.is_dark());
    }

    #[test]
    fn make_source_scales_color_and_radius() {
        let def = MatLightDef::emitting(LightCell::new(0.8, 0.4, 0.0), 10);
        let whole = def.make_source(1.0);
        assert_eq!(whole.power, LightCell::new(0.8, 0.4, 0.0));
        assert_eq!(whole.radius, 10);
        let half = def.make_source(0.5);
        assert_eq!(half.power, LightCell::new(0.4, 0.2, 0.0));
        assert_eq!(half.radius, 5);
    }
}
