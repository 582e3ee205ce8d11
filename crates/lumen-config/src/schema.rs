//! TOML document layout for [`LightingConfig`] and the record conversions.
//!
//! Sections are isolated: a section that fails to deserialize is reported
//! and skipped without disturbing the others, and individual records that
//! fail validation are dropped the same way.

use serde::{Deserialize, Serialize};

use lumen_light::LightCell;

use crate::{BuildingLightDef, LightingConfig, MatLightDef};

fn default_radius() -> i32 {
    -1
}

fn default_one() -> f32 {
    1.0
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmitRecord {
    pub color: [f32; 3],
    /// Radius in tiles; negative derives it from the peak channel.
    #[serde(default = "default_radius")]
    pub radius: i32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub flicker: bool,
}

/// One `[[materials]]` entry. At least one of `transparency` / `emit` must
/// be present for the record to mean anything.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaterialRecord {
    /// Material key: `[type, index]`.
    pub mat: [i32; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emit: Option<EmitRecord>,
}

/// One `[[buildings]]` entry, keyed `[type, subtype, custom]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildingRecord {
    pub key: [i32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emit: Option<EmitRecord>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub powered_only: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub use_material: bool,
    #[serde(default = "default_one")]
    pub size: f32,
    #[serde(default = "default_one")]
    pub thickness: f32,
}

/// A `[special.NAME]` entry overriding one of the built-in defs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SpecialRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emit: Option<EmitRecord>,
}

/// The `[sky]` section: ambient floor and the day cycle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkyRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_dim: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_hour: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_colors: Option<Vec<[f32; 3]>>,
}

/// Names accepted under `[special]`, in the order they serialize.
pub const SPECIAL_NAMES: &[&str] = &[
    "AMBIENT",
    "CITIZEN",
    "CURSOR",
    "FROZEN_LIQUID",
    "LAVA",
    "WALL",
    "WATER",
];

fn cell(v: [f32; 3]) -> LightCell {
    LightCell::new(v[0], v[1], v[2])
}

fn triple(c: LightCell) -> [f32; 3] {
    [c.r, c.g, c.b]
}

fn def_from_parts(transparency: Option<[f32; 3]>, emit: Option<EmitRecord>) -> MatLightDef {
    let mut def = MatLightDef::default();
    if let Some(t) = transparency {
        def.transparent = true;
        def.transparency = cell(t);
    }
    if let Some(e) = emit {
        def.emitting = true;
        def.emit_color = cell(e.color);
        def.radius = if e.radius < 0 {
            lumen_light::LightSource::new(def.emit_color, -1).radius
        } else {
            e.radius
        };
        def.flicker = e.flicker;
    }
    def
}

fn emit_record(def: &MatLightDef) -> Option<EmitRecord> {
    def.emitting.then(|| EmitRecord {
        color: triple(def.emit_color),
        radius: def.radius,
        flicker: def.flicker,
    })
}

fn transparency_record(def: &MatLightDef) -> Option<[f32; 3]> {
    def.transparent.then(|| triple(def.transparency))
}

/// Folds every recognized section of `doc` into `cfg`, warning about the
/// ones it cannot make sense of.
pub(crate) fn apply_document(cfg: &mut LightingConfig, doc: &toml::Table) {
    for (name, value) in doc {
        match name.as_str() {
            "materials" => apply_materials(cfg, value),
            "buildings" => apply_buildings(cfg, value),
            "special" => apply_special(cfg, value),
            "sky" => apply_sky(cfg, value),
            other => log::warn!("ignoring unknown config section [{other}]"),
        }
    }
}

fn apply_materials(cfg: &mut LightingConfig, value: &toml::Value) {
    let records = match Vec::<MaterialRecord>::deserialize(value.clone()) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("skipping malformed [[materials]] section: {e}");
            return;
        }
    };
    for rec in records {
        if rec.transparency.is_none() && rec.emit.is_none() {
            log::warn!(
                "material {:?} defines neither transparency nor emit, skipping",
                rec.mat
            );
            continue;
        }
        let def = def_from_parts(rec.transparency, rec.emit);
        cfg.materials.insert((rec.mat[0], rec.mat[1]), def);
    }
}

fn apply_buildings(cfg: &mut LightingConfig, value: &toml::Value) {
    let records = match Vec::<BuildingRecord>::deserialize(value.clone()) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("skipping malformed [[buildings]] section: {e}");
            return;
        }
    };
    for rec in records {
        if rec.transparency.is_none() && rec.emit.is_none() && !rec.use_material {
            log::warn!(
                "building {:?} defines no light behavior, skipping",
                rec.key
            );
            continue;
        }
        let def = BuildingLightDef {
            light: def_from_parts(rec.transparency, rec.emit),
            powered_only: rec.powered_only,
            use_material: rec.use_material,
            size: rec.size,
            thickness: rec.thickness,
        };
        cfg.buildings.insert((rec.key[0], rec.key[1], rec.key[2]), def);
    }
}

fn apply_special(cfg: &mut LightingConfig, value: &toml::Value) {
    let table = match value.as_table() {
        Some(t) => t,
        None => {
            log::warn!("skipping malformed [special] section: expected a table");
            return;
        }
    };
    for (name, entry) in table {
        let rec = match SpecialRecord::deserialize(entry.clone()) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("skipping malformed [special.{name}]: {e}");
                continue;
            }
        };
        let slot = match name.as_str() {
            "AMBIENT" => &mut cfg.ambience,
            "CITIZEN" => &mut cfg.citizen,
            "CURSOR" => &mut cfg.cursor,
            "FROZEN_LIQUID" => &mut cfg.ice,
            "LAVA" => &mut cfg.lava,
            "WALL" => &mut cfg.wall,
            "WATER" => &mut cfg.water,
            other => {
                log::warn!("ignoring unknown special material {other:?}");
                continue;
            }
        };
        *slot = def_from_parts(rec.transparency, rec.emit);
    }
}

fn apply_sky(cfg: &mut LightingConfig, value: &toml::Value) {
    let rec = match SkyRecord::deserialize(value.clone()) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("skipping malformed [sky] section: {e}");
            return;
        }
    };
    if let Some(v) = rec.level_dim {
        cfg.level_dim = v;
    }
    if let Some(v) = rec.day_hour {
        cfg.day_hour = v;
    }
    if let Some(v) = rec.day_speed {
        cfg.day_speed = v;
    }
    if let Some(colors) = rec.day_colors {
        cfg.day_colors = colors.into_iter().map(cell).collect();
    }
}

/// Serializable mirror of a full [`LightingConfig`].
#[derive(Serialize)]
pub(crate) struct ConfigDoc {
    materials: Vec<MaterialRecord>,
    buildings: Vec<BuildingRecord>,
    special: toml::map::Map<String, toml::Value>,
    sky: SkyRecord,
}

pub(crate) fn document_from(cfg: &LightingConfig) -> ConfigDoc {
    // Sort records by key so serialization is deterministic.
    let mut materials: Vec<MaterialRecord> = cfg
        .materials
        .iter()
        .map(|(&(t, i), def)| MaterialRecord {
            mat: [t, i],
            transparency: transparency_record(def),
            emit: emit_record(def),
        })
        .collect();
    materials.sort_by_key(|r| r.mat);

    let mut buildings: Vec<BuildingRecord> = cfg
        .buildings
        .iter()
        .map(|(&(t, s, c), def)| BuildingRecord {
            key: [t, s, c],
            transparency: transparency_record(&def.light),
            emit: emit_record(&def.light),
            powered_only: def.powered_only,
            use_material: def.use_material,
            size: def.size,
            thickness: def.thickness,
        })
        .collect();
    buildings.sort_by_key(|r| r.key);

    let mut special = toml::map::Map::new();
    for &name in SPECIAL_NAMES {
        let def = match name {
            "AMBIENT" => &cfg.ambience,
            "CITIZEN" => &cfg.citizen,
            "CURSOR" => &cfg.cursor,
            "FROZEN_LIQUID" => &cfg.ice,
            "LAVA" => &cfg.lava,
            "WALL" => &cfg.wall,
            "WATER" => &cfg.water,
            _ => unreachable!(),
        };
        let rec = SpecialRecord {
            transparency: transparency_record(def),
            emit: emit_record(def),
        };
        if let Ok(v) = toml::Value::try_from(rec) {
            special.insert(name.to_string(), v);
        }
    }

    ConfigDoc {
        materials,
        buildings,
        special,
        sky: SkyRecord {
            level_dim: Some(cfg.level_dim),
            day_hour: Some(cfg.day_hour),
            day_speed: Some(cfg.day_speed),
            day_colors: Some(cfg.day_colors.iter().map(|&c| triple(c)).collect()),
        },
    }
}
