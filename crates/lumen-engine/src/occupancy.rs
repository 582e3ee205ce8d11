//! Scene extraction: turns the visible map slice into per-tile occupancy
//! and light sources.

use lumen_config::MatLightDef;
use lumen_light::{LightCell, LightSource};
use lumen_world::{
    BLOCK_DIM, BuildingKind, FlowKind, LiquidKind, MAX_FLOW, MapSource, TileShape,
};

use crate::LightingEngine;

/// Material type raw plant definitions hang off.
const PLANT_STRUCTURAL_MAT: i32 = 419;
/// Growth counter at which a plant counts as mature enough to glow.
const PLANT_MATURE_GROWTH: i32 = 180_000;

/// Flow clouds light up by how dense they burn.
fn fire_source(density: i32) -> LightSource {
    let color = if density > 60 {
        LightCell::new(0.98, 0.91, 0.30)
    } else if density > 30 {
        LightCell::new(0.93, 0.16, 0.16)
    } else {
        LightCell::new(0.64, 0.0, 0.0)
    };
    LightSource::new(color, density / 5)
}

fn magma_below(world: &impl MapSource, mx: i32, my: i32, z: i32) -> bool {
    world.tile_at(mx, my, z - 1).is_some_and(|t| {
        t.designation.liquid == Some(LiquidKind::Magma) && t.designation.flow > 0
    })
}

impl LightingEngine {
    /// Display index of map tile `(mx, my)`, if it falls inside the
    /// viewport.
    pub(crate) fn display_index(&self, world: &impl MapSource, mx: i32, my: i32) -> Option<usize> {
        let window = world.window();
        let vp = self.map_port;
        let dx = mx - window.x + vp.min.x;
        let dy = my - window.y + vp.min.y;
        vp.contains(dx, dy).then(|| self.idx(dx, dy))
    }

    pub(crate) fn add_light(&mut self, idx: usize, source: LightSource) {
        self.lights[idx].combine(&source);
    }

    pub(crate) fn add_occlusion(&mut self, idx: usize, transparency: LightCell, thickness: f32) {
        if (thickness - 1.0).abs() < 1e-3 {
            self.occupancy[idx] *= transparency;
        } else {
            self.occupancy[idx] *= transparency.pow(thickness);
        }
    }

    /// Folds one material def into a tile: occlusion scaled by `thickness`
    /// tiles of depth, emission scaled by `size`. A def with no
    /// transparency blacks the tile out entirely.
    pub(crate) fn apply_material(&mut self, idx: usize, def: MatLightDef, size: f32, thickness: f32) {
        if def.transparent {
            self.add_occlusion(idx, def.transparency, thickness);
        } else {
            self.occupancy[idx] = LightCell::DARK;
        }
        if def.emitting {
            self.add_light(idx, def.make_source(size));
        }
    }

    pub(crate) fn build_occupancy_and_lights(&mut self, world: &impl MapSource) {
        let z = world.z_level();
        let window = world.window();
        let vp = self.map_port;
        for dx in 0..vp.width() {
            for dy in 0..vp.height() {
                let Some(&tile) = world.tile_at(window.x + dx, window.y + dy, z) else {
                    continue;
                };
                let idx = self.idx(vp.min.x + dx, vp.min.y + dy);
                if tile.designation.hidden {
                    self.occupancy[idx] = LightCell::DARK;
                    continue;
                }
                let def = self.cfg.transmitting_material(tile.material.key());
                match tile.shape {
                    TileShape::BrookBed => self.occupancy[idx] = LightCell::DARK,
                    TileShape::Wall => {
                        let def = if tile.frozen { self.cfg.ice } else { def };
                        self.apply_material(idx, def, 1.0, 1.0);
                    }
                    _ => {
                        if tile.designation.liquid == Some(LiquidKind::Water)
                            && tile.designation.flow > 0
                        {
                            let depth = tile.designation.flow as f32 / MAX_FLOW as f32;
                            self.apply_material(idx, self.cfg.water, depth, depth);
                        }
                    }
                }
                if tile.designation.liquid == Some(LiquidKind::Magma) && tile.designation.flow > 0
                {
                    let depth = tile.designation.flow as f32 / MAX_FLOW as f32;
                    self.apply_material(idx, self.cfg.lava, depth, depth);
                } else if tile.shape.is_open()
                    && magma_below(world, window.x + dx, window.y + dy, z)
                {
                    self.apply_material(idx, self.cfg.lava, 1.0, 1.0);
                }
            }
        }
        self.collect_block_features(world);
        self.collect_actors(world);
        self.collect_buildings(world);
    }

    /// Fires, glowing plants, and emissive spatter live on the blocks, not
    /// the tiles.
    fn collect_block_features(&mut self, world: &impl MapSource) {
        let z = world.z_level();
        let window = world.window();
        let vp = self.map_port;
        let bx0 = window.x.div_euclid(BLOCK_DIM);
        let bx1 = (window.x + vp.width() - 1).div_euclid(BLOCK_DIM);
        let by0 = window.y.div_euclid(BLOCK_DIM);
        let by1 = (window.y + vp.height() - 1).div_euclid(BLOCK_DIM);
        for bx in bx0..=bx1 {
            for by in by0..=by1 {
                let Some(block) = world.block_at(bx, by, z) else {
                    continue;
                };
                for &flow in &block.flows {
                    if !matches!(flow.kind, FlowKind::Fire | FlowKind::Dragonfire)
                        || flow.density <= 0
                    {
                        continue;
                    }
                    let mx = bx * BLOCK_DIM + flow.x as i32;
                    let my = by * BLOCK_DIM + flow.y as i32;
                    if let Some(idx) = self.display_index(world, mx, my) {
                        self.add_light(idx, fire_source(flow.density));
                    }
                }
                for &plant in &block.plants {
                    if plant.growth < PLANT_MATURE_GROWTH {
                        continue;
                    }
                    let Some(def) = self.cfg.material((PLANT_STRUCTURAL_MAT, plant.index)) else {
                        continue;
                    };
                    let mx = bx * BLOCK_DIM + plant.x as i32;
                    let my = by * BLOCK_DIM + plant.y as i32;
                    if let Some(idx) = self.display_index(world, mx, my) {
                        self.apply_material(idx, def, 1.0, 1.0);
                    }
                }
                for spatter in &block.spatters {
                    let Some(def) = self.cfg.material(spatter.material.key()) else {
                        continue;
                    };
                    if !def.emitting {
                        continue;
                    }
                    for sx in 0..BLOCK_DIM {
                        for sy in 0..BLOCK_DIM {
                            let amount = spatter.amount[sx as usize][sy as usize];
                            if amount <= 0 {
                                continue;
                            }
                            let mx = bx * BLOCK_DIM + sx;
                            let my = by * BLOCK_DIM + sy;
                            if let Some(idx) = self.display_index(world, mx, my) {
                                self.add_light(idx, def.make_source(amount as f32 / 100.0));
                            }
                        }
                    }
                }
            }
        }
    }

    fn collect_actors(&mut self, world: &impl MapSource) {
        let z = world.z_level();
        if let Some((cx, cy, cz)) = world.cursor() {
            if cz == z {
                if let Some(idx) = self.display_index(world, cx, cy) {
                    let cursor = self.cfg.cursor;
                    self.apply_material(idx, cursor, 1.0, 1.0);
                }
            }
        }
        if self.cfg.citizen.emitting {
            for &c in world.creatures() {
                if !c.citizen || !c.conscious || c.z != z {
                    continue;
                }
                if let Some(idx) = self.display_index(world, c.x, c.y) {
                    let source = self.cfg.citizen.make_source(1.0);
                    self.add_light(idx, source);
                }
            }
        }
    }

    fn collect_buildings(&mut self, world: &impl MapSource) {
        let z = world.z_level();
        for &b in world.buildings() {
            if b.z != z || !b.complete {
                continue;
            }
            let Some(def) = self.cfg.building(b.key) else {
                continue;
            };
            if def.powered_only && !b.powered {
                continue;
            }
            // Open doors neither glow nor block.
            if matches!(b.kind, BuildingKind::Door { closed: false }) {
                continue;
            }
            let Some(idx) = self.display_index(world, b.x, b.y) else {
                continue;
            };
            let (emit, occlude) = if def.use_material {
                let mat = self.cfg.material(b.material.key()).unwrap_or_default();
                (
                    if def.light.emitting { def.light } else { mat },
                    if def.light.transparent { def.light } else { mat },
                )
            } else {
                (def.light, def.light)
            };
            if emit.emitting {
                self.add_light(idx, emit.make_source(def.size));
            }
            if occlude.transparent {
                self.add_occlusion(idx, occlude.transparency, def.thickness);
            }
        }
    }
}
