//! Sunlight: walks each block column from the map top down to the viewed
//! level, attenuating the sky color, and injects what survives as wide
//! light sources.

use lumen_light::{LightCell, LightSource};
use lumen_world::{BLOCK_DIM, LiquidKind, MAX_FLOW, MapSource, TileShape};

use crate::{LightingEngine, sky};

/// A sky cell whose self-dot falls below this is night-dark and stops
/// propagating.
const SUN_DIM: f32 = 0.003;
/// Radius of injected sunlight sources.
const SUN_RADIUS: i32 = 15;
/// Connected staircases leak most of the light through.
const STAIRCASE_TRANSPARENCY: LightCell = LightCell::new(0.9, 0.9, 0.9);
/// Fraction of a tile a floor is thick.
const FLOOR_THICKNESS: f32 = 1.0 / 7.0;

const TILES_PER_BLOCK: usize = (BLOCK_DIM * BLOCK_DIM) as usize;

impl LightingEngine {
    pub(crate) fn propagate_sun(&mut self, world: &impl MapSource) {
        let sky = sky::sky_color(&self.cfg, sky::day_position(&self.cfg, world.time_tick()));
        if sky.dot(sky) < SUN_DIM {
            return;
        }
        let view_z = world.z_level();
        let top_z = world.z_count() - 1;
        let window = world.window();
        let vp = self.map_port;
        let bx0 = window.x.div_euclid(BLOCK_DIM);
        let bx1 = (window.x + vp.width() - 1).div_euclid(BLOCK_DIM);
        let by0 = window.y.div_euclid(BLOCK_DIM);
        let by1 = (window.y + vp.height() - 1).div_euclid(BLOCK_DIM);
        for bx in bx0..=bx1 {
            for by in by0..=by1 {
                self.sun_column(world, sky, bx, by, view_z, top_z);
            }
        }
    }

    fn sun_column(
        &mut self,
        world: &impl MapSource,
        sky: LightCell,
        bx: i32,
        by: i32,
        view_z: i32,
        top_z: i32,
    ) {
        let mut cells = [sky; TILES_PER_BLOCK];
        let mut dark = [false; TILES_PER_BLOCK];
        let mut dark_count = 0usize;
        for z in (view_z..=top_z).rev() {
            let Some(block) = world.block_at(bx, by, z) else {
                continue;
            };
            let last = z == view_z;
            for ti in 0..TILES_PER_BLOCK {
                if dark[ti] {
                    continue;
                }
                let tile = &block.tiles[ti];
                let def = self.cfg.transmitting_material(tile.material.key());
                let mut cell = cells[ti];
                // Ice cover filters on top of the tile's own shape
                // attenuation.
                if tile.frozen {
                    cell *= self.cfg.ice.transparency;
                }
                let shape = tile.shape;
                if shape == TileShape::Wall || shape == TileShape::BrookBed {
                    cell *= def.transparency;
                } else if shape.is_floor_like() {
                    // The viewed level's own floor is what the light lands
                    // on; it does not shade itself.
                    if !last {
                        cell *= def.transparency.pow(FLOOR_THICKNESS);
                    }
                } else if shape.is_stair_through() {
                    cell *= STAIRCASE_TRANSPARENCY;
                }
                if let Some(kind) = tile.designation.liquid {
                    if tile.designation.flow > 0 && !tile.frozen {
                        let liquid = match kind {
                            LiquidKind::Water => self.cfg.water,
                            LiquidKind::Magma => self.cfg.lava,
                        };
                        let depth = tile.designation.flow as f32 / MAX_FLOW as f32;
                        cell *= liquid.transparency.pow(depth);
                    }
                }
                if cell.dot(cell) < SUN_DIM {
                    cell = LightCell::DARK;
                    dark[ti] = true;
                    dark_count += 1;
                }
                cells[ti] = cell;
            }
            if dark_count == TILES_PER_BLOCK {
                return;
            }
        }
        for ti in 0..TILES_PER_BLOCK {
            if dark[ti] {
                continue;
            }
            let mx = bx * BLOCK_DIM + ti as i32 / BLOCK_DIM;
            let my = by * BLOCK_DIM + ti as i32 % BLOCK_DIM;
            if let Some(idx) = self.display_index(world, mx, my) {
                self.add_light(idx, LightSource::new(cells[ti], SUN_RADIUS));
            }
        }
    }
}
