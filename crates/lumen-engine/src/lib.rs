//! Per-tile RGB lighting over a 2D map view: scene extraction, sunlight,
//! and a threaded ray-casting pass feeding a double-buffered output grid.
#![forbid(unsafe_code)]

mod buffer;
mod occupancy;
mod pool;
mod rays;
pub mod sky;
mod sun;

pub use buffer::RenderBuffer;

use std::error::Error;
use std::mem;
use std::sync::{Arc, Mutex};

use lumen_config::LightingConfig;
use lumen_light::{LightCell, LightSource};
use lumen_world::{MapSource, Rect2};

use crate::pool::LightPool;
use crate::rays::Frame;

/// Computes one lit frame at a time from a [`MapSource`] and swaps the
/// result into a shared [`RenderBuffer`].
pub struct LightingEngine {
    pub(crate) cfg: LightingConfig,
    w: i32,
    h: i32,
    light_map: Vec<LightCell>,
    pub(crate) occupancy: Vec<LightCell>,
    pub(crate) lights: Vec<LightSource>,
    pub(crate) map_port: Rect2,
    smooth: bool,
    pool: LightPool,
    target: Arc<Mutex<RenderBuffer>>,
}

impl LightingEngine {
    /// `threads` of zero sizes the ray pool to the available parallelism.
    /// `smooth` selects anti-aliased rays.
    pub fn new(
        cfg: LightingConfig,
        target: Arc<Mutex<RenderBuffer>>,
        threads: usize,
        smooth: bool,
    ) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            cfg,
            w: 0,
            h: 0,
            light_map: Vec::new(),
            occupancy: Vec::new(),
            lights: Vec::new(),
            map_port: Rect2::default(),
            smooth,
            pool: LightPool::new(threads)?,
            target,
        })
    }

    #[inline]
    pub(crate) fn idx(&self, x: i32, y: i32) -> usize {
        (x * self.h + y) as usize
    }

    pub fn config(&self) -> &LightingConfig {
        &self.cfg
    }

    /// Swaps in a new configuration; it takes effect from the next frame.
    pub fn reload(&mut self, cfg: LightingConfig) {
        self.cfg = cfg;
    }

    pub fn set_smooth(&mut self, smooth: bool) {
        self.smooth = smooth;
    }

    fn resize(&mut self, w: i32, h: i32) {
        self.w = w;
        self.h = h;
        let n = (w * h) as usize;
        self.light_map = vec![LightCell::BRIGHT; n];
        self.occupancy = vec![self.cfg.ambience.transparency; n];
        self.lights = vec![LightSource::default(); n];
    }

    /// Computes one frame from the world's current view. Returns false when
    /// there is nothing to light (empty viewport or degenerate display).
    pub fn calculate(&mut self, world: &impl MapSource) -> bool {
        let vp = world.viewport();
        if vp.is_empty() {
            log::debug!("skipping frame: empty viewport");
            return false;
        }
        let (w, h) = world.display_dims();
        if w <= 0 || h <= 0 {
            log::debug!("skipping frame: degenerate display {w}x{h}");
            return false;
        }
        if (w, h) != (self.w, self.h) {
            self.resize(w, h);
        }
        self.map_port = vp;

        // Baselines: everything outside the map view renders unlit, the
        // view itself starts at the ambient floor.
        let ambient = self.cfg.ambience.transparency;
        let dim = LightCell::splat(self.cfg.level_dim);
        self.light_map.fill(LightCell::BRIGHT);
        self.occupancy.fill(ambient);
        self.lights.fill(LightSource::default());
        for x in vp.min.x..vp.max.x {
            for y in vp.min.y..vp.max.y {
                let idx = self.idx(x, y);
                self.light_map[idx] = dim;
            }
        }

        self.build_occupancy_and_lights(world);
        self.propagate_sun(world);

        let frame = Arc::new(Frame {
            w,
            h,
            smooth: self.smooth,
            occupancy: mem::take(&mut self.occupancy),
            lights: mem::take(&mut self.lights),
        });
        let canvas = mem::take(&mut self.light_map);
        self.light_map = self.pool.run_frame(frame.clone(), canvas);
        match Arc::try_unwrap(frame) {
            Ok(f) => {
                self.occupancy = f.occupancy;
                self.lights = f.lights;
            }
            Err(_) => {
                let n = (w * h) as usize;
                self.occupancy = vec![ambient; n];
                self.lights = vec![LightSource::default(); n];
            }
        }

        self.publish(vp);
        true
    }

    /// Hands the finished grid to the renderer. A dimension change swaps in
    /// a resized buffer and invalidates everything; otherwise only the
    /// viewport needs repainting.
    fn publish(&mut self, vp: Rect2) {
        let mut buf = self.target.lock().unwrap_or_else(|p| p.into_inner());
        if (buf.w, buf.h) != (self.w, self.h) {
            buf.resize(self.w, self.h);
            mem::swap(&mut buf.cells, &mut self.light_map);
            buf.invalidate_all();
        } else {
            mem::swap(&mut buf.cells, &mut self.light_map);
            buf.invalidate_rect(vp);
        }
    }

    /// Resets the output to fully lit, as if the engine were off.
    pub fn clear(&mut self) {
        self.light_map.fill(LightCell::BRIGHT);
        let mut buf = self.target.lock().unwrap_or_else(|p| p.into_inner());
        buf.cells.fill(LightCell::BRIGHT);
        buf.invalidate_all();
    }
}
