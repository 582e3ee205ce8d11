//! Per-source ray tracing over a frozen frame snapshot.

use lumen_light::raster::{NEAR_ZERO, plot_line, plot_line_aa, plot_square};
use lumen_light::{LightCell, LightSource};
use rand::Rng;

/// Immutable per-frame inputs shared with the worker pool: occupancy and
/// source grids plus the display dimensions they are indexed by.
pub(crate) struct Frame {
    pub w: i32,
    pub h: i32,
    pub smooth: bool,
    pub occupancy: Vec<LightCell>,
    pub lights: Vec<LightSource>,
}

impl Frame {
    #[inline]
    pub fn len(&self) -> usize {
        (self.w * self.h) as usize
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.w && y < self.h
    }

    #[inline]
    fn idx(&self, x: i32, y: i32) -> usize {
        (x * self.h + y) as usize
    }

    #[inline]
    fn coords(&self, idx: usize) -> (i32, i32) {
        (idx as i32 / self.h, idx as i32 % self.h)
    }
}

/// Lands `power` on `(x, y)` after attenuating it by the tile's occupancy
/// over the step length, and returns what the ray carries onward. An
/// all-dark occupancy is an opaque tile: it is lit at full carried power but
/// the ray ends on it. A ray that has decayed below the power of a source
/// already sitting on the tile ends too; it cannot add anything past it.
fn light_up_cell(
    frame: &Frame,
    canvas: &mut [LightCell],
    mut power: LightCell,
    dx: i32,
    dy: i32,
    x: i32,
    y: i32,
) -> LightCell {
    if !frame.in_bounds(x, y) {
        return LightCell::DARK;
    }
    let idx = frame.idx(x, y);
    let occ = frame.occupancy[idx];
    let opaque = occ.is_dark();
    let dsq = dx * dx + dy * dy;
    if dsq > 0 && !opaque {
        let dt = match dsq {
            1 => 1.0,
            2 => core::f32::consts::SQRT_2,
            _ => (dsq as f32).sqrt(),
        };
        power = power * occ.pow(dt);
    }
    if dsq > 0 {
        let here = frame.lights[idx];
        if here.radius > 0 && power.all_le(here.power) {
            return LightCell::DARK;
        }
    }
    canvas[idx] = canvas[idx].max(power);
    if opaque { LightCell::DARK } else { power }
}

/// Traces one source: lights the source tile directly and its eight
/// neighbors through one step of their own occupancy, then casts a ray to
/// every tile on the perimeter square of the source radius. Flicker scales
/// power and radius once per frame.
pub(crate) fn do_light(frame: &Frame, canvas: &mut [LightCell], rng: &mut impl Rng, tile: usize) {
    let source = frame.lights[tile];
    if !source.is_active() {
        return;
    }
    let (x, y) = frame.coords(tile);
    let mut power = source.power;
    let mut radius = source.radius;
    if source.flicker {
        let flicker = rng.gen_range(0.5f32..1.0);
        radius = (radius as f32 * flicker) as i32;
        power = power * flicker;
    }
    let mut surrounds = LightCell::DARK;
    for dx in -1..=1 {
        for dy in -1..=1 {
            surrounds += light_up_cell(frame, canvas, power, dx, dy, x + dx, y + dy);
        }
    }
    // Fully boxed-in sources have nowhere to shine.
    if surrounds.dot(surrounds) <= NEAR_ZERO {
        return;
    }
    plot_square(x, y, radius, |tx, ty| {
        if frame.smooth {
            plot_line_aa(x, y, tx, ty, power, |p, dx, dy, cx, cy| {
                light_up_cell(frame, canvas, p, dx, dy, cx, cy)
            });
        } else {
            plot_line(x, y, tx, ty, power, |p, dx, dy, cx, cy| {
                light_up_cell(frame, canvas, p, dx, dy, cx, cy)
            });
        }
    });
}

/// Max-blends a worker canvas into the shared frame grid.
pub(crate) fn merge_max(dst: &mut [LightCell], src: &[LightCell]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = d.max(*s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn frame(w: i32, h: i32) -> Frame {
        Frame {
            w,
            h,
            smooth: false,
            occupancy: vec![LightCell::splat(0.85); (w * h) as usize],
            lights: vec![LightSource::default(); (w * h) as usize],
        }
    }

    #[test]
    fn neighbors_attenuate_by_one_step_of_their_occupancy() {
        let mut f = frame(16, 16);
        let idx = f.idx(8, 8);
        f.lights[idx] = LightSource::new(LightCell::BRIGHT, 4);
        let mut canvas = vec![LightCell::DARK; f.len()];
        do_light(&f, &mut canvas, &mut StepRng::new(0, 0), idx);
        assert_eq!(canvas[f.idx(8, 8)], LightCell::BRIGHT);
        assert!((canvas[f.idx(9, 8)].r - 0.85).abs() < 1e-4);
        let diag = 0.85f32.powf(core::f32::consts::SQRT_2);
        assert!((canvas[f.idx(7, 7)].r - diag).abs() < 1e-4);
    }

    #[test]
    fn submerged_neighbor_is_dimmed_not_skipped() {
        let mut f = frame(16, 16);
        let idx = f.idx(8, 8);
        f.lights[idx] = LightSource::new(LightCell::BRIGHT, 4);
        let wet = f.idx(9, 8);
        f.occupancy[wet] = LightCell::new(0.51, 0.51, 0.68);
        let mut canvas = vec![LightCell::DARK; f.len()];
        do_light(&f, &mut canvas, &mut StepRng::new(0, 0), idx);
        assert!((canvas[wet].r - 0.51).abs() < 1e-4);
        assert!((canvas[wet].b - 0.68).abs() < 1e-4);
    }

    #[test]
    fn power_decays_with_each_tile_crossed() {
        let mut f = frame(16, 16);
        let idx = f.idx(2, 8);
        f.lights[idx] = LightSource::new(LightCell::BRIGHT, 8);
        let mut canvas = vec![LightCell::DARK; f.len()];
        do_light(&f, &mut canvas, &mut StepRng::new(0, 0), idx);
        let d2 = canvas[f.idx(4, 8)].r;
        let d3 = canvas[f.idx(5, 8)].r;
        assert!((d2 - 0.85f32.powi(2)).abs() < 1e-4);
        assert!((d3 - 0.85f32.powi(3)).abs() < 1e-4);
    }

    #[test]
    fn opaque_tile_is_lit_but_ends_the_ray() {
        let mut f = frame(16, 16);
        let src = f.idx(2, 8);
        f.lights[src] = LightSource::new(LightCell::BRIGHT, 8);
        let wall = f.idx(5, 8);
        f.occupancy[wall] = LightCell::DARK;
        let mut canvas = vec![LightCell::DARK; f.len()];
        do_light(&f, &mut canvas, &mut StepRng::new(0, 0), src);
        // Lands at the power carried past two ambient tiles, then nothing
        // behind it on the same row.
        let carried = 0.85f32.powi(2);
        assert!((canvas[wall].r - carried).abs() < 1e-4);
        assert_eq!(canvas[f.idx(6, 8)], LightCell::DARK);
    }

    #[test]
    fn ray_weaker_than_a_source_it_crosses_stops_there() {
        let mut f = frame(24, 16);
        let left = f.idx(2, 8);
        f.lights[left] = LightSource::new(LightCell::splat(0.3), 12);
        let right = f.idx(10, 8);
        f.lights[right] = LightSource::new(LightCell::BRIGHT, 2);
        let mut canvas = vec![LightCell::DARK; f.len()];
        do_light(&f, &mut canvas, &mut StepRng::new(0, 0), left);
        assert_eq!(canvas[right], LightCell::DARK);
        assert_eq!(canvas[f.idx(11, 8)], LightCell::DARK);
    }

    #[test]
    fn boxed_in_source_traces_no_rays() {
        let mut f = frame(16, 16);
        let src = f.idx(8, 8);
        f.lights[src] = LightSource::new(LightCell::BRIGHT, 6);
        for nx in 7..=9 {
            for ny in 7..=9 {
                let i = f.idx(nx, ny);
                f.occupancy[i] = LightCell::DARK;
            }
        }
        let mut canvas = vec![LightCell::DARK; f.len()];
        do_light(&f, &mut canvas, &mut StepRng::new(0, 0), src);
        assert_eq!(canvas[f.idx(11, 8)], LightCell::DARK);
        // The box walls themselves still catch the glow.
        assert_eq!(canvas[f.idx(9, 8)], LightCell::BRIGHT);
    }
}
