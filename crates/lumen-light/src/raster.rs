//! Grid raster primitives: midpoint circle, square perimeter, line tracers.

use crate::LightCell;

/// Carried energy below this dot-with-self threshold is treated as gone and
/// the ray terminates.
pub const NEAR_ZERO: f32 = 1e-5;

/// Midpoint circle of radius `r` around `(xm, ym)`.
pub fn plot_circle(xm: i32, ym: i32, r: i32, mut set_pixel: impl FnMut(i32, i32)) {
    let mut x = -r;
    let mut y = 0;
    let mut err = 2 - 2 * r;
    loop {
        set_pixel(xm - x, ym + y);
        set_pixel(xm - y, ym - x);
        set_pixel(xm + x, ym - y);
        set_pixel(xm + y, ym + x);
        let r = err;
        if r <= y {
            y += 1;
            err += y * 2 + 1;
        }
        if r > x || err > y {
            x += 1;
            err += x * 2 + 1;
        }
        if x >= 0 {
            break;
        }
    }
}

/// Perimeter of the axis-aligned square of half-side `r` around `(xm, ym)`.
/// These are the ray targets for a source of radius `r`.
pub fn plot_square(xm: i32, ym: i32, r: i32, mut set_pixel: impl FnMut(i32, i32)) {
    for x in 0..=r {
        set_pixel(xm + r, ym + x);
        set_pixel(xm + x, ym + r);
        set_pixel(xm + r, ym - x);
        set_pixel(xm + x, ym - r);
        set_pixel(xm - r, ym - x);
        set_pixel(xm - x, ym - r);
        set_pixel(xm - r, ym + x);
        set_pixel(xm - x, ym + r);
    }
}

/// Bresenham ray from `(x0, y0)` to `(x1, y1)`. `step` receives the carried
/// power, the step delta into the tile, and the tile coordinates, and returns
/// the power left after that tile. The source tile itself is skipped; the
/// caller lights it directly (occlusion must not apply at distance zero).
pub fn plot_line(
    mut x0: i32,
    mut y0: i32,
    x1: i32,
    y1: i32,
    mut power: LightCell,
    mut step: impl FnMut(LightCell, i32, i32, i32, i32) -> LightCell,
) {
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let mut rdx = 0;
    let mut rdy = 0;
    loop {
        if rdx != 0 || rdy != 0 {
            power = step(power, rdx, rdy, x0, y0);
            if power.dot(power) < NEAR_ZERO {
                return;
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        rdx = 0;
        rdy = 0;
        if e2 >= dy {
            err += dy;
            x0 += sx;
            rdx = sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
            rdy = sy;
        }
    }
}

/// Anti-aliased variant of [`plot_line`]: each step's contribution is split
/// across the two candidate tiles weighted by sub-pixel coverage, and the
/// carried power is the coverage-normalized sum of what survived both tiles.
pub fn plot_line_aa(
    mut x0: i32,
    mut y0: i32,
    x1: i32,
    y1: i32,
    mut power: LightCell,
    mut step: impl FnMut(LightCell, i32, i32, i32, i32) -> LightCell,
) {
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = (y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;
    let ed = if dx + dy == 0 {
        1.0
    } else {
        ((dx * dx + dy * dy) as f32).sqrt()
    };
    let mut rdx = 0;
    let mut rdy = 0;
    loop {
        let mut str_sum = 1.0 - ((err - dx + dy).abs() as f32) / ed;
        let mut sum_power = step(power * str_sum, rdx, rdy, x0, y0);
        let e2 = err;
        let x2 = x0;
        let lrdx = rdx;
        let lrdy = rdy;
        rdx = 0;
        rdy = 0;
        if 2 * e2 >= -dx {
            if x0 == x1 {
                break;
            }
            if ((e2 + dy) as f32) < ed {
                let s = 1.0 - (e2 + dy) as f32 / ed;
                sum_power += step(power * s, lrdx, lrdy, x0, y0 + sy);
                str_sum += s;
            }
            err -= dy;
            x0 += sx;
            rdx = sx;
        }
        if 2 * e2 <= dy {
            if y0 == y1 {
                break;
            }
            if ((dx - e2) as f32) < ed {
                let s = 1.0 - (dx - e2) as f32 / ed;
                sum_power += step(power * s, lrdx, lrdy, x2 + sx, y0);
                str_sum += s;
            }
            err += dx;
            y0 += sy;
            rdy = sy;
        }
        if str_sum < 1e-3 {
            return;
        }
        sum_power = sum_power / str_sum;
        if sum_power.dot(sum_power) < NEAR_ZERO {
            return;
        }
        power = sum_power;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn circle_radius_two_is_symmetric() {
        let mut pts = HashSet::new();
        plot_circle(0, 0, 2, |x, y| {
            pts.insert((x, y));
        });
        for &(x, y) in &pts {
            assert!(pts.contains(&(-x, y)));
            assert!(pts.contains(&(x, -y)));
        }
        assert!(pts.contains(&(2, 0)));
        assert!(pts.contains(&(0, 2)));
    }

    #[test]
    fn square_perimeter_covers_all_edge_tiles() {
        let r = 3;
        let mut pts = HashSet::new();
        plot_square(0, 0, r, |x, y| {
            pts.insert((x, y));
        });
        for v in -r..=r {
            assert!(pts.contains(&(r, v)));
            assert!(pts.contains(&(-r, v)));
            assert!(pts.contains(&(v, r)));
            assert!(pts.contains(&(v, -r)));
        }
        assert_eq!(pts.len(), (8 * r) as usize);
    }

    #[test]
    fn line_visits_every_tile_once_and_skips_the_origin() {
        let mut visited = Vec::new();
        plot_line(0, 0, 5, 2, LightCell::BRIGHT, |p, _, _, x, y| {
            visited.push((x, y));
            p
        });
        assert!(!visited.contains(&(0, 0)));
        assert_eq!(visited.last(), Some(&(5, 2)));
        let unique: HashSet<_> = visited.iter().collect();
        assert_eq!(unique.len(), visited.len());
    }

    #[test]
    fn line_stops_once_power_is_spent() {
        let mut steps = 0;
        plot_line(0, 0, 10, 0, LightCell::splat(0.5), |p, _, _, _, _| {
            steps += 1;
            p * 0.01
        });
        assert!(steps < 5);
    }

    #[test]
    fn aa_line_decays_monotonically_along_a_straight_run() {
        let mut seen = Vec::new();
        plot_line_aa(0, 0, 8, 0, LightCell::BRIGHT, |p, _, _, x, _| {
            seen.push((x, p.r));
            p * 0.9
        });
        let mut best = f32::INFINITY;
        for (_, v) in seen {
            assert!(v <= best + 1e-6);
            best = best.min(v);
        }
    }
}
