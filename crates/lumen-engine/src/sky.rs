//! Day cycle: maps the world clock onto a sky color.

use lumen_config::LightingConfig;
use lumen_light::LightCell;

/// World ticks per full day at `day_speed` one.
const DAY_TICKS: f32 = 1200.0;

/// Position within the day in `[0, 1)`. A non-negative `day_hour` pins the
/// clock; otherwise the position advances with the world tick, scaled by
/// `day_speed`.
pub fn day_position(cfg: &LightingConfig, tick: i32) -> f32 {
    if cfg.day_hour >= 0.0 {
        return (cfg.day_hour % 24.0) / 24.0;
    }
    let len = ((DAY_TICKS / cfg.day_speed.max(f32::MIN_POSITIVE)) as i32).max(1);
    tick.rem_euclid(len) as f32 / len as f32
}

/// Sky color at day position `pos`. With two or more keyframes the color is
/// a linear blend over evenly spaced segments; with fewer it degrades to a
/// grayscale triangular wave peaking at midday.
pub fn sky_color(cfg: &LightingConfig, pos: f32) -> LightCell {
    let pos = pos.clamp(0.0, 1.0);
    if cfg.day_colors.len() < 2 {
        let v = (((pos + 0.5) % 1.0) - 0.5).abs() * 2.0;
        return LightCell::splat(v);
    }
    let segments = (cfg.day_colors.len() - 1) as f32;
    let scaled = pos * segments;
    let i = (scaled.floor() as usize).min(cfg.day_colors.len() - 2);
    let t = scaled - i as f32;
    cfg.day_colors[i] * (1.0 - t) + cfg.day_colors[i + 1] * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: LightCell, b: LightCell) -> bool {
        (a.r - b.r).abs() < 1e-5 && (a.g - b.g).abs() < 1e-5 && (a.b - b.b).abs() < 1e-5
    }

    #[test]
    fn default_keyframes_run_midnight_to_noon_to_midnight() {
        let cfg = LightingConfig::default();
        assert!(close(sky_color(&cfg, 0.0), LightCell::DARK));
        assert!(close(sky_color(&cfg, 0.5), LightCell::BRIGHT));
        assert!(close(sky_color(&cfg, 1.0), LightCell::DARK));
        assert!(close(sky_color(&cfg, 0.25), LightCell::splat(0.5)));
    }

    #[test]
    fn single_keyframe_degrades_to_triangular_wave() {
        let mut cfg = LightingConfig::default();
        cfg.day_colors.truncate(1);
        assert!(close(sky_color(&cfg, 0.0), LightCell::DARK));
        assert!(close(sky_color(&cfg, 0.5), LightCell::BRIGHT));
        assert!(close(sky_color(&cfg, 0.75), LightCell::splat(0.5)));
    }

    #[test]
    fn fixed_hour_overrides_the_clock() {
        let mut cfg = LightingConfig::default();
        cfg.day_hour = 12.0;
        assert_eq!(day_position(&cfg, 0), 0.5);
        assert_eq!(day_position(&cfg, 99_999), 0.5);
    }

    #[test]
    fn free_running_clock_wraps_every_day_length() {
        let cfg = LightingConfig::default();
        assert_eq!(day_position(&cfg, 0), 0.0);
        assert_eq!(day_position(&cfg, 600), 0.5);
        assert_eq!(day_position(&cfg, 1200), 0.0);
        let mut fast = cfg.clone();
        fast.day_speed = 2.0;
        assert_eq!(day_position(&fast, 300), 0.5);
    }
}
