use lumen_config::LightingConfig;
use lumen_engine::sky;
use lumen_light::LightCell;
use proptest::prelude::*;

proptest! {
    #[test]
    fn day_position_stays_in_unit_range(
        tick in any::<i32>(),
        speed in 0.1f32..10.0,
        hour in -1.0f32..24.0,
    ) {
        let mut cfg = LightingConfig::default();
        cfg.day_speed = speed;
        cfg.day_hour = hour;
        let v = sky::day_position(&cfg, tick);
        prop_assert!((0.0..=1.0).contains(&v));
    }

    // Linear blending cannot overshoot the keyframes it blends between.
    #[test]
    fn sky_color_stays_inside_the_keyframe_envelope(
        pos in 0.0f32..=1.0,
        frames in proptest::collection::vec(
            (0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0),
            2..6,
        ),
    ) {
        let mut cfg = LightingConfig::default();
        cfg.day_colors = frames
            .iter()
            .map(|&(r, g, b)| LightCell::new(r, g, b))
            .collect();
        let c = sky::sky_color(&cfg, pos);
        let hi = frames.iter().fold(0.0f32, |m, f| m.max(f.0).max(f.1).max(f.2));
        prop_assert!(c.r <= hi + 1e-5 && c.g <= hi + 1e-5 && c.b <= hi + 1e-5);
        prop_assert!(c.r >= -1e-6 && c.g >= -1e-6 && c.b >= -1e-6);
    }
}
