use lumen_light::LightCell;
use proptest::prelude::*;

fn cell() -> impl Strategy<Value = LightCell> {
    (0.0f32..4.0, 0.0f32..4.0, 0.0f32..4.0).prop_map(|(r, g, b)| LightCell::new(r, g, b))
}

fn transmission() -> impl Strategy<Value = LightCell> {
    (0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0).prop_map(|(r, g, b)| LightCell::new(r, g, b))
}

proptest! {
    #[test]
    fn max_blend_is_commutative(a in cell(), b in cell()) {
        prop_assert_eq!(a.max(b), b.max(a));
    }

    #[test]
    fn max_blend_is_associative(a in cell(), b in cell(), c in cell()) {
        prop_assert_eq!(a.max(b).max(c), a.max(b.max(c)));
    }

    #[test]
    fn max_blend_is_idempotent(a in cell()) {
        prop_assert_eq!(a.max(a), a);
    }

    #[test]
    fn blending_never_darkens(a in cell(), b in cell()) {
        prop_assert!(a.all_le(a.max(b)));
        prop_assert!(b.all_le(a.max(b)));
    }

    // A transmission factor in [0,1] attenuates monotonically with distance.
    #[test]
    fn attenuation_is_monotone_in_distance(occ in transmission(), d in 0.0f32..16.0) {
        prop_assert!(occ.pow(d + 1.0).all_le(occ.pow(d)));
    }

    #[test]
    fn componentwise_mul_never_produces_negatives(a in cell(), b in transmission()) {
        let m = a * b;
        prop_assert!(m.r >= 0.0 && m.g >= 0.0 && m.b >= 0.0);
    }
}
