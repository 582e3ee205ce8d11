//! Light intensity/attenuation value types shared by the lighting crates.
#![forbid(unsafe_code)]

pub mod raster;

use core::ops::{Add, AddAssign, Div, Mul, MulAssign};

/// RGB-like intensity or per-tile transmission factor. All operations are
/// componentwise and inputs are non-negative by construction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LightCell {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl LightCell {
    pub const DARK: LightCell = LightCell::new(0.0, 0.0, 0.0);
    pub const BRIGHT: LightCell = LightCell::new(1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    #[inline]
    pub fn dot(self, rhs: LightCell) -> f32 {
        self.r * rhs.r + self.g * rhs.g + self.b * rhs.b
    }

    /// Raises each channel to `t`. Models attenuation over `t` tiles (or a
    /// fraction of a tile) of a material with this transmission factor.
    #[inline]
    pub fn pow(self, t: f32) -> Self {
        Self::new(self.r.powf(t), self.g.powf(t), self.b.powf(t))
    }

    /// Max-blend: componentwise maximum. Overlapping light saturates rather
    /// than summing.
    #[inline]
    pub fn max(self, rhs: LightCell) -> Self {
        Self::new(self.r.max(rhs.r), self.g.max(rhs.g), self.b.max(rhs.b))
    }

    #[inline]
    pub fn max_channel(self) -> f32 {
        self.r.max(self.g).max(self.b)
    }

    #[inline]
    pub fn all_le(self, rhs: LightCell) -> bool {
        self.r <= rhs.r && self.g <= rhs.g && self.b <= rhs.b
    }

    /// The degenerate all-zero cell. As an occupancy value it marks a fully
    /// opaque tile that still renders lit when a ray lands on it.
    #[inline]
    pub fn is_dark(self) -> bool {
        self.r + self.g + self.b == 0.0
    }
}

impl Add for LightCell {
    type Output = LightCell;
    #[inline]
    fn add(self, rhs: LightCell) -> LightCell {
        LightCell::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl AddAssign for LightCell {
    #[inline]
    fn add_assign(&mut self, rhs: LightCell) {
        self.r += rhs.r;
        self.g += rhs.g;
        self.b += rhs.b;
    }
}

impl Mul for LightCell {
    type Output = LightCell;
    #[inline]
    fn mul(self, rhs: LightCell) -> LightCell {
        LightCell::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
    }
}

impl MulAssign for LightCell {
    #[inline]
    fn mul_assign(&mut self, rhs: LightCell) {
        self.r *= rhs.r;
        self.g *= rhs.g;
        self.b *= rhs.b;
    }
}

impl Mul<f32> for LightCell {
    type Output = LightCell;
    #[inline]
    fn mul(self, rhs: f32) -> LightCell {
        LightCell::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}

impl Div<f32> for LightCell {
    type Output = LightCell;
    #[inline]
    fn div(self, rhs: f32) -> LightCell {
        LightCell::new(self.r / rhs, self.g / rhs, self.b / rhs)
    }
}

/// Per-tile decay factor used when deriving a radius from a peak intensity.
const RADIUS_FALLOFF: f32 = 0.85;
/// Channel level below which a derived-radius source is no longer visible.
const RADIUS_DIM: f32 = 0.2;

/// An emissive point: peak color, effective radius in tiles, optional
/// per-frame flicker.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LightSource {
    pub power: LightCell,
    pub radius: i32,
    pub flicker: bool,
}

impl LightSource {
    /// Builds a source. A negative `radius` derives the effective radius as
    /// the tile count after which repeated decay by `RADIUS_FALLOFF` drops
    /// the dominant channel below `RADIUS_DIM`.
    pub fn new(power: LightCell, radius: i32) -> Self {
        let radius = if radius >= 0 {
            radius
        } else {
            let peak = power.max_channel();
            if peak > 0.0 {
                ((RADIUS_DIM / peak).ln() / RADIUS_FALLOFF.ln()) as i32 + 1
            } else {
                0
            }
        };
        Self {
            power,
            radius,
            flicker: false,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.radius > 0
    }

    /// Merges another source emitting from the same tile: max-blend of the
    /// powers, max of the radii, flicker if either flickers.
    pub fn combine(&mut self, other: &LightSource) {
        self.power = self.power.max(other.power);
        self.radius = self.radius.max(other.radius);
        if other.flicker {
            self.flicker = true;
        }
    }
}
