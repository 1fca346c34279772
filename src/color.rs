//! Backend-agnostic RGBA color.
//!
//! The render backend owns real color spaces; the engine only needs a plain
//! value it can tint, pulse, and fade without pulling in a renderer.

use serde::{Deserialize, Serialize};

/// Linear RGBA color, components in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const RED: Rgba = Rgba::new(0.9, 0.15, 0.1, 1.0);
    pub const GOLD: Rgba = Rgba::new(1.0, 0.85, 0.3, 1.0);
    pub const GRAY: Rgba = Rgba::new(0.6, 0.6, 0.6, 1.0);
    pub const SOFT_BLUE: Rgba = Rgba::new(0.4, 0.6, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Linear interpolation toward `other` by `t` in `[0, 1]`.
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        Rgba::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }

    pub fn with_alpha(self, a: f32) -> Rgba {
        Rgba { a, ..self }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        let a = Rgba::new(0.0, 0.0, 0.0, 1.0);
        let b = Rgba::WHITE;
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
    }

    #[test]
    fn test_lerp_clamps_t() {
        let a = Rgba::new(0.2, 0.2, 0.2, 1.0);
        let b = Rgba::WHITE;
        assert_eq!(a.lerp(b, 2.0), b);
    }
}
