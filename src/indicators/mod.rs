//! Floating combat text: damage numbers and miss indicators.
//!
//! Short-lived entities that rise and fade above a map entity's tile. The
//! render backend draws them; this module only owns the motion and
//! lifetime.

use bevy::prelude::*;

use crate::color::Rgba;
use crate::constants::{FLOATING_TEXT_RISE, FLOATING_TEXT_SECS};
use crate::grid::GridPos;

pub struct IndicatorsPlugin;

impl Plugin for IndicatorsPlugin {
    fn build(&self, _app: &mut App) {}
}

#[derive(Component, Debug, Clone)]
pub struct FloatingText {
    /// Anchor in tile-space units (the tile the text floats above).
    pub anchor: Vec2,
    pub text: String,
    pub color: Rgba,
    pub elapsed: f32,
    pub duration: f32,
}

impl FloatingText {
    pub fn damage(tile: GridPos, value: i32) -> Self {
        Self {
            anchor: tile.center(),
            text: value.to_string(),
            color: Rgba::RED,
            elapsed: 0.0,
            duration: FLOATING_TEXT_SECS,
        }
    }

    pub fn miss(tile: GridPos) -> Self {
        Self {
            anchor: tile.center(),
            text: "MISS".to_string(),
            color: Rgba::GRAY,
            elapsed: 0.0,
            duration: FLOATING_TEXT_SECS,
        }
    }

    fn progress(&self) -> f32 {
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    /// Current draw position: rises as it ages.
    pub fn position(&self) -> Vec2 {
        self.anchor - Vec2::new(0.0, FLOATING_TEXT_RISE * self.progress())
    }

    /// Fades out over the final half of its life.
    pub fn alpha(&self) -> f32 {
        let t = self.progress();
        if t < 0.5 {
            1.0
        } else {
            1.0 - (t - 0.5) * 2.0
        }
    }
}

/// Age floating text and despawn expired entries.
pub fn advance_floating_text(
    time: Res<Time>,
    mut commands: Commands,
    mut query: Query<(Entity, &mut FloatingText)>,
) {
    let dt = time.delta_secs();
    for (entity, mut text) in &mut query {
        text.elapsed += dt;
        if text.elapsed >= text.duration {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rises_over_lifetime() {
        let mut text = FloatingText::damage(GridPos::new(2, 2), 7);
        let start = text.position();
        text.elapsed = text.duration;
        let end = text.position();
        assert!(end.y < start.y);
        assert!((start.y - end.y - FLOATING_TEXT_RISE).abs() < 1e-4);
    }

    #[test]
    fn test_alpha_holds_then_fades() {
        let mut text = FloatingText::miss(GridPos::new(0, 0));
        text.elapsed = text.duration * 0.25;
        assert!((text.alpha() - 1.0).abs() < 1e-4);
        text.elapsed = text.duration;
        assert!(text.alpha() < 1e-4);
    }

    #[test]
    fn test_damage_text_renders_value() {
        let text = FloatingText::damage(GridPos::new(0, 0), 42);
        assert_eq!(text.text, "42");
    }
}
