//! Viewport controller: zoom and pan camera state.
//!
//! Pure logic over a resource; the render backend applies
//! `translate(pan) * scale(zoom)` to everything it draws. Pan is always
//! clamped so a minimum fraction of the scaled content stays on screen in
//! both axes, and zooming at a focal point keeps the content under the
//! cursor visually stationary.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::grid::GridPos;

pub struct ViewportPlugin;

impl Plugin for ViewportPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Viewport>();
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub zoom: f32,
    /// Screen-space offset of the content origin, pixels.
    pub pan: Vec2,
    /// Unscaled content size in pixels (grid dims x tile size).
    pub content_size: Vec2,
    /// Current on-screen viewport size in pixels.
    pub viewport_size: Vec2,
    min_zoom: f32,
    max_zoom: f32,
    zoom_step: f32,
    min_visible_fraction: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(
            Vec2::new(576.0, 576.0),
            Vec2::new(800.0, 600.0),
            DEFAULT_MIN_ZOOM,
            DEFAULT_ZOOM,
            DEFAULT_MAX_ZOOM,
            DEFAULT_ZOOM_STEP,
            DEFAULT_MIN_VISIBLE_FRACTION,
        )
    }
}

impl Viewport {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        content_size: Vec2,
        viewport_size: Vec2,
        min_zoom: f32,
        default_zoom: f32,
        max_zoom: f32,
        zoom_step: f32,
        min_visible_fraction: f32,
    ) -> Self {
        let mut viewport = Self {
            zoom: default_zoom.clamp(min_zoom, max_zoom),
            pan: Vec2::ZERO,
            content_size,
            viewport_size,
            min_zoom,
            max_zoom,
            zoom_step,
            min_visible_fraction,
        };
        viewport.pan = viewport.clamp_pan(viewport.pan);
        viewport
    }

    pub fn min_zoom(&self) -> f32 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f32 {
        self.max_zoom
    }

    /// Content size after the current zoom.
    pub fn scaled_size(&self) -> Vec2 {
        self.content_size * self.zoom
    }

    fn clamp_axis(pan: f32, scaled: f32, view: f32, min_visible: f32) -> f32 {
        // Content occupies [pan, pan + scaled]; keep at least `min_visible`
        // of it inside [0, view].
        let lo = min_visible - scaled;
        let hi = view - min_visible;
        if lo > hi {
            // Degenerate viewport; fall back to centering.
            return (view - scaled) / 2.0;
        }
        pan.clamp(lo, hi)
    }

    fn clamp_pan(&self, pan: Vec2) -> Vec2 {
        let scaled = self.scaled_size();
        let min_visible = scaled * self.min_visible_fraction;
        Vec2::new(
            Self::clamp_axis(pan.x, scaled.x, self.viewport_size.x, min_visible.x),
            Self::clamp_axis(pan.y, scaled.y, self.viewport_size.y, min_visible.y),
        )
    }

    /// Set zoom, clamped to the configured range. With a focal point, the
    /// content under that screen point stays visually stationary:
    /// `pan' = focal - (focal - pan) * new_zoom / old_zoom`.
    pub fn set_zoom(&mut self, scale: f32, focal: Option<Vec2>) {
        let old_zoom = self.zoom;
        let new_zoom = scale.clamp(self.min_zoom, self.max_zoom);
        if let Some(focal) = focal {
            self.pan = focal - (focal - self.pan) * (new_zoom / old_zoom);
        }
        self.zoom = new_zoom;
        self.pan = self.clamp_pan(self.pan);
    }

    /// Step zoom in, anchored at the viewport center.
    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + self.zoom_step, Some(self.viewport_size / 2.0));
    }

    /// Step zoom out, anchored at the viewport center.
    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - self.zoom_step, Some(self.viewport_size / 2.0));
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan = self.clamp_pan(self.pan + Vec2::new(dx, dy));
    }

    pub fn set_pan(&mut self, x: f32, y: f32) {
        self.pan = self.clamp_pan(Vec2::new(x, y));
    }

    /// Pan so the given tile's center lands on the viewport center, then
    /// clamp as usual. `tile_size` is the unscaled tile edge in pixels.
    pub fn center_on_tile(&mut self, tile: GridPos, tile_size: f32) {
        let tile_center = tile.center() * tile_size * self.zoom;
        self.pan = self.clamp_pan(self.viewport_size / 2.0 - tile_center);
    }

    /// Fraction of the scaled content currently visible on each axis.
    pub fn visible_fraction(&self) -> Vec2 {
        let scaled = self.scaled_size();
        let visible_x =
            (self.pan.x + scaled.x).min(self.viewport_size.x) - self.pan.x.max(0.0);
        let visible_y =
            (self.pan.y + scaled.y).min(self.viewport_size.y) - self.pan.y.max(0.0);
        Vec2::new(
            (visible_x / scaled.x).clamp(0.0, 1.0),
            (visible_y / scaled.y).clamp(0.0, 1.0),
        )
    }
}
