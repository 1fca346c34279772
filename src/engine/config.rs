//! Engine configuration: the plain options record the host passes in.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("grid dimensions must be non-zero, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },
    #[error("tile size must be positive, got {0}")]
    BadTileSize(f32),
    #[error("zoom range invalid: min {min} <= default {default} <= max {max} violated")]
    BadZoomRange { min: f32, default: f32, max: f32 },
    #[error("zoom step must be positive, got {0}")]
    BadZoomStep(f32),
    #[error("minimum visible fraction must be in (0, 1], got {0}")]
    BadVisibleFraction(f32),
    #[error("particle pool must hold at least one slot")]
    EmptyParticlePool,
    #[error("config JSON malformed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomConfig {
    pub min: f32,
    pub default: f32,
    pub max: f32,
    pub step: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_ZOOM,
            default: DEFAULT_ZOOM,
            max: DEFAULT_MAX_ZOOM,
            step: DEFAULT_ZOOM_STEP,
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub grid_width: u32,
    pub grid_height: u32,
    /// Unscaled tile edge in pixels.
    pub tile_size: f32,
    /// Opaque background reference resolved by the render backend.
    pub background: Option<String>,
    pub zoom: ZoomConfig,
    pub min_visible_fraction: f32,
    pub particle_pool_size: usize,
    /// Movement range (tiles) for the combat Move overlay.
    pub move_range: u32,
    /// Attack range (Chebyshev tiles) for the Attack overlay.
    pub attack_range: u32,
    /// Seed for the deterministic effect RNG.
    pub effect_seed: u64,
    /// On-screen viewport size in pixels.
    pub viewport_width: f32,
    pub viewport_height: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_width: 9,
            grid_height: 9,
            tile_size: 64.0,
            background: None,
            zoom: ZoomConfig::default(),
            min_visible_fraction: DEFAULT_MIN_VISIBLE_FRACTION,
            particle_pool_size: DEFAULT_PARTICLE_POOL_SIZE,
            move_range: DEFAULT_MOVE_RANGE,
            attack_range: DEFAULT_ATTACK_RANGE,
            effect_seed: 0,
            viewport_width: 800.0,
            viewport_height: 600.0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.grid_width,
                height: self.grid_height,
            });
        }
        if self.tile_size <= 0.0 {
            return Err(ConfigError::BadTileSize(self.tile_size));
        }
        let zoom = &self.zoom;
        if !(zoom.min <= zoom.default && zoom.default <= zoom.max && zoom.min > 0.0) {
            return Err(ConfigError::BadZoomRange {
                min: zoom.min,
                default: zoom.default,
                max: zoom.max,
            });
        }
        if zoom.step <= 0.0 {
            return Err(ConfigError::BadZoomStep(zoom.step));
        }
        if !(self.min_visible_fraction > 0.0 && self.min_visible_fraction <= 1.0) {
            return Err(ConfigError::BadVisibleFraction(self.min_visible_fraction));
        }
        if self.particle_pool_size == 0 {
            return Err(ConfigError::EmptyParticlePool);
        }
        Ok(())
    }

    /// Parse and validate a JSON options record.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
