//! Tactical Map Core - Local-Map Engine Library
//!
//! This crate provides the room-scale exploration and grid-combat engine
//! for the host roleplay application:
//! - Grid model and entity registry (tiles, exits, allegiances)
//! - Threat-zone derivation and tile classification
//! - BFS pathfinding (8-directional) and reachability
//! - Deterministic entity auto-placement
//! - Per-entity animation timeline scheduler (idle/entrance/moving/
//!   attacking/death/incapacitation/revival)
//! - Pooled particle and projectile effects
//! - Floating damage/miss indicators
//! - Zoom/pan viewport controller
//! - Exploration/combat mode controller and event surface
//!
//! The engine is headless: it owns *what* animates, *where* entities are,
//! and *when* transitions occur. A render backend reads the `Visual`,
//! particle, and indicator buffers and applies the `Viewport` transform.

pub mod color;
pub mod constants;
pub mod engine;
pub mod grid;
pub mod indicators;
pub mod logging;
pub mod mode;
pub mod particles;
pub mod pathfinding;
pub mod placement;
pub mod timeline;
pub mod viewport;
pub mod zones;

pub use engine::{ConfigError, EngineConfig, MapEnginePlugin, ZoomConfig};
