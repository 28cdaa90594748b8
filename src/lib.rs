//! Arena Survivor - top-down arena survival shooter, simulation core
//!
//! Core modules:
//! - `sim`: Frame-stepped simulation (waves, enemy AI, combat, chunk streaming)
//! - `tuning`: Data-driven game balance
//! - `web`: wasm-bindgen surface consumed by the browser client (wasm32 only)
//!
//! Rendering, DOM panels, audio playback and local storage live in the browser
//! client. They read simulation state and drain [`sim::GameEvent`]s, but never
//! mutate the simulation directly.

pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
///
/// World units are meters on the ground plane. `Vec2::y` is world Z.
pub mod consts {
    /// Fixed step used by the headless driver (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest delta a single step may consume (frame hitch guard)
    pub const MAX_DT: f32 = 0.05;

    /// Player capsule radius for bodies and obstacles
    pub const PLAYER_RADIUS: f32 = 0.5;
    /// Enemy bullets hit the player inside this radius
    pub const PLAYER_HIT_RADIUS: f32 = 0.6;
    /// Invincibility granted after an enemy bullet lands
    pub const PLAYER_HIT_INVINCIBILITY: f32 = 0.5;

    /// Base enemy body radius (multiplied by enemy scale)
    pub const ENEMY_RADIUS: f32 = 0.45;
    /// Player bullets hit an enemy inside this radius
    pub const HIT_RADIUS: f32 = 0.75;
    /// Fade-in before a fresh enemy moves or collides
    pub const ENEMY_SPAWN_TIME: f32 = 0.6;
    /// Hit reaction that suspends movement
    pub const ENEMY_STAGGER_TIME: f32 = 0.12;
    /// Distance from the player at which enemies appear
    pub const SPAWN_DISTANCE: f32 = 20.0;

    /// Contact damage feedback cadence (real seconds)
    pub const CONTACT_FEEDBACK_INTERVAL: f32 = 0.35;
    /// Share of the overlap each body is pushed by per step
    pub const CONTACT_PUSH_FRACTION: f32 = 0.25;

    /// Player bullets
    pub const BULLET_SPEED: f32 = 24.0;
    pub const BULLET_LIFE: f32 = 1.1;
    pub const BULLET_BASE_DAMAGE: f32 = 10.0;
    /// Angle between neighbouring bullets of a volley (radians)
    pub const VOLLEY_SPREAD: f32 = 0.12;

    /// Enemy bullets
    pub const ENEMY_BULLET_SPEED: f32 = 9.0;
    pub const ENEMY_BULLET_LIFE: f32 = 3.0;
    pub const ENEMY_BULLET_DAMAGE: f32 = 8.0;
    /// Elites only shoot at players closer than this
    pub const ELITE_FIRE_RANGE: f32 = 16.0;

    /// Orbit drones
    pub const ORBIT_HIT_RADIUS: f32 = 0.7;
    pub const ORBIT_BASE_DAMAGE: f32 = 12.0;

    /// Melee slash lane
    pub const SLASH_RANGE: f32 = 3.2;
    pub const SLASH_HALF_WIDTH: f32 = 0.9;
    pub const SLASH_LIFE: f32 = 0.25;
    /// Fraction of the sweep's life at which the blade crosses the lane
    pub const SLASH_HIT_FRACTION: f32 = 0.4;
    pub const SLASH_COOLDOWN: f32 = 0.6;
    pub const SLASH_BASE_DAMAGE: f32 = 25.0;

    /// Loot pickups
    pub const LOOT_MAGNET_RADIUS: f32 = 4.0;
    pub const LOOT_PICKUP_RADIUS: f32 = 0.9;
    pub const LOOT_MAGNET_SPEED: f32 = 12.0;

    /// Chunk streaming
    pub const CHUNK_SIZE: f32 = 16.0;
    /// Chebyshev radius (in chunks) kept loaded around the player
    pub const CHUNK_RADIUS: i32 = 4;
    pub const MAX_OBSTACLES_PER_CHUNK: u32 = 3;
    pub const OBSTACLE_MIN_RADIUS: f32 = 0.8;
    pub const OBSTACLE_MAX_RADIUS: f32 = 2.4;
    /// Obstacles never generate this close to the world origin (player start)
    pub const SPAWN_CLEAR_RADIUS: f32 = 6.0;

    /// Steering
    /// Obstacle look-ahead as a multiple of the entity radius
    pub const STEER_LOOKAHEAD: f32 = 4.0;
    pub const STEER_PEER_MARGIN: f32 = 0.3;
    pub const STEER_OBSTACLE_WEIGHT: f32 = 1.6;
    pub const STEER_PEER_WEIGHT: f32 = 1.0;
}

/// Convert polar (r, theta) to cartesian (x, z)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Squared-distance circle test
#[inline]
pub fn within(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance_squared(b) < radius * radius
}
