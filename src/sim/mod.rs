//! Frame-stepped simulation module
//!
//! All gameplay logic lives here. This module must stay deterministic for a
//! given seed and input stream:
//! - Seeded RNG only (run RNG plus per-chunk generators)
//! - Stable iteration order (`Vec` registries, ordered chunk map)
//! - No rendering, audio or platform dependencies: outbound effects are
//!   `GameEvent`s

pub mod ai;
pub mod combat;
pub mod progression;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod wave;
pub mod weapons;
pub mod world;

pub use progression::{
    MAX_TIER, Progression, PurchaseError, WeaponTier, coins_per_kill, damage_multiplier,
    enemy_hp_for_level, fire_interval_multiplier, weapon_tier, xp_per_kill, xp_to_next,
    xp_to_reach,
};
pub use snapshot::{EnemyView, Snapshot};
pub use state::{
    Bullet, DeferredSpawn, EliteKind, EliteProfile, Enemy, EnemyState, GameEvent, GamePhase,
    GameState, Loot, MeleeSweep, OrbitRing, Player, RunRecord, SoundCue, WavePhase, WaveState,
};
pub use tick::{TickInput, autopilot, tick};
pub use world::{Collider, Peer, World};
