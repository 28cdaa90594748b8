//! Read-only view of the simulation for renderers and the browser HUD

use glam::Vec2;
use serde::Serialize;

use super::progression::Progression;
use super::state::{Bullet, EliteKind, GamePhase, GameState, Loot, MeleeSweep, Player, WaveState};
use super::world::Collider;

/// Standard enemy tint (0xRRGGBB)
const STANDARD_COLOR: u32 = 0xd94f4f;
const BOSS_COLOR: u32 = 0xffd23f;

/// Enemy as the renderer sees it
#[derive(Debug, Clone, Serialize)]
pub struct EnemyView {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    /// Current / max HP in [0, 1]
    pub hp_frac: f32,
    /// Spawn fade-in opacity
    pub fade: f32,
    /// Hit flash intensity
    pub flash: f32,
    pub color: u32,
    pub elite: Option<EliteKind>,
    pub boss: bool,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<'a> {
    pub phase: GamePhase,
    pub paused: bool,
    pub elapsed: f32,
    pub time_scale: f32,
    pub wave: &'a WaveState,
    pub player: &'a Player,
    pub progression: &'a Progression,
    /// Progress toward the next level in [0, 1)
    pub level_progress: f32,
    pub enemies: Vec<EnemyView>,
    pub bullets: &'a [Bullet],
    pub enemy_bullets: &'a [Bullet],
    pub drones: Vec<Vec2>,
    pub sweeps: &'a [MeleeSweep],
    pub loot: &'a [Loot],
    pub obstacles: Vec<Collider>,
}

impl<'a> Snapshot<'a> {
    pub fn capture(state: &'a GameState) -> Self {
        let enemies = state
            .enemies
            .iter()
            .map(|e| EnemyView {
                id: e.id,
                pos: e.pos,
                radius: e.radius(),
                hp_frac: (e.hp / e.max_hp).clamp(0.0, 1.0),
                fade: e.spawn_fade(),
                flash: e.hit_flash(),
                color: match (e.elite, e.boss) {
                    (_, true) => BOSS_COLOR,
                    (Some(kind), false) => kind.profile().color,
                    (None, false) => STANDARD_COLOR,
                },
                elite: e.elite,
                boss: e.boss,
            })
            .collect();

        let center = state.player.pos;
        let drones = state
            .orbit_rings
            .iter()
            .flat_map(|ring| (0..ring.drones).map(move |slot| ring.drone_pos(center, slot)))
            .collect();

        Self {
            phase: state.phase,
            paused: state.paused,
            elapsed: state.elapsed,
            time_scale: state.time_scale(),
            wave: &state.wave,
            player: &state.player,
            progression: &state.progression,
            level_progress: state.progression.level_progress(),
            enemies,
            bullets: &state.bullets,
            enemy_bullets: &state.enemy_bullets,
            drones,
            sweeps: &state.sweeps,
            loot: &state.loot,
            obstacles: state.world.colliders().cloned().collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
