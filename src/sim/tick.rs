//! Frame driver
//!
//! Advances the simulation by one rendered frame. Player input runs on real
//! time; everything else runs on world time, which slows down while the
//! player dashes.

use glam::Vec2;

use super::state::{GameEvent, GamePhase, GameState, SoundCue};
use super::{ai, combat, wave, weapons};
use crate::consts::*;

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement on the ground plane (x, z); clamped to unit length
    pub move_dir: Vec2,
    /// World point under the cursor
    pub aim: Option<Vec2>,
    /// Hold to fire
    pub fire: bool,
    pub slash: bool,
    pub dash: bool,
    /// Pause toggle
    pub pause: bool,
    /// Idle/demo mode - AI plays the game
    pub idle_mode: bool,
}

/// Advance the game state by one frame of `dt` real seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.pause && state.phase == GamePhase::Playing {
        state.paused = !state.paused;
        log::debug!("Paused: {}", state.paused);
    }

    // Frozen while paused, after the run ends, and while the shop is open
    if state.paused || state.phase != GamePhase::Playing || state.shop_open() {
        return;
    }

    let input = if input.idle_mode {
        autopilot(state)
    } else {
        input.clone()
    };

    let real_dt = dt.clamp(0.0, MAX_DT);
    state.elapsed += real_dt;

    // === Player (real time) ===
    if let Some(facing) = input
        .aim
        .and_then(|aim| (aim - state.player.pos).try_normalize())
    {
        state.player.facing = facing;
    }
    if state
        .player
        .update_movement(input.move_dir, input.dash, &state.tuning, real_dt)
    {
        state.sound(SoundCue::Dash, 0.6, 1.0);
    }
    state
        .world
        .push_out_of_colliders(&mut state.player.pos, PLAYER_RADIUS);

    let world_dt = real_dt * state.time_scale();

    // === World streaming ===
    state.world.update(state.player.pos);

    // === Spawning ===
    wave::update_deferred(state, world_dt);
    wave::tick_spawns(state, world_dt);

    // === Weapons ===
    weapons::update(state, input.fire, input.slash, real_dt);

    // === Projectiles and melee ===
    combat::update_player_bullets(state, world_dt);
    combat::update_enemy_bullets(state, world_dt);
    // Dead players stay dead: no later kill may level up and heal
    if check_game_over(state) {
        return;
    }
    combat::update_orbit_drones(state, world_dt);
    combat::update_sweeps(state, world_dt);
    if check_game_over(state) {
        return;
    }

    // === Enemies ===
    ai::update(state, world_dt, real_dt);
    if check_game_over(state) {
        return;
    }

    combat::update_loot(state, world_dt);
    wave::advance_phase(state);
}

/// End the run if the player is dead. Returns true if it ended.
fn check_game_over(state: &mut GameState) -> bool {
    if !state.player.is_dead() {
        return false;
    }
    state.player.hp = 0.0;
    state.phase = GamePhase::GameOver;
    let record = state.run_record();
    log::info!(
        "Game over on wave {}: {} kills, level {}, {:.1}s",
        state.wave.wave,
        record.kills,
        state.progression.level,
        record.elapsed_secs
    );
    state.emit(GameEvent::GameOver { record });
    state.banner("Game over");
    state.sound(SoundCue::GameOver, 1.0, 0.8);
    true
}

/// Input a simple bot would give: shoot the nearest threat, keep some
/// distance, grab loot when the coast is clear.
pub fn autopilot(state: &GameState) -> TickInput {
    let pos = state.player.pos;
    let nearest = state
        .enemies
        .iter()
        .filter(|e| e.is_targetable())
        .min_by(|a, b| {
            a.pos
                .distance_squared(pos)
                .partial_cmp(&b.pos.distance_squared(pos))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    let mut input = TickInput::default();
    let Some(enemy) = nearest else {
        // Nothing to fight: go get the nearest coin
        if let Some(loot) = state.loot.iter().min_by(|a, b| {
            a.pos
                .distance_squared(pos)
                .partial_cmp(&b.pos.distance_squared(pos))
                .unwrap_or(std::cmp::Ordering::Equal)
        }) {
            input.move_dir = (loot.pos - pos).normalize_or_zero();
        }
        return input;
    };

    let to_enemy = enemy.pos - pos;
    let dist = to_enemy.length();
    let away = -to_enemy.normalize_or_zero();

    // Circle-strafe, alternating direction every few seconds
    let strafe_sign = if (state.elapsed / 4.0) as u32 % 2 == 0 { 1.0 } else { -1.0 };
    let strafe = away.perp() * strafe_sign;

    input.aim = Some(enemy.pos);
    input.fire = true;
    input.slash = dist < SLASH_RANGE;
    input.dash = dist < enemy.radius() + PLAYER_RADIUS + 0.4;
    input.move_dir = if dist < 6.0 {
        (away + strafe * 0.5).normalize_or_zero()
    } else {
        strafe
    };
    input
}
