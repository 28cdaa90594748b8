//! Player weapons: gun volleys, melee slash and orbit rings

use glam::Vec2;

use super::progression::{damage_multiplier, fire_interval_multiplier};
use super::state::{Bullet, GameState, MeleeSweep, OrbitRing, SoundCue};
use crate::consts::*;

/// Radial gap between successive orbit rings
const RING_SPACING: f32 = 1.1;

/// Damage of one player bullet at the current tier and level
pub fn bullet_damage(state: &GameState) -> f32 {
    BULLET_BASE_DAMAGE
        * state.progression.weapon().damage_mult
        * damage_multiplier(state.progression.level)
}

/// Seconds between volleys at the current tier and level
pub fn fire_interval(state: &GameState) -> f32 {
    state.progression.weapon().fire_interval * fire_interval_multiplier(state.progression.level)
}

pub fn slash_damage(state: &GameState) -> f32 {
    SLASH_BASE_DAMAGE
        * state.progression.weapon().damage_mult
        * damage_multiplier(state.progression.level)
}

/// Rebuild orbit rings from the current tier
///
/// Contact hysteresis is dropped with the old rings.
pub fn sync_orbit_rings(state: &mut GameState) {
    let tier = state.progression.weapon();
    state.orbit_rings = (0..tier.orbit_rings)
        .map(|i| {
            let direction = if i % 2 == 0 { 1.0 } else { -1.0 };
            OrbitRing {
                index: i,
                radius: tier.ring_radius + i as f32 * RING_SPACING,
                angular_speed: tier.ring_speed * direction / (1.0 + 0.25 * i as f32),
                angle: i as f32 * 0.5,
                drones: tier.drones_per_ring,
            }
        })
        .collect();
    state.orbit_contacts.clear();
    log::debug!(
        "Orbit rings synced to tier {} ({} rings)",
        state.progression.tier,
        state.orbit_rings.len()
    );
}

/// Fire a volley fanned around `dir`
pub fn fire_volley(state: &mut GameState, dir: Vec2) {
    let count = state.progression.weapon().projectiles.max(1);
    let damage = bullet_damage(state);
    let origin = state.player.pos + dir * PLAYER_RADIUS;
    let half = (count - 1) as f32 * 0.5;

    for k in 0..count {
        let offset = (k as f32 - half) * VOLLEY_SPREAD;
        let heading = Vec2::from_angle(offset).rotate(dir);
        state
            .bullets
            .push(Bullet::new(origin, heading, BULLET_SPEED, BULLET_LIFE, damage));
    }
    state.sound(SoundCue::Shoot, 0.45, 1.0 + 0.05 * (count - 1) as f32);
}

/// Start a melee sweep along `dir`
pub fn slash(state: &mut GameState, dir: Vec2) {
    let damage = slash_damage(state);
    state.sweeps.push(MeleeSweep {
        origin: state.player.pos,
        dir,
        half_width: SLASH_HALF_WIDTH,
        range: SLASH_RANGE,
        life: SLASH_LIFE,
        total_life: SLASH_LIFE,
        damage,
        applied: false,
    });
    state.sound(SoundCue::Slash, 0.7, 1.0);
}

/// Advance weapon cooldowns (real time) and fire on request
pub fn update(state: &mut GameState, fire: bool, slash_pressed: bool, real_dt: f32) {
    let player = &mut state.player;
    player.shot_cooldown = (player.shot_cooldown - real_dt).max(0.0);
    player.slash_cooldown = (player.slash_cooldown - real_dt).max(0.0);
    let dir = player.facing;

    if fire && state.player.shot_cooldown <= 0.0 {
        fire_volley(state, dir);
        state.player.shot_cooldown = fire_interval(state);
    }
    if slash_pressed && state.player.slash_cooldown <= 0.0 {
        slash(state, dir);
        state.player.slash_cooldown = SLASH_COOLDOWN;
    }
}
