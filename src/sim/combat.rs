//! Combat resolution
//!
//! Projectiles, orbit drones, melee sweeps and body contact against enemies
//! and the player. Registries are scanned back-to-front so removing the entry
//! under the cursor never shifts an entry that is still to be visited.

use glam::Vec2;

use super::progression::{coins_per_kill, damage_multiplier, xp_per_kill};
use super::state::{GameEvent, GameState, Loot, SoundCue};
use crate::consts::*;
use crate::within;

/// Hysteresis key for a (ring, drone slot, enemy) triple
#[inline]
pub fn orbit_key(ring: u32, slot: u32, enemy_id: u32) -> u64 {
    ((ring as u64 & 0xFFFF) << 48) | ((slot as u64 & 0xFFFF) << 32) | enemy_id as u64
}

/// Enemy id encoded in an orbit key
#[inline]
fn orbit_key_enemy(key: u64) -> u32 {
    (key & 0xFFFF_FFFF) as u32
}

/// Damage dealt by a drone right now (follows the live weapon tier)
pub fn orbit_damage(state: &GameState) -> f32 {
    ORBIT_BASE_DAMAGE
        * state.progression.weapon().damage_mult
        * damage_multiplier(state.progression.level)
}

/// Damage the enemy at `index`. Returns true if it died and was removed.
pub fn damage_enemy(state: &mut GameState, index: usize, amount: f32) -> bool {
    let enemy = &mut state.enemies[index];
    let died = enemy.take_damage(amount);
    let pos = enemy.pos;

    state.emit(GameEvent::DamageNumber {
        pos,
        amount,
        player: false,
    });
    if died {
        kill_enemy(state, index);
    } else {
        state.sound(SoundCue::EnemyHit, 0.35, 1.0);
    }
    died
}

/// Remove the enemy at `index`, drop its loot and award XP
pub fn kill_enemy(state: &mut GameState, index: usize) {
    let enemy = state.enemies.remove(index);
    state
        .orbit_contacts
        .retain(|&key| orbit_key_enemy(key) != enemy.id);

    let level = state.progression.level;
    let xp = (xp_per_kill(level) as f32 * enemy.xp_mult).round() as u32;
    let coins = (coins_per_kill(level) as f32 * enemy.coin_mult).round() as u32;
    state.progression.kills += 1;

    state.loot.push(Loot::new(enemy.pos, coins));
    state.emit(GameEvent::LootDropped {
        pos: enemy.pos,
        coins,
    });
    state.emit(GameEvent::EnemyKilled {
        pos: enemy.pos,
        elite: enemy.elite,
        boss: enemy.boss,
    });
    if enemy.elite.is_some() || enemy.boss {
        state.sound(SoundCue::EliteDeath, 0.9, 0.8);
    } else {
        state.sound(SoundCue::EnemyDeath, 0.6, 1.0);
    }

    award_xp(state, xp);
}

/// Add XP, firing one level-up per level gained
pub fn award_xp(state: &mut GameState, amount: u32) {
    let gained = state.progression.award_xp(amount);
    let reached = state.progression.level;
    for level in reached + 1 - gained..=reached {
        log::debug!("Level up: {}", level);
        let heal = state.tuning.level_up_heal;
        state.player.heal(heal);
        state.emit(GameEvent::LevelUp { level });
        state.sound(SoundCue::LevelUp, 1.0, 1.0);
    }
}

/// Apply damage to the player (no-op while invincible)
pub fn hurt_player(state: &mut GameState, amount: f32) {
    if state.player.is_invincible() {
        return;
    }
    state.player.hp -= amount;
    state.player.invincible_timer = PLAYER_HIT_INVINCIBILITY;
    state.emit(GameEvent::DamageNumber {
        pos: state.player.pos,
        amount,
        player: true,
    });
    state.sound(SoundCue::PlayerHurt, 0.9, 1.0);
}

/// Move player bullets and resolve hits against obstacles and enemies
pub fn update_player_bullets(state: &mut GameState, dt: f32) {
    let mut i = state.bullets.len();
    while i > 0 {
        i -= 1;

        let bullet = &mut state.bullets[i];
        bullet.pos += bullet.vel * dt;
        bullet.life -= dt;
        let (pos, damage) = (bullet.pos, bullet.damage);

        if bullet.life <= 0.0 || state.world.blocks(pos) {
            state.bullets.remove(i);
            continue;
        }

        let hit = state
            .enemies
            .iter()
            .rposition(|e| e.is_targetable() && within(pos, e.pos, HIT_RADIUS * e.scale));
        if let Some(index) = hit {
            state.bullets.remove(i);
            damage_enemy(state, index, damage);
        }
    }
}

/// Move enemy bullets and resolve hits against obstacles and the player
pub fn update_enemy_bullets(state: &mut GameState, dt: f32) {
    let mut i = state.enemy_bullets.len();
    while i > 0 {
        i -= 1;

        let bullet = &mut state.enemy_bullets[i];
        bullet.pos += bullet.vel * dt;
        bullet.life -= dt;
        let (pos, damage) = (bullet.pos, bullet.damage);

        if bullet.life <= 0.0 || state.world.blocks(pos) {
            state.enemy_bullets.remove(i);
            continue;
        }

        if within(pos, state.player.pos, PLAYER_HIT_RADIUS) {
            state.enemy_bullets.remove(i);
            hurt_player(state, damage);
        }
    }
}

/// Spin orbit rings and damage enemies a drone has just started touching
pub fn update_orbit_drones(state: &mut GameState, dt: f32) {
    if state.orbit_rings.is_empty() {
        return;
    }

    let center = state.player.pos;
    let mut drones: Vec<(u32, u32, Vec2)> = Vec::new();
    for ring in &mut state.orbit_rings {
        ring.angle = (ring.angle + ring.angular_speed * dt).rem_euclid(std::f32::consts::TAU);
        for slot in 0..ring.drones {
            drones.push((ring.index, slot, ring.drone_pos(center, slot)));
        }
    }

    let damage = orbit_damage(state);
    let mut j = state.enemies.len();
    while j > 0 {
        j -= 1;

        let enemy = &state.enemies[j];
        let (id, pos, reach, targetable) = (
            enemy.id,
            enemy.pos,
            ORBIT_HIT_RADIUS * enemy.scale,
            enemy.is_targetable(),
        );

        let mut entered = 0;
        for &(ring, slot, drone_pos) in &drones {
            let key = orbit_key(ring, slot, id);
            if targetable && within(drone_pos, pos, reach) {
                if state.orbit_contacts.insert(key) {
                    entered += 1;
                }
            } else {
                state.orbit_contacts.remove(&key);
            }
        }

        for _ in 0..entered {
            if damage_enemy(state, j, damage) {
                break;
            }
        }
    }
}

/// Age melee sweeps; each one strikes exactly once when the blade crosses
pub fn update_sweeps(state: &mut GameState, dt: f32) {
    let mut i = state.sweeps.len();
    while i > 0 {
        i -= 1;

        let sweep = &mut state.sweeps[i];
        sweep.life -= dt;

        if !sweep.applied && sweep.elapsed_fraction() >= SLASH_HIT_FRACTION {
            sweep.applied = true;
            let sweep = sweep.clone();
            let mut j = state.enemies.len();
            while j > 0 {
                j -= 1;
                let enemy = &state.enemies[j];
                if enemy.is_targetable() && sweep.contains(enemy.pos) {
                    damage_enemy(state, j, sweep.damage);
                }
            }
        }

        if state.sweeps[i].life <= 0.0 {
            state.sweeps.remove(i);
        }
    }
}

/// Body contact between enemies and the player.
///
/// Damage is continuous (`contact_dps * world_dt` per touching enemy). Both
/// bodies are nudged apart by a fraction of the overlap, so contact stays
/// soft. Feedback (number + sound) is throttled on real time. Returns true if
/// any enemy touched the player this step.
pub fn resolve_contacts(state: &mut GameState, world_dt: f32, real_dt: f32) -> bool {
    let player_pos = state.player.pos;
    let mut player_push = Vec2::ZERO;
    let mut damage = 0.0;
    let mut touching = false;

    for enemy in state.enemies.iter_mut().filter(|e| e.is_targetable()) {
        let delta = enemy.pos - player_pos;
        let overlap = enemy.radius() + PLAYER_RADIUS - delta.length();
        if overlap <= 0.0 {
            continue;
        }
        touching = true;
        let normal = delta.try_normalize().unwrap_or(Vec2::X);
        enemy.pos += normal * overlap * CONTACT_PUSH_FRACTION;
        player_push -= normal * overlap * CONTACT_PUSH_FRACTION;
        damage += state.tuning.contact_dps * world_dt;
    }

    let player = &mut state.player;
    if !touching {
        player.contact_feedback_timer = 0.0;
        player.contact_damage_pending = 0.0;
        return false;
    }

    player.pos += player_push;
    state.world.push_out_of_colliders(&mut player.pos, PLAYER_RADIUS);
    if !player.is_invincible() {
        player.hp -= damage;
        player.contact_damage_pending += damage;
    }

    player.contact_feedback_timer -= real_dt;
    if player.contact_feedback_timer <= 0.0 {
        player.contact_feedback_timer = CONTACT_FEEDBACK_INTERVAL;
        let amount = std::mem::take(&mut player.contact_damage_pending);
        if amount > 0.0 {
            let pos = player.pos;
            state.emit(GameEvent::DamageNumber {
                pos,
                amount,
                player: true,
            });
            state.sound(SoundCue::PlayerHurt, 0.7, 0.9);
        }
    }
    true
}

/// Pull nearby coins toward the player and bank the ones that arrive
pub fn update_loot(state: &mut GameState, dt: f32) {
    let player_pos = state.player.pos;
    let mut collected = 0;
    state.loot.retain_mut(|loot| {
        loot.age += dt;
        let to_player = player_pos - loot.pos;
        let dist = to_player.length();
        if dist < LOOT_MAGNET_RADIUS && dist > 1e-5 {
            let step = (LOOT_MAGNET_SPEED * dt).min(dist);
            loot.pos += to_player / dist * step;
        }
        if within(loot.pos, player_pos, LOOT_PICKUP_RADIUS) {
            collected += loot.coins;
            return false;
        }
        true
    });

    if collected > 0 {
        state.progression.coins += collected;
        state.emit(GameEvent::LootCollected { coins: collected });
        state.sound(SoundCue::Coin, 0.4, 1.3);
    }
}
