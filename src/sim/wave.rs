//! Wave director
//!
//! Each wave runs Standard -> Boss -> Upgrade. Standard enemies trickle in
//! by batches under a population cap, elites arrive through the deferred
//! queue, and the boss pack is released once the field is empty. A phase
//! only ever advances when no enemy is alive and nothing of the current
//! phase is left to spawn.

use glam::Vec2;
use rand::Rng;

use super::progression::enemy_hp_for_level;
use super::state::{
    DeferredSpawn, EliteKind, Enemy, GameEvent, GamePhase, GameState, SoundCue, WavePhase,
    WaveState,
};
use crate::consts::*;
use crate::polar_to_cartesian;

/// Most elite arrivals scheduled for a single wave
const MAX_ELITES_PER_WAVE: u32 = 3;

/// Begin wave `wave` in its Standard phase
pub fn start_wave(state: &mut GameState, wave: u32) {
    state.wave = WaveState::new(wave, &state.tuning);
    schedule_elites(state);

    log::info!(
        "Wave {}: {} standard, {} boss, cap {}, {} elites pending",
        wave,
        state.wave.remaining_standard,
        state.wave.remaining_boss,
        state.wave.population_cap,
        pending_elites(state)
    );
    state.emit(GameEvent::WaveStarted { wave });
    state.banner(format!("Wave {}", wave));
}

/// Queue this wave's elite arrivals on the deferred queue
fn schedule_elites(state: &mut GameState) {
    let wave = state.wave.wave;
    let first = state.tuning.elite_first_wave;
    if wave < first {
        return;
    }

    let level = state.progression.level;
    let eligible: Vec<EliteKind> = EliteKind::ALL
        .into_iter()
        .filter(|kind| kind.profile().min_level <= level)
        .collect();
    if eligible.is_empty() {
        return;
    }

    let arrivals = (1 + (wave - first) / 3).min(MAX_ELITES_PER_WAVE);
    for k in 0..arrivals {
        let elite = eligible[state.rng.random_range(0..eligible.len())];
        let delay = state.tuning.elite_delay + k as f32 * state.tuning.elite_interval;
        state.deferred.push(DeferredSpawn {
            delay,
            generation: state.generation,
            wave,
            elite,
        });
    }
}

/// Deferred elites of the current generation still waiting to arrive
pub fn pending_elites(state: &GameState) -> usize {
    state
        .deferred
        .iter()
        .filter(|task| task.generation == state.generation)
        .count()
}

/// Count down the deferred queue and run whatever came due.
///
/// Entries from an older generation are dropped without effect.
pub fn update_deferred(state: &mut GameState, dt: f32) {
    if state.deferred.is_empty() {
        return;
    }

    let generation = state.generation;
    let mut due = Vec::new();
    state.deferred.retain_mut(|task| {
        task.delay -= dt;
        if task.delay > 0.0 {
            return true;
        }
        if task.generation == generation {
            due.push(task.elite);
        } else {
            log::debug!(
                "Dropping stale {:?} spawn (wave {}, generation {} != {})",
                task.elite,
                task.wave,
                task.generation,
                generation
            );
        }
        false
    });

    for elite in due {
        spawn_elite(state, elite);
    }
}

/// Release spawn batches for the current phase
pub fn tick_spawns(state: &mut GameState, dt: f32) {
    let pending = match state.wave.phase {
        WavePhase::Standard => state.wave.remaining_standard,
        WavePhase::Boss => state.wave.remaining_boss,
        WavePhase::Upgrade => return,
    };
    if pending == 0 {
        return;
    }

    state.wave.spawn_timer -= dt;
    if state.wave.spawn_timer > 0.0 {
        return;
    }
    state.wave.spawn_timer = state.tuning.spawn_interval;

    let headroom = state
        .wave
        .population_cap
        .saturating_sub(state.enemies.len() as u32);

    match state.wave.phase {
        WavePhase::Standard => {
            let batch = state.tuning.batch_cap.min(pending).min(headroom);
            for _ in 0..batch {
                spawn_standard(state);
            }
            state.wave.remaining_standard -= batch;
        }
        WavePhase::Boss => {
            let batch = pending.min(headroom);
            for _ in 0..batch {
                spawn_boss(state);
            }
            state.wave.remaining_boss -= batch;
        }
        WavePhase::Upgrade => {}
    }
}

/// Random point on the spawn ring around the player, clear of obstacles
fn spawn_position(state: &mut GameState, radius: f32) -> Vec2 {
    let angle = state.rng.random_range(0.0..std::f32::consts::TAU);
    let mut pos = state.player.pos + polar_to_cartesian(SPAWN_DISTANCE, angle);
    state.world.push_out_of_colliders(&mut pos, radius);
    pos
}

fn spawn_standard(state: &mut GameState) {
    let hp = enemy_hp_for_level(state.progression.level);
    let speed = state.tuning.enemy_speed * state.rng.random_range(0.9..1.1);
    let pos = spawn_position(state, ENEMY_RADIUS);
    let id = state.next_entity_id();
    state.enemies.push(Enemy::new(id, pos, hp, speed));
}

fn spawn_boss(state: &mut GameState) {
    let tuning = &state.tuning;
    let hp = enemy_hp_for_level(state.progression.level) * tuning.boss_hp_mult;
    let speed = tuning.enemy_speed * tuning.boss_speed_mult;
    let (scale, reward) = (tuning.boss_scale, tuning.boss_reward_mult);

    let pos = spawn_position(state, ENEMY_RADIUS * scale);
    let id = state.next_entity_id();
    let mut enemy = Enemy::new(id, pos, hp, speed);
    enemy.scale = scale;
    enemy.boss = true;
    enemy.xp_mult = reward;
    enemy.coin_mult = reward;
    state.enemies.push(enemy);
}

/// Spawn an elite group (`profile.count` bodies)
pub fn spawn_elite(state: &mut GameState, kind: EliteKind) {
    let profile = kind.profile();
    let hp = enemy_hp_for_level(state.progression.level) * profile.hp_mult;
    let speed = state.tuning.enemy_speed * profile.speed_mult;

    for _ in 0..profile.count {
        let pos = spawn_position(state, ENEMY_RADIUS * profile.size);
        let id = state.next_entity_id();
        let mut enemy = Enemy::new(id, pos, hp, speed);
        enemy.scale = profile.size;
        enemy.elite = Some(kind);
        enemy.xp_mult = profile.xp_mult;
        enemy.coin_mult = profile.coin_mult;
        if let Some(rate) = profile.fire_rate {
            enemy.fire_timer = rate * state.rng.random_range(0.8..=1.2);
        }
        state.enemies.push(enemy);
    }

    log::info!("Elite incoming: {} x{}", profile.name, profile.count);
    state.banner(format!("{} incoming", profile.name));
    state.sound(SoundCue::EliteIncoming, 0.9, 1.0);
}

/// Advance the wave phase if the current one is finished.
///
/// Returns the phase that was entered, if any.
pub fn advance_phase(state: &mut GameState) -> Option<WavePhase> {
    if state.phase != GamePhase::Playing || !state.enemies.is_empty() {
        return None;
    }

    match state.wave.phase {
        WavePhase::Standard
            if state.wave.remaining_standard == 0 && pending_elites(state) == 0 =>
        {
            start_boss_phase(state);
            Some(WavePhase::Boss)
        }
        WavePhase::Boss if state.wave.remaining_boss == 0 => {
            open_shop(state);
            Some(WavePhase::Upgrade)
        }
        _ => None,
    }
}

fn start_boss_phase(state: &mut GameState) {
    let wave = state.wave.wave;
    let bosses = state.wave.remaining_boss;
    state.wave.phase = WavePhase::Boss;
    // Release the pack on the next spawn tick
    state.wave.spawn_timer = 0.0;

    log::info!("Wave {}: boss phase ({} bosses)", wave, bosses);
    state.emit(GameEvent::BossWave { wave, bosses });
    state.banner(if bosses > 1 {
        format!("{} bosses approach", bosses)
    } else {
        "Boss approaches".to_string()
    });
    state.sound(SoundCue::BossIncoming, 1.0, 0.8);
}

/// Enter the Upgrade phase: sweep leftover loot into the purse, clear
/// projectiles, and open the shop.
fn open_shop(state: &mut GameState) {
    let wave = state.wave.wave;
    state.wave.phase = WavePhase::Upgrade;

    let coins: u32 = state.loot.drain(..).map(|l| l.coins).sum();
    if coins > 0 {
        state.progression.coins += coins;
        state.emit(GameEvent::LootCollected { coins });
    }
    state.bullets.clear();
    state.enemy_bullets.clear();
    state.sweeps.clear();

    log::info!(
        "Wave {} cleared, shop open ({} coins, tier {})",
        wave,
        state.progression.coins,
        state.progression.tier
    );
    state.emit(GameEvent::UpgradeShopOpened { wave });
    state.banner(format!("Wave {} cleared", wave));
    state.sound(SoundCue::WaveClear, 1.0, 1.0);
}

/// Leave the shop: next wave, or victory after the final one
pub fn close_shop(state: &mut GameState) {
    let wave = state.wave.wave;
    if wave >= state.tuning.total_waves {
        state.phase = GamePhase::Victory;
        let record = state.run_record();
        log::info!(
            "Victory after {} waves: {} kills in {:.1}s",
            wave,
            record.kills,
            record.elapsed_secs
        );
        state.emit(GameEvent::Victory { record });
        state.banner("Victory");
        state.sound(SoundCue::Victory, 1.0, 1.0);
    } else {
        start_wave(state, wave + 1);
    }
}
