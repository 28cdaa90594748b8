//! Enemy behaviour: chase, ranged elites, body contact and crowd separation

use glam::Vec2;
use rand::Rng;

use super::combat::resolve_contacts;
use super::state::{Bullet, EnemyState, GameState, SoundCue};
use super::world::Peer;
use crate::consts::*;

/// Advance every enemy by one step.
///
/// Timers and movement run on world time; contact feedback is throttled on
/// real time. Elite fire cooldowns keep running through a stagger, but only
/// active elites shoot or move. Returns true if any enemy touched the player.
pub fn update(state: &mut GameState, world_dt: f32, real_dt: f32) -> bool {
    for enemy in &mut state.enemies {
        enemy.update_timers(world_dt);
    }

    let player_pos = state.player.pos;
    let peers: Vec<Peer> = state
        .enemies
        .iter()
        .map(|e| Peer {
            pos: e.pos,
            radius: e.radius(),
            active: e.is_targetable(),
        })
        .collect();

    let mut shots = Vec::new();
    for (i, enemy) in state.enemies.iter_mut().enumerate() {
        if !enemy.is_targetable() {
            continue;
        }
        let fire_rate = enemy.elite.and_then(|kind| kind.profile().fire_rate);
        if fire_rate.is_some() {
            enemy.fire_timer -= world_dt;
        }
        if enemy.state != EnemyState::Active {
            continue;
        }

        let radius = enemy.radius();
        if let Some(rate) = fire_rate {
            if enemy.fire_timer <= 0.0
                && enemy.pos.distance(player_pos) <= ELITE_FIRE_RANGE
                && state.world.line_of_sight(enemy.pos, player_pos)
            {
                let dir = (player_pos - enemy.pos).normalize_or_zero();
                shots.push(Bullet::new(
                    enemy.pos + dir * radius,
                    dir,
                    ENEMY_BULLET_SPEED,
                    ENEMY_BULLET_LIFE,
                    ENEMY_BULLET_DAMAGE,
                ));
                enemy.fire_timer = rate * state.rng.random_range(0.8..=1.2);
            }
        }

        let heading = state
            .world
            .steer(enemy.pos, player_pos, radius, &peers, i);
        enemy.pos += heading * enemy.speed * world_dt;
        state.world.push_out_of_colliders(&mut enemy.pos, radius);
    }

    for shot in shots {
        state.enemy_bullets.push(shot);
        state.sound(SoundCue::EnemyShot, 0.5, 1.1);
    }

    let touching = resolve_contacts(state, world_dt, real_dt);
    separate(state);
    touching
}

/// Pairwise overlap resolution between enemy bodies.
///
/// Displacements are computed from this step's positions and applied
/// together, so the result does not depend on registry order. Each body of
/// an overlapping pair moves by half the penetration.
pub fn separate(state: &mut GameState) {
    let count = state.enemies.len();
    if count < 2 {
        return;
    }

    let mut offsets = vec![Vec2::ZERO; count];
    for i in 0..count {
        let a = &state.enemies[i];
        if !a.is_targetable() {
            continue;
        }
        for j in i + 1..count {
            let b = &state.enemies[j];
            if !b.is_targetable() {
                continue;
            }
            let delta = b.pos - a.pos;
            let overlap = a.radius() + b.radius() - delta.length();
            if overlap <= 0.0 {
                continue;
            }
            // Coincident bodies split along a fixed axis
            let normal = delta.try_normalize().unwrap_or(Vec2::X);
            offsets[i] -= normal * overlap * 0.5;
            offsets[j] += normal * overlap * 0.5;
        }
    }

    for (enemy, offset) in state.enemies.iter_mut().zip(offsets) {
        if offset != Vec2::ZERO {
            let radius = enemy.radius();
            enemy.pos += offset;
            state.world.push_out_of_colliders(&mut enemy.pos, radius);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{EliteKind, Enemy};
    use crate::sim::world::{Collider, World};

    fn arena() -> GameState {
        let mut state = GameState::new(5);
        state.world = World::with_colliders(Vec::new());
        state.enemies.clear();
        state.events.clear();
        state
    }

    fn push_enemy(state: &mut GameState, pos: Vec2) -> usize {
        let id = state.next_entity_id();
        let mut enemy = Enemy::new(id, pos, 50.0, 2.0);
        enemy.state = EnemyState::Active;
        state.enemies.push(enemy);
        state.enemies.len() - 1
    }

    fn gunner(state: &mut GameState, pos: Vec2) -> usize {
        let idx = push_enemy(state, pos);
        state.enemies[idx].elite = Some(EliteKind::Gunner);
        state.enemies[idx].scale = EliteKind::Gunner.profile().size;
        idx
    }

    #[test]
    fn test_active_enemies_chase_player() {
        let mut state = arena();
        push_enemy(&mut state, Vec2::new(10.0, 0.0));
        update(&mut state, 0.1, 0.1);
        assert!((state.enemies[0].pos.x - 9.8).abs() < 1e-4);
        assert!(state.enemies[0].pos.y.abs() < 1e-5);
    }

    #[test]
    fn test_spawning_and_staggered_enemies_hold_still() {
        let mut state = arena();
        let id = state.next_entity_id();
        state
            .enemies
            .push(Enemy::new(id, Vec2::new(10.0, 0.0), 50.0, 2.0));
        let idx = push_enemy(&mut state, Vec2::new(0.0, 10.0));
        state.enemies[idx].take_damage(1.0);

        update(&mut state, 0.05, 0.05);
        assert_eq!(state.enemies[0].pos, Vec2::new(10.0, 0.0));
        assert_eq!(state.enemies[1].pos, Vec2::new(0.0, 10.0));
    }

    #[test]
    fn test_gunner_fires_with_line_of_sight() {
        let mut state = arena();
        gunner(&mut state, Vec2::new(8.0, 0.0));
        update(&mut state, 0.01, 0.01);

        assert_eq!(state.enemy_bullets.len(), 1);
        assert!(state.enemy_bullets[0].vel.x < 0.0);
        let rate = EliteKind::Gunner.profile().fire_rate.unwrap_or_default();
        let timer = state.enemies[0].fire_timer;
        assert!(timer >= rate * 0.8 - 1e-4 && timer <= rate * 1.2 + 1e-4);
        assert!(state
            .events
            .iter()
            .any(|e| matches!(e, crate::sim::GameEvent::Sound { cue: SoundCue::EnemyShot, .. })));
    }

    #[test]
    fn test_gunner_holds_fire_when_blocked_or_far() {
        let mut state = arena();
        state.world = World::with_colliders(vec![Collider {
            pos: Vec2::new(4.0, 0.0),
            radius: 1.0,
        }]);
        gunner(&mut state, Vec2::new(8.0, 0.0));
        gunner(&mut state, Vec2::new(0.0, ELITE_FIRE_RANGE + 2.0));
        update(&mut state, 0.01, 0.01);
        assert!(state.enemy_bullets.is_empty());
    }

    #[test]
    fn test_gunner_cooldown_runs_while_staggered() {
        let mut state = arena();
        let idx = gunner(&mut state, Vec2::new(8.0, 0.0));
        state.enemies[idx].fire_timer = 1.0;
        state.enemies[idx].take_damage(1.0);
        let start = state.enemies[idx].pos;

        update(&mut state, 0.05, 0.05);
        let enemy = &state.enemies[idx];
        assert!(matches!(enemy.state, EnemyState::Staggered { .. }));
        assert!((enemy.fire_timer - 0.95).abs() < 1e-5);
        // Still held in place and silent
        assert_eq!(enemy.pos, start);
        assert!(state.enemy_bullets.is_empty());
    }

    #[test]
    fn test_push_out_uses_body_radius() {
        let mut state = arena();
        state.world = World::with_colliders(vec![Collider {
            pos: Vec2::new(10.0, 0.0),
            radius: 1.0,
        }]);
        // Large body overlapping the obstacle's far side
        let idx = push_enemy(&mut state, Vec2::new(11.2, 0.0));
        state.enemies[idx].scale = 1.5;
        update(&mut state, 0.05, 0.05);

        let enemy = &state.enemies[idx];
        let min_dist = 1.0 + enemy.radius();
        assert!(enemy.pos.distance(Vec2::new(10.0, 0.0)) >= min_dist - 1e-4);
    }

    #[test]
    fn test_separation_splits_overlap_evenly() {
        let mut state = arena();
        push_enemy(&mut state, Vec2::new(10.0, 0.0));
        push_enemy(&mut state, Vec2::new(10.5, 0.0));
        separate(&mut state);

        let gap = state.enemies[1].pos.x - state.enemies[0].pos.x;
        assert!((gap - 2.0 * ENEMY_RADIUS).abs() < 1e-4);
        // Both moved by the same amount
        let left = 10.0 - state.enemies[0].pos.x;
        let right = state.enemies[1].pos.x - 10.5;
        assert!((left - right).abs() < 1e-5);
    }

    #[test]
    fn test_separation_ignores_registry_order() {
        let positions = [
            Vec2::new(10.0, 0.0),
            Vec2::new(10.4, 0.2),
            Vec2::new(10.2, 0.6),
        ];

        let mut forward = arena();
        for &pos in &positions {
            push_enemy(&mut forward, pos);
        }
        separate(&mut forward);

        let mut reverse = arena();
        for &pos in positions.iter().rev() {
            push_enemy(&mut reverse, pos);
        }
        separate(&mut reverse);

        for (k, enemy) in forward.enemies.iter().enumerate() {
            let mirror = &reverse.enemies[positions.len() - 1 - k];
            assert!((enemy.pos - mirror.pos).length() < 1e-5);
        }
    }
}
