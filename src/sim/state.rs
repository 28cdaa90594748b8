//! Game state and core simulation types
//!
//! `GameState` is the single simulation context. The frame driver owns it and
//! hands it to each component in a fixed order; components read and mutate
//! the registries directly.

use std::collections::HashSet;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::progression::{Progression, PurchaseError};
use super::world::World;
use crate::consts::*;
use crate::polar_to_cartesian;
use crate::tuning::Tuning;

/// Run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active run (see `WaveState::phase` for the sub-stage)
    Playing,
    /// Player died
    GameOver,
    /// Final wave's shop closed
    Victory,
}

/// Per-enemy behaviour state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyState {
    /// Fading in: immobile, cannot be hit
    Spawning { timer: f32 },
    Active,
    /// Hit reaction: movement suspended
    Staggered { timer: f32 },
    /// Terminal; removed in the same step
    Dead,
}

/// Elite variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EliteKind {
    Brute,
    Stalker,
    Gunner,
    Warden,
}

/// Static stats of an elite variant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EliteProfile {
    pub name: &'static str,
    /// Tint read by the renderer (0xRRGGBB)
    pub color: u32,
    pub size: f32,
    pub hp_mult: f32,
    pub speed_mult: f32,
    pub xp_mult: f32,
    pub coin_mult: f32,
    /// Enemies spawned each time this variant is scheduled
    pub count: u32,
    /// Player level required before this variant appears
    pub min_level: u32,
    /// Seconds between shots (None = melee only)
    pub fire_rate: Option<f32>,
}

const ELITE_PROFILES: [EliteProfile; 4] = [
    EliteProfile { name: "Brute", color: 0xff7a1a, size: 1.6, hp_mult: 4.0, speed_mult: 0.8, xp_mult: 5.0, coin_mult: 5.0, count: 1, min_level: 1, fire_rate: None },
    EliteProfile { name: "Stalker", color: 0xb04dff, size: 1.2, hp_mult: 2.5, speed_mult: 1.35, xp_mult: 3.0, coin_mult: 3.0, count: 2, min_level: 3, fire_rate: None },
    EliteProfile { name: "Gunner", color: 0x2ee6ff, size: 1.3, hp_mult: 3.0, speed_mult: 0.9, xp_mult: 6.0, coin_mult: 6.0, count: 1, min_level: 4, fire_rate: Some(1.8) },
    EliteProfile { name: "Warden", color: 0xff2e63, size: 1.8, hp_mult: 6.0, speed_mult: 0.7, xp_mult: 10.0, coin_mult: 10.0, count: 1, min_level: 7, fire_rate: Some(1.2) },
];

impl EliteKind {
    pub const ALL: [EliteKind; 4] = [
        EliteKind::Brute,
        EliteKind::Stalker,
        EliteKind::Gunner,
        EliteKind::Warden,
    ];

    pub fn profile(self) -> &'static EliteProfile {
        &ELITE_PROFILES[self as usize]
    }
}

/// An enemy entity
#[derive(Debug, Clone, Serialize)]
pub struct Enemy {
    pub id: u32,
    pub pos: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    /// Body size multiplier
    pub scale: f32,
    /// Walk speed (m/s)
    pub speed: f32,
    pub elite: Option<EliteKind>,
    pub boss: bool,
    /// Seconds until the next ranged shot (elites with a fire rate)
    pub fire_timer: f32,
    pub state: EnemyState,
    /// XP multiplier on death
    pub xp_mult: f32,
    /// Coin multiplier on death
    pub coin_mult: f32,
}

impl Enemy {
    pub fn new(id: u32, pos: Vec2, hp: f32, speed: f32) -> Self {
        Self {
            id,
            pos,
            hp,
            max_hp: hp,
            scale: 1.0,
            speed,
            elite: None,
            boss: false,
            fire_timer: 0.0,
            state: EnemyState::Spawning {
                timer: ENEMY_SPAWN_TIME,
            },
            xp_mult: 1.0,
            coin_mult: 1.0,
        }
    }

    /// Body radius
    #[inline]
    pub fn radius(&self) -> f32 {
        ENEMY_RADIUS * self.scale
    }

    /// Can be hit by weapons and touch the player
    pub fn is_targetable(&self) -> bool {
        matches!(self.state, EnemyState::Active | EnemyState::Staggered { .. })
    }

    pub fn is_alive(&self) -> bool {
        self.state != EnemyState::Dead
    }

    /// Advance spawn-fade and stagger timers
    pub fn update_timers(&mut self, dt: f32) {
        match &mut self.state {
            EnemyState::Spawning { timer } | EnemyState::Staggered { timer } => {
                *timer -= dt;
                if *timer <= 0.0 {
                    self.state = EnemyState::Active;
                }
            }
            EnemyState::Active | EnemyState::Dead => {}
        }
    }

    /// Apply damage. Returns true when this hit killed the enemy.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.hp -= amount;
        if self.hp <= 0.0 {
            self.state = EnemyState::Dead;
            true
        } else {
            self.state = EnemyState::Staggered {
                timer: ENEMY_STAGGER_TIME,
            };
            false
        }
    }

    /// Opacity for the renderer's fade-in (0 = just spawned, 1 = solid)
    pub fn spawn_fade(&self) -> f32 {
        match self.state {
            EnemyState::Spawning { timer } => (1.0 - timer / ENEMY_SPAWN_TIME).clamp(0.0, 1.0),
            _ => 1.0,
        }
    }

    /// Hit-flash intensity for the renderer (1 = just hit)
    pub fn hit_flash(&self) -> f32 {
        match self.state {
            EnemyState::Staggered { timer } => (timer / ENEMY_STAGGER_TIME).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

/// A straight-flying projectile (player or enemy)
#[derive(Debug, Clone, Serialize)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds left
    pub life: f32,
    pub damage: f32,
}

impl Bullet {
    pub fn new(pos: Vec2, dir: Vec2, speed: f32, life: f32, damage: f32) -> Self {
        Self {
            pos,
            vel: dir * speed,
            life,
            damage,
        }
    }
}

/// A ring of drones circling the player
#[derive(Debug, Clone, Serialize)]
pub struct OrbitRing {
    pub index: u32,
    pub radius: f32,
    /// Radians per second (sign = direction)
    pub angular_speed: f32,
    pub angle: f32,
    /// Drone slots, evenly spaced
    pub drones: u32,
}

impl OrbitRing {
    /// World position of a drone slot around `center`
    pub fn drone_pos(&self, center: Vec2, slot: u32) -> Vec2 {
        let step = std::f32::consts::TAU / self.drones.max(1) as f32;
        center + polar_to_cartesian(self.radius, self.angle + step * slot as f32)
    }
}

/// A melee slash lane
#[derive(Debug, Clone, Serialize)]
pub struct MeleeSweep {
    pub origin: Vec2,
    /// Unit direction of the lane
    pub dir: Vec2,
    pub half_width: f32,
    pub range: f32,
    pub life: f32,
    pub total_life: f32,
    pub damage: f32,
    /// Damage already resolved
    pub applied: bool,
}

impl MeleeSweep {
    /// Fraction of the sweep's life already elapsed
    pub fn elapsed_fraction(&self) -> f32 {
        if self.total_life <= 0.0 {
            1.0
        } else {
            1.0 - self.life / self.total_life
        }
    }

    /// True if `point` lies inside the lane
    pub fn contains(&self, point: Vec2) -> bool {
        let rel = point - self.origin;
        let along = rel.dot(self.dir);
        let across = rel.perp_dot(self.dir).abs();
        (0.0..=self.range).contains(&along) && across <= self.half_width
    }
}

/// Coins waiting on the ground
#[derive(Debug, Clone, Serialize)]
pub struct Loot {
    pub pos: Vec2,
    pub coins: u32,
    /// Seconds on the ground (renderer bob/spin)
    pub age: f32,
}

impl Loot {
    pub fn new(pos: Vec2, coins: u32) -> Self {
        Self {
            pos,
            coins,
            age: 0.0,
        }
    }
}

/// The player capsule
#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub pos: Vec2,
    /// Unit aim direction
    pub facing: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    /// Seconds of dash left (invincible + slow motion while > 0)
    pub dash_timer: f32,
    pub dash_cooldown: f32,
    pub dash_dir: Vec2,
    /// Post-hit invincibility
    pub invincible_timer: f32,
    pub shot_cooldown: f32,
    pub slash_cooldown: f32,
    /// Throttle for contact-damage feedback (real seconds)
    pub contact_feedback_timer: f32,
    /// Contact damage accumulated since the last feedback
    pub contact_damage_pending: f32,
}

impl Player {
    pub fn new(max_hp: f32) -> Self {
        Self {
            pos: Vec2::ZERO,
            facing: Vec2::X,
            hp: max_hp,
            max_hp,
            dash_timer: 0.0,
            dash_cooldown: 0.0,
            dash_dir: Vec2::X,
            invincible_timer: 0.0,
            shot_cooldown: 0.0,
            slash_cooldown: 0.0,
            contact_feedback_timer: 0.0,
            contact_damage_pending: 0.0,
        }
    }

    pub fn is_dashing(&self) -> bool {
        self.dash_timer > 0.0
    }

    pub fn is_invincible(&self) -> bool {
        self.is_dashing() || self.invincible_timer > 0.0
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    /// Input-driven movement (real delta). Returns true if a dash started.
    pub fn update_movement(&mut self, move_dir: Vec2, dash: bool, tuning: &Tuning, dt: f32) -> bool {
        self.dash_cooldown = (self.dash_cooldown - dt).max(0.0);
        self.invincible_timer = (self.invincible_timer - dt).max(0.0);

        let move_dir = move_dir.clamp_length_max(1.0);
        let mut dashed = false;
        if dash && self.dash_cooldown <= 0.0 && !self.is_dashing() {
            self.dash_dir = move_dir.try_normalize().unwrap_or(self.facing);
            self.dash_timer = tuning.dash_duration;
            self.dash_cooldown = tuning.dash_cooldown;
            dashed = true;
        }

        if self.is_dashing() {
            let step = dt.min(self.dash_timer);
            self.pos += self.dash_dir * tuning.dash_speed * step;
            self.dash_timer = (self.dash_timer - dt).max(0.0);
        } else {
            self.pos += move_dir * tuning.player_speed * dt;
        }
        dashed
    }

    /// Restore HP up to the cap; a dead player stays dead
    pub fn heal(&mut self, amount: f32) {
        if self.is_dead() {
            return;
        }
        self.hp = (self.hp + amount).min(self.max_hp);
    }
}

/// Sub-stage of a numbered wave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WavePhase {
    Standard,
    Boss,
    /// Shop open, simulation frozen
    Upgrade,
}

/// Wave director state
#[derive(Debug, Clone, Serialize)]
pub struct WaveState {
    /// Current wave (1-based)
    pub wave: u32,
    pub phase: WavePhase,
    pub remaining_standard: u32,
    pub remaining_boss: u32,
    /// Live enemy ceiling
    pub population_cap: u32,
    /// Seconds until the next spawn batch
    pub spawn_timer: f32,
}

impl WaveState {
    pub fn new(wave: u32, tuning: &Tuning) -> Self {
        Self {
            wave,
            phase: WavePhase::Standard,
            remaining_standard: tuning.standard_count(wave),
            remaining_boss: tuning.boss_count(wave),
            population_cap: tuning.population_cap(wave),
            spawn_timer: 0.0,
        }
    }
}

/// A spawn postponed to a later step, tagged with the session that scheduled it
#[derive(Debug, Clone, Serialize)]
pub struct DeferredSpawn {
    /// Seconds of world time left
    pub delay: f32,
    pub generation: u32,
    pub wave: u32,
    pub elite: EliteKind,
}

/// Sound cues for the audio collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    Shoot,
    Slash,
    Dash,
    EnemyHit,
    EnemyDeath,
    EliteDeath,
    EnemyShot,
    PlayerHurt,
    Coin,
    LevelUp,
    WaveClear,
    BossIncoming,
    EliteIncoming,
    GameOver,
    Victory,
}

/// Summary handed to the persistence collaborator at the end of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub kills: u32,
    pub elapsed_secs: f32,
    pub coins: u32,
    pub victory: bool,
}

/// Outbound notifications, drained once per step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    Sound { cue: SoundCue, volume: f32, pitch: f32 },
    Banner { text: String },
    /// Floating number; `player` is true for damage taken by the player
    DamageNumber { pos: Vec2, amount: f32, player: bool },
    EnemyKilled { pos: Vec2, elite: Option<EliteKind>, boss: bool },
    LootDropped { pos: Vec2, coins: u32 },
    LootCollected { coins: u32 },
    LevelUp { level: u32 },
    WaveStarted { wave: u32 },
    BossWave { wave: u32, bosses: u32 },
    UpgradeShopOpened { wave: u32 },
    TierPurchased { tier: u8 },
    GameOver { record: RunRecord },
    Victory { record: RunRecord },
}

/// Complete simulation context
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed (world layout and spawn RNG)
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    /// Bumped on every restart; deferred work from older generations is dropped
    pub generation: u32,
    pub phase: GamePhase,
    /// Global pause: no part of the step runs
    pub paused: bool,
    /// Real seconds survived
    pub elapsed: f32,
    pub player: Player,
    pub world: World,
    pub wave: WaveState,
    pub progression: Progression,
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub enemy_bullets: Vec<Bullet>,
    pub orbit_rings: Vec<OrbitRing>,
    /// Orbit contacts currently overlapping (see `combat::orbit_key`)
    pub orbit_contacts: HashSet<u64>,
    pub sweeps: Vec<MeleeSweep>,
    pub loot: Vec<Loot>,
    /// Scheduled spawns; survives restarts, filtered by generation
    pub deferred: Vec<DeferredSpawn>,
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create a new run with default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    /// Create a new run with the given tuning
    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        Self::build(seed, tuning, 0)
    }

    fn build(seed: u64, tuning: Tuning, generation: u32) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            player: Player::new(tuning.player_max_hp),
            wave: WaveState::new(1, &tuning),
            tuning,
            generation,
            phase: GamePhase::Playing,
            paused: false,
            elapsed: 0.0,
            world: World::new(seed),
            progression: Progression::default(),
            enemies: Vec::new(),
            bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            orbit_rings: Vec::new(),
            orbit_contacts: HashSet::new(),
            sweeps: Vec::new(),
            loot: Vec::new(),
            deferred: Vec::new(),
            events: Vec::new(),
            next_id: 1,
        };

        state.world.update(state.player.pos);
        super::weapons::sync_orbit_rings(&mut state);
        super::wave::start_wave(&mut state, 1);
        state
    }

    /// Wipe the run and start over.
    ///
    /// Registries and progression are rebuilt from scratch. The deferred
    /// queue is kept, but its entries belong to the old generation and are
    /// discarded when they come due.
    pub fn restart(&mut self, seed: u64) {
        let generation = self.generation.wrapping_add(1);
        let mut deferred = std::mem::take(&mut self.deferred);
        let tuning = self.tuning.clone();
        *self = Self::build(seed, tuning, generation);
        deferred.append(&mut self.deferred);
        self.deferred = deferred;
        log::info!("Run restarted (seed {}, generation {})", seed, generation);
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn sound(&mut self, cue: SoundCue, volume: f32, pitch: f32) {
        self.events.push(GameEvent::Sound { cue, volume, pitch });
    }

    pub fn banner(&mut self, text: impl Into<String>) {
        self.events.push(GameEvent::Banner { text: text.into() });
    }

    /// Take all events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// World time multiplier (slow motion while dashing)
    pub fn time_scale(&self) -> f32 {
        if self.player.is_dashing() {
            self.tuning.dash_time_scale
        } else {
            1.0
        }
    }

    /// Summary of the run so far
    pub fn run_record(&self) -> RunRecord {
        RunRecord {
            kills: self.progression.kills,
            elapsed_secs: self.elapsed,
            coins: self.progression.coins,
            victory: self.phase == GamePhase::Victory,
        }
    }

    /// True while the shop is open
    pub fn shop_open(&self) -> bool {
        self.phase == GamePhase::Playing && self.wave.phase == WavePhase::Upgrade
    }

    /// Buy the next weapon tier (shop only)
    pub fn purchase_tier(&mut self, target: u8) -> Result<u8, PurchaseError> {
        if !self.shop_open() {
            return Err(PurchaseError::ShopClosed);
        }
        let tier = self.progression.purchase_tier(target)?;
        log::info!("Weapon tier {} purchased ({} coins left)", tier, self.progression.coins);
        super::weapons::sync_orbit_rings(self);
        self.emit(GameEvent::TierPurchased { tier });
        self.sound(SoundCue::Coin, 0.8, 1.2);
        Ok(tier)
    }

    /// Close the shop: next wave, or victory after the last one
    pub fn close_upgrade_shop(&mut self) {
        if self.shop_open() {
            super::wave::close_shop(self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enemy_state_machine() {
        let mut enemy = Enemy::new(1, Vec2::ZERO, 30.0, 3.0);
        assert!(!enemy.is_targetable());
        assert_eq!(enemy.spawn_fade(), 0.0);

        enemy.update_timers(ENEMY_SPAWN_TIME * 0.5);
        assert!(matches!(enemy.state, EnemyState::Spawning { .. }));
        enemy.update_timers(ENEMY_SPAWN_TIME);
        assert_eq!(enemy.state, EnemyState::Active);

        assert!(!enemy.take_damage(10.0));
        assert!(matches!(enemy.state, EnemyState::Staggered { .. }));
        assert!(enemy.hit_flash() > 0.99);
        enemy.update_timers(ENEMY_STAGGER_TIME + 0.01);
        assert_eq!(enemy.state, EnemyState::Active);

        assert!(enemy.take_damage(25.0));
        assert_eq!(enemy.state, EnemyState::Dead);
        // Dead enemies ignore further hits
        assert!(!enemy.take_damage(5.0));
    }

    #[test]
    fn test_sweep_lane() {
        let sweep = MeleeSweep {
            origin: Vec2::ZERO,
            dir: Vec2::X,
            half_width: 1.0,
            range: 3.0,
            life: SLASH_LIFE,
            total_life: SLASH_LIFE,
            damage: 10.0,
            applied: false,
        };
        assert!(sweep.contains(Vec2::new(2.0, 0.9)));
        assert!(sweep.contains(Vec2::new(3.0, -1.0)));
        assert!(!sweep.contains(Vec2::new(-0.1, 0.0)));
        assert!(!sweep.contains(Vec2::new(3.1, 0.0)));
        assert!(!sweep.contains(Vec2::new(1.0, 1.2)));
    }

    #[test]
    fn test_dash_moves_fast_and_grants_invincibility() {
        let tuning = Tuning::default();
        let mut player = Player::new(100.0);
        assert!(player.update_movement(Vec2::Y, true, &tuning, 0.05));
        assert!(player.is_invincible());
        assert!(player.pos.y > tuning.player_speed * 0.05);

        // Cooldown blocks an immediate second dash
        player.update_movement(Vec2::Y, false, &tuning, 0.5);
        assert!(!player.is_dashing());
        assert!(!player.update_movement(Vec2::Y, true, &tuning, 0.01));
    }

    #[test]
    fn test_heal_caps_and_skips_dead_player() {
        let mut player = Player::new(100.0);
        player.hp = 90.0;
        player.heal(15.0);
        assert_eq!(player.hp, 100.0);

        player.hp = -3.0;
        player.heal(15.0);
        assert_eq!(player.hp, -3.0);
        assert!(player.is_dead());
    }

    #[test]
    fn test_purchase_tier_only_in_shop() {
        let mut state = GameState::new(11);
        state.progression.coins = 100;
        state.events.clear();

        assert_eq!(state.purchase_tier(1), Err(PurchaseError::ShopClosed));
        assert_eq!(state.progression.coins, 100);
        assert_eq!(state.progression.tier, 0);
        assert!(state.orbit_rings.is_empty());

        state.wave.phase = WavePhase::Upgrade;
        assert_eq!(state.purchase_tier(1), Ok(1));
        assert_eq!(state.progression.coins, 75);
        assert_eq!(state.progression.tier, 1);
        assert_eq!(state.orbit_rings.len(), 1);
        assert_eq!(state.orbit_rings[0].drones, 2);
        assert!(state
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::TierPurchased { tier: 1 })));

        // Rings follow the live tier
        assert_eq!(state.purchase_tier(2), Ok(2));
        assert_eq!(state.orbit_rings[0].drones, 3);
        assert_eq!(state.progression.coins, 15);
    }

    #[test]
    fn test_drone_slots_are_evenly_spaced() {
        let ring = OrbitRing {
            index: 0,
            radius: 2.0,
            angular_speed: 1.0,
            angle: 0.0,
            drones: 4,
        };
        let center = Vec2::new(1.0, 1.0);
        assert!((ring.drone_pos(center, 0) - Vec2::new(3.0, 1.0)).length() < 1e-5);
        assert!((ring.drone_pos(center, 2) - Vec2::new(-1.0, 1.0)).length() < 1e-5);
    }
}
