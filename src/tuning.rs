//! Data-driven game balance
//!
//! Everything a designer is expected to tweak between builds. Fixed geometry
//! (hit radii, chunk size) stays in [`crate::consts`]. Tuning files are JSON
//! and may override any subset of fields.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a tuning file is rejected
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("`{field}` must be positive (got {value})")]
    NotPositive { field: &'static str, value: f32 },
    #[error("`{field}` must be at least 1")]
    Zero { field: &'static str },
    #[error("dash_time_scale must be in (0, 1] (got {0})")]
    TimeScale(f32),
}

/// Balance knobs for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Player ===
    pub player_max_hp: f32,
    /// Walk speed (m/s)
    pub player_speed: f32,
    pub dash_speed: f32,
    pub dash_duration: f32,
    pub dash_cooldown: f32,
    /// World time multiplier while dashing (slow motion)
    pub dash_time_scale: f32,
    /// HP restored per level gained
    pub level_up_heal: f32,

    // === Enemies ===
    /// Base walk speed of a standard enemy (m/s)
    pub enemy_speed: f32,
    /// Damage per second while an enemy body touches the player
    pub contact_dps: f32,

    // === Waves ===
    pub total_waves: u32,
    pub standard_base: u32,
    pub standard_per_wave: u32,
    /// Most enemies spawned by a single spawn tick
    pub batch_cap: u32,
    pub population_cap_base: u32,
    pub population_cap_per_wave: u32,
    /// Seconds between spawn ticks
    pub spawn_interval: f32,

    // === Bosses ===
    pub boss_count_base: u32,
    /// One more boss every this many waves
    pub boss_count_step: u32,
    pub boss_hp_mult: f32,
    pub boss_scale: f32,
    pub boss_speed_mult: f32,
    pub boss_reward_mult: f32,

    // === Elites ===
    /// First wave that schedules elites
    pub elite_first_wave: u32,
    /// Delay after wave start before the first elite arrives
    pub elite_delay: f32,
    /// Additional delay between successive elite arrivals
    pub elite_interval: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player_max_hp: 100.0,
            player_speed: 6.5,
            dash_speed: 18.0,
            dash_duration: 0.18,
            dash_cooldown: 1.2,
            dash_time_scale: 0.35,
            level_up_heal: 15.0,

            enemy_speed: 3.2,
            contact_dps: 18.0,

            total_waves: 10,
            standard_base: 12,
            standard_per_wave: 6,
            batch_cap: 4,
            population_cap_base: 18,
            population_cap_per_wave: 3,
            spawn_interval: 0.8,

            boss_count_base: 1,
            boss_count_step: 3,
            boss_hp_mult: 8.0,
            boss_scale: 2.2,
            boss_speed_mult: 0.75,
            boss_reward_mult: 6.0,

            elite_first_wave: 2,
            elite_delay: 4.0,
            elite_interval: 2.5,
        }
    }
}

impl Tuning {
    /// Parse and validate a (possibly partial) JSON tuning file
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would stall or break the simulation
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("player_max_hp", self.player_max_hp),
            ("player_speed", self.player_speed),
            ("dash_speed", self.dash_speed),
            ("dash_duration", self.dash_duration),
            ("enemy_speed", self.enemy_speed),
            ("spawn_interval", self.spawn_interval),
            ("boss_hp_mult", self.boss_hp_mult),
            ("boss_scale", self.boss_scale),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(TuningError::NotPositive { field, value });
            }
        }

        let counts = [
            ("total_waves", self.total_waves),
            ("batch_cap", self.batch_cap),
            ("population_cap_base", self.population_cap_base),
            ("boss_count_base", self.boss_count_base),
            ("boss_count_step", self.boss_count_step),
        ];
        for (field, value) in counts {
            if value == 0 {
                return Err(TuningError::Zero { field });
            }
        }

        if !(self.dash_time_scale > 0.0 && self.dash_time_scale <= 1.0) {
            return Err(TuningError::TimeScale(self.dash_time_scale));
        }
        Ok(())
    }

    /// Standard enemies in a wave (1-based)
    pub fn standard_count(&self, wave: u32) -> u32 {
        self.standard_base + self.standard_per_wave * wave.saturating_sub(1)
    }

    /// Bosses in a wave's boss pack (1-based)
    pub fn boss_count(&self, wave: u32) -> u32 {
        self.boss_count_base + wave.saturating_sub(1) / self.boss_count_step.max(1)
    }

    /// Live enemy ceiling for a wave (1-based)
    pub fn population_cap(&self, wave: u32) -> u32 {
        self.population_cap_base + self.population_cap_per_wave * wave.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "total_waves": 3, "batch_cap": 2 }"#).unwrap();
        assert_eq!(tuning.total_waves, 3);
        assert_eq!(tuning.batch_cap, 2);
        assert_eq!(tuning.player_max_hp, Tuning::default().player_max_hp);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            Tuning::from_json(r#"{ "spawn_interval": 0.0 }"#),
            Err(TuningError::NotPositive { field: "spawn_interval", .. })
        ));
        assert!(matches!(
            Tuning::from_json(r#"{ "batch_cap": 0 }"#),
            Err(TuningError::Zero { field: "batch_cap" })
        ));
        assert!(matches!(
            Tuning::from_json(r#"{ "dash_time_scale": 1.5 }"#),
            Err(TuningError::TimeScale(_))
        ));
        assert!(matches!(Tuning::from_json("{ nope"), Err(TuningError::Parse(_))));
    }

    #[test]
    fn test_wave_scaling() {
        let tuning = Tuning::default();
        assert_eq!(tuning.standard_count(1), 12);
        assert_eq!(tuning.standard_count(3), 24);
        assert_eq!(tuning.boss_count(1), 1);
        assert_eq!(tuning.boss_count(4), 2);
        assert_eq!(tuning.population_cap(2), 21);
    }
}
