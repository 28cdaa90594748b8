//! Progression model: XP thresholds, per-level scaling and weapon tiers
//!
//! Every lookup here is a pure function, monotonic in its argument.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// XP needed to go from level `i + 1` to level `i + 2`
const XP_TO_NEXT: [u32; 12] = [10, 25, 45, 70, 100, 135, 175, 220, 270, 325, 385, 450];
/// Growth of the threshold past the end of the table
const XP_TAIL_STEP: u32 = 70;

/// Highest purchasable weapon tier
pub const MAX_TIER: u8 = 5;

/// One row of the weapon tier table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeaponTier {
    /// Seconds between volleys (before level scaling)
    pub fire_interval: f32,
    /// Bullets per volley
    pub projectiles: u32,
    pub damage_mult: f32,
    pub orbit_rings: u32,
    pub drones_per_ring: u32,
    /// Radius of the innermost ring; outer rings step out from it
    pub ring_radius: f32,
    /// Radians per second of the innermost ring
    pub ring_speed: f32,
    /// Coins to buy this tier from the one below
    pub cost: u32,
}

const WEAPON_TIERS: [WeaponTier; MAX_TIER as usize + 1] = [
    WeaponTier { fire_interval: 0.32, projectiles: 1, damage_mult: 1.0, orbit_rings: 0, drones_per_ring: 0, ring_radius: 0.0, ring_speed: 0.0, cost: 0 },
    WeaponTier { fire_interval: 0.28, projectiles: 2, damage_mult: 1.1, orbit_rings: 1, drones_per_ring: 2, ring_radius: 2.2, ring_speed: 2.6, cost: 25 },
    WeaponTier { fire_interval: 0.25, projectiles: 2, damage_mult: 1.25, orbit_rings: 1, drones_per_ring: 3, ring_radius: 2.4, ring_speed: 2.8, cost: 60 },
    WeaponTier { fire_interval: 0.22, projectiles: 3, damage_mult: 1.4, orbit_rings: 2, drones_per_ring: 3, ring_radius: 2.4, ring_speed: 3.0, cost: 120 },
    WeaponTier { fire_interval: 0.19, projectiles: 3, damage_mult: 1.6, orbit_rings: 2, drones_per_ring: 4, ring_radius: 2.6, ring_speed: 3.2, cost: 200 },
    WeaponTier { fire_interval: 0.16, projectiles: 4, damage_mult: 1.85, orbit_rings: 3, drones_per_ring: 4, ring_radius: 2.8, ring_speed: 3.4, cost: 320 },
];

/// Weapon stats for a tier (clamped to the table)
pub fn weapon_tier(tier: u8) -> WeaponTier {
    WEAPON_TIERS[tier.min(MAX_TIER) as usize]
}

/// XP needed to advance from `level` to `level + 1`
pub fn xp_to_next(level: u32) -> u32 {
    let idx = level.saturating_sub(1) as usize;
    match XP_TO_NEXT.get(idx) {
        Some(&xp) => xp,
        None => {
            let last = XP_TO_NEXT[XP_TO_NEXT.len() - 1];
            let extra = (idx - XP_TO_NEXT.len() + 1) as u32;
            last + XP_TAIL_STEP * extra
        }
    }
}

/// Cumulative XP at which `level` is reached (level 1 = 0 XP)
pub fn xp_to_reach(level: u32) -> u32 {
    (1..level).map(xp_to_next).sum()
}

pub fn xp_per_kill(level: u32) -> u32 {
    3 + level / 3
}

pub fn coins_per_kill(level: u32) -> u32 {
    1 + level / 4
}

/// Max HP of a standard enemy spawned while the player is at `level`
pub fn enemy_hp_for_level(level: u32) -> f32 {
    30.0 * (1.0 + 0.12 * level.saturating_sub(1) as f32)
}

/// Player damage multiplier at `level`
pub fn damage_multiplier(level: u32) -> f32 {
    1.0 + 0.08 * level.saturating_sub(1) as f32
}

/// Multiplier applied to the tier's fire interval (never below 0.6)
pub fn fire_interval_multiplier(level: u32) -> f32 {
    (1.0 - 0.025 * level.saturating_sub(1) as f32).max(0.6)
}

/// Why a tier purchase was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("the upgrade shop is closed")]
    ShopClosed,
    #[error("tier {requested} is not the next tier after {current}")]
    NotNextTier { current: u8, requested: u8 },
    #[error("already at the maximum tier")]
    MaxTier,
    #[error("tier costs {cost} coins, only {coins} available")]
    InsufficientCoins { cost: u32, coins: u32 },
}

/// Player progression for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    /// Current level (1-based)
    pub level: u32,
    /// Cumulative XP
    pub xp: u32,
    pub coins: u32,
    pub kills: u32,
    /// Purchased weapon tier
    pub tier: u8,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            coins: 0,
            kills: 0,
            tier: 0,
        }
    }
}

impl Progression {
    /// Add XP and return how many levels were gained
    ///
    /// A large award may cross several thresholds at once.
    pub fn award_xp(&mut self, amount: u32) -> u32 {
        self.xp = self.xp.saturating_add(amount);
        let mut gained = 0;
        while self.xp >= xp_to_reach(self.level + 1) {
            self.level += 1;
            gained += 1;
        }
        gained
    }

    /// Progress toward the next level in [0, 1) for the HUD bar
    pub fn level_progress(&self) -> f32 {
        let floor = xp_to_reach(self.level);
        let span = xp_to_next(self.level).max(1);
        (self.xp.saturating_sub(floor) as f32 / span as f32).min(1.0)
    }

    /// Buy `target` tier. Tiers are bought one at a time.
    pub fn purchase_tier(&mut self, target: u8) -> Result<u8, PurchaseError> {
        if self.tier >= MAX_TIER {
            return Err(PurchaseError::MaxTier);
        }
        if target != self.tier + 1 {
            return Err(PurchaseError::NotNextTier {
                current: self.tier,
                requested: target,
            });
        }
        let cost = weapon_tier(target).cost;
        if self.coins < cost {
            return Err(PurchaseError::InsufficientCoins {
                cost,
                coins: self.coins,
            });
        }
        self.coins -= cost;
        self.tier = target;
        Ok(target)
    }

    /// Current weapon stats
    pub fn weapon(&self) -> WeaponTier {
        weapon_tier(self.tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_ascend() {
        for level in 1..40 {
            assert!(xp_to_next(level + 1) > xp_to_next(level));
            assert!(xp_to_reach(level + 1) > xp_to_reach(level));
        }
        assert_eq!(xp_to_reach(1), 0);
        assert_eq!(xp_to_reach(2), 10);
        assert_eq!(xp_to_reach(3), 35);
    }

    #[test]
    fn test_scaling_is_monotonic() {
        for level in 1..60 {
            assert!(xp_per_kill(level + 1) >= xp_per_kill(level));
            assert!(coins_per_kill(level + 1) >= coins_per_kill(level));
            assert!(enemy_hp_for_level(level + 1) > enemy_hp_for_level(level));
            assert!(damage_multiplier(level + 1) > damage_multiplier(level));
            assert!(fire_interval_multiplier(level + 1) <= fire_interval_multiplier(level));
        }
        assert_eq!(enemy_hp_for_level(1), 30.0);
    }

    #[test]
    fn test_single_award_crosses_multiple_levels() {
        let mut progression = Progression::default();
        // Exactly enough for level 5
        let gained = progression.award_xp(xp_to_reach(5));
        assert_eq!(gained, 4);
        assert_eq!(progression.level, 5);

        // One short of level 6 gains nothing
        let gained = progression.award_xp(xp_to_next(5) - 1);
        assert_eq!(gained, 0);
        assert_eq!(progression.level, 5);

        let gained = progression.award_xp(1);
        assert_eq!(gained, 1);
        assert_eq!(progression.level, 6);
    }

    #[test]
    fn test_level_progress() {
        let mut progression = Progression::default();
        assert_eq!(progression.level_progress(), 0.0);
        progression.award_xp(5);
        assert!((progression.level_progress() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_purchase_rules() {
        let mut progression = Progression::default();
        let cost = weapon_tier(1).cost;

        // Not enough coins: nothing changes
        progression.coins = cost - 1;
        assert_eq!(
            progression.purchase_tier(1),
            Err(PurchaseError::InsufficientCoins { cost, coins: cost - 1 })
        );
        assert_eq!(progression.coins, cost - 1);
        assert_eq!(progression.tier, 0);

        // Skipping a tier is rejected even when affordable
        progression.coins = 10_000;
        assert_eq!(
            progression.purchase_tier(2),
            Err(PurchaseError::NotNextTier { current: 0, requested: 2 })
        );
        assert_eq!(progression.coins, 10_000);
        assert_eq!(progression.tier, 0);

        assert_eq!(progression.purchase_tier(1), Ok(1));
        assert_eq!(progression.coins, 10_000 - cost);
        assert_eq!(progression.tier, 1);
    }

    #[test]
    fn test_purchase_stops_at_max_tier() {
        let mut progression = Progression {
            coins: 100_000,
            ..Default::default()
        };
        for tier in 1..=MAX_TIER {
            assert_eq!(progression.purchase_tier(tier), Ok(tier));
        }
        assert_eq!(progression.purchase_tier(MAX_TIER + 1), Err(PurchaseError::MaxTier));
    }

    #[test]
    fn test_tier_table_costs_ascend() {
        for tier in 1..=MAX_TIER {
            assert!(weapon_tier(tier).cost > weapon_tier(tier - 1).cost);
            assert!(weapon_tier(tier).damage_mult >= weapon_tier(tier - 1).damage_mult);
        }
        assert_eq!(weapon_tier(MAX_TIER + 3), weapon_tier(MAX_TIER));
    }
}
