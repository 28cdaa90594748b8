//! Chunked obstacle streaming and collider queries
//!
//! The ground is split into square chunks. Chunks within a Chebyshev radius of
//! the player's chunk are loaded, each carrying a handful of circular obstacle
//! colliders. A chunk's obstacles are a pure function of (world seed, chunk
//! coordinate), so a chunk that leaves range and comes back is identical.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::consts::*;

/// A circular obstacle on the ground plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Collider {
    pub pos: Vec2,
    pub radius: f32,
}

/// Integer chunk coordinate (x, z)
pub type ChunkCoord = (i32, i32);

/// A loaded chunk
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub coord: ChunkCoord,
    pub colliders: Vec<Collider>,
}

/// Another body taken into account by [`World::steer`]
#[derive(Debug, Clone, Copy)]
pub struct Peer {
    pub pos: Vec2,
    pub radius: f32,
    /// Inactive peers (spawning, dead) are ignored
    pub active: bool,
}

/// Chunk containing a world position
pub fn chunk_coord(pos: Vec2) -> ChunkCoord {
    (
        (pos.x / CHUNK_SIZE).floor() as i32,
        (pos.y / CHUNK_SIZE).floor() as i32,
    )
}

/// Seed for a chunk's generator
pub fn chunk_seed(world_seed: u64, coord: ChunkCoord) -> u64 {
    let (cx, cz) = coord;
    world_seed
        ^ (cx as i64 as u64).wrapping_mul(73_856_093)
        ^ (cz as i64 as u64).wrapping_mul(19_349_663)
        ^ 0x9E37_79B9_7F4A_7C15
}

/// Generate a chunk's obstacles (deterministic in seed and coordinate)
pub fn generate_chunk(world_seed: u64, coord: ChunkCoord) -> Chunk {
    let mut rng = Pcg32::seed_from_u64(chunk_seed(world_seed, coord));
    let origin = Vec2::new(coord.0 as f32, coord.1 as f32) * CHUNK_SIZE;
    let margin = OBSTACLE_MAX_RADIUS;

    let count = rng.random_range(0..=MAX_OBSTACLES_PER_CHUNK);
    let mut colliders = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let pos = origin
            + Vec2::new(
                rng.random_range(margin..CHUNK_SIZE - margin),
                rng.random_range(margin..CHUNK_SIZE - margin),
            );
        let radius = rng.random_range(OBSTACLE_MIN_RADIUS..OBSTACLE_MAX_RADIUS);

        // Keep the player start clear
        if pos.length() < SPAWN_CLEAR_RADIUS + radius {
            continue;
        }
        colliders.push(Collider { pos, radius });
    }

    Chunk { coord, colliders }
}

/// Streamed obstacle field around the player
#[derive(Debug, Clone)]
pub struct World {
    seed: u64,
    /// Ordered so collider iteration (and push-out order) is deterministic
    chunks: BTreeMap<ChunkCoord, Chunk>,
    center: Option<ChunkCoord>,
}

impl World {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            chunks: BTreeMap::new(),
            center: None,
        }
    }

    /// Number of loaded chunks
    pub fn loaded_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Every active collider
    pub fn colliders(&self) -> impl Iterator<Item = &Collider> {
        self.chunks.values().flat_map(|c| c.colliders.iter())
    }

    /// Stream chunks around `player_pos`.
    ///
    /// Returns (loaded, unloaded) chunk counts. Does nothing while the player
    /// stays inside the same chunk.
    pub fn update(&mut self, player_pos: Vec2) -> (usize, usize) {
        let center = chunk_coord(player_pos);
        if self.center == Some(center) {
            return (0, 0);
        }
        self.center = Some(center);

        let in_range = |coord: &ChunkCoord| {
            (coord.0 - center.0).abs() <= CHUNK_RADIUS && (coord.1 - center.1).abs() <= CHUNK_RADIUS
        };

        let before = self.chunks.len();
        self.chunks.retain(|coord, _| in_range(coord));
        let unloaded = before - self.chunks.len();

        let mut loaded = 0;
        for cx in center.0 - CHUNK_RADIUS..=center.0 + CHUNK_RADIUS {
            for cz in center.1 - CHUNK_RADIUS..=center.1 + CHUNK_RADIUS {
                let coord = (cx, cz);
                if !self.chunks.contains_key(&coord) {
                    self.chunks.insert(coord, generate_chunk(self.seed, coord));
                    loaded += 1;
                }
            }
        }

        if loaded > 0 || unloaded > 0 {
            log::debug!(
                "Chunk streaming at {:?}: +{} -{} ({} loaded)",
                center,
                loaded,
                unloaded,
                self.chunks.len()
            );
        }
        (loaded, unloaded)
    }

    /// True if segment `a -> b` does not pass within any collider's radius
    pub fn line_of_sight(&self, a: Vec2, b: Vec2) -> bool {
        let seg = b - a;
        let len_sq = seg.length_squared();
        self.colliders().all(|c| {
            let t = if len_sq < 1e-8 {
                0.0
            } else {
                ((c.pos - a).dot(seg) / len_sq).clamp(0.0, 1.0)
            };
            let closest = a + seg * t;
            closest.distance_squared(c.pos) >= c.radius * c.radius
        })
    }

    /// Steering direction from `pos` toward `target`.
    ///
    /// Blends the direct heading with repulsion from obstacles inside the
    /// look-ahead distance and from active peers (other than `self_index`)
    /// closer than the sum of radii plus a margin. Falls back to the direct
    /// heading when the blend cancels out.
    pub fn steer(
        &self,
        pos: Vec2,
        target: Vec2,
        self_radius: f32,
        peers: &[Peer],
        self_index: usize,
    ) -> Vec2 {
        let direct = (target - pos).normalize_or_zero();
        if direct == Vec2::ZERO {
            return Vec2::ZERO;
        }

        let lookahead = self_radius * STEER_LOOKAHEAD;
        let mut avoid = Vec2::ZERO;
        for c in self.colliders() {
            let away = pos - c.pos;
            let gap = away.length() - c.radius - self_radius;
            if gap < lookahead {
                let strength = (1.0 - gap.max(0.0) / lookahead).clamp(0.0, 1.0);
                avoid += away.normalize_or_zero() * strength;
            }
        }

        let mut separate = Vec2::ZERO;
        for (i, peer) in peers.iter().enumerate() {
            if i == self_index || !peer.active {
                continue;
            }
            let away = pos - peer.pos;
            let dist = away.length();
            let reach = self_radius + peer.radius + STEER_PEER_MARGIN;
            if dist < reach && dist > 1e-5 {
                separate += away / dist * (1.0 - dist / reach);
            }
        }

        let blended = direct + avoid * STEER_OBSTACLE_WEIGHT + separate * STEER_PEER_WEIGHT;
        if blended.length_squared() < 1e-6 {
            direct
        } else {
            blended.normalize()
        }
    }

    /// Resolve overlap with obstacles, one collider at a time
    pub fn push_out_of_colliders(&self, pos: &mut Vec2, self_radius: f32) {
        for c in self.colliders() {
            let min_dist = c.radius + self_radius;
            let away = *pos - c.pos;
            let dist_sq = away.length_squared();
            if dist_sq < min_dist * min_dist {
                let normal = away.try_normalize().unwrap_or(Vec2::X);
                *pos = c.pos + normal * min_dist;
            }
        }
    }

    /// True if a point sits inside any collider (bullet blocking)
    pub fn blocks(&self, pos: Vec2) -> bool {
        self.colliders()
            .any(|c| pos.distance_squared(c.pos) < c.radius * c.radius)
    }

    /// Test helper: install a fixed set of colliders in a single chunk
    #[cfg(test)]
    pub(crate) fn with_colliders(colliders: Vec<Collider>) -> Self {
        let mut chunks = BTreeMap::new();
        chunks.insert((0, 0), Chunk { coord: (0, 0), colliders });
        Self {
            seed: 0,
            chunks,
            center: Some((0, 0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaming_keeps_chebyshev_square() {
        let mut world = World::new(7);
        let (loaded, unloaded) = world.update(Vec2::ZERO);
        let side = (2 * CHUNK_RADIUS + 1) as usize;
        assert_eq!(loaded, side * side);
        assert_eq!(unloaded, 0);

        // Same chunk: no work
        assert_eq!(world.update(Vec2::new(1.0, 1.0)), (0, 0));

        // Step one chunk east: one column in, one column out
        let (loaded, unloaded) = world.update(Vec2::new(CHUNK_SIZE + 1.0, 0.0));
        assert_eq!(loaded, side);
        assert_eq!(unloaded, side);
        assert!(!world.is_loaded((-CHUNK_RADIUS, 0)));
        assert!(world.is_loaded((CHUNK_RADIUS + 1, 0)));
        assert_eq!(world.loaded_chunks(), side * side);
    }

    #[test]
    fn test_chunks_regenerate_identically() {
        let mut world = World::new(42);
        world.update(Vec2::ZERO);
        let coord = (3, -2);
        let original = world.chunk(coord).cloned().unwrap();

        // Walk far enough to unload it, then come back
        world.update(Vec2::new(CHUNK_SIZE * 20.0, 0.0));
        assert!(!world.is_loaded(coord));
        world.update(Vec2::ZERO);
        assert_eq!(world.chunk(coord), Some(&original));

        // Different world seed: different layout somewhere nearby
        let other: Vec<_> = (0..10).map(|x| generate_chunk(43, (x, 5))).collect();
        let ours: Vec<_> = (0..10).map(|x| generate_chunk(42, (x, 5))).collect();
        assert_ne!(other, ours);
    }

    #[test]
    fn test_start_area_is_clear() {
        let mut world = World::new(1234);
        world.update(Vec2::ZERO);
        for c in world.colliders() {
            assert!(c.pos.length() >= SPAWN_CLEAR_RADIUS + c.radius);
        }
    }

    #[test]
    fn test_line_of_sight_midpoint_blocked() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        let world = World::with_colliders(vec![Collider {
            pos: Vec2::new(5.0, 0.0),
            radius: 1.0,
        }]);
        assert!(!world.line_of_sight(a, b));

        // Off the segment by more than its radius
        let world = World::with_colliders(vec![Collider {
            pos: Vec2::new(5.0, 1.1),
            radius: 1.0,
        }]);
        assert!(world.line_of_sight(a, b));

        // Beyond the segment's end
        let world = World::with_colliders(vec![Collider {
            pos: Vec2::new(12.0, 0.0),
            radius: 1.0,
        }]);
        assert!(world.line_of_sight(a, b));
    }

    #[test]
    fn test_steer_goes_straight_in_open_field() {
        let world = World::with_colliders(Vec::new());
        let dir = world.steer(Vec2::ZERO, Vec2::new(0.0, 10.0), 0.5, &[], 0);
        assert!((dir - Vec2::Y).length() < 1e-5);

        // Standing on the target
        let dir = world.steer(Vec2::ONE, Vec2::ONE, 0.5, &[], 0);
        assert_eq!(dir, Vec2::ZERO);
    }

    #[test]
    fn test_steer_bends_around_obstacle() {
        let world = World::with_colliders(vec![Collider {
            pos: Vec2::new(1.5, 0.3),
            radius: 1.0,
        }]);
        let dir = world.steer(Vec2::ZERO, Vec2::new(10.0, 0.0), 0.5, &[], 0);
        assert!((dir.length() - 1.0).abs() < 1e-4);
        // Obstacle sits slightly left (+z) of the path, so we veer right
        assert!(dir.y < 0.0);
    }

    #[test]
    fn test_steer_separates_from_peers() {
        let world = World::with_colliders(Vec::new());
        let peers = [
            Peer { pos: Vec2::ZERO, radius: 0.5, active: true },
            Peer { pos: Vec2::new(0.0, 0.4), radius: 0.5, active: true },
            Peer { pos: Vec2::new(0.0, -0.4), radius: 0.5, active: false },
        ];
        let dir = world.steer(Vec2::ZERO, Vec2::new(10.0, 0.0), 0.5, &peers, 0);
        // Pushed away from the active neighbour only
        assert!(dir.y < 0.0);
        assert!(dir.x > 0.0);
    }

    #[test]
    fn test_steer_degenerate_blend_falls_back_to_direct() {
        // Touching obstacle dead ahead pushes back with 1.6, the heading pulls
        // with 1.0 and a peer behind pushes forward with 0.6: net zero.
        let world = World::with_colliders(vec![Collider {
            pos: Vec2::new(1.0, 0.0),
            radius: 0.5,
        }]);
        let pos = Vec2::ZERO;
        let target = Vec2::new(10.0, 0.0);
        let peers = [
            Peer { pos, radius: 0.5, active: true },
            Peer { pos: Vec2::new(-0.52, 0.0), radius: 0.5, active: true },
        ];
        let dir = world.steer(pos, target, 0.5, &peers, 0);
        assert!((dir - Vec2::X).length() < 1e-4);
    }

    #[test]
    fn test_push_out_resolves_overlap() {
        let world = World::with_colliders(vec![Collider {
            pos: Vec2::ZERO,
            radius: 1.0,
        }]);
        let mut pos = Vec2::new(0.5, 0.0);
        world.push_out_of_colliders(&mut pos, 0.5);
        assert!((pos - Vec2::new(1.5, 0.0)).length() < 1e-5);

        // Dead center falls back to +X
        let mut pos = Vec2::ZERO;
        world.push_out_of_colliders(&mut pos, 0.5);
        assert!((pos - Vec2::new(1.5, 0.0)).length() < 1e-5);

        // Clear positions are untouched
        let mut pos = Vec2::new(3.0, 0.0);
        world.push_out_of_colliders(&mut pos, 0.5);
        assert_eq!(pos, Vec2::new(3.0, 0.0));
    }
}
