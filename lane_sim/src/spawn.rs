//! Seeded construction of vehicles and coins.

use hand_signal::Lane;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::config::SimConfig;
use crate::entity::{Collectible, CollectibleKind, Obstacle, ObstacleKind};

pub struct Spawner {
    rng:       StdRng,
    bad_ratio: f64,
}

impl Spawner {
    pub fn new(seed: u64, bad_ratio: f64) -> Self {
        Spawner {
            rng:       StdRng::seed_from_u64(seed),
            bad_ratio: if bad_ratio.is_finite() { bad_ratio.clamp(0.0, 1.0) } else { 0.0 },
        }
    }

    fn lane(&mut self) -> Lane {
        match self.rng.random_range(0..3) {
            0 => Lane::Up,
            1 => Lane::Front,
            _ => Lane::Down,
        }
    }

    /// A random vehicle whose centre sits one width to the right of
    /// `initial_x`.
    pub fn obstacle(&mut self, initial_x: f32, cfg: &SimConfig) -> Obstacle {
        let kind = *ObstacleKind::ALL.choose(&mut self.rng).unwrap_or(&ObstacleKind::Car);
        let style = kind.style();
        let mult = if style.max_mult > style.min_mult {
            self.rng.random_range(style.min_mult..=style.max_mult)
        } else {
            style.min_mult
        };
        let width = cfg.obstacle_height * mult;
        let lane = self.lane();

        Obstacle {
            lane,
            x: initial_x + width,
            width,
            height: cfg.obstacle_height,
            kind,
            color: style.color,
        }
    }

    /// A coin somewhere in `[initial_x, initial_x + width/2)` that does not
    /// overlap any obstacle.  Gives up after `placement_attempts` tries.
    pub fn collectible(
        &mut self,
        initial_x: f32,
        obstacles: &[Obstacle],
        cfg: &SimConfig,
    ) -> Option<Collectible> {
        let lane_height = cfg.lane_height();
        for _ in 0..cfg.placement_attempts {
            let lane = self.lane();
            let y = lane.target_y(lane_height);
            let x = initial_x + self.rng.random::<f32>() * (cfg.width / 2.0);
            let kind = if self.bad_ratio > 0.0 && self.rng.random_bool(self.bad_ratio) {
                CollectibleKind::Bad
            } else {
                CollectibleKind::Good
            };
            let candidate = Collectible { lane, x, y, size: cfg.collectible_size, kind, color: kind.color() };

            let rect = candidate.rect();
            if obstacles.iter().all(|o| !rect.overlaps(&o.rect(lane_height))) {
                return Some(candidate);
            }
        }
        tracing::debug!(initial_x, "collectible placement gave up");
        None
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obstacle_width_matches_kind() {
        let cfg = SimConfig::default();
        let mut s = Spawner::new(3, 0.0);
        for _ in 0..200 {
            let o = s.obstacle(1000.0, &cfg);
            let style = o.kind.style();
            let mult = o.width / cfg.obstacle_height;
            assert!(mult >= style.min_mult - 1e-4 && mult <= style.max_mult + 1e-4);
            assert_eq!(o.x, 1000.0 + o.width);
            assert_eq!(o.height, cfg.obstacle_height);
            assert_eq!(o.color, style.color);
        }
    }

    #[test]
    fn same_seed_same_world() {
        let cfg = SimConfig::default();
        let mut a = Spawner::new(11, 0.2);
        let mut b = Spawner::new(11, 0.2);
        for i in 0..50 {
            let x = i as f32 * 100.0;
            assert_eq!(a.obstacle(x, &cfg), b.obstacle(x, &cfg));
            assert_eq!(a.collectible(x, &[], &cfg), b.collectible(x, &[], &cfg));
        }
    }

    #[test]
    fn collectible_sits_on_lane_centre_in_range() {
        let cfg = SimConfig::default();
        let mut s = Spawner::new(5, 0.0);
        for _ in 0..100 {
            let c = s.collectible(960.0, &[], &cfg).expect("free world");
            assert_eq!(c.y, c.lane.target_y(cfg.lane_height()));
            assert!(c.x >= 960.0 && c.x <= 960.0 + cfg.width / 2.0);
            assert_eq!(c.kind, CollectibleKind::Good);
        }
    }

    #[test]
    fn collectible_avoids_obstacles() {
        let cfg = SimConfig::default();
        let mut s = Spawner::new(9, 0.0);
        // A single long train in the middle lane.
        let blocker = Obstacle {
            lane: Lane::Front, x: 1200.0, width: 600.0, height: 60.0,
            kind: ObstacleKind::Train, color: 0,
        };
        let lh = cfg.lane_height();
        for _ in 0..100 {
            let c = s.collectible(960.0, std::slice::from_ref(&blocker), &cfg).expect("two lanes free");
            assert!(!c.rect().overlaps(&blocker.rect(lh)));
        }
    }

    #[test]
    fn collectible_gives_up_when_every_lane_is_blocked() {
        let cfg = SimConfig::default();
        let mut s = Spawner::new(1, 0.0);
        let wall: Vec<Obstacle> = Lane::ALL
            .iter()
            .map(|&lane| Obstacle {
                lane, x: 1200.0, width: 800.0, height: 60.0,
                kind: ObstacleKind::Train, color: 0,
            })
            .collect();
        assert!(s.collectible(960.0, &wall, &cfg).is_none());
    }

    #[test]
    fn bad_ratio_one_spawns_only_bad() {
        let cfg = SimConfig::default();
        let mut s = Spawner::new(2, 1.0);
        for _ in 0..20 {
            let c = s.collectible(0.0, &[], &cfg).expect("free world");
            assert_eq!(c.kind, CollectibleKind::Bad);
        }
    }
}
