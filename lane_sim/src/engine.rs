//! The per-session game world.
//!
//! One [`Engine::step`] is one display tick:
//!
//! ```text
//!   lane follow ─► obstacles advance ─► collision ─► recycle obstacles
//!        ─► collectibles advance ─► pickups / off-screen ─► respawn ─► clock
//! ```
//!
//! Every removal pass first collects indices, then applies them, so no list
//! is mutated while it is being scanned.

use std::time::Duration;

use hand_signal::{GestureSignal, Lane};

use crate::clock::{Countdown, WalkCycle};
use crate::collision::{circle_hits_rect, Rect};
use crate::config::SimConfig;
use crate::entity::{Collectible, CollectibleKind, Obstacle};
use crate::spawn::Spawner;

// ════════════════════════════════════════════════════════════════════════════
// Public types
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    pub score:          u32,
    pub time_remaining: u32,
    pub is_over:        bool,
    pub player_x:       f32,
    pub player_y:       f32,
    pub player_target_y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimEvent {
    /// A coin was collected; `score` is the new total.
    Pickup { kind: CollectibleKind, score: u32 },
    /// The player started touching a vehicle.
    Crash,
    /// The countdown reached zero.
    Expired,
}

/// Everything a renderer needs for one frame.
#[derive(Clone, Debug)]
pub struct RenderSnapshot {
    pub width:          f32,
    pub height:         f32,
    pub lane_height:    f32,

    pub player_x:       f32,
    pub player_y:       f32,
    pub player_radius:  f32,
    pub hit:            bool,
    pub walk_phase:     bool,

    pub obstacles:      Vec<Obstacle>,
    pub collectibles:   Vec<Collectible>,

    pub score:          u32,
    pub time_remaining: u32,
    pub is_over:        bool,

    /// Extra speed from activity on the last tick.
    pub boost:          f32,
    pub lane:           Lane,
    pub dash_offset:    f32,
}

// ════════════════════════════════════════════════════════════════════════════
// Engine
// ════════════════════════════════════════════════════════════════════════════

pub struct Engine {
    cfg:          SimConfig,
    spawner:      Spawner,
    state:        GameState,
    obstacles:    Vec<Obstacle>,
    collectibles: Vec<Collectible>,
    countdown:    Countdown,
    walk:         WalkCycle,
    hit:          bool,
    boost:        f32,
    lane:         Lane,
    dash_offset:  f32,
}

impl Engine {
    pub fn new(cfg: SimConfig) -> Self {
        let seed = cfg.seed.unwrap_or_else(|| rand::random());
        tracing::info!(seed, "simulation seeded");
        let spawner = Spawner::new(seed, cfg.bad_collectible_ratio);
        let mut engine = Engine {
            spawner,
            state:        Self::fresh_state(&cfg),
            obstacles:    Vec::with_capacity(cfg.obstacle_count),
            collectibles: Vec::with_capacity(cfg.collectible_count),
            countdown:    Countdown::new(cfg.duration_secs),
            walk:         WalkCycle::new(Duration::from_millis(cfg.walk_period_ms)),
            hit:          false,
            boost:        0.0,
            lane:         Lane::Front,
            dash_offset:  0.0,
            cfg,
        };
        engine.populate();
        engine
    }

    fn fresh_state(cfg: &SimConfig) -> GameState {
        let y = Lane::Front.target_y(cfg.lane_height());
        GameState {
            score:           0,
            time_remaining:  cfg.duration_secs,
            is_over:         false,
            player_x:        cfg.player_x(),
            player_y:        y,
            player_target_y: y,
        }
    }

    /// Initial layout: obstacles then collectibles, each at `width + i·spacing`.
    fn populate(&mut self) {
        self.obstacles.clear();
        self.collectibles.clear();
        for i in 0..self.cfg.obstacle_count {
            let x = self.cfg.width + i as f32 * self.cfg.obstacle_spacing;
            let o = self.spawner.obstacle(x, &self.cfg);
            self.obstacles.push(o);
        }
        for i in 0..self.cfg.collectible_count {
            let x = self.cfg.width + i as f32 * self.cfg.collectible_spacing;
            if let Some(c) = self.spawner.collectible(x, &self.obstacles, &self.cfg) {
                self.collectibles.push(c);
            }
        }
    }

    /// Back to a full clock, zero score and a freshly spawned world.  The RNG
    /// continues so consecutive sessions differ.
    pub fn restart(&mut self) {
        self.state = Self::fresh_state(&self.cfg);
        self.countdown = Countdown::new(self.cfg.duration_secs);
        self.walk = WalkCycle::new(Duration::from_millis(self.cfg.walk_period_ms));
        self.hit = false;
        self.boost = 0.0;
        self.lane = Lane::Front;
        self.dash_offset = 0.0;
        self.populate();
        tracing::info!("simulation restarted");
    }

    /// End the session early.  The world freezes as it would at time up,
    /// but no `Expired` event is raised.
    pub fn finish(&mut self) {
        if !self.state.is_over {
            self.state.is_over = true;
            tracing::info!(score = self.state.score, remaining = self.state.time_remaining, "game ended early");
        }
    }

    // ── accessors ────────────────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig           { &self.cfg }
    pub fn state(&self) -> &GameState            { &self.state }
    pub fn obstacles(&self) -> &[Obstacle]       { &self.obstacles }
    pub fn collectibles(&self) -> &[Collectible] { &self.collectibles }
    pub fn lane_height(&self) -> f32             { self.cfg.lane_height() }
    pub fn is_over(&self) -> bool                { self.state.is_over }
    pub fn time_label(&self) -> String           { self.countdown.label() }

    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot {
            width:          self.cfg.width,
            height:         self.cfg.height,
            lane_height:    self.cfg.lane_height(),
            player_x:       self.state.player_x,
            player_y:       self.state.player_y,
            player_radius:  self.cfg.player_radius(),
            hit:            self.hit,
            walk_phase:     self.walk.phase(),
            obstacles:      self.obstacles.clone(),
            collectibles:   self.collectibles.clone(),
            score:          self.state.score,
            time_remaining: self.state.time_remaining,
            is_over:        self.state.is_over,
            boost:          self.boost,
            lane:           self.lane,
            dash_offset:    self.dash_offset,
        }
    }

    // ── tick ─────────────────────────────────────────────────────────────────

    /// Advance one tick.  `dt` is the wall time since the previous tick and
    /// only feeds the clocks; movement is per tick.  Does nothing once the
    /// game is over.
    pub fn step(&mut self, signal: &GestureSignal, dt: Duration) -> Vec<SimEvent> {
        let mut events = Vec::new();
        if self.state.is_over {
            return events;
        }

        self.lane = signal.lane;
        self.follow_lane(signal.lane);

        self.boost = if signal.activity.is_finite() { signal.activity.max(0.0) } else { 0.0 };
        let speed = self.cfg.base_speed + self.boost;

        for o in &mut self.obstacles {
            o.x -= speed;
        }
        let was_hit = self.hit;
        self.hit = self.resolve_collision();
        if self.hit && !was_hit {
            tracing::debug!(score = self.state.score, "crash");
            events.push(SimEvent::Crash);
        }
        self.recycle_obstacles();

        for c in &mut self.collectibles {
            c.x -= speed;
        }
        self.collect(&mut events);
        self.recycle_collectibles();

        self.walk.advance(dt);
        if self.cfg.dash_period > 0.0 {
            self.dash_offset = (self.dash_offset + speed).rem_euclid(self.cfg.dash_period);
        }

        if self.countdown.advance(dt) {
            self.state.is_over = true;
            tracing::info!(score = self.state.score, "time up");
            events.push(SimEvent::Expired);
        }
        self.state.time_remaining = self.countdown.remaining();
        events
    }

    fn follow_lane(&mut self, lane: Lane) {
        let target = lane.target_y(self.cfg.lane_height());
        self.state.player_target_y = target;
        let gap = target - self.state.player_y;
        if gap.abs() > self.cfg.snap_px {
            self.state.player_y += gap * self.cfg.lane_ease;
        } else {
            self.state.player_y = target;
        }
    }

    /// Resolve contact with the first touching obstacle.  Returns whether
    /// the player was touching one.
    fn resolve_collision(&mut self) -> bool {
        let lh = self.cfg.lane_height();
        let r = self.cfg.player_radius();
        let (px, py) = (self.state.player_x, self.state.player_y);

        let Some(idx) = self
            .obstacles
            .iter()
            .position(|o| circle_hits_rect(px, py, r, &o.rect(lh)))
        else {
            return false;
        };

        let hit = &self.obstacles[idx];
        let left = hit.left();
        if px < left {
            let push = px + r - left;
            for o in &mut self.obstacles {
                o.x += push;
            }
            for c in &mut self.collectibles {
                c.x += push;
            }
        } else {
            let oy = hit.center_y(lh);
            let half = hit.height / 2.0;
            let y = if py < oy { oy - half - r } else { oy + half + r };
            self.state.player_y = y;
            self.state.player_target_y = y;
        }
        true
    }

    fn player_rect(&self) -> Rect {
        Rect::from_center(
            self.state.player_x,
            self.state.player_y,
            self.cfg.player_size,
            self.cfg.player_size,
        )
    }

    fn collect(&mut self, events: &mut Vec<SimEvent>) {
        let player = self.player_rect();
        let picked: Vec<usize> = self
            .collectibles
            .iter()
            .enumerate()
            .filter(|(_, c)| player.overlaps(&c.rect()))
            .map(|(i, _)| i)
            .collect();

        for &i in picked.iter().rev() {
            let c = self.collectibles.remove(i);
            self.state.score = match c.kind {
                CollectibleKind::Good => self.state.score.saturating_add(1),
                CollectibleKind::Bad  => self.state.score.saturating_sub(1),
            };
            tracing::debug!(kind = ?c.kind, score = self.state.score, "pickup");
            events.push(SimEvent::Pickup { kind: c.kind, score: self.state.score });
        }
        for _ in &picked {
            self.spawn_collectible();
        }
    }

    fn spawn_collectible(&mut self) {
        let x = self
            .collectibles
            .last()
            .map_or(self.cfg.width, |c| c.x + self.cfg.collectible_spacing);
        if let Some(c) = self.spawner.collectible(x, &self.obstacles, &self.cfg) {
            self.collectibles.push(c);
        }
    }

    /// Replace every obstacle that has left the screen.  Returns how many
    /// were replaced; a second call in a row replaces none.
    pub fn recycle_obstacles(&mut self) -> usize {
        let gone: Vec<usize> = self
            .obstacles
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_offscreen())
            .map(|(i, _)| i)
            .collect();

        for &i in gone.iter().rev() {
            self.obstacles.remove(i);
        }
        for _ in &gone {
            let x = self
                .obstacles
                .last()
                .map_or(self.cfg.width, |o| o.x + self.cfg.obstacle_spacing);
            let o = self.spawner.obstacle(x, &self.cfg);
            self.obstacles.push(o);
        }
        gone.len()
    }

    /// Remove every off-screen collectible, then spawn until the level is
    /// back at `collectible_count`, so earlier failed placements heal here.
    /// Returns how many were removed.
    pub fn recycle_collectibles(&mut self) -> usize {
        let gone: Vec<usize> = self
            .collectibles
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_offscreen())
            .map(|(i, _)| i)
            .collect();

        for &i in gone.iter().rev() {
            self.collectibles.remove(i);
        }
        let missing = self.cfg.collectible_count.saturating_sub(self.collectibles.len());
        for _ in 0..missing {
            self.spawn_collectible();
        }
        gone.len()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
