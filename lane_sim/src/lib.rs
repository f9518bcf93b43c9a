//! # lane_sim
//!
//! The game behind the gestures: a player disc on three horizontal lanes,
//! vehicles scrolling in from the right, coins to collect and a two-minute
//! countdown.
//!
//! The [`Engine`] never draws.  Each call to [`Engine::step`] reads one
//! [`GestureSignal`](hand_signal::GestureSignal), advances the world by one
//! tick and returns the [`SimEvent`]s that happened; [`Engine::snapshot`]
//! hands the presentation layer everything it needs for one frame.
//!
//! ```rust
//! use std::time::Duration;
//! use hand_signal::{GestureSignal, Lane};
//! use lane_sim::{Engine, SimConfig};
//!
//! let mut engine = Engine::new(SimConfig { seed: Some(7), ..SimConfig::default() });
//! let signal = GestureSignal { lane: Lane::Up, ..GestureSignal::default() };
//! for _ in 0..120 {
//!     engine.step(&signal, Duration::from_millis(16));
//! }
//! assert!((engine.state().player_y - engine.lane_height() / 2.0).abs() < 1.0);
//! ```

pub mod config;
pub mod collision;
pub mod entity;
pub mod spawn;
pub mod clock;
pub mod engine;

pub use config::SimConfig;
pub use collision::Rect;
pub use entity::{Collectible, CollectibleKind, Obstacle, ObstacleKind, ObstacleStyle};
pub use spawn::Spawner;
pub use clock::{Countdown, WalkCycle};
pub use engine::{Engine, GameState, RenderSnapshot, SimEvent};
