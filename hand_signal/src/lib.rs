//! # hand_signal
//!
//! Turns per-frame hand landmarks into two gameplay signals:
//!
//! * a discrete **lane** (`Up` / `Front` / `Down`) from the hand's pitch,
//!   filtered through a state-dependent hysteresis band, and
//! * a continuous **activity** value from lateral wrist oscillation,
//!   depth corrected, peak-held with decay and exponentially smoothed.
//!
//! ## Pipeline
//!
//! ```text
//! HandFrame ──► orientation::estimate ──► LaneClassifier ──┐
//!     │                                                     ├──► SignalBus
//!     └──────────► ActivityEstimator ───────────────────────┘
//! ```
//!
//! [`GesturePipeline`] owns one classifier and one estimator and is the
//! only writer of a [`SignalBus`].  Any number of readers can hold clones of
//! the bus and call [`SignalBus::snapshot`].
//!
//! ## Quick start
//!
//! ```rust
//! use hand_signal::{GesturePipeline, PipelineConfig, SignalBus, HandFrame, Hand, Lane};
//!
//! let bus = SignalBus::new();
//! let mut pipeline = GesturePipeline::new(PipelineConfig::default(), 640.0, bus.clone());
//!
//! let frame = HandFrame::new(16, vec![Hand::with_pitch(0.5, 0.5, -0.1, 45.0)]);
//! pipeline.process(Some(&frame));
//!
//! assert_eq!(bus.snapshot().lane, Lane::Up);
//! ```

pub mod landmark;
pub mod orientation;
pub mod lane;
pub mod activity;
pub mod bus;
pub mod mailbox;
pub mod pipeline;

pub use landmark::{Hand, HandFrame, Landmark, HAND_CONNECTIONS, LANDMARK_COUNT};
pub use orientation::{estimate as estimate_orientation, Orientation};
pub use lane::{Lane, LaneClassifier, LaneThresholds};
pub use activity::{ActivityConfig, ActivityEstimator, ActivitySignal};
pub use bus::{GestureSignal, SignalBus};
pub use mailbox::Mailbox;
pub use pipeline::{GesturePipeline, PipelineConfig, TickOutcome};
