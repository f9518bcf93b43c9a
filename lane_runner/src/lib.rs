//! # lane_runner
//!
//! A lane runner steered by your hand.  Tilt it to change lanes, brush it
//! side to side to run faster, dodge traffic and collect coins until the
//! clock runs out.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Action |
//! |---|---|
//! | Fingers tilted up (pitch above the up threshold) | Move to the top lane |
//! | Hand level | Middle lane |
//! | Fingers tilted down | Bottom lane |
//! | Brush left and right | Speed boost, proportional to stroke size and tempo |
//! | No hand in view | Keep the current lane, boost fades out |
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: the keyboard drives a synthetic hand.
//! * `leap` — **Hardware mode**: polls a real LeapMotion controller via LeapC.
//!
//! ### Keyboard
//!
//! | Key | Effect |
//! |---|---|
//! | `Up` / hold | Tilt the synthetic hand up |
//! | `Down` / hold | Tilt it down |
//! | `B` / hold | Brush (wrist oscillates) |
//! | `H` | Hand in / out of view |
//! | `N` / `F` | Move the hand nearer / farther |
//! | `Enter` | Camera on, start the game |
//! | `Escape` | Camera off, ends a running game |
//! | `R` | Restart |
//! | `Q` | Quit |

pub mod config;
pub mod gesture;
pub mod player;
pub mod visualizer;
pub mod app;
