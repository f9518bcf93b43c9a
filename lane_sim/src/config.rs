//! World dimensions, entity counts and pacing.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// World size in pixels; three lanes share the height equally.
    pub width:  f32,
    pub height: f32,

    pub player_size:          f32,
    /// Player's fixed horizontal position as a fraction of `width`.
    pub player_x_fraction:    f32,
    /// Per-tick easing toward the lane centre.
    pub lane_ease:            f32,
    /// Gap below which the player snaps onto the lane centre.
    pub snap_px:              f32,

    pub obstacle_height:      f32,
    pub obstacle_count:       usize,
    pub obstacle_spacing:     f32,
    /// Leftward px per tick before the activity boost.
    pub base_speed:           f32,

    pub collectible_size:     f32,
    pub collectible_count:    usize,
    pub collectible_spacing:  f32,
    pub placement_attempts:   usize,
    /// Share of spawned collectibles that cost a point; 0 disables them.
    pub bad_collectible_ratio: f64,

    pub duration_secs:        u32,
    pub walk_period_ms:       u64,
    /// Dash + gap length of the lane divider pattern.
    pub dash_period:          f32,

    /// RNG seed; `None` picks one from the OS.
    pub seed:                 Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            width:  960.0,
            height: 540.0,

            player_size:          40.0,
            player_x_fraction:    0.25,
            lane_ease:            0.1,
            snap_px:              1.0,

            obstacle_height:      60.0,
            obstacle_count:       10,
            obstacle_spacing:     500.0,
            base_speed:           2.0,

            collectible_size:     20.0,
            collectible_count:    20,
            collectible_spacing:  250.0,
            placement_attempts:   100,
            bad_collectible_ratio: 0.2,

            duration_secs:        120,
            walk_period_ms:       300,
            dash_period:          36.0,

            seed:                 None,
        }
    }
}

impl SimConfig {
    pub fn lane_height(&self)   -> f32 { self.height / 3.0 }
    pub fn player_x(&self)      -> f32 { self.width * self.player_x_fraction }
    pub fn player_radius(&self) -> f32 { self.player_size / 2.0 }
}
