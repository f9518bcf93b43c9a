//! Vehicles and coins.

use hand_signal::Lane;

use crate::collision::Rect;

// ════════════════════════════════════════════════════════════════════════════
// Obstacles
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObstacleKind {
    Car,
    Truck,
    Train,
}

/// Static look of a vehicle kind: width range as multiples of the obstacle
/// height and a fill colour (0xAARRGGBB).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObstacleStyle {
    pub min_mult: f32,
    pub max_mult: f32,
    pub color:    u32,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 3] = [ObstacleKind::Car, ObstacleKind::Truck, ObstacleKind::Train];

    pub fn style(self) -> ObstacleStyle {
        match self {
            ObstacleKind::Car   => ObstacleStyle { min_mult: 2.0, max_mult: 2.0, color: 0xFF_E8_4C_3D },
            ObstacleKind::Truck => ObstacleStyle { min_mult: 2.2, max_mult: 3.0, color: 0xFF_F1_C4_0F },
            ObstacleKind::Train => ObstacleStyle { min_mult: 4.0, max_mult: 5.0, color: 0xFF_34_98_DB },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ObstacleKind::Car   => "car",
            ObstacleKind::Truck => "truck",
            ObstacleKind::Train => "train",
        }
    }
}

/// A vehicle.  `x` is the horizontal centre; the vertical centre is the
/// centre of `lane`.
#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    pub lane:   Lane,
    pub x:      f32,
    pub width:  f32,
    pub height: f32,
    pub kind:   ObstacleKind,
    pub color:  u32,
}

impl Obstacle {
    pub fn center_y(&self, lane_height: f32) -> f32 {
        self.lane.target_y(lane_height)
    }

    pub fn left(&self) -> f32 { self.x - self.width / 2.0 }

    pub fn rect(&self, lane_height: f32) -> Rect {
        Rect::from_center(self.x, self.center_y(lane_height), self.width, self.height)
    }

    /// Fully past the left edge of the world.
    pub fn is_offscreen(&self) -> bool {
        self.x + self.width / 2.0 < 0.0
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Collectibles
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectibleKind {
    /// +1
    Good,
    /// −1, never below zero.
    Bad,
}

impl CollectibleKind {
    pub fn color(self) -> u32 {
        match self {
            CollectibleKind::Good => 0xFF_FF_D7_00,
            CollectibleKind::Bad  => 0xFF_8E_44_AD,
        }
    }
}

/// A square coin centred on (`x`, `y`).
#[derive(Clone, Debug, PartialEq)]
pub struct Collectible {
    pub lane:  Lane,
    pub x:     f32,
    pub y:     f32,
    pub size:  f32,
    pub kind:  CollectibleKind,
    pub color: u32,
}

impl Collectible {
    pub fn rect(&self) -> Rect {
        Rect::from_center(self.x, self.y, self.size, self.size)
    }

    pub fn is_offscreen(&self) -> bool {
        self.x + self.size / 2.0 < 0.0
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
