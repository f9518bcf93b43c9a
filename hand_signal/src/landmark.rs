//! Hand landmarks as delivered by the detector.
//!
//! A [`Hand`] is always exactly [`LANDMARK_COUNT`] points in the detector's
//! fixed order.  `x`/`y` are normalised frame coordinates in `[0, 1]`; `z` is
//! relative depth, more negative meaning closer to the camera.

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices
// ════════════════════════════════════════════════════════════════════════════

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const MIDDLE_MCP: usize = 9;
pub const RING_MCP:   usize = 13;
pub const PINKY_MCP:  usize = 17;

/// Bone list used to draw the hand preview.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1),  (1, 2),   (2, 3),   (3, 4),
    (0, 5),  (5, 6),   (6, 7),   (7, 8),
    (5, 9),  (9, 10),  (10, 11), (11, 12),
    (9, 13), (13, 14), (14, 15), (15, 16),
    (13, 17), (0, 17), (17, 18), (18, 19), (19, 20),
];

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    /// Component-wise `self − other`.
    pub fn sub(self, other: Landmark) -> [f32; 3] {
        [self.x - other.x, self.y - other.y, self.z - other.z]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Hand
// ════════════════════════════════════════════════════════════════════════════

/// One detected hand: 21 ordered landmarks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand {
    points: [Landmark; LANDMARK_COUNT],
}

impl Hand {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Hand { points }
    }

    /// Build from a detector slice.  Returns `None` unless it holds exactly
    /// [`LANDMARK_COUNT`] points.
    pub fn from_slice(points: &[Landmark]) -> Option<Self> {
        let points: [Landmark; LANDMARK_COUNT] = points.try_into().ok()?;
        Some(Hand { points })
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] { &self.points }
    pub fn wrist(&self)      -> Landmark { self.points[WRIST] }
    pub fn middle_mcp(&self) -> Landmark { self.points[MIDDLE_MCP] }
    pub fn pinky_mcp(&self)  -> Landmark { self.points[PINKY_MCP] }

    /// Synthesise a plausible hand whose wrist sits at `(x, y, z)` and whose
    /// wrist→middle-knuckle vector is tilted by `pitch_deg`.
    ///
    /// [`crate::orientation::estimate`] on the result reports `pitch_deg`
    /// (to rounding) with zero yaw.  Used by the keyboard simulator and tests.
    pub fn with_pitch(x: f32, y: f32, z: f32, pitch_deg: f32) -> Self {
        const PALM: f32 = 0.1;
        const PHALANX: f32 = 0.035;

        let p = pitch_deg.to_radians();
        let up = [0.0, p.sin(), -p.cos()];
        let wrist = Landmark::new(x, y, z);
        let along = |base: Landmark, k: f32, dx: f32| Landmark::new(
            base.x + up[0] * k + dx,
            base.y + up[1] * k,
            base.z + up[2] * k,
        );

        let mut points = [wrist; LANDMARK_COUNT];

        // Thumb fans out toward −x from low on the palm.
        points[THUMB_CMC] = along(wrist, PALM * 0.3, -0.03);
        points[THUMB_MCP] = along(wrist, PALM * 0.55, -0.05);
        points[THUMB_IP]  = along(wrist, PALM * 0.75, -0.065);
        points[THUMB_TIP] = along(wrist, PALM * 0.95, -0.075);

        // Four fingers: MCP on the knuckle line, then three phalanges.
        for (finger, mcp) in [INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP].into_iter().enumerate() {
            let dx = (finger as f32 - 1.0) * 0.025;
            let knuckle = along(wrist, PALM, dx);
            points[mcp] = knuckle;
            for joint in 1..4 {
                points[mcp + joint] = along(knuckle, PHALANX * joint as f32, 0.0);
            }
        }

        Hand { points }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandFrame
// ════════════════════════════════════════════════════════════════════════════

/// One detector result.  An empty `hands` list means "no hand in view",
/// which is a normal outcome, not an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandFrame {
    /// Monotonic capture timestamp in milliseconds.
    pub timestamp_ms: u64,
    pub hands:        Vec<Hand>,
}

impl HandFrame {
    pub fn new(timestamp_ms: u64, hands: Vec<Hand>) -> Self {
        HandFrame { timestamp_ms, hands }
    }

    pub fn empty(timestamp_ms: u64) -> Self {
        HandFrame { timestamp_ms, hands: Vec::new() }
    }

    /// The tracked hand ("hand 0"), if any.
    pub fn primary(&self) -> Option<&Hand> { self.hands.first() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
