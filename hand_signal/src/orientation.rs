//! Hand orientation from three landmarks (wrist, middle MCP, pinky MCP).

use crate::landmark::Hand;

/// Yaw / pitch / roll in degrees, rounded to hundredths.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Orientation {
    pub yaw:   f32,
    pub pitch: f32,
    pub roll:  f32,
}

/// Estimate the orientation of `hand`.
///
/// * `pitch = asin(up.y / |up|)` with `up = middle_mcp − wrist`
/// * `roll  = atan2(side.y, side.x)` with `side = pinky_mcp − wrist` (x/y only)
/// * `yaw   = atan2(up.x, −up.z)`
///
/// Returns `None` when `up` has zero (or non-finite) length; the caller must
/// treat that frame as having no usable orientation.
pub fn estimate(hand: &Hand) -> Option<Orientation> {
    let wrist = hand.wrist();
    let up    = hand.middle_mcp().sub(wrist);
    let side  = hand.pinky_mcp().sub(wrist);

    let mag = (up[0] * up[0] + up[1] * up[1] + up[2] * up[2]).sqrt();
    if !mag.is_finite() || mag <= f32::EPSILON {
        return None;
    }

    let pitch = (up[1] / mag).clamp(-1.0, 1.0).asin().to_degrees();
    let roll  = side[1].atan2(side[0]).to_degrees();
    let yaw   = up[0].atan2(-up[2]).to_degrees();

    Some(Orientation {
        yaw:   round2(yaw),
        pitch: round2(pitch),
        roll:  round2(roll),
    })
}

fn round2(deg: f32) -> f32 {
    (deg * 100.0).round() / 100.0
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
