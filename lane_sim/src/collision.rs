//! Overlap tests.

/// Axis-aligned box in world pixels (y grows downward).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub left:   f32,
    pub top:    f32,
    pub right:  f32,
    pub bottom: f32,
}

impl Rect {
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Rect {
            left:   cx - w / 2.0,
            top:    cy - h / 2.0,
            right:  cx + w / 2.0,
            bottom: cy + h / 2.0,
        }
    }

    pub fn width(&self)  -> f32 { self.right - self.left }
    pub fn height(&self) -> f32 { self.bottom - self.top }

    /// True when the boxes share a region of positive area.  Touching edges
    /// do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        let x = self.right.min(other.right) - self.left.max(other.left);
        let y = self.bottom.min(other.bottom) - self.top.max(other.top);
        x > 0.0 && y > 0.0
    }
}

/// Circle vs box by closest point: clamp the centre into the box and compare
/// squared distance with `r²`.  Touching counts.
pub fn circle_hits_rect(cx: f32, cy: f32, r: f32, rect: &Rect) -> bool {
    let nx = cx.clamp(rect.left, rect.right);
    let ny = cy.clamp(rect.top, rect.bottom);
    let dx = cx - nx;
    let dy = cy - ny;
    dx * dx + dy * dy <= r * r
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
