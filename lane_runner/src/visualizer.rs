//! Software-rendered game window using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┬────────────┐
//! │  lane 0   ───  ───  ───  ───  ───  ───  ───  ───      │ hand tile  │
//! │  lane 1        (player)   [truck]     ◆      [car]    └────────────┤
//! │  lane 2   ───  ───  ───  ───  ───  ───  ───  ───                   │
//! ├───────────────────────────────────────────────────────────────────┤
//! │  SCORE  TIME  BOOST  LANE  HANDS  CAM  FPS                         │
//! │  status line                                      key legend       │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All drawing goes into a [`Canvas`]; the [`Visualizer`] only owns the
//! window and presents the canvas once per frame.

use anyhow::{anyhow, Result};
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use hand_signal::{Hand, HAND_CONNECTIONS};
use lane_sim::{Collectible, CollectibleKind, Obstacle, ObstacleKind, RenderSnapshot};

use crate::gesture::{SimInput, SimKey};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:    usize = 960;
pub const WORLD_H:  usize = 540;
const HUD_H:        usize = 56;
pub const WIN_H:    usize = WORLD_H + HUD_H;
const TILE_W:       usize = 160;
const TILE_H:       usize = 120;
const TILE_MARGIN:  usize = 8;
const DASH_LEN:     f32   = 18.0;
const GLYPH_W:      usize = 4; // 3 wide + 1 gap

const BG_COLOR:     u32 = 0xFF1A1A2E;
const LANE_COLORS:  [u32; 3] = [0xFF34495E, 0xFF2C3E50, 0xFF34495E];
const DASH_COLOR:   u32 = 0xFFECF0F1;
const HUD_BG:       u32 = 0xFF0F3460;
const TEXT_COLOR:   u32 = 0xFFEEEEEE;
const DIM_TEXT:     u32 = 0xFF888888;
const PLAYER_COLOR: u32 = 0xFF2ECC71;
const HIT_COLOR:    u32 = 0xFFE74C3C;
const GOLD:         u32 = 0xFFFFD700;
const BLACK:        u32 = 0xFF000000;
const WHITE:        u32 = 0xFFFFFFFF;

// ════════════════════════════════════════════════════════════════════════════
// Input
// ════════════════════════════════════════════════════════════════════════════

/// Session controls from the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    StartCamera, // Enter
    StopCamera,  // Esc
    Restart,     // R
    Quit,        // Q
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Control(Control),
    Sim(SimInput),
}

// ════════════════════════════════════════════════════════════════════════════
// HUD model
// ════════════════════════════════════════════════════════════════════════════

/// Everything drawn that does not come from the simulation.
#[derive(Clone, Debug, Default)]
pub struct Hud {
    pub time_label: String,
    pub fps:        f32,
    pub camera_on:  bool,
    pub live:       bool,
    pub hands:      usize,
    pub status:     String,
    /// Large centred message (e.g. "press enter to start").
    pub banner:     Option<String>,
    pub preview:    Option<Hand>,
}

pub fn hud_line(snap: &RenderSnapshot, hud: &Hud) -> String {
    let cam = match (hud.camera_on, hud.live) {
        (false, _)    => "OFF",
        (true, true)  => "ON",
        (true, false) => "WAIT",
    };
    format!(
        "SCORE {}   TIME {}   BOOST {:.1}   LANE {}   HANDS {}   CAM {}   FPS {:.0}",
        snap.score,
        hud.time_label,
        snap.boost,
        snap.lane.name(),
        hud.hands,
        cam,
        hud.fps,
    )
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas — ARGB framebuffer with drawing primitives
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    pub buf: Vec<u32>,
    w:       usize,
    h:       usize,
}

impl Canvas {
    pub fn new(w: usize, h: usize) -> Self {
        Canvas { buf: vec![BG_COLOR; w * h], w, h }
    }

    pub fn width(&self)  -> usize { self.w }
    pub fn height(&self) -> usize { self.h }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.w && y < self.h).then(|| self.buf[y * self.w + x])
    }

    pub fn clear(&mut self, color: u32) { self.buf.fill(color); }

    fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.buf[y as usize * self.w + x as usize] = color;
        }
    }

    /// Filled rectangle, clipped to the canvas.  Accepts partly off-screen
    /// origins so vehicles can slide out on the left.
    fn fill_rect(&mut self, x: isize, y: isize, w: isize, h: isize, color: u32) {
        let x0 = x.max(0) as usize;
        let y0 = y.max(0) as usize;
        let x1 = (x + w).clamp(0, self.w as isize) as usize;
        let y1 = (y + h).clamp(0, self.h as isize) as usize;
        for row in y0..y1 {
            self.buf[row * self.w + x0.min(x1)..row * self.w + x1].fill(color);
        }
    }

    fn draw_border(&mut self, x: isize, y: isize, w: isize, h: isize, color: u32) {
        if w <= 0 || h <= 0 { return; }
        self.fill_rect(x, y, w, 1, color);
        self.fill_rect(x, y + h - 1, w, 1, color);
        self.fill_rect(x, y, 1, h, color);
        self.fill_rect(x + w - 1, y, 1, h, color);
    }

    fn fill_circle(&mut self, cx: isize, cy: isize, r: isize, color: u32) {
        for dy in -r..=r {
            let half = ((r * r - dy * dy) as f32).sqrt() as isize;
            self.fill_rect(cx - half, cy + dy, 2 * half + 1, 1, color);
        }
    }

    /// Bresenham line.
    fn draw_line(&mut self, x0: isize, y0: isize, x1: isize, y1: isize, color: u32) {
        let (mut x, mut y) = (x0, y0);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.set_pixel(x, y, color);
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    /// Darken (or tint) a region toward `color` by `t`.
    fn shade_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32, t: f32) {
        for row in y..(y + h).min(self.h) {
            for col in x..(x + w).min(self.w) {
                let i = row * self.w + col;
                self.buf[i] = blend(self.buf[i], color, t);
            }
        }
    }

    /// 3×5 bitmap text, each glyph pixel drawn as a `scale`×`scale` block.
    fn draw_text(&mut self, text: &str, x: isize, y: isize, scale: usize, color: u32) {
        let s = scale.max(1) as isize;
        let mut cx = x;
        for ch in text.chars() {
            for (row, &bits) in char_glyph(ch).iter().enumerate() {
                for col in 0..3isize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * s, y + row as isize * s, s, s, color);
                    }
                }
            }
            cx += GLYPH_W as isize * s;
            if cx >= self.w as isize { break; }
        }
    }

    fn draw_text_centered(&mut self, text: &str, cy: isize, scale: usize, color: u32) {
        let x = (self.w as isize - text_width(text, scale) as isize) / 2;
        self.draw_text(text, x, cy, scale, color);
    }
}

pub fn text_width(text: &str, scale: usize) -> usize {
    (text.chars().count() * GLYPH_W * scale.max(1)).saturating_sub(scale.max(1))
}

// ════════════════════════════════════════════════════════════════════════════
// Frame drawing
// ════════════════════════════════════════════════════════════════════════════

/// Draw a complete frame.
pub fn draw_frame(c: &mut Canvas, snap: &RenderSnapshot, hud: &Hud) {
    c.clear(BG_COLOR);
    let sy = WORLD_H as f32 / snap.height.max(1.0);
    let sx = c.width() as f32 / snap.width.max(1.0);

    draw_lanes(c, snap, sx, sy);
    for o in &snap.obstacles {
        draw_obstacle(c, o, snap.lane_height, sx, sy);
    }
    for coin in &snap.collectibles {
        draw_collectible(c, coin, sx, sy);
    }
    draw_player(c, snap, sx, sy);
    draw_hand_tile(c, hud.preview.as_ref());
    draw_hud(c, snap, hud);

    let w = c.width();
    if snap.is_over {
        c.shade_rect(0, 0, w, WORLD_H, BLACK, 0.6);
        let mid = WORLD_H as isize / 2;
        c.draw_text_centered("GAME OVER", mid - 70, 8, HIT_COLOR);
        c.draw_text_centered(&format!("SCORE {}", snap.score), mid, 5, GOLD);
        c.draw_text_centered("PRESS R TO PLAY AGAIN", mid + 50, 2, TEXT_COLOR);
    } else if let Some(banner) = &hud.banner {
        c.shade_rect(0, 0, w, WORLD_H, BLACK, 0.4);
        c.draw_text_centered(banner, WORLD_H as isize / 2 - 10, 3, TEXT_COLOR);
    }
}

/// Left edges of the divider dashes visible across `width`.
pub fn dash_starts(offset: f32, width: f32) -> Vec<f32> {
    let period = DASH_LEN * 2.0;
    let mut x = -offset.rem_euclid(period);
    let mut out = Vec::new();
    while x < width {
        out.push(x);
        x += period;
    }
    out
}

fn draw_lanes(c: &mut Canvas, snap: &RenderSnapshot, sx: f32, sy: f32) {
    let lh = (snap.lane_height * sy) as isize;
    let w = c.width() as isize;
    for (i, &color) in LANE_COLORS.iter().enumerate() {
        c.fill_rect(0, i as isize * lh, w, lh, color);
    }
    for divider in 1..3 {
        let y = divider * lh;
        for x in dash_starts(snap.dash_offset, snap.width) {
            c.fill_rect((x * sx) as isize, y - 1, (DASH_LEN * sx) as isize, 3, DASH_COLOR);
        }
    }
}

fn draw_obstacle(c: &mut Canvas, o: &Obstacle, lane_height: f32, sx: f32, sy: f32) {
    let r = o.rect(lane_height);
    let (x, y) = ((r.left * sx) as isize, (r.top * sy) as isize);
    let (w, h) = ((r.width() * sx) as isize, (r.height() * sy) as isize);
    if x + w < 0 || x >= c.width() as isize { return; }

    let dark  = blend(o.color, BLACK, 0.45);
    let glass = blend(o.color, WHITE, 0.55);
    let wheel = h / 5;

    match o.kind {
        ObstacleKind::Car => {
            c.fill_rect(x, y + h / 4, w, h / 2, o.color);
            c.fill_rect(x + w / 5, y + h / 10, w * 3 / 5, h / 4, o.color);
            c.fill_rect(x + w / 4, y + h / 7, w / 5, h / 6, glass);
            c.fill_rect(x + w * 11 / 20, y + h / 7, w / 5, h / 6, glass);
        }
        ObstacleKind::Truck => {
            // Cab faces the player (left).
            let cab = w / 4;
            c.fill_rect(x, y + h / 4, cab, h * 3 / 5 - h / 10, dark);
            c.fill_rect(x + cab / 6, y + h / 3, cab / 2, h / 6, glass);
            c.fill_rect(x + cab + 2, y + h / 10, w - cab - 2, h * 7 / 10, o.color);
        }
        ObstacleKind::Train => {
            c.fill_rect(x, y + h / 10, w, h * 7 / 10, o.color);
            let car = ((h as f32 * 1.3) as isize).max(1);
            let mut cx = x + car;
            while cx < x + w {
                c.fill_rect(cx, y + h / 10, 2, h * 7 / 10, dark);
                cx += car;
            }
            let mut wx = x + h / 6;
            while wx + h / 5 < x + w {
                c.fill_rect(wx, y + h / 4, h / 5, h / 6, glass);
                wx += (h / 3).max(1);
            }
        }
    }
    // Wheels along the bottom edge.
    let mut wx = x + w / 8;
    while wx + wheel < x + w {
        c.fill_rect(wx, y + h * 4 / 5 - wheel / 2, wheel, wheel, BLACK);
        wx += (w / 3).max(wheel * 2).max(1);
    }
    c.draw_border(x, y + h / 10, w, h * 7 / 10, dark);
}

fn draw_collectible(c: &mut Canvas, coin: &Collectible, sx: f32, sy: f32) {
    let r = coin.rect();
    let (x, y) = ((r.left * sx) as isize, (r.top * sy) as isize);
    let (w, h) = ((r.width() * sx) as isize, (r.height() * sy) as isize);
    c.fill_rect(x, y, w, h, coin.color);
    c.draw_border(x, y, w, h, blend(coin.color, BLACK, 0.4));
    if coin.kind == CollectibleKind::Bad {
        c.draw_line(x + 3, y + 3, x + w - 4, y + h - 4, BLACK);
        c.draw_line(x + w - 4, y + 3, x + 3, y + h - 4, BLACK);
    } else {
        c.fill_rect(x + w / 3, y + h / 3, w / 3, h / 3, blend(coin.color, WHITE, 0.5));
    }
}

fn draw_player(c: &mut Canvas, snap: &RenderSnapshot, sx: f32, sy: f32) {
    let cx = (snap.player_x * sx) as isize;
    let cy = (snap.player_y * sy) as isize;
    let r  = (snap.player_radius * sy) as isize;
    let body = if snap.hit { HIT_COLOR } else { PLAYER_COLOR };

    // Legs swap on the walk phase.
    let (front, back) = if snap.walk_phase { (r / 2, -r / 3) } else { (-r / 3, r / 2) };
    c.fill_rect(cx + front - 2, cy + r - 4, 5, r / 2 + 4, blend(body, BLACK, 0.4));
    c.fill_rect(cx + back - 2, cy + r - 4, 5, r / 2 + 4, blend(body, BLACK, 0.4));

    c.fill_circle(cx, cy, r, body);
    c.fill_circle(cx + r / 3, cy - r / 4, (r / 6).max(2), WHITE);
    c.fill_circle(cx + r / 3, cy - r / 4, (r / 12).max(1), BLACK);

    // Smile, or a frown when touching traffic.
    let mouth_y = cy + r / 3;
    if snap.hit {
        c.draw_line(cx - r / 4, mouth_y + 3, cx + r / 2, mouth_y - 1, BLACK);
    } else {
        c.draw_line(cx - r / 4, mouth_y - 1, cx + r / 2, mouth_y + 3, BLACK);
    }
}

/// Hand skeleton, mirrored like a selfie preview.
fn draw_hand_tile(c: &mut Canvas, hand: Option<&Hand>) {
    let tx = c.width() - TILE_W - TILE_MARGIN;
    let ty = TILE_MARGIN;
    c.fill_rect(tx as isize, ty as isize, TILE_W as isize, TILE_H as isize, BG_COLOR);
    c.draw_border(tx as isize, ty as isize, TILE_W as isize, TILE_H as isize, DIM_TEXT);

    let Some(hand) = hand else {
        c.draw_text("NO HAND", tx as isize + 52, ty as isize + 56, 1, DIM_TEXT);
        return;
    };
    let to_tile = |i: usize| -> (isize, isize) {
        let p = hand.points()[i];
        let x = tx as f32 + (1.0 - p.x).clamp(0.0, 1.0) * TILE_W as f32;
        let y = ty as f32 + p.y.clamp(0.0, 1.0) * TILE_H as f32;
        (x as isize, y as isize)
    };
    for &(a, b) in HAND_CONNECTIONS.iter() {
        let (x0, y0) = to_tile(a);
        let (x1, y1) = to_tile(b);
        c.draw_line(x0, y0, x1, y1, PLAYER_COLOR);
    }
    for i in 0..hand.points().len() {
        let (x, y) = to_tile(i);
        c.fill_rect(x - 1, y - 1, 3, 3, HIT_COLOR);
    }
}

fn draw_hud(c: &mut Canvas, snap: &RenderSnapshot, hud: &Hud) {
    let y = WORLD_H as isize;
    let w = c.width() as isize;
    c.fill_rect(0, y, w, HUD_H as isize, HUD_BG);
    c.draw_text(&hud_line(snap, hud), 10, y + 8, 2, TEXT_COLOR);
    c.draw_text(&hud.status, 10, y + 30, 1, GOLD);
    c.draw_text(
        "UP/DOWN=tilt  B=brush  H=hand  N/F=near/far  ENTER=start  ESC=stop  R=restart  Q=quit",
        10, y + 44, 1, DIM_TEXT,
    );
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer — the window
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    canvas: Canvas,
}

impl Visualizer {
    pub fn new() -> Result<Self> {
        let mut window = Window::new(
            "Lane Runner",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| anyhow!("Failed to open window: {}", e))?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer { window, canvas: Canvas::new(WIN_W, WIN_H) })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Translate this frame's key activity into input events.
    pub fn poll_input(&mut self) -> Vec<InputEvent> {
        let mut out = Vec::new();
        let pressed  = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        let released = |k: Key| self.window.is_key_released(k);

        for (key, control) in [
            (Key::Q,      Control::Quit),
            (Key::Enter,  Control::StartCamera),
            (Key::Escape, Control::StopCamera),
            (Key::R,      Control::Restart),
        ] {
            if pressed(key) { out.push(InputEvent::Control(control)); }
        }

        // Held keys report both edges.
        for (key, sim) in [(Key::Up, SimKey::TiltUp), (Key::Down, SimKey::TiltDown), (Key::B, SimKey::Brush)] {
            if pressed(key)  { out.push(InputEvent::Sim(SimInput::KeyDown(sim))); }
            if released(key) { out.push(InputEvent::Sim(SimInput::KeyUp(sim))); }
        }
        for (key, sim) in [(Key::H, SimKey::ToggleHand), (Key::N, SimKey::Nearer), (Key::F, SimKey::Farther)] {
            if pressed(key) { out.push(InputEvent::Sim(SimInput::KeyDown(sim))); }
        }
        out
    }

    pub fn render(&mut self, snap: &RenderSnapshot, hud: &Hud) {
        draw_frame(&mut self.canvas, snap, hud);
        self.window.update_with_buffer(&self.canvas.buf, WIN_W, WIN_H).ok();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_signal::{GestureSignal, Lane};
    use lane_sim::{Engine, SimConfig};

    fn snapshot() -> RenderSnapshot {
        let mut e = Engine::new(SimConfig { seed: Some(4), ..SimConfig::default() });
        for _ in 0..400 {
            e.step(&GestureSignal { lane: Lane::Up, ..GestureSignal::default() }, std::time::Duration::from_millis(16));
        }
        e.snapshot()
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFF102030, 0xFFFFFFFF, 0.0), 0xFF102030);
        assert_eq!(blend(0xFF102030, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
    }

    #[test]
    fn dashes_scroll_and_cover_width() {
        let a = dash_starts(0.0, 100.0);
        assert_eq!(a, vec![0.0, 36.0, 72.0]);
        let b = dash_starts(10.0, 100.0);
        assert_eq!(b[0], -10.0);
        assert!(*b.last().unwrap() < 100.0);
    }

    #[test]
    fn text_width_scales() {
        assert_eq!(text_width("AB", 1), 7);
        assert_eq!(text_width("AB", 2), 14);
        assert_eq!(text_width("", 3), 0);
    }

    #[test]
    fn hud_line_reports_state() {
        let snap = snapshot();
        let hud = Hud { time_label: "01:54".into(), camera_on: true, live: false, hands: 1, fps: 59.6, ..Hud::default() };
        let line = hud_line(&snap, &hud);
        assert!(line.contains("TIME 01:54"));
        assert!(line.contains("LANE up"));
        assert!(line.contains("CAM WAIT"));
        assert!(line.contains("FPS 60"));
    }

    #[test]
    fn canvas_clips_offscreen_shapes() {
        let mut c = Canvas::new(20, 10);
        c.fill_rect(-5, -5, 10, 10, WHITE);
        assert_eq!(c.pixel(0, 0), Some(WHITE));
        assert_eq!(c.pixel(5, 5), Some(BG_COLOR));
        c.fill_rect(100, 100, 10, 10, WHITE);
        c.draw_line(-10, 3, 30, 3, GOLD);
        assert_eq!(c.pixel(19, 3), Some(GOLD));
        assert_eq!(c.pixel(20, 3), None);
    }

    #[test]
    fn frame_draws_player_and_hud() {
        let snap = snapshot();
        let mut c = Canvas::new(WIN_W, WIN_H);
        draw_frame(&mut c, &snap, &Hud::default());
        let px = snap.player_x as usize;
        let py = snap.player_y as usize;
        let body = if snap.hit { HIT_COLOR } else { PLAYER_COLOR };
        assert_eq!(c.pixel(px - 5, py), Some(body));
        assert_eq!(c.pixel(2, WORLD_H + 2), Some(HUD_BG));
    }

    #[test]
    fn game_over_darkens_world() {
        let mut snap = snapshot();
        let mut c = Canvas::new(WIN_W, WIN_H);
        draw_frame(&mut c, &snap, &Hud::default());
        let before = c.pixel(2, 2).unwrap();
        snap.is_over = true;
        draw_frame(&mut c, &snap, &Hud::default());
        assert_ne!(c.pixel(2, 2).unwrap(), before);
    }

    #[test]
    fn sliver_obstacles_still_draw() {
        let mut c = Canvas::new(WIN_W, WIN_H);
        for kind in ObstacleKind::ALL {
            for (width, height) in [(400.0, 0.5), (400.0, 2.0), (2.0, 0.5), (1.0, 1.0)] {
                let o = Obstacle { lane: Lane::Front, x: 300.0, width, height, kind, color: 0xFF_34_98_DB };
                draw_obstacle(&mut c, &o, 180.0, 1.0, 1.0);
            }
        }
        assert_eq!(c.pixel(2, 2), Some(BG_COLOR));
    }

    #[test]
    fn hand_tile_draws_skeleton() {
        let snap = snapshot();
        let hud = Hud { preview: Some(Hand::with_pitch(0.5, 0.5, -0.1, 60.0)), ..Hud::default() };
        let mut c = Canvas::new(WIN_W, WIN_H);
        draw_frame(&mut c, &snap, &hud);
        let tx = WIN_W - TILE_W - TILE_MARGIN;
        let lit = (tx..tx + TILE_W)
            .flat_map(|x| (TILE_MARGIN..TILE_MARGIN + TILE_H).map(move |y| (x, y)))
            .filter(|&(x, y)| c.pixel(x, y) == Some(HIT_COLOR))
            .count();
        assert!(lit > 0);
    }
}
