//! Sound cues over MIDI, played on their own thread.
//!
//! The frame loop only ever sends a [`PlayerCommand`]; note timing (and the
//! sleeps it needs) stays off the render thread.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use lane_sim::{CollectibleKind, SimEvent};

use crate::config::SoundConfig;

// ════════════════════════════════════════════════════════════════════════════
// SoundCue — what the game wants heard
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundCue {
    Start,
    Pickup,
    Penalty,
    Crash,
    GameOver,
}

impl SoundCue {
    pub fn for_event(event: &SimEvent) -> SoundCue {
        match event {
            SimEvent::Pickup { kind: CollectibleKind::Good, .. } => SoundCue::Pickup,
            SimEvent::Pickup { kind: CollectibleKind::Bad, .. }  => SoundCue::Penalty,
            SimEvent::Crash                                      => SoundCue::Crash,
            SimEvent::Expired                                    => SoundCue::GameOver,
        }
    }

    /// `(note, millis)` steps; a note of 0 is a rest.
    pub fn phrase(self) -> &'static [(u8, u64)] {
        match self {
            SoundCue::Start    => &[(60, 90), (64, 90), (67, 140)],
            SoundCue::Pickup   => &[(84, 60), (91, 90)],
            SoundCue::Penalty  => &[(52, 180)],
            SoundCue::Crash    => &[(36, 120), (35, 160)],
            SoundCue::GameOver => &[(72, 160), (67, 160), (64, 160), (0, 60), (60, 420)],
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PlayerCommand — sent to the playback thread
// ════════════════════════════════════════════════════════════════════════════

pub enum PlayerCommand {
    Cue(SoundCue),
    /// Terminate the thread.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut — abstraction over midir / null (for testing)
// ════════════════════════════════════════════════════════════════════════════

trait MidiOut: Send {
    fn program_change(&mut self, channel: u8, program: u8);
    fn note_on(&mut self,  channel: u8, note: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, note: u8);
}

// ── midir backend ─────────────────────────────────────────────────────────

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn program_change(&mut self, channel: u8, program: u8) {
        let _ = self.conn.send(&[0xC0 | (channel & 0x0F), program & 0x7F]);
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        let _ = self.conn.send(&[0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]);
    }
    fn note_off(&mut self, channel: u8, note: u8) {
        let _ = self.conn.send(&[0x80 | (channel & 0x0F), note & 0x7F, 0]);
    }
}

// ── null backend (no port, or sound disabled) ─────────────────────────────

struct NullOut;
impl MidiOut for NullOut {
    fn program_change(&mut self, _ch: u8, _p: u8)   {}
    fn note_on(&mut self, _ch: u8, _n: u8, _v: u8)  {}
    fn note_off(&mut self, _ch: u8, _n: u8)          {}
}

/// Open the first output port, preferring a softsynth.  Falls back to
/// `NullOut` when there is none.
fn open_midi_output() -> Box<dyn MidiOut> {
    let midi_out = match midir::MidiOutput::new("lane_runner_cues") {
        Ok(m)  => m,
        Err(e) => {
            tracing::warn!(error = %e, "MIDI init failed, sound off");
            return Box::new(NullOut);
        }
    };

    let ports = midi_out.ports();
    if ports.is_empty() {
        tracing::warn!("no MIDI output ports, sound off (try `timidity -iA` or `fluidsynth`)");
        return Box::new(NullOut);
    }

    let port_idx = ports.iter()
        .position(|p| {
            midi_out.port_name(p).map(|n| {
                let n = n.to_lowercase();
                n.contains("fluid") || n.contains("timidity") ||
                n.contains("microsoft") || n.contains("gm") ||
                n.contains("synth")
            }).unwrap_or(false)
        })
        .unwrap_or(0);

    let port = &ports[port_idx];
    let name = midi_out.port_name(port).unwrap_or_else(|_| "Unknown".to_string());
    tracing::info!(port = %name, "opening MIDI port");

    match midi_out.connect(port, "lane-runner-cues") {
        Ok(conn) => Box::new(MidirOut { conn }),
        Err(e) => {
            tracing::warn!(error = %e, "MIDI connect failed, sound off");
            Box::new(NullOut)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Player — the cue thread
// ════════════════════════════════════════════════════════════════════════════

/// Handle to the cue thread.  Dropping it stops the thread.
pub struct Player {
    cmd_tx: Sender<PlayerCommand>,
}

impl Player {
    /// Spawn the cue thread on a real MIDI port, or silently when sound is
    /// disabled.
    pub fn spawn(cfg: &SoundConfig) -> Self {
        let enabled = cfg.enabled;
        Self::spawn_with(cfg, move || {
            if enabled { open_midi_output() } else { Box::new(NullOut) as Box<dyn MidiOut> }
        })
    }

    /// A player that plays nothing.
    pub fn silent() -> Self {
        Self::spawn_with(&SoundConfig { enabled: false, ..SoundConfig::default() }, || Box::new(NullOut) as Box<dyn MidiOut>)
    }

    fn spawn_with<F>(cfg: &SoundConfig, open: F) -> Self
    where
        F: FnOnce() -> Box<dyn MidiOut> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PlayerCommand>();
        let (instrument, channel, velocity) = (cfg.instrument, cfg.channel, cfg.velocity);
        let spawned = thread::Builder::new()
            .name("sound".into())
            .spawn(move || player_thread(open(), instrument, channel, velocity, cmd_rx));
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "sound thread failed to start");
        }
        Player { cmd_tx }
    }

    pub fn cue(&self, cue: SoundCue) {
        let _ = self.cmd_tx.send(PlayerCommand::Cue(cue));
    }

    pub fn quit(&self) {
        let _ = self.cmd_tx.send(PlayerCommand::Quit);
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.quit();
    }
}

fn player_thread(
    mut midi:       Box<dyn MidiOut>,
    instrument:     u8,
    channel:        u8,
    velocity:       u8,
    cmd_rx:         Receiver<PlayerCommand>,
) {
    midi.program_change(channel, instrument);

    loop {
        let cmd = match cmd_rx.recv_timeout(Duration::from_millis(250)) {
            Ok(c) => c,
            Err(RecvTimeoutError::Timeout)      => continue,
            Err(RecvTimeoutError::Disconnected) => return,
        };
        match cmd {
            PlayerCommand::Cue(cue) => {
                for &(note, ms) in cue.phrase() {
                    if note == 0 {
                        thread::sleep(Duration::from_millis(ms));
                        continue;
                    }
                    midi.note_on(channel, note, velocity);
                    thread::sleep(Duration::from_millis(ms));
                    midi.note_off(channel, note);
                }
            }
            PlayerCommand::Quit => return,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
