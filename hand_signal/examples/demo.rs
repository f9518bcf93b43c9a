//! Walks a synthetic hand through a pitch sweep and a brushing burst and
//! prints what the bus would publish each frame.

use hand_signal::{GesturePipeline, Hand, HandFrame, PipelineConfig, SignalBus, TickOutcome};

fn main() {
    let bus = SignalBus::new();
    let mut pipeline = GesturePipeline::new(PipelineConfig::default(), 640.0, bus.clone());
    pipeline.start();

    println!("\n=== Pitch sweep (hysteresis) ===\n");
    let sweep = [0.0, 35.0, 41.0, 35.0, 25.0, 0.0, -65.0, -71.0, -55.0, -48.0, 0.0];
    for (i, &pitch) in sweep.iter().enumerate() {
        let frame = HandFrame::new(i as u64 + 1, vec![Hand::with_pitch(0.5, 0.5, -0.1, pitch)]);
        if let TickOutcome::Tracked { lane, orientation, .. } = pipeline.process(Some(&frame)) {
            println!("   pitch {:>6.1}°  →  measured {:>6.2}°  lane {}", pitch, orientation.pitch, lane);
        }
    }

    println!("\n=== Brushing, then hand leaves ===\n");
    let mut ts = 100;
    for i in 0..40 {
        ts += 1;
        let x = if i % 2 == 0 { 0.35 } else { 0.55 };
        pipeline.process(Some(&HandFrame::new(ts, vec![Hand::with_pitch(x, 0.5, -0.1, 0.0)])));
    }
    println!("   after 40 brushing frames: activity {:.2}", bus.snapshot().activity);
    for step in 1..=30 {
        ts += 1;
        pipeline.process(Some(&HandFrame::empty(ts)));
        if step % 5 == 0 {
            println!("   {:>2} frames without hand: activity {:.2}", step, bus.snapshot().activity);
        }
    }
    println!();
}
