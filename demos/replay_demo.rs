//! Demonstration of the gesture pipeline on a synthetic capture.
//!
//! This example shows how to:
//! 1. Record a short gesture session as a JSON Lines capture
//! 2. Replay it through a frame source
//! 3. Run each frame through the pipeline and print what it sees
//! 4. Watch the pipeline suspend on inactivity and wake on motion
//!
//! Run with: cargo run --example replay_demo

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use gesture_pilot::{
    activity::ActivityLog,
    core::{EmitPolicy, Emitter, GesturePipeline, PipelineConfig},
    source::{synthetic, FrameInput, FrameSample, FrameSource, RasterFrame, ReplayConfig, ReplaySource},
    GESTURE_REFERENCE,
};

const FRAME_MS: u64 = 100;

/// Two seconds per gesture, a long pause, then a wave to wake up.
fn script() -> Vec<FrameInput> {
    let mut frames = Vec::new();
    let mut hold = |input: FrameInput, count: usize| {
        frames.extend(std::iter::repeat(input).take(count));
    };

    hold(FrameInput::with_hand(synthetic::open_palm()), 20);
    hold(FrameInput::with_hand(synthetic::point_index(0.15)), 20);
    hold(FrameInput::with_hand(synthetic::ok_sign()), 20);
    hold(FrameInput::with_frame(RasterFrame::filled(160, 120, 30)), 40);
    hold(FrameInput::with_frame(RasterFrame::filled(160, 120, 180)), 1);
    hold(FrameInput::with_hand(synthetic::two_fingers()), 10);
    frames
}

fn main() {
    println!("gesture-pilot - Replay Demo");
    println!("===========================");
    println!();
    println!("{GESTURE_REFERENCE}");
    println!();

    let path = std::env::temp_dir().join("gesture-pilot-demo.jsonl");
    let lines: Vec<String> = script()
        .iter()
        .enumerate()
        .filter_map(|(i, input)| {
            serde_json::to_string(&FrameSample::from_input(i as u64 * FRAME_MS, input)).ok()
        })
        .collect();
    if let Err(e) = std::fs::write(&path, lines.join("\n")) {
        eprintln!("Error writing capture: {e}");
        return;
    }
    println!("Wrote {} frames to {}", lines.len(), path.display());
    println!();

    let config = PipelineConfig {
        emit_policy: EmitPolicy::OnChange,
        ..PipelineConfig::default()
    };
    let activity_log = Arc::new(ActivityLog::new());
    let (emitter, events) = Emitter::channel();
    let mut pipeline = GesturePipeline::new(config, emitter).with_activity_log(activity_log.clone());

    // 100 fps keeps the demo short; timestamps still come from the capture.
    let mut source = ReplaySource::new(ReplayConfig::new(&path, 100));
    let t0 = Instant::now();
    if let Err(e) = pipeline.start_with(&mut source, t0) {
        eprintln!("Error starting pipeline: {e}");
        return;
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let receiver = source.receiver().clone();
    while running.load(Ordering::SeqCst) {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(sample) => {
                let at = sample.timestamp_ms;
                let Ok(input) = sample.into_input() else {
                    continue;
                };
                if let Some(report) = pipeline.process_frame(&input, t0 + Duration::from_millis(at)) {
                    if report.transition.is_some() {
                        println!("  [{at:>5}ms] {}", pipeline.status());
                    }
                    if at % 1000 == 0 {
                        println!("  [{at:>5}ms] {report}");
                    }
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }

        for event in events.try_iter() {
            println!("  → {} ({})", event.command, event.source);
        }
    }

    println!();
    println!("Stopping replay...");
    source.stop();
    pipeline.stop();
    let _ = std::fs::remove_file(&path);

    println!();
    println!("{}", activity_log.summary());
}
