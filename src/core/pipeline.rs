//! The gesture recognition pipeline.
//!
//! Owns the classifier, stabilizer, motion detector, suspension controller and
//! emitter, and advances all of them by exactly one frame per
//! [`GesturePipeline::process_frame`] call. The caller decides when frames
//! arrive; nothing in here blocks or schedules.
//!
//! ```text
//!  Active:    hand pose ──▶ Classifier ──▶ Stabilizer ──▶ Emitter
//!                                              │
//!                                   activity timestamp ──▶ suspend after 3.5 s idle
//!
//!  Suspended: raster ──▶ MotionDetector ──▶ wake on score > 18
//! ```

use crate::activity::SharedActivityLog;
use crate::core::classifier::{Classification, Classifier};
use crate::core::command::Signal;
use crate::core::emitter::{EmitPolicy, Emitter};
use crate::core::motion::{MotionDetector, DEFAULT_SAMPLE_SIZE};
use crate::core::stabilizer::{Stabilizer, DEFAULT_STABLE_FRAMES};
use crate::core::suspension::{
    Mode, SuspensionController, Transition, DEFAULT_MOTION_WAKE_THRESHOLD, DEFAULT_SUSPEND_AFTER,
};
use crate::source::types::FrameInput;
use crate::source::{FrameSource, SourceError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Tunable pipeline behavior.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub suspend_after: Duration,
    pub motion_wake_threshold: f64,
    pub motion_sample_size: u32,
    pub stable_frames: u32,
    /// Whether the operator sees a mirrored preview
    pub mirrored_view: bool,
    pub emit_policy: EmitPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            suspend_after: DEFAULT_SUSPEND_AFTER,
            motion_wake_threshold: DEFAULT_MOTION_WAKE_THRESHOLD,
            motion_sample_size: DEFAULT_SAMPLE_SIZE,
            stable_frames: DEFAULT_STABLE_FRAMES,
            mirrored_view: true,
            emit_policy: EmitPolicy::EveryFrame,
        }
    }
}

/// Operator-facing status line.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Ready,
    Recognizing,
    NotCoherent,
    NoHand,
    SuspendedIdle,
    SuspendedManual,
    Awake,
    Stopped,
    Error(String),
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Ready => write!(f, "Ready to start."),
            Status::Recognizing => write!(f, "Recognizing gestures..."),
            Status::NotCoherent => write!(f, "Gesture detected but not coherent."),
            Status::NoHand => write!(f, "No hand detected."),
            Status::SuspendedIdle => write!(f, "Suspended due to inactivity (no valid command)."),
            Status::SuspendedManual => write!(f, "Suspended manually."),
            Status::Awake => write!(f, "Awake: resuming recognition..."),
            Status::Stopped => write!(f, "Stopped."),
            Status::Error(e) => write!(f, "Error: {e}"),
        }
    }
}

/// What happened during one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Mode after the step
    pub mode: Mode,
    /// Raw signal, `None` while suspended
    pub raw: Option<Signal>,
    pub stable: Signal,
    pub classification: Option<Classification>,
    /// Motion score, only computed while suspended with a raster available
    pub motion_score: Option<f64>,
    pub motion_threshold: f64,
    /// Whether an event was published this frame
    pub emitted: bool,
    pub transition: Option<Transition>,
}

impl std::fmt::Display for StepReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(score) = self.motion_score {
            return write!(f, "Motion: {score:.1} (threshold {})", self.motion_threshold);
        }
        match (&self.classification, self.raw) {
            (Some(c), Some(raw)) => write!(
                f,
                "Fingers={} | {} | Raw={} | Stable={}",
                c.flags.extended_count(),
                c.flags,
                raw,
                self.stable
            ),
            _ if self.mode == Mode::Suspended => write!(f, "Suspended, no frame to compare."),
            _ => write!(f, "No hand detected."),
        }
    }
}

pub struct GesturePipeline {
    config: PipelineConfig,
    classifier: Classifier,
    stabilizer: Stabilizer,
    motion: MotionDetector,
    suspension: SuspensionController,
    emitter: Emitter,
    activity: Option<SharedActivityLog>,
    running: bool,
    status: Status,
}

impl GesturePipeline {
    pub fn new(config: PipelineConfig, emitter: Emitter) -> Self {
        Self {
            classifier: Classifier::new(config.mirrored_view),
            stabilizer: Stabilizer::new(config.stable_frames),
            motion: MotionDetector::new(config.motion_sample_size),
            suspension: SuspensionController::new(
                config.suspend_after,
                config.motion_wake_threshold,
            ),
            emitter,
            activity: None,
            running: false,
            status: Status::Ready,
            config,
        }
    }

    /// Count frames, hands, commands and transitions in `log`.
    pub fn with_activity_log(mut self, log: SharedActivityLog) -> Self {
        self.activity = Some(log);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> Mode {
        self.suspension.mode()
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn stable(&self) -> Signal {
        self.stabilizer.current()
    }

    pub fn last_activity(&self) -> Option<Instant> {
        self.suspension.last_activity()
    }

    /// Reset all state and begin accepting frames.
    pub fn start(&mut self, now: Instant) {
        self.reset_state();
        self.suspension.arm(now);
        self.running = true;
        self.status = Status::Recognizing;
        info!("gesture pipeline started");
    }

    /// Start `source`, then the pipeline. A source that fails to start leaves
    /// the pipeline stopped with an error status.
    pub fn start_with<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
        now: Instant,
    ) -> Result<(), SourceError> {
        if let Err(e) = source.start() {
            self.fail_start(&e);
            return Err(e);
        }
        self.start(now);
        Ok(())
    }

    /// Record a setup failure.
    pub fn fail_start(&mut self, error: &SourceError) {
        warn!("gesture pipeline failed to start: {error}");
        self.running = false;
        self.reset_state();
        self.status = Status::Error(error.to_string());
    }

    /// Stop accepting frames and clear all state.
    pub fn stop(&mut self) {
        self.running = false;
        self.reset_state();
        self.status = Status::Stopped;
        info!("gesture pipeline stopped");
    }

    /// Flip between active and suspended. Does nothing unless running.
    pub fn toggle_suspend(&mut self, now: Instant) -> Option<Transition> {
        if !self.running {
            return None;
        }
        let transition = self.suspension.toggle(now);
        match transition {
            Transition::WokeManual => {
                self.on_wake();
                self.status = Status::Recognizing;
            }
            _ => {
                self.on_suspend();
                self.status = Status::SuspendedManual;
            }
        }
        info!(mode = %self.mode(), "manual mode toggle");
        Some(transition)
    }

    /// Toggle only if the current mode differs from `mode`.
    pub fn set_mode(&mut self, mode: Mode, now: Instant) -> Option<Transition> {
        if self.mode() == mode {
            return None;
        }
        self.toggle_suspend(now)
    }

    /// Advance the pipeline by one frame. Returns `None` when stopped.
    pub fn process_frame(&mut self, input: &FrameInput, now: Instant) -> Option<StepReport> {
        if !self.running {
            return None;
        }
        if let Some(log) = &self.activity {
            log.record_frame();
        }

        let report = match self.suspension.mode() {
            Mode::Active => self.step_active(input, now),
            Mode::Suspended => self.step_suspended(input, now),
        };
        Some(report)
    }

    fn step_active(&mut self, input: &FrameInput, now: Instant) -> StepReport {
        let classification = input
            .primary_hand()
            .map(|pose| self.classifier.explain(pose));
        let raw = classification.map_or(Signal::NoSignal, |c| Signal::Command(c.command));

        let previous = self.stabilizer.current();
        let stable = self.stabilizer.stabilize(raw);
        if stable != previous {
            info!(from = %previous, to = %stable, "stable command changed");
        }

        let should_emit = match self.config.emit_policy {
            EmitPolicy::EveryFrame => true,
            EmitPolicy::OnChange => stable != previous,
        };
        let emitted = should_emit && self.emitter.emit(stable);

        if let Some(log) = &self.activity {
            if classification.is_some() {
                log.record_hand();
            }
            if emitted {
                log.record_command();
            }
        }

        self.status = if stable.is_meaningful() {
            self.suspension.record_activity(now);
            Status::Recognizing
        } else if classification.is_some() {
            Status::NotCoherent
        } else {
            Status::NoHand
        };

        let transition = self.suspension.check_inactivity(now);
        if transition.is_some() {
            self.on_suspend();
            self.status = Status::SuspendedIdle;
            info!(
                idle_ms = self.config.suspend_after.as_millis() as u64,
                "suspended after inactivity"
            );
        }

        StepReport {
            mode: self.suspension.mode(),
            raw: Some(raw),
            stable,
            classification,
            motion_score: None,
            motion_threshold: self.config.motion_wake_threshold,
            emitted,
            transition,
        }
    }

    fn step_suspended(&mut self, input: &FrameInput, now: Instant) -> StepReport {
        let motion_score = input.frame.as_ref().map(|frame| self.motion.score(frame));
        let transition =
            motion_score.and_then(|score| self.suspension.observe_motion(score, now));

        if let Some(score) = motion_score {
            debug!(score, "motion score");
        }
        if transition.is_some() {
            self.on_wake();
            self.status = Status::Awake;
            info!(score = motion_score.unwrap_or_default(), "woke on motion");
        }

        StepReport {
            mode: self.suspension.mode(),
            raw: None,
            stable: self.stabilizer.current(),
            classification: None,
            motion_score,
            motion_threshold: self.config.motion_wake_threshold,
            emitted: false,
            transition,
        }
    }

    fn on_suspend(&mut self) {
        self.motion.reset();
        if let Some(log) = &self.activity {
            log.record_suspension();
        }
    }

    fn on_wake(&mut self) {
        self.stabilizer.reset();
        self.motion.reset();
        if let Some(log) = &self.activity {
            log.record_wake();
        }
    }

    fn reset_state(&mut self) {
        self.stabilizer.reset();
        self.motion.reset();
        self.suspension.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::create_shared_log;
    use crate::core::command::Command;
    use crate::source::synthetic;
    use crate::source::types::RasterFrame;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn started(
        config: PipelineConfig,
    ) -> (
        GesturePipeline,
        crossbeam_channel::Receiver<crate::core::emitter::CommandEvent>,
        Instant,
    ) {
        let (emitter, events) = Emitter::channel();
        let mut pipeline = GesturePipeline::new(config, emitter);
        let t0 = Instant::now();
        pipeline.start(t0);
        (pipeline, events, t0)
    }

    #[test]
    fn test_stopped_pipeline_ignores_frames() {
        let (emitter, events) = Emitter::channel();
        let mut pipeline = GesturePipeline::new(PipelineConfig::default(), emitter);
        assert_eq!(pipeline.status(), &Status::Ready);
        assert!(pipeline
            .process_frame(&FrameInput::with_hand(synthetic::fist()), Instant::now())
            .is_none());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_no_hand_flows_through_stabilizer() {
        let (mut pipeline, events, t0) = started(PipelineConfig::default());
        for i in 0..3 {
            pipeline.process_frame(&FrameInput::with_hand(synthetic::open_palm()), t0 + ms(i * 33));
        }
        assert_eq!(pipeline.stable(), Signal::Command(Command::Advance));

        for i in 3..5 {
            let report = pipeline.process_frame(&FrameInput::empty(), t0 + ms(i * 33)).unwrap();
            assert_eq!(report.raw, Some(Signal::NoSignal));
            assert_eq!(report.stable, Signal::Command(Command::Advance));
        }
        let report = pipeline.process_frame(&FrameInput::empty(), t0 + ms(200)).unwrap();
        assert_eq!(report.stable, Signal::NoSignal);
        assert!(!report.emitted);
        assert_eq!(pipeline.status(), &Status::NoHand);

        // Advance was published on frames 3, 4 and 5 only.
        assert_eq!(events.try_iter().count(), 3);
    }

    #[test]
    fn test_unrecognized_keeps_suspend_timer_running() {
        let (mut pipeline, events, t0) = started(PipelineConfig::default());
        let pinky = FrameInput::with_hand(synthetic::pinky_only());
        let mut last = None;
        for i in 0..=36 {
            last = pipeline.process_frame(&pinky, t0 + ms(i * 100));
        }
        let last = last.unwrap();
        assert_eq!(last.stable, Signal::Command(Command::Unrecognized));
        assert_eq!(last.transition, Some(Transition::SuspendedIdle));
        assert_eq!(pipeline.status(), &Status::SuspendedIdle);
        assert!(events.try_iter().all(|e| e.command == "Unrecognized"));
    }

    #[test]
    fn test_manual_toggle_only_while_running() {
        let (emitter, _events) = Emitter::channel();
        let mut pipeline = GesturePipeline::new(PipelineConfig::default(), emitter);
        let t0 = Instant::now();
        assert_eq!(pipeline.toggle_suspend(t0), None);

        pipeline.start(t0);
        assert_eq!(pipeline.toggle_suspend(t0), Some(Transition::SuspendedManual));
        assert_eq!(pipeline.mode(), Mode::Suspended);
        assert_eq!(pipeline.status(), &Status::SuspendedManual);

        assert_eq!(pipeline.set_mode(Mode::Suspended, t0), None);
        assert_eq!(
            pipeline.set_mode(Mode::Active, t0 + ms(10_000)),
            Some(Transition::WokeManual)
        );
        assert_eq!(pipeline.last_activity(), Some(t0 + ms(10_000)));
    }

    #[test]
    fn test_manual_wake_resets_stabilizer() {
        let (mut pipeline, _events, t0) = started(PipelineConfig::default());
        for i in 0..3 {
            pipeline.process_frame(&FrameInput::with_hand(synthetic::fist()), t0 + ms(i));
        }
        assert_eq!(pipeline.stable(), Signal::Command(Command::Retreat));

        pipeline.toggle_suspend(t0 + ms(10));
        pipeline.toggle_suspend(t0 + ms(20));
        assert_eq!(pipeline.stable(), Signal::NoSignal);
    }

    #[test]
    fn test_suspended_without_raster_stays_suspended() {
        let (mut pipeline, _events, t0) = started(PipelineConfig::default());
        pipeline.toggle_suspend(t0);
        let report = pipeline
            .process_frame(&FrameInput::with_hand(synthetic::open_palm()), t0 + ms(33))
            .unwrap();
        assert_eq!(report.mode, Mode::Suspended);
        assert_eq!(report.raw, None);
        assert_eq!(report.motion_score, None);
        assert_eq!(report.to_string(), "Suspended, no frame to compare.");
    }

    #[test]
    fn test_stop_resets_everything() {
        let (mut pipeline, _events, t0) = started(PipelineConfig::default());
        for i in 0..3 {
            pipeline.process_frame(&FrameInput::with_hand(synthetic::fist()), t0 + ms(i));
        }
        pipeline.toggle_suspend(t0 + ms(5));
        pipeline.stop();

        assert!(!pipeline.is_running());
        assert_eq!(pipeline.mode(), Mode::Active);
        assert_eq!(pipeline.stable(), Signal::NoSignal);
        assert_eq!(pipeline.last_activity(), None);
        assert_eq!(pipeline.status(), &Status::Stopped);
    }

    #[test]
    fn test_start_with_failing_source() {
        use crate::source::{ReplayConfig, ReplaySource};

        let (emitter, _events) = Emitter::channel();
        let mut pipeline = GesturePipeline::new(PipelineConfig::default(), emitter);
        let mut source = ReplaySource::new(ReplayConfig::new(
            std::env::temp_dir().join("gesture-pilot-does-not-exist.jsonl"),
            0,
        ));

        let result = pipeline.start_with(&mut source, Instant::now());
        assert!(matches!(result, Err(SourceError::CameraUnavailable(_))));
        assert!(!pipeline.is_running());
        assert!(matches!(pipeline.status(), Status::Error(_)));
        assert!(pipeline.status().to_string().starts_with("Error: Camera unavailable"));
    }

    #[test]
    fn test_activity_log_counts() {
        let log = create_shared_log();
        let (emitter, _events) = Emitter::channel();
        let mut pipeline =
            GesturePipeline::new(PipelineConfig::default(), emitter).with_activity_log(log.clone());
        let t0 = Instant::now();
        pipeline.start(t0);

        for i in 0..4 {
            pipeline.process_frame(&FrameInput::with_hand(synthetic::fist()), t0 + ms(i));
        }
        pipeline.process_frame(&FrameInput::empty(), t0 + ms(5));
        pipeline.toggle_suspend(t0 + ms(6));
        pipeline.process_frame(&FrameInput::with_frame(RasterFrame::filled(8, 8, 0)), t0 + ms(7));
        pipeline.process_frame(&FrameInput::with_frame(RasterFrame::filled(8, 8, 255)), t0 + ms(8));

        let stats = log.stats();
        assert_eq!(stats.frames_processed, 7);
        assert_eq!(stats.hands_detected, 4);
        // Frames 3, 4 and 5 (the no-hand frame still holds Retreat).
        assert_eq!(stats.commands_emitted, 3);
        assert_eq!(stats.suspensions, 1);
        assert_eq!(stats.wakes, 1);
    }

    #[test]
    fn test_report_debug_line() {
        let (mut pipeline, _events, t0) = started(PipelineConfig::default());
        let report = pipeline
            .process_frame(&FrameInput::with_hand(synthetic::two_fingers()), t0)
            .unwrap();
        assert_eq!(
            report.to_string(),
            "Fingers=2 | th=0 idx=1 mid=1 ring=0 pinky=0 | Raw=360° left | Stable=—"
        );

        let report = pipeline.process_frame(&FrameInput::empty(), t0 + ms(1)).unwrap();
        assert_eq!(report.to_string(), "No hand detected.");
    }
}
