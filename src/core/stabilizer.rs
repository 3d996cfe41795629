//! Debouncing of per-frame classifications.
//!
//! Switching to a new command takes `required_frames` consecutive identical
//! raw signals; holding the current one takes none. A single misclassified
//! frame therefore never changes the output.

use crate::core::command::Signal;

/// Consecutive identical frames needed before the stable output switches.
pub const DEFAULT_STABLE_FRAMES: u32 = 3;

#[derive(Debug, Clone)]
pub struct Stabilizer {
    required_frames: u32,
    last_raw: Option<Signal>,
    repeat_count: u32,
    current: Signal,
}

impl Default for Stabilizer {
    fn default() -> Self {
        Self::new(DEFAULT_STABLE_FRAMES)
    }
}

impl Stabilizer {
    pub fn new(required_frames: u32) -> Self {
        Self {
            required_frames: required_frames.max(1),
            last_raw: None,
            repeat_count: 0,
            current: Signal::NoSignal,
        }
    }

    /// Feed one raw signal and return the stable output for this frame.
    pub fn stabilize(&mut self, raw: Signal) -> Signal {
        if self.last_raw == Some(raw) {
            self.repeat_count = self.repeat_count.saturating_add(1);
        } else {
            self.last_raw = Some(raw);
            self.repeat_count = 1;
        }

        if self.repeat_count >= self.required_frames {
            self.current = raw;
        }

        self.current
    }

    /// Forget all history; the output goes back to no signal.
    pub fn reset(&mut self) {
        self.last_raw = None;
        self.repeat_count = 0;
        self.current = Signal::NoSignal;
    }

    pub fn current(&self) -> Signal {
        self.current
    }

    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::Command;

    fn sig(command: Command) -> Signal {
        Signal::Command(command)
    }

    #[test]
    fn test_switches_on_third_repeat() {
        let mut stabilizer = Stabilizer::default();
        assert_eq!(stabilizer.stabilize(sig(Command::Advance)), Signal::NoSignal);
        assert_eq!(stabilizer.stabilize(sig(Command::Advance)), Signal::NoSignal);
        assert_eq!(stabilizer.stabilize(sig(Command::Advance)), sig(Command::Advance));
        for _ in 0..10 {
            assert_eq!(stabilizer.stabilize(sig(Command::Advance)), sig(Command::Advance));
        }
    }

    #[test]
    fn test_short_runs_keep_previous_value() {
        let mut stabilizer = Stabilizer::default();
        for _ in 0..3 {
            stabilizer.stabilize(sig(Command::Stop));
        }

        // One and two frame blips never take over.
        assert_eq!(stabilizer.stabilize(sig(Command::TurnLeft)), sig(Command::Stop));
        assert_eq!(stabilizer.stabilize(sig(Command::Retreat)), sig(Command::Stop));
        assert_eq!(stabilizer.stabilize(sig(Command::Retreat)), sig(Command::Stop));
        assert_eq!(stabilizer.stabilize(Signal::NoSignal), sig(Command::Stop));
        assert_eq!(stabilizer.stabilize(sig(Command::Retreat)), sig(Command::Stop));
    }

    #[test]
    fn test_no_signal_is_debounced_too() {
        let mut stabilizer = Stabilizer::default();
        for _ in 0..3 {
            stabilizer.stabilize(sig(Command::Advance));
        }
        stabilizer.stabilize(Signal::NoSignal);
        stabilizer.stabilize(Signal::NoSignal);
        assert_eq!(stabilizer.current(), sig(Command::Advance));
        assert_eq!(stabilizer.stabilize(Signal::NoSignal), Signal::NoSignal);
    }

    #[test]
    fn test_reset() {
        let mut stabilizer = Stabilizer::default();
        for _ in 0..3 {
            stabilizer.stabilize(sig(Command::Advance));
        }
        stabilizer.reset();
        assert_eq!(stabilizer.current(), Signal::NoSignal);
        assert_eq!(stabilizer.repeat_count(), 0);

        // History is gone: two more frames of the same command are not enough.
        assert_eq!(stabilizer.stabilize(sig(Command::Advance)), Signal::NoSignal);
        assert_eq!(stabilizer.stabilize(sig(Command::Advance)), Signal::NoSignal);
        assert_eq!(stabilizer.stabilize(sig(Command::Advance)), sig(Command::Advance));
    }

    #[test]
    fn test_single_frame_threshold() {
        let mut stabilizer = Stabilizer::new(1);
        assert_eq!(stabilizer.stabilize(sig(Command::Stop)), sig(Command::Stop));
        assert_eq!(stabilizer.stabilize(sig(Command::Advance)), sig(Command::Advance));
    }
}
