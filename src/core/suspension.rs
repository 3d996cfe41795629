//! Active/suspended power state.
//!
//! The controller only tracks the mode and the activity timestamp. What runs
//! in each mode, and what gets reset on a transition, is up to the pipeline.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Inactivity window before recognition suspends itself.
pub const DEFAULT_SUSPEND_AFTER: Duration = Duration::from_millis(3500);

/// Motion score (0–255 scale) above which a suspended pipeline wakes.
pub const DEFAULT_MOTION_WAKE_THRESHOLD: f64 = 18.0;

/// Recognition mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Active,
    Suspended,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Active => "ACTIVE",
            Mode::Suspended => "SUSPENDED",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A mode change and what caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// No meaningful command within the inactivity window
    SuspendedIdle,
    SuspendedManual,
    /// Motion above the wake threshold
    WokeOnMotion,
    WokeManual,
}

impl Transition {
    pub fn mode(&self) -> Mode {
        match self {
            Transition::SuspendedIdle | Transition::SuspendedManual => Mode::Suspended,
            Transition::WokeOnMotion | Transition::WokeManual => Mode::Active,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SuspensionController {
    mode: Mode,
    suspend_after: Duration,
    wake_threshold: f64,
    last_activity: Option<Instant>,
}

impl Default for SuspensionController {
    fn default() -> Self {
        Self::new(DEFAULT_SUSPEND_AFTER, DEFAULT_MOTION_WAKE_THRESHOLD)
    }
}

impl SuspensionController {
    pub fn new(suspend_after: Duration, wake_threshold: f64) -> Self {
        Self {
            mode: Mode::Active,
            suspend_after,
            wake_threshold,
            last_activity: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn last_activity(&self) -> Option<Instant> {
        self.last_activity
    }

    pub fn wake_threshold(&self) -> f64 {
        self.wake_threshold
    }

    /// Active, with the inactivity window starting at `now`.
    pub fn arm(&mut self, now: Instant) {
        self.mode = Mode::Active;
        self.last_activity = Some(now);
    }

    /// Back to defaults: active, no activity recorded.
    pub fn reset(&mut self) {
        self.mode = Mode::Active;
        self.last_activity = None;
    }

    /// A meaningful command was seen.
    pub fn record_activity(&mut self, now: Instant) {
        self.last_activity = Some(now);
    }

    /// Time since the last meaningful command.
    pub fn idle_for(&self, now: Instant) -> Option<Duration> {
        self.last_activity
            .map(|last| now.saturating_duration_since(last))
    }

    /// Suspend if the inactivity window has been exceeded.
    pub fn check_inactivity(&mut self, now: Instant) -> Option<Transition> {
        if self.mode != Mode::Active {
            return None;
        }
        let Some(idle) = self.idle_for(now) else {
            // Nothing recorded yet: the window starts now.
            self.last_activity = Some(now);
            return None;
        };
        if idle > self.suspend_after {
            self.mode = Mode::Suspended;
            Some(Transition::SuspendedIdle)
        } else {
            None
        }
    }

    /// Wake if suspended and `score` exceeds the wake threshold.
    pub fn observe_motion(&mut self, score: f64, now: Instant) -> Option<Transition> {
        if self.mode == Mode::Suspended && score > self.wake_threshold {
            self.arm(now);
            Some(Transition::WokeOnMotion)
        } else {
            None
        }
    }

    /// Flip the mode immediately. Waking restarts the inactivity window, the
    /// same as a motion wake.
    pub fn toggle(&mut self, now: Instant) -> Transition {
        match self.mode {
            Mode::Active => {
                self.mode = Mode::Suspended;
                Transition::SuspendedManual
            }
            Mode::Suspended => {
                self.arm(now);
                Transition::WokeManual
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_suspends_after_window() {
        let t0 = Instant::now();
        let mut controller = SuspensionController::default();
        controller.arm(t0);

        assert_eq!(controller.check_inactivity(t0 + ms(3500)), None);
        assert_eq!(controller.mode(), Mode::Active);
        assert_eq!(
            controller.check_inactivity(t0 + ms(3501)),
            Some(Transition::SuspendedIdle)
        );
        assert_eq!(controller.mode(), Mode::Suspended);
        // Already suspended: no second transition.
        assert_eq!(controller.check_inactivity(t0 + ms(9000)), None);
    }

    #[test]
    fn test_activity_extends_window() {
        let t0 = Instant::now();
        let mut controller = SuspensionController::default();
        controller.arm(t0);
        controller.record_activity(t0 + ms(3000));
        assert_eq!(controller.check_inactivity(t0 + ms(6000)), None);
        assert_eq!(controller.idle_for(t0 + ms(6000)), Some(ms(3000)));
    }

    #[test]
    fn test_unarmed_controller_starts_window_on_first_check() {
        let t0 = Instant::now();
        let mut controller = SuspensionController::default();
        assert_eq!(controller.check_inactivity(t0), None);
        assert_eq!(controller.last_activity(), Some(t0));
    }

    #[test]
    fn test_wakes_only_above_threshold() {
        let t0 = Instant::now();
        let mut controller = SuspensionController::default();
        controller.arm(t0);
        controller.check_inactivity(t0 + ms(4000));

        assert_eq!(controller.observe_motion(18.0, t0 + ms(4100)), None);
        assert_eq!(controller.mode(), Mode::Suspended);
        assert_eq!(
            controller.observe_motion(18.5, t0 + ms(4200)),
            Some(Transition::WokeOnMotion)
        );
        assert_eq!(controller.mode(), Mode::Active);
        assert_eq!(controller.last_activity(), Some(t0 + ms(4200)));
    }

    #[test]
    fn test_motion_ignored_while_active() {
        let t0 = Instant::now();
        let mut controller = SuspensionController::default();
        controller.arm(t0);
        assert_eq!(controller.observe_motion(200.0, t0 + ms(10)), None);
        assert_eq!(controller.last_activity(), Some(t0));
    }

    #[test]
    fn test_manual_toggle() {
        let t0 = Instant::now();
        let mut controller = SuspensionController::default();
        controller.arm(t0);

        assert_eq!(controller.toggle(t0 + ms(100)), Transition::SuspendedManual);
        assert_eq!(controller.mode(), Mode::Suspended);
        assert_eq!(controller.last_activity(), Some(t0));

        assert_eq!(controller.toggle(t0 + ms(9000)), Transition::WokeManual);
        assert_eq!(controller.mode(), Mode::Active);
        // Manual wake restarts the window, so the next check does not re-suspend.
        assert_eq!(controller.check_inactivity(t0 + ms(9001)), None);
    }

    #[test]
    fn test_reset() {
        let t0 = Instant::now();
        let mut controller = SuspensionController::default();
        controller.arm(t0);
        controller.toggle(t0);
        controller.reset();
        assert_eq!(controller.mode(), Mode::Active);
        assert_eq!(controller.last_activity(), None);
    }
}
