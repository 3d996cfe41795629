//! Navigation commands produced by the gesture classifier.

use serde::{Deserialize, Serialize};

/// A classified gesture, mapped to the navigation command it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Advance,
    Retreat,
    Stop,
    TurnRight,
    TurnLeft,
    Rotate90Right,
    Rotate90Left,
    Rotate360Right,
    Rotate360Left,
    /// A hand was visible but matched no gesture.
    Unrecognized,
}

impl Command {
    pub const ALL: [Command; 10] = [
        Command::Advance,
        Command::Retreat,
        Command::Stop,
        Command::TurnRight,
        Command::TurnLeft,
        Command::Rotate90Right,
        Command::Rotate90Left,
        Command::Rotate360Right,
        Command::Rotate360Left,
        Command::Unrecognized,
    ];

    /// Human-readable label, as published to listeners.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Advance => "Advance",
            Self::Retreat => "Retreat",
            Self::Stop => "Stop",
            Self::TurnRight => "Turn right",
            Self::TurnLeft => "Turn left",
            Self::Rotate90Right => "90° right",
            Self::Rotate90Left => "90° left",
            Self::Rotate360Right => "360° right",
            Self::Rotate360Left => "360° left",
            Self::Unrecognized => "Unrecognized",
        }
    }

    /// Parse a published label back into a command.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-frame recognition outcome: either no hand at all, or a classified command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Signal {
    #[default]
    NoSignal,
    Command(Command),
}

impl Signal {
    /// Placeholder shown while there is no signal.
    pub const NO_SIGNAL_LABEL: &'static str = "—";

    pub fn command(&self) -> Option<Command> {
        match self {
            Signal::NoSignal => None,
            Signal::Command(c) => Some(*c),
        }
    }

    /// A recognized command other than `Unrecognized`. Only these count as activity.
    pub fn is_meaningful(&self) -> bool {
        matches!(self, Signal::Command(c) if *c != Command::Unrecognized)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Signal::NoSignal => Self::NO_SIGNAL_LABEL,
            Signal::Command(c) => c.label(),
        }
    }
}

impl From<Command> for Signal {
    fn from(command: Command) -> Self {
        Signal::Command(command)
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
