//! Publication of stable commands to listeners.

use crate::core::command::Signal;
use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Source tag carried by every published event.
pub const EVENT_SOURCE: &str = "gestures";

/// A published navigation command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEvent {
    /// Always [`EVENT_SOURCE`]
    pub source: String,
    /// Human-readable command label
    pub command: String,
    pub emitted_at: DateTime<Utc>,
}

impl CommandEvent {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            source: EVENT_SOURCE.to_string(),
            command: command.into(),
            emitted_at: Utc::now(),
        }
    }
}

/// When to publish the stable command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmitPolicy {
    /// Every frame the stable command is set, repeats included
    #[default]
    EveryFrame,
    /// Only on frames where the stable command changes
    OnChange,
}

/// Sends [`CommandEvent`]s to whoever holds the receiving end.
#[derive(Debug, Clone)]
pub struct Emitter {
    sender: Sender<CommandEvent>,
}

impl Emitter {
    pub fn new(sender: Sender<CommandEvent>) -> Self {
        Self { sender }
    }

    /// An emitter paired with an unbounded receiver.
    pub fn channel() -> (Self, Receiver<CommandEvent>) {
        let (sender, receiver) = unbounded();
        (Self::new(sender), receiver)
    }

    /// Publish `signal` unless it is no signal. `Unrecognized` is published.
    ///
    /// Returns whether an event was sent. A receiver that has gone away is
    /// not an error.
    pub fn emit(&self, signal: Signal) -> bool {
        let Some(command) = signal.command() else {
            return false;
        };
        match self.sender.send(CommandEvent::new(command.label())) {
            Ok(()) => true,
            Err(_) => {
                debug!(command = command.label(), "no listener for command event");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::Command;

    #[test]
    fn test_no_signal_is_suppressed() {
        let (emitter, receiver) = Emitter::channel();
        assert!(!emitter.emit(Signal::NoSignal));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_unrecognized_is_forwarded() {
        let (emitter, receiver) = Emitter::channel();
        assert!(emitter.emit(Signal::Command(Command::Unrecognized)));
        let event = receiver.try_recv().unwrap();
        assert_eq!(event.source, "gestures");
        assert_eq!(event.command, "Unrecognized");
    }

    #[test]
    fn test_event_json_shape() {
        let (emitter, receiver) = Emitter::channel();
        emitter.emit(Signal::Command(Command::Rotate90Left));
        let json = serde_json::to_value(receiver.try_recv().unwrap()).unwrap();
        assert_eq!(json["source"], "gestures");
        assert_eq!(json["command"], "90° left");
        assert!(json["emitted_at"].as_str().is_some());
    }

    #[test]
    fn test_dropped_receiver_never_fails() {
        let (emitter, receiver) = Emitter::channel();
        drop(receiver);
        assert!(!emitter.emit(Signal::Command(Command::Advance)));
    }
}
