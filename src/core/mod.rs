//! Core functionality for gesture navigation.
//!
//! This module contains:
//! - The landmark classifier mapping hand poses to commands
//! - Frame-difference motion scoring for wake-up
//! - Debouncing of per-frame results into a stable command
//! - The active/suspended power state machine
//! - Command publication and the pipeline that ties them together

pub mod classifier;
pub mod command;
pub mod emitter;
pub mod motion;
pub mod pipeline;
pub mod stabilizer;
pub mod suspension;

// Re-export commonly used types
pub use classifier::{classify, Classification, Classifier, FingerFlags, GESTURE_RULES};
pub use command::{Command, Signal};
pub use emitter::{CommandEvent, EmitPolicy, Emitter, EVENT_SOURCE};
pub use motion::{MotionDetector, MAX_SAMPLE_SIZE};
pub use pipeline::{GesturePipeline, PipelineConfig, Status, StepReport};
pub use stabilizer::Stabilizer;
pub use suspension::{Mode, SuspensionController, Transition};
