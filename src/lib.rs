//! gesture-pilot - hand-gesture navigation commands from a camera feed.
//!
//! Each frame, the first detected hand is classified into a navigation
//! command, debounced, and published to listeners. When no valid command has
//! been seen for a while, recognition suspends itself and only watches for
//! motion until something moves in front of the camera again.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        gesture-pilot                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │ FrameSource │──▶│ Classifier  │──▶│ Stabilizer  │──┐    │
//! │  │  (replay)   │   │ (21 points) │   │ (3 frames)  │  │    │
//! │  └─────────────┘   └─────────────┘   └─────────────┘  │    │
//! │         │                                              ▼    │
//! │         │  suspended  ┌─────────────┐          ┌─────────┐ │
//! │         └────────────▶│   Motion    │─ wake ──▶│ Emitter │ │
//! │                       │  Detector   │          └─────────┘ │
//! │                       └─────────────┘                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use gesture_pilot::core::{Emitter, GesturePipeline, PipelineConfig};
//! use gesture_pilot::source::{synthetic, FrameInput};
//! use std::time::Instant;
//!
//! let (emitter, events) = Emitter::channel();
//! let mut pipeline = GesturePipeline::new(PipelineConfig::default(), emitter);
//! pipeline.start(Instant::now());
//!
//! for _ in 0..3 {
//!     pipeline.process_frame(&FrameInput::with_hand(synthetic::fist()), Instant::now());
//! }
//!
//! let event = events.try_recv().expect("Retreat after three frames");
//! assert_eq!(event.command, "Retreat");
//! ```

pub mod activity;
pub mod config;
pub mod core;
pub mod source;

// Re-export key types at crate root for convenience
pub use crate::activity::{ActivityLog, ActivityStats, SharedActivityLog};
pub use crate::config::{Config, ConfigError};
pub use crate::core::{
    classify, Command, CommandEvent, EmitPolicy, Emitter, GesturePipeline, Mode, PipelineConfig,
    Signal, Status, StepReport,
};
pub use crate::source::{FrameInput, FrameSample, FrameSource, HandPose, ReplaySource, SourceError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Gesture reference card that can be displayed to operators.
pub const GESTURE_REFERENCE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                GESTURE-PILOT - GESTURE REFERENCE                 ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  Hold a gesture steady for three frames to send its command.     ║
║  Keep the hand upright, fingers pointing to the ceiling.         ║
║                                                                  ║
║    Open palm (all five fingers)        →  Advance                ║
║    Closed fist                         →  Retreat                ║
║    OK sign (thumb touches index)       →  Stop                   ║
║    Index finger pointing sideways      →  Turn right / left      ║
║    Thumb pointing sideways             →  90° right / left       ║
║    Index + middle + ring               →  360° right             ║
║    Index + middle                      →  360° left              ║
║                                                                  ║
║  Directions are as you see them in the mirrored preview.         ║
║                                                                  ║
║  After 3.5 seconds without a valid gesture, recognition          ║
║  suspends. Wave in front of the camera to wake it up.            ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
