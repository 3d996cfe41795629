//! Frame acquisition for the gesture pipeline.
//!
//! Camera capture and the hand landmark model live outside this crate. A
//! [`FrameSource`] stands in for both: once started it delivers one
//! [`FrameSample`] per frame-ready tick over a channel.

pub mod replay;
pub mod synthetic;
pub mod types;

use crossbeam_channel::Receiver;
use std::path::Path;

// Re-export commonly used types
pub use replay::{ReplayConfig, ReplaySource};
pub use types::{FrameInput, FrameSample, HandPose, InputError, LandmarkPoint, RasterFrame};

/// A producer of per-frame landmark samples.
pub trait FrameSource {
    /// Acquire the camera and model and begin delivering frames.
    fn start(&mut self) -> Result<(), SourceError>;

    /// Stop delivering frames.
    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Receiver for delivered frames. Disconnects once the source runs dry.
    fn receiver(&self) -> &Receiver<FrameSample>;
}

/// Setup failures. All of them are fatal to starting the pipeline.
#[derive(Debug)]
pub enum SourceError {
    AlreadyRunning,
    CameraUnavailable(String),
    PermissionDenied,
    ModelUnavailable(String),
    InvalidSample { line: usize, reason: String },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::AlreadyRunning => write!(f, "Frame source is already running"),
            SourceError::CameraUnavailable(e) => write!(f, "Camera unavailable: {e}"),
            SourceError::PermissionDenied => write!(f, "Camera permission denied"),
            SourceError::ModelUnavailable(e) => write!(f, "Landmark model unavailable: {e}"),
            SourceError::InvalidSample { line, reason } => {
                write!(f, "Invalid frame sample on line {line}: {reason}")
            }
        }
    }
}

impl std::error::Error for SourceError {}

/// Whether the capture at `input` may be opened. A missing file is not a
/// permission problem; starting the source reports it.
pub fn check_camera_permission(input: &Path) -> bool {
    match std::fs::File::open(input) {
        Err(e) => e.kind() != std::io::ErrorKind::PermissionDenied,
        Ok(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_check_ignores_missing_capture() {
        let missing = std::env::temp_dir().join("gesture-pilot-no-such-capture.jsonl");
        assert!(check_camera_permission(&missing));

        let present = std::env::temp_dir().join(format!(
            "gesture-pilot-permission-{}.jsonl",
            std::process::id()
        ));
        std::fs::write(&present, "").unwrap();
        assert!(check_camera_permission(&present));
        let _ = std::fs::remove_file(present);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SourceError::PermissionDenied.to_string(),
            "Camera permission denied"
        );
        assert_eq!(
            SourceError::InvalidSample {
                line: 4,
                reason: "bad".to_string()
            }
            .to_string(),
            "Invalid frame sample on line 4: bad"
        );
    }
}
