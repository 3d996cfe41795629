//! Replay of recorded landmark captures.
//!
//! A capture is a JSON Lines file with one [`FrameSample`] per line. The whole
//! file is parsed on start, so a malformed capture fails setup instead of
//! stopping the loop halfway. Samples are then paced onto a bounded channel
//! from a background thread at the configured frame rate.

use crate::source::types::FrameSample;
use crate::source::{FrameSource, SourceError};
use crossbeam_channel::{bounded, Receiver};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

/// Capacity of the frame channel. Roughly four seconds at 30 fps.
const CHANNEL_CAPACITY: usize = 120;

/// Configuration for a replay source.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Path of the JSON Lines capture
    pub path: PathBuf,
    /// Delivery rate in frames per second (0 delivers as fast as the consumer reads)
    pub frame_rate: u32,
}

impl ReplayConfig {
    pub fn new(path: impl Into<PathBuf>, frame_rate: u32) -> Self {
        Self {
            path: path.into(),
            frame_rate,
        }
    }

    fn frame_interval(&self) -> Option<Duration> {
        (self.frame_rate > 0).then(|| Duration::from_secs(1) / self.frame_rate)
    }
}

/// A frame source that plays back a recorded capture.
pub struct ReplaySource {
    config: ReplayConfig,
    receiver: Receiver<FrameSample>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ReplaySource {
    pub fn new(config: ReplayConfig) -> Self {
        // Placeholder channel until start; its sender is dropped so it reads as drained.
        let (_, receiver) = bounded(0);
        Self {
            config,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Parse and validate every line of the capture.
    pub fn load_samples(&self) -> Result<Vec<FrameSample>, SourceError> {
        let content = std::fs::read_to_string(&self.config.path)
            .map_err(|e| read_error(&self.config.path, e))?;

        let samples = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                let invalid = |reason: String| SourceError::InvalidSample {
                    line: idx + 1,
                    reason,
                };
                let sample = serde_json::from_str::<FrameSample>(line)
                    .map_err(|e| invalid(e.to_string()))?;
                sample.validate().map_err(|e| invalid(e.to_string()))?;
                Ok(sample)
            })
            .collect::<Result<Vec<_>, SourceError>>()?;

        if samples.is_empty() {
            return Err(SourceError::ModelUnavailable(format!(
                "{} holds no landmark frames",
                self.config.path.display()
            )));
        }
        Ok(samples)
    }

    /// Try to receive a frame without blocking.
    pub fn try_recv(&self) -> Option<FrameSample> {
        self.receiver.try_recv().ok()
    }
}

fn read_error(path: &Path, error: std::io::Error) -> SourceError {
    match error.kind() {
        std::io::ErrorKind::PermissionDenied => SourceError::PermissionDenied,
        _ => SourceError::CameraUnavailable(format!("{}: {error}", path.display())),
    }
}

impl FrameSource for ReplaySource {
    fn start(&mut self) -> Result<(), SourceError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SourceError::AlreadyRunning);
        }

        let samples = self.load_samples()?;
        info!(
            path = %self.config.path.display(),
            frames = samples.len(),
            "replay capture loaded"
        );

        let (sender, receiver) = bounded(CHANNEL_CAPACITY);
        self.receiver = receiver;
        self.running.store(true, Ordering::SeqCst);

        let running = self.running.clone();
        let interval = self.config.frame_interval();
        self.worker = Some(thread::spawn(move || {
            for sample in samples {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if sender.send(sample).is_err() {
                    break;
                }
                if let Some(interval) = interval {
                    thread::sleep(interval);
                }
            }
            running.store(false, Ordering::SeqCst);
            debug!("replay worker finished");
        }));

        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        // Unblock a worker waiting on a full channel.
        while self.receiver.try_recv().is_ok() {}
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn receiver(&self) -> &Receiver<FrameSample> {
        &self.receiver
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("gesture-pilot-replay-{name}-{}.jsonl", std::process::id()))
    }

    #[test]
    fn test_missing_capture_is_camera_unavailable() {
        let mut source = ReplaySource::new(ReplayConfig::new(capture_path("missing"), 0));
        assert!(matches!(
            source.start(),
            Err(SourceError::CameraUnavailable(_))
        ));
        assert!(!source.is_running());
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let path = capture_path("malformed");
        std::fs::write(&path, "{\"timestamp_ms\": 0}\n\nnot json\n").unwrap();

        let mut source = ReplaySource::new(ReplayConfig::new(&path, 0));
        match source.start() {
            Err(SourceError::InvalidSample { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {other:?}"),
        }
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_short_hand_fails_at_start() {
        let path = capture_path("short-hand");
        let hand: Vec<[f64; 3]> = (0..20).map(|i| [0.5, i as f64 / 20.0, 0.0]).collect();
        let sample = serde_json::json!({ "timestamp_ms": 33, "hands": [hand] });
        std::fs::write(&path, format!("{{\"timestamp_ms\": 0}}\n{sample}\n")).unwrap();

        let mut source = ReplaySource::new(ReplayConfig::new(&path, 0));
        match source.start() {
            Err(SourceError::InvalidSample { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("20"), "unexpected reason: {reason}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!source.is_running());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_empty_capture_is_model_unavailable() {
        let path = capture_path("empty");
        std::fs::write(&path, "\n\n").unwrap();

        let mut source = ReplaySource::new(ReplayConfig::new(&path, 0));
        assert!(matches!(
            source.start(),
            Err(SourceError::ModelUnavailable(_))
        ));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_read_error_kinds() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(
            read_error(Path::new("capture.jsonl"), denied),
            SourceError::PermissionDenied
        ));
        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(matches!(
            read_error(Path::new("capture.jsonl"), missing),
            SourceError::CameraUnavailable(_)
        ));
    }

    #[test]
    fn test_replay_delivers_all_frames_then_disconnects() {
        let path = capture_path("frames");
        let lines: Vec<String> = (0..5)
            .map(|i| format!("{{\"timestamp_ms\": {}}}", i * 33))
            .collect();
        std::fs::write(&path, lines.join("\n")).unwrap();

        // Slow enough that the worker is still running for the second start.
        let mut source = ReplaySource::new(ReplayConfig::new(&path, 10));
        source.start().unwrap();
        assert!(matches!(source.start(), Err(SourceError::AlreadyRunning)));

        let received: Vec<u64> = source.receiver().iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(received, vec![0, 33, 66, 99, 132]);

        source.stop();
        assert!(!source.is_running());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_frame_interval() {
        let config = ReplayConfig::new("capture.jsonl", 25);
        assert_eq!(config.frame_interval(), Some(Duration::from_millis(40)));
        assert_eq!(ReplayConfig::new("capture.jsonl", 0).frame_interval(), None);
    }
}
