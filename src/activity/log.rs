//! Session activity log.
//!
//! Counts what the pipeline did (frames seen, hands found, commands
//! published, power-state changes) so an operator can check it after the fact.
//! No landmark data or imagery is kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Activity counters for the current session.
#[derive(Debug)]
pub struct ActivityLog {
    /// Frames processed while running
    frames_processed: AtomicU64,
    /// Frames where at least one hand was visible
    hands_detected: AtomicU64,
    /// Command events published
    commands_emitted: AtomicU64,
    /// Transitions into suspended mode
    suspensions: AtomicU64,
    /// Transitions back to active mode
    wakes: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            frames_processed: AtomicU64::new(0),
            hands_detected: AtomicU64::new(0),
            commands_emitted: AtomicU64::new(0),
            suspensions: AtomicU64::new(0),
            wakes: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create an activity log that loads and saves its counters at `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            warn!("could not load previous activity stats: {e}");
        }

        log
    }

    pub fn record_frame(&self) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hand(&self) {
        self.hands_detected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_command(&self) {
        self.commands_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_suspension(&self) {
        self.suspensions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_wake(&self) {
        self.wakes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> ActivityStats {
        ActivityStats {
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            hands_detected: self.hands_detected.load(Ordering::Relaxed),
            commands_emitted: self.commands_emitted.load(Ordering::Relaxed),
            suspensions: self.suspensions.load(Ordering::Relaxed),
            wakes: self.wakes.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Frames processed: {}\n\
             - Frames with a hand: {}\n\
             - Commands published: {}\n\
             - Suspensions: {}\n\
             - Wakes: {}\n\
             - Session duration: {} seconds",
            stats.frames_processed,
            stats.hands_detected,
            stats.commands_emitted,
            stats.suspensions,
            stats.wakes,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                frames_processed: stats.frames_processed,
                hands_detected: stats.hands_detected,
                commands_emitted: stats.commands_emitted,
                suspensions: stats.suspensions,
                wakes: stats.wakes,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.frames_processed
                    .store(persisted.frames_processed, Ordering::Relaxed);
                self.hands_detected
                    .store(persisted.hands_detected, Ordering::Relaxed);
                self.commands_emitted
                    .store(persisted.commands_emitted, Ordering::Relaxed);
                self.suspensions
                    .store(persisted.suspensions, Ordering::Relaxed);
                self.wakes.store(persisted.wakes, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.frames_processed.store(0, Ordering::Relaxed);
        self.hands_detected.store(0, Ordering::Relaxed);
        self.commands_emitted.store(0, Ordering::Relaxed);
        self.suspensions.store(0, Ordering::Relaxed);
        self.wakes.store(0, Ordering::Relaxed);
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of activity statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityStats {
    pub frames_processed: u64,
    pub hands_detected: u64,
    pub commands_emitted: u64,
    pub suspensions: u64,
    pub wakes: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    frames_processed: u64,
    hands_detected: u64,
    commands_emitted: u64,
    suspensions: u64,
    wakes: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared activity log.
pub type SharedActivityLog = Arc<ActivityLog>;

pub fn create_shared_log() -> SharedActivityLog {
    Arc::new(ActivityLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedActivityLog {
    Arc::new(ActivityLog::with_persistence(path))
}
