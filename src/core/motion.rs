//! Frame-difference motion detector.
//!
//! Used only while the pipeline is suspended. Each frame is shrunk to a small
//! square and compared against the previous one on a sparse byte stride, which
//! is cheap enough to run on every frame.

use crate::source::types::RasterFrame;
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgba, RgbaImage};
use tracing::warn;

/// Edge length of the downsampled comparison square.
pub const DEFAULT_SAMPLE_SIZE: u32 = 128;

/// Largest accepted comparison square (4 MiB per stored frame).
pub const MAX_SAMPLE_SIZE: u32 = 1024;

/// Compare one byte in every 16 (the red channel of every fourth pixel).
pub const SAMPLE_STRIDE: usize = 16;

/// Motion score from successive frames.
#[derive(Debug, Clone)]
pub struct MotionDetector {
    sample_size: u32,
    previous: Option<RgbaImage>,
}

impl Default for MotionDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_SIZE)
    }
}

impl MotionDetector {
    pub fn new(sample_size: u32) -> Self {
        Self {
            sample_size: sample_size.clamp(1, MAX_SAMPLE_SIZE),
            previous: None,
        }
    }

    /// Mean absolute byte difference against the previous frame, on a 0–255 scale.
    ///
    /// Returns 0 when there is no previous frame. The current frame always
    /// becomes the new baseline.
    pub fn score(&mut self, frame: &RasterFrame) -> f64 {
        let Some(current) = self.downsample(frame) else {
            return 0.0;
        };

        let score = match &self.previous {
            Some(previous) => mean_abs_difference(previous.as_raw(), current.as_raw()),
            None => 0.0,
        };

        self.previous = Some(current);
        score
    }

    /// Drop the baseline so the next frame scores 0.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    pub fn has_baseline(&self) -> bool {
        self.previous.is_some()
    }

    fn downsample(&self, frame: &RasterFrame) -> Option<RgbaImage> {
        let Some(view) = ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(
            frame.width(),
            frame.height(),
            frame.as_bytes(),
        ) else {
            warn!(
                width = frame.width(),
                height = frame.height(),
                "frame buffer does not match its dimensions"
            );
            return None;
        };
        Some(imageops::resize(
            &view,
            self.sample_size,
            self.sample_size,
            FilterType::Triangle,
        ))
    }
}

fn mean_abs_difference(previous: &[u8], current: &[u8]) -> f64 {
    let (sum, samples) = previous
        .iter()
        .step_by(SAMPLE_STRIDE)
        .zip(current.iter().step_by(SAMPLE_STRIDE))
        .fold((0u64, 0u64), |(sum, n), (&a, &b)| {
            (sum + u64::from(a.abs_diff(b)), n + 1)
        });

    if samples == 0 {
        0.0
    } else {
        sum as f64 / samples as f64
    }
}
