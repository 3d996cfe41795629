//! Per-frame input types delivered by a frame source.
//!
//! A frame carries at most a handful of detected hands (normalized landmark
//! sets from the vision model) and, optionally, the raw RGBA raster used by the
//! motion detector while the pipeline is suspended.

use serde::{Deserialize, Serialize};

/// Number of landmarks in a hand pose.
pub const HAND_LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_PIP: usize = 14;
pub const RING_TIP: usize = 16;
pub const PINKY_PIP: usize = 18;
pub const PINKY_TIP: usize = 20;

/// A single landmark in normalized image coordinates.
///
/// `x` grows to the right and `y` grows downward, both in `[0, 1]`.
/// `z` is carried through but never read by the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar distance, ignoring depth.
    pub fn distance(&self, other: &LandmarkPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One detected hand: exactly 21 landmarks in anatomical order.
#[derive(Debug, Clone, PartialEq)]
pub struct HandPose {
    points: [LandmarkPoint; HAND_LANDMARK_COUNT],
}

impl HandPose {
    pub fn new(points: [LandmarkPoint; HAND_LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build a pose from a slice, rejecting anything that is not 21 points long.
    pub fn from_points(points: &[LandmarkPoint]) -> Result<Self, InputError> {
        let points: [LandmarkPoint; HAND_LANDMARK_COUNT] =
            points
                .try_into()
                .map_err(|_| InputError::WrongLandmarkCount {
                    expected: HAND_LANDMARK_COUNT,
                    found: points.len(),
                })?;
        Ok(Self { points })
    }

    /// Build a pose from `[x, y, z]` triples as written by recorders.
    pub fn from_triples(triples: &[[f64; 3]]) -> Result<Self, InputError> {
        let points: Vec<LandmarkPoint> = triples
            .iter()
            .map(|[x, y, z]| LandmarkPoint::new(*x, *y, *z))
            .collect();
        Self::from_points(&points)
    }

    pub fn point(&self, index: usize) -> &LandmarkPoint {
        &self.points[index]
    }

    pub fn points(&self) -> &[LandmarkPoint; HAND_LANDMARK_COUNT] {
        &self.points
    }

    /// Shift every landmark by the same offset.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let mut points = self.points;
        for p in points.iter_mut() {
            p.x += dx;
            p.y += dy;
        }
        Self { points }
    }

    fn to_triples(&self) -> Vec<[f64; 3]> {
        self.points.iter().map(|p| [p.x, p.y, p.z]).collect()
    }
}

/// An RGBA8 raster frame.
///
/// The buffer length is checked on construction, so a `RasterFrame` always
/// holds exactly `width * height * 4` bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RasterFrameRecord", into = "RasterFrameRecord")]
pub struct RasterFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterFrame {
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, InputError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || data.len() != expected {
            return Err(InputError::FrameSizeMismatch {
                width,
                height,
                found: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A frame where every channel of every pixel holds `value` (alpha stays opaque).
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let mut data = vec![value; width as usize * height as usize * 4];
        for px in data.chunks_mut(4) {
            px[3] = 255;
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Wire form of a raster frame, validated into [`RasterFrame`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RasterFrameRecord {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl TryFrom<RasterFrameRecord> for RasterFrame {
    type Error = InputError;

    fn try_from(record: RasterFrameRecord) -> Result<Self, Self::Error> {
        RasterFrame::from_rgba(record.width, record.height, record.data)
    }
}

impl From<RasterFrame> for RasterFrameRecord {
    fn from(frame: RasterFrame) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            data: frame.data,
        }
    }
}

/// Everything the pipeline consumes for one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Hands reported by the landmark model, most confident first
    pub hands: Vec<HandPose>,
    /// Raster for motion scoring; sources may omit it while recognition is active
    pub frame: Option<RasterFrame>,
}

impl FrameInput {
    pub fn with_hand(pose: HandPose) -> Self {
        Self {
            hands: vec![pose],
            frame: None,
        }
    }

    pub fn with_frame(frame: RasterFrame) -> Self {
        Self {
            hands: Vec::new(),
            frame: Some(frame),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Only the first reported hand is ever classified.
    pub fn primary_hand(&self) -> Option<&HandPose> {
        self.hands.first()
    }
}

/// One recorded frame as stored in a JSON Lines capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSample {
    /// Offset from the start of the capture
    pub timestamp_ms: u64,
    /// Landmark sets as `[x, y, z]` triples
    #[serde(default)]
    pub hands: Vec<Vec<[f64; 3]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<RasterFrame>,
}

impl FrameSample {
    pub fn from_input(timestamp_ms: u64, input: &FrameInput) -> Self {
        Self {
            timestamp_ms,
            hands: input.hands.iter().map(HandPose::to_triples).collect(),
            frame: input.frame.clone(),
        }
    }

    /// Check every hand carries a full landmark set without converting.
    pub fn validate(&self) -> Result<(), InputError> {
        match self
            .hands
            .iter()
            .find(|triples| triples.len() != HAND_LANDMARK_COUNT)
        {
            Some(triples) => Err(InputError::WrongLandmarkCount {
                expected: HAND_LANDMARK_COUNT,
                found: triples.len(),
            }),
            None => Ok(()),
        }
    }

    pub fn into_input(self) -> Result<FrameInput, InputError> {
        let hands = self
            .hands
            .iter()
            .map(|triples| HandPose::from_triples(triples))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FrameInput {
            hands,
            frame: self.frame,
        })
    }
}

/// Malformed per-frame input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    WrongLandmarkCount { expected: usize, found: usize },
    FrameSizeMismatch { width: u32, height: u32, found: usize },
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::WrongLandmarkCount { expected, found } => {
                write!(f, "Hand pose needs {expected} landmarks, got {found}")
            }
            InputError::FrameSizeMismatch {
                width,
                height,
                found,
            } => write!(
                f,
                "Frame {width}x{height} needs {} RGBA bytes, got {found}",
                *width as usize * *height as usize * 4
            ),
        }
    }
}

impl std::error::Error for InputError {}
