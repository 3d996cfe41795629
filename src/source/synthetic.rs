//! Synthetic hand poses.
//!
//! Builds upright, right-way-up hands with chosen fingers extended, for demo
//! captures and tests. Coordinates follow image convention (y grows downward).

use crate::source::types::{HandPose, LandmarkPoint, HAND_LANDMARK_COUNT};

const WRIST_AT: (f64, f64) = (0.50, 0.90);
const THUMB_CMC_AT: (f64, f64) = (0.45, 0.85);
const THUMB_MCP_AT: (f64, f64) = (0.42, 0.80);
const THUMB_EXTENDED_TIP: (f64, f64) = (0.25, 0.72);
const THUMB_TUCKED_TIP: (f64, f64) = (0.47, 0.70);

/// Knuckle (MCP) positions for index, middle, ring and pinky.
const FINGER_MCPS: [(f64, f64); 4] = [(0.45, 0.65), (0.50, 0.64), (0.55, 0.65), (0.60, 0.68)];

/// Builder for a single synthetic hand.
#[derive(Debug, Clone, Default)]
pub struct PoseBuilder {
    thumb: bool,
    fingers: [bool; 4],
    index_lean: f64,
    thumb_tip: Option<(f64, f64)>,
    offset: (f64, f64),
}

impl PoseBuilder {
    /// A hand with every finger curled.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thumb(mut self, extended: bool) -> Self {
        self.thumb = extended;
        self
    }

    pub fn index(mut self, extended: bool) -> Self {
        self.fingers[0] = extended;
        self
    }

    pub fn middle(mut self, extended: bool) -> Self {
        self.fingers[1] = extended;
        self
    }

    pub fn ring(mut self, extended: bool) -> Self {
        self.fingers[2] = extended;
        self
    }

    pub fn pinky(mut self, extended: bool) -> Self {
        self.fingers[3] = extended;
        self
    }

    pub fn all(self, extended: bool) -> Self {
        self.thumb(extended)
            .index(extended)
            .middle(extended)
            .ring(extended)
            .pinky(extended)
    }

    /// Horizontal offset of an extended index tip from its knuckle.
    pub fn index_lean(mut self, dx: f64) -> Self {
        self.index_lean = dx;
        self
    }

    /// Place the thumb tip explicitly.
    pub fn thumb_tip(mut self, x: f64, y: f64) -> Self {
        self.thumb_tip = Some((x, y));
        self
    }

    /// Shift the whole hand.
    pub fn offset(mut self, dx: f64, dy: f64) -> Self {
        self.offset = (dx, dy);
        self
    }

    pub fn build(&self) -> HandPose {
        let mut points = [LandmarkPoint::default(); HAND_LANDMARK_COUNT];
        let (ox, oy) = self.offset;
        let at = |(x, y): (f64, f64)| LandmarkPoint::new(x + ox, y + oy, 0.0);

        points[0] = at(WRIST_AT);
        points[1] = at(THUMB_CMC_AT);
        points[2] = at(THUMB_MCP_AT);
        let tip = self.thumb_tip.unwrap_or(if self.thumb {
            THUMB_EXTENDED_TIP
        } else {
            THUMB_TUCKED_TIP
        });
        points[3] = at(midpoint(THUMB_MCP_AT, tip));
        points[4] = at(tip);

        for (finger, &(mx, my)) in FINGER_MCPS.iter().enumerate() {
            let base = 5 + finger * 4;
            let pip = (mx, my - 0.10);
            let lean = if finger == 0 { self.index_lean } else { 0.0 };
            let (dip, tip) = if self.fingers[finger] {
                ((mx + lean / 2.0, pip.1 - 0.07), (mx + lean, pip.1 - 0.15))
            } else {
                ((mx, pip.1 + 0.02), (mx, pip.1 + 0.05))
            };
            points[base] = at((mx, my));
            points[base + 1] = at(pip);
            points[base + 2] = at(dip);
            points[base + 3] = at(tip);
        }

        HandPose::new(points)
    }
}

fn midpoint(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

pub fn open_palm() -> HandPose {
    PoseBuilder::new().all(true).build()
}

pub fn fist() -> HandPose {
    PoseBuilder::new().build()
}

/// Thumb and curled index touching, the other three fingers up.
pub fn ok_sign() -> HandPose {
    PoseBuilder::new()
        .middle(true)
        .ring(true)
        .pinky(true)
        .thumb_tip(0.47, 0.61)
        .build()
}

/// Index finger up, tip leaning `dx` from its knuckle in image coordinates.
pub fn point_index(dx: f64) -> HandPose {
    PoseBuilder::new().index(true).index_lean(dx).build()
}

/// Thumb out sideways, tip `dx` from its base in image coordinates.
pub fn point_thumb(dx: f64) -> HandPose {
    PoseBuilder::new()
        .thumb(true)
        .thumb_tip(THUMB_CMC_AT.0 + dx, 0.72)
        .build()
}

pub fn three_fingers() -> HandPose {
    PoseBuilder::new().index(true).middle(true).ring(true).build()
}

pub fn two_fingers() -> HandPose {
    PoseBuilder::new().index(true).middle(true).build()
}

/// Pinky alone, which matches no gesture.
pub fn pinky_only() -> HandPose {
    PoseBuilder::new().pinky(true).build()
}
