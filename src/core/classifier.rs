//! Landmark classifier.
//!
//! Maps one hand pose to a [`Command`] using only relative landmark geometry,
//! so the result does not depend on where the hand sits in the frame. Gesture
//! rules are an ordered table; the first rule that matches wins, which is how
//! poses satisfying several rules are resolved.

use crate::core::command::Command;
use crate::source::types::{
    HandPose, INDEX_MCP, INDEX_PIP, INDEX_TIP, MIDDLE_PIP, MIDDLE_TIP, PINKY_PIP, PINKY_TIP,
    RING_PIP, RING_TIP, THUMB_CMC, THUMB_TIP, WRIST,
};
use serde::{Deserialize, Serialize};

/// Minimum thumb tip distance from the index knuckle for an extended thumb.
const THUMB_KNUCKLE_DISTANCE: f64 = 0.12;

/// Minimum thumb tip distance from the wrist for an extended thumb.
const THUMB_WRIST_DISTANCE: f64 = 0.18;

/// Maximum thumb-to-index tip distance for the OK sign.
const OK_PINCH_DISTANCE: f64 = 0.06;

/// Horizontal displacement below which a pointing finger has no direction.
const POINTING_DEADZONE: f64 = 0.08;

/// Which fingers are extended in a pose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerFlags {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerFlags {
    pub fn from_pose(pose: &HandPose) -> Self {
        Self {
            thumb: thumb_extended(pose),
            index: finger_extended(pose, INDEX_TIP, INDEX_PIP),
            middle: finger_extended(pose, MIDDLE_TIP, MIDDLE_PIP),
            ring: finger_extended(pose, RING_TIP, RING_PIP),
            pinky: finger_extended(pose, PINKY_TIP, PINKY_PIP),
        }
    }

    fn as_array(&self) -> [bool; 5] {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
    }

    pub fn extended_count(&self) -> usize {
        self.as_array().iter().filter(|&&f| f).count()
    }

    pub fn all_extended(&self) -> bool {
        self.as_array().iter().all(|&f| f)
    }

    pub fn none_extended(&self) -> bool {
        !self.as_array().iter().any(|&f| f)
    }
}

impl std::fmt::Display for FingerFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "th={} idx={} mid={} ring={} pinky={}",
            u8::from(self.thumb),
            u8::from(self.index),
            u8::from(self.middle),
            u8::from(self.ring),
            u8::from(self.pinky)
        )
    }
}

/// A finger counts as extended when its tip is above its middle joint.
///
/// Assumes an upright hand in image coordinates.
pub fn finger_extended(pose: &HandPose, tip: usize, pip: usize) -> bool {
    pose.point(tip).y < pose.point(pip).y
}

/// The thumb must clear both the index knuckle and the wrist, so a thumb
/// tucked across the palm is not mistaken for an extended one.
pub fn thumb_extended(pose: &HandPose) -> bool {
    let tip = pose.point(THUMB_TIP);
    tip.distance(pose.point(INDEX_MCP)) > THUMB_KNUCKLE_DISTANCE
        && tip.distance(pose.point(WRIST)) > THUMB_WRIST_DISTANCE
}

/// Horizontal pointing direction as the operator perceives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    fn flipped(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

type RuleFn = fn(&Classifier, &HandPose, &FingerFlags) -> Option<Command>;

/// One entry of the priority-ordered gesture table.
pub struct GestureRule {
    pub name: &'static str,
    matches: RuleFn,
}

/// Gesture rules in priority order.
pub const GESTURE_RULES: &[GestureRule] = &[
    GestureRule {
        name: "open_palm",
        matches: open_palm,
    },
    GestureRule {
        name: "fist",
        matches: fist,
    },
    GestureRule {
        name: "ok_sign",
        matches: ok_sign,
    },
    GestureRule {
        name: "index_pointing",
        matches: index_pointing,
    },
    GestureRule {
        name: "thumb_pointing",
        matches: thumb_pointing,
    },
    GestureRule {
        name: "three_fingers",
        matches: three_fingers,
    },
    GestureRule {
        name: "two_fingers",
        matches: two_fingers,
    },
];

impl GestureRule {
    pub fn evaluate(
        &self,
        classifier: &Classifier,
        pose: &HandPose,
        flags: &FingerFlags,
    ) -> Option<Command> {
        (self.matches)(classifier, pose, flags)
    }
}

fn open_palm(_: &Classifier, _: &HandPose, flags: &FingerFlags) -> Option<Command> {
    flags.all_extended().then_some(Command::Advance)
}

fn fist(_: &Classifier, _: &HandPose, flags: &FingerFlags) -> Option<Command> {
    flags.none_extended().then_some(Command::Retreat)
}

fn ok_sign(_: &Classifier, pose: &HandPose, flags: &FingerFlags) -> Option<Command> {
    let pinched = pose.point(THUMB_TIP).distance(pose.point(INDEX_TIP)) < OK_PINCH_DISTANCE;
    (pinched && (flags.middle || flags.ring || flags.pinky)).then_some(Command::Stop)
}

fn index_pointing(classifier: &Classifier, pose: &HandPose, flags: &FingerFlags) -> Option<Command> {
    if !flags.index || flags.thumb || flags.middle || flags.ring || flags.pinky {
        return None;
    }
    let vx = pose.point(INDEX_TIP).x - pose.point(INDEX_MCP).x;
    classifier.direction(vx).map(|dir| match dir {
        Direction::Right => Command::TurnRight,
        Direction::Left => Command::TurnLeft,
    })
}

fn thumb_pointing(classifier: &Classifier, pose: &HandPose, flags: &FingerFlags) -> Option<Command> {
    if !flags.thumb || flags.index || flags.middle || flags.ring || flags.pinky {
        return None;
    }
    let vx = pose.point(THUMB_TIP).x - pose.point(THUMB_CMC).x;
    classifier.direction(vx).map(|dir| match dir {
        Direction::Right => Command::Rotate90Right,
        Direction::Left => Command::Rotate90Left,
    })
}

fn three_fingers(_: &Classifier, _: &HandPose, flags: &FingerFlags) -> Option<Command> {
    (!flags.thumb && flags.index && flags.middle && flags.ring && !flags.pinky)
        .then_some(Command::Rotate360Right)
}

fn two_fingers(_: &Classifier, _: &HandPose, flags: &FingerFlags) -> Option<Command> {
    (!flags.thumb && flags.index && flags.middle && !flags.ring && !flags.pinky)
        .then_some(Command::Rotate360Left)
}

/// Result of classifying one pose, with the intermediate values kept for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub command: Command,
    pub flags: FingerFlags,
    /// Name of the rule that matched, `None` when nothing did
    pub rule: Option<&'static str>,
}

/// Gesture classifier.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    /// The preview shown to the operator is mirrored, so image-space left is
    /// the operator's right.
    mirrored: bool,
}

impl Default for Classifier {
    fn default() -> Self {
        Self { mirrored: true }
    }
}

impl Classifier {
    pub fn new(mirrored: bool) -> Self {
        Self { mirrored }
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn classify(&self, pose: &HandPose) -> Command {
        self.explain(pose).command
    }

    /// Classify and report which rule fired.
    pub fn explain(&self, pose: &HandPose) -> Classification {
        let flags = FingerFlags::from_pose(pose);
        GESTURE_RULES
            .iter()
            .find_map(|rule| {
                rule.evaluate(self, pose, &flags)
                    .map(|command| Classification {
                        command,
                        flags,
                        rule: Some(rule.name),
                    })
            })
            .unwrap_or(Classification {
                command: Command::Unrecognized,
                flags,
                rule: None,
            })
    }

    /// Direction of a horizontal displacement, or `None` inside the deadzone.
    pub fn direction(&self, vx: f64) -> Option<Direction> {
        if vx.abs() < POINTING_DEADZONE {
            return None;
        }
        let raw = if vx > 0.0 {
            Direction::Right
        } else {
            Direction::Left
        };
        Some(if self.mirrored { raw.flipped() } else { raw })
    }
}

/// Classify with the default (mirrored) classifier.
pub fn classify(pose: &HandPose) -> Command {
    Classifier::default().classify(pose)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::synthetic::{self, PoseBuilder};

    #[test]
    fn test_open_palm_and_fist() {
        assert_eq!(classify(&synthetic::open_palm()), Command::Advance);
        assert_eq!(classify(&synthetic::fist()), Command::Retreat);
    }

    #[test]
    fn test_translation_invariance() {
        let cases = [
            (synthetic::open_palm(), Command::Advance),
            (synthetic::fist(), Command::Retreat),
            (synthetic::ok_sign(), Command::Stop),
            (synthetic::point_index(0.15), Command::TurnLeft),
            (synthetic::three_fingers(), Command::Rotate360Right),
        ];
        for (pose, expected) in cases {
            for (dx, dy) in [(0.0, 0.0), (0.2, -0.1), (-0.3, 0.05), (0.07, 0.07)] {
                assert_eq!(classify(&pose.translated(dx, dy)), expected, "offset ({dx}, {dy})");
            }
        }
    }

    #[test]
    fn test_open_palm_beats_ok_sign() {
        // Every finger up, but thumb tip right next to the index tip.
        let pose = PoseBuilder::new().all(true).thumb_tip(0.43, 0.42).build();
        let flags = FingerFlags::from_pose(&pose);
        assert!(flags.all_extended());
        assert!(pose.point(THUMB_TIP).distance(pose.point(INDEX_TIP)) < OK_PINCH_DISTANCE);

        let result = Classifier::default().explain(&pose);
        assert_eq!(result.command, Command::Advance);
        assert_eq!(result.rule, Some("open_palm"));
    }

    #[test]
    fn test_ok_sign() {
        let result = Classifier::default().explain(&synthetic::ok_sign());
        assert_eq!(result.command, Command::Stop);
        assert_eq!(result.rule, Some("ok_sign"));
    }

    #[test]
    fn test_ok_sign_needs_a_raised_finger() {
        // Pinched, but middle, ring and pinky all curled: reads as a fist.
        let pose = PoseBuilder::new().thumb_tip(0.47, 0.61).build();
        assert_eq!(classify(&pose), Command::Retreat);
    }

    #[test]
    fn test_index_pointing_is_mirrored() {
        assert_eq!(classify(&synthetic::point_index(0.15)), Command::TurnLeft);
        assert_eq!(classify(&synthetic::point_index(-0.15)), Command::TurnRight);

        let unmirrored = Classifier::new(false);
        assert_eq!(unmirrored.classify(&synthetic::point_index(0.15)), Command::TurnRight);
        assert_eq!(unmirrored.classify(&synthetic::point_index(-0.15)), Command::TurnLeft);
    }

    #[test]
    fn test_index_pointing_deadzone_falls_through() {
        let result = Classifier::default().explain(&synthetic::point_index(0.05));
        assert_eq!(result.command, Command::Unrecognized);
        assert_eq!(result.rule, None);
    }

    #[test]
    fn test_thumb_pointing() {
        assert_eq!(classify(&synthetic::point_thumb(-0.2)), Command::Rotate90Right);
        assert_eq!(classify(&synthetic::point_thumb(0.2)), Command::Rotate90Left);
    }

    #[test]
    fn test_thumb_pointing_deadzone() {
        // Thumb clearly extended, but pointing up rather than sideways.
        let pose = PoseBuilder::new().thumb(true).thumb_tip(0.49, 0.45).build();
        assert!(FingerFlags::from_pose(&pose).thumb);
        assert_eq!(classify(&pose), Command::Unrecognized);
    }

    #[test]
    fn test_multi_finger_rotations() {
        assert_eq!(classify(&synthetic::three_fingers()), Command::Rotate360Right);
        assert_eq!(classify(&synthetic::two_fingers()), Command::Rotate360Left);
        // Two fingers plus a thumb is not the two-finger gesture.
        let pose = PoseBuilder::new().thumb(true).index(true).middle(true).build();
        assert_eq!(classify(&pose), Command::Unrecognized);
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(classify(&synthetic::pinky_only()), Command::Unrecognized);
    }

    #[test]
    fn test_tucked_thumb_is_not_extended() {
        let flags = FingerFlags::from_pose(&synthetic::fist());
        assert!(!flags.thumb);
        assert!(flags.none_extended());

        let flags = FingerFlags::from_pose(&synthetic::open_palm());
        assert_eq!(flags.extended_count(), 5);
        assert_eq!(flags.to_string(), "th=1 idx=1 mid=1 ring=1 pinky=1");
    }

    #[test]
    fn test_rule_order() {
        let names: Vec<&str> = GESTURE_RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "open_palm",
                "fist",
                "ok_sign",
                "index_pointing",
                "thumb_pointing",
                "three_fingers",
                "two_fingers"
            ]
        );
    }
}
