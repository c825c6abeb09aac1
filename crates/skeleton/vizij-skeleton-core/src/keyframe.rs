//! Keyframe clip data model and sampling.
//!
//! Model:
//! - A clip has a duration in seconds and one track per animated joint.
//! - Each track holds keys with absolute times in [0, duration], non-decreasing.
//! - Between two keys the joint transform is blended with [`JointTransform::interpolate`];
//!   before the first / after the last key the boundary key is held.
//! - Joints without a track sample as identity (no motion relative to the parent).

use serde::{Deserialize, Serialize};

use crate::clip::AnimationClip;
use crate::error::ClipError;
use crate::ids::JointId;
use crate::transform::{identity_rotation, unit_scale, JointTransform};

/// A single key: a joint transform at an absolute time in seconds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct JointKey {
    pub time: f32,
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
}

impl JointKey {
    pub fn new(time: f32, transform: JointTransform) -> Self {
        Self {
            time,
            translation: transform.translation,
            rotation: transform.rotation,
            scale: transform.scale,
        }
    }

    #[inline]
    pub fn transform(&self) -> JointTransform {
        JointTransform::new(self.translation, self.rotation, self.scale)
    }
}

/// All keys driving one joint.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct JointTrack {
    pub joint: JointId,
    pub keys: Vec<JointKey>,
}

/// A named, fixed-duration clip made of per-joint key tracks.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct KeyframeClip {
    pub name: String,
    /// Duration in seconds.
    pub duration: f32,
    #[serde(default)]
    pub tracks: Vec<JointTrack>,
}

/// Find the keys [i, i+1] that bracket `t` and return (i, i+1, local_t) with
/// local_t normalized between the two key times.
/// Edge cases:
/// - If t <= first.time, returns (0, 0, 0).
/// - If t >= last.time, returns (last, last, 0).
fn find_segment(keys: &[JointKey], t: f32) -> (usize, usize, f32) {
    let n = keys.len();
    if n <= 1 || t <= keys[0].time {
        return (0, 0, 0.0);
    }
    if t >= keys[n - 1].time {
        return (n - 1, n - 1, 0.0);
    }
    // Linear scan (could be optimized to binary search if needed)
    for i in 0..(n - 1) {
        let t0 = keys[i].time;
        let t1 = keys[i + 1].time;
        if t >= t0 && t <= t1 {
            let denom = (t1 - t0).max(f32::EPSILON);
            return (i, i + 1, ((t - t0) / denom).clamp(0.0, 1.0));
        }
    }
    (n - 1, n - 1, 0.0)
}

/// Sample one track at absolute time `t` (seconds).
pub fn sample_joint_track(track: &JointTrack, t: f32) -> JointTransform {
    match track.keys.len() {
        0 => JointTransform::IDENTITY,
        1 => track.keys[0].transform(),
        _ => {
            let (i0, i1, lt) = find_segment(&track.keys, t);
            if i0 == i1 {
                return track.keys[i0].transform();
            }
            JointTransform::interpolate(
                &track.keys[i0].transform(),
                &track.keys[i1].transform(),
                lt,
            )
        }
    }
}

impl KeyframeClip {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
            tracks: Vec::new(),
        }
    }

    /// Builder-style helper: append a track for `joint`.
    pub fn with_track(mut self, joint: JointId, keys: Vec<JointKey>) -> Self {
        self.tracks.push(JointTrack { joint, keys });
        self
    }

    pub fn track(&self, joint: JointId) -> Option<&JointTrack> {
        self.tracks.iter().find(|t| t.joint == joint)
    }

    /// Validate basic invariants (positive duration, in-range and ordered key times,
    /// one track per joint).
    pub fn validate_basic(&self) -> Result<(), ClipError> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(ClipError::InvalidDuration {
                clip: self.name.clone(),
                duration: self.duration,
            });
        }
        for (idx, track) in self.tracks.iter().enumerate() {
            if self.tracks[..idx].iter().any(|t| t.joint == track.joint) {
                return Err(ClipError::DuplicateTrack {
                    clip: self.name.clone(),
                    joint: track.joint,
                });
            }
            let mut last = -f32::INFINITY;
            for key in &track.keys {
                if !key.time.is_finite() || key.time < 0.0 || key.time > self.duration {
                    return Err(ClipError::KeyOutOfRange {
                        clip: self.name.clone(),
                        joint: track.joint,
                    });
                }
                if key.time < last {
                    return Err(ClipError::KeysNotSorted {
                        clip: self.name.clone(),
                        joint: track.joint,
                    });
                }
                last = key.time;
            }
        }
        Ok(())
    }
}

impl AnimationClip for KeyframeClip {
    fn name(&self) -> &str {
        &self.name
    }

    fn duration(&self) -> f32 {
        self.duration
    }

    fn sample(&self, joint: JointId, time: f32) -> JointTransform {
        match self.track(joint) {
            Some(track) => sample_joint_track(track, time.clamp(0.0, self.duration)),
            None => JointTransform::IDENTITY,
        }
    }
}

/// Public API: parse keyframe clip JSON and validate it.
///
/// ```json
/// { "name": "wave", "duration": 1.5,
///   "tracks": [ { "joint": 2, "keys": [ { "time": 0.0, "rotation": [0, 0, 0, 1] } ] } ] }
/// ```
/// Missing `translation`/`rotation`/`scale` on a key default to identity components.
pub fn parse_keyframe_clip_json(s: &str) -> Result<KeyframeClip, ClipError> {
    let clip: KeyframeClip = serde_json::from_str(s).map_err(|e| ClipError::Parse {
        reason: e.to_string(),
    })?;
    clip.validate_basic()?;
    Ok(clip)
}
