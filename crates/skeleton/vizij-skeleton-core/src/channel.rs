//! Playback channel: one clip playing at a time while the previously playing clip
//! cross-fades out underneath it.
//!
//! Scenarios handled:
//! 1. Repeating the same clip, with a cross-fade across the loop seam.
//! 2. Transitioning from one clip to another (or to nothing) over a blend window.
//!
//! At most two layers are live. Starting a new clip with a blend window promotes the
//! current layer to `previous`; a previous layer that was still fading is dropped.

use std::fmt;

use crate::clip::ClipHandle;
use crate::error::ChannelError;
use crate::ids::JointId;
use crate::transform::JointTransform;

/// A layer that is fading out underneath the current one.
#[derive(Clone)]
pub struct FadingLayer {
    pub clip: ClipHandle,
    /// Local clip time in seconds. Keeps running past the clip end until `timeout`.
    pub time: f32,
    /// Local time at which the layer no longer contributes.
    pub timeout: f32,
}

impl FadingLayer {
    /// Sample time clamped so the clip is never read past its end.
    #[inline]
    fn sample_time(&self) -> f32 {
        self.time.min(self.clip.duration())
    }
}

impl fmt::Debug for FadingLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FadingLayer")
            .field("clip", &self.clip.name())
            .field("time", &self.time)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Dual-layer (current/previous) clip playback with cross-fade evaluation.
#[derive(Clone, Default)]
pub struct ChannelManager {
    current: Option<ClipHandle>,
    /// Current layer time. Also serves as the fade-in clock after the current layer
    /// is cleared, until `transition_time` is reached.
    curr_t: f32,
    previous: Option<FadingLayer>,
    transition_time: f32,
    repeat: bool,
}

impl fmt::Debug for ChannelManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelManager")
            .field("current", &self.current.as_ref().map(|c| c.name()))
            .field("curr_t", &self.curr_t)
            .field("previous", &self.previous)
            .field("transition_time", &self.transition_time)
            .field("repeat", &self.repeat)
            .finish()
    }
}

impl ChannelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `clip` as the current layer (`None` plays nothing and fades to rest).
    ///
    /// With a zero `transition_time` any previous layer is dropped and the new clip
    /// takes over immediately. Otherwise the current layer (if any) becomes the
    /// previous layer and fades out over `transition_time` seconds.
    pub fn play_animation(&mut self, clip: Option<ClipHandle>, repeat: bool, transition_time: f32) {
        let transition_time = transition_time.max(0.0);
        if transition_time == 0.0 {
            self.previous = None;
        } else {
            if let Some(curr) = self.current.take() {
                if let Some(dropped) = &self.previous {
                    log::trace!(
                        "channel: dropping fading layer '{}' at t={}",
                        dropped.clip.name(),
                        dropped.time
                    );
                }
                self.previous = Some(FadingLayer {
                    clip: curr,
                    time: self.curr_t,
                    timeout: 0.0,
                });
            }
            if let Some(prev) = self.previous.as_mut() {
                prev.timeout = prev.time + transition_time;
            }
        }

        log::debug!(
            "channel: play {:?} (repeat={}, transition={}s)",
            clip.as_ref().map(|c| c.name()),
            repeat,
            transition_time
        );
        self.current = clip;
        self.curr_t = 0.0;
        self.repeat = repeat;
        self.transition_time = transition_time;
    }

    /// Advance both layers by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if let Some(prev) = self.previous.as_mut() {
            prev.time += dt;
            if prev.time >= prev.timeout {
                log::trace!("channel: previous layer '{}' faded out", prev.clip.name());
                self.previous = None;
            }
        }

        if let Some(duration) = self.current.as_ref().map(|c| c.duration()) {
            self.curr_t += dt;
            if self.repeat {
                if self.curr_t >= duration - self.transition_time {
                    let clip = self.current.clone();
                    self.play_animation(clip, true, self.transition_time);
                }
            } else {
                if self.curr_t >= self.transition_time {
                    self.transition_time = 0.0;
                }
                if self.curr_t >= duration {
                    log::trace!("channel: current layer finished");
                    self.current = None;
                    self.curr_t = 0.0;
                }
            }
        } else if self.curr_t < self.transition_time {
            // Keep the fade-in clock running so the inter-channel fade has a ratio to read.
            self.curr_t += dt;
        }
    }

    /// Previous→current blend ratio in effect while both layers are live.
    pub fn fade_in_ratio(&self) -> f32 {
        if self.transition_time <= 0.0 {
            return 1.0;
        }
        (self.curr_t / self.transition_time).clamp(0.0, 1.0)
    }

    /// Blended local transform of `joint`.
    ///
    /// Fails with [`ChannelError::InactiveChannel`] when neither layer is playing.
    pub fn compute_joint_frame(&self, joint: JointId) -> Result<JointTransform, ChannelError> {
        match (&self.current, &self.previous) {
            (Some(curr), Some(prev)) => {
                let loc = curr.sample(joint, self.curr_t);
                let prev_loc = prev.clip.sample(joint, prev.sample_time());
                Ok(JointTransform::interpolate(&prev_loc, &loc, self.fade_in_ratio()))
            }
            (Some(curr), None) => Ok(curr.sample(joint, self.curr_t)),
            // Tail of a fade to nothing: the clip decides how it holds past its end.
            (None, Some(prev)) => Ok(prev.clip.sample(joint, prev.time)),
            (None, None) => Err(ChannelError::InactiveChannel { joint }),
        }
    }

    /// Time left on the current layer, else on the previous layer, else 0. Never negative.
    pub fn time_remaining(&self) -> f32 {
        if let Some(curr) = &self.current {
            (curr.duration() - self.curr_t).max(0.0)
        } else if let Some(prev) = &self.previous {
            (prev.clip.duration() - prev.time).max(0.0)
        } else {
            0.0
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.current.is_some() || self.previous.is_some()
    }

    /// True while a non-repeating channel has no current layer but is still inside
    /// its transition window.
    #[inline]
    pub fn is_fading_out(&self) -> bool {
        if self.repeat {
            return false;
        }
        self.current.is_none() && self.curr_t < self.transition_time
    }

    #[inline]
    pub fn transition_time(&self) -> f32 {
        self.transition_time
    }

    #[inline]
    pub fn current_time(&self) -> f32 {
        self.curr_t
    }

    /// Local time of the previous layer, 0 when there is none.
    #[inline]
    pub fn previous_time(&self) -> f32 {
        self.previous.as_ref().map_or(0.0, |p| p.time)
    }

    #[inline]
    pub fn is_repeating(&self) -> bool {
        self.repeat
    }

    pub fn current_clip(&self) -> Option<&ClipHandle> {
        self.current.as_ref()
    }

    pub fn previous_layer(&self) -> Option<&FadingLayer> {
        self.previous.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::keyframe::{JointKey, KeyframeClip};

    fn ramp(name: &str, duration: f32) -> ClipHandle {
        Arc::new(KeyframeClip::new(name, duration).with_track(
            JointId(0),
            vec![
                JointKey::new(0.0, JointTransform::from_translation([0.0, 0.0, 0.0])),
                JointKey::new(duration, JointTransform::from_translation([duration, 0.0, 0.0])),
            ],
        ))
    }

    #[test]
    fn idle_channel_is_inactive() {
        let ch = ChannelManager::default();
        assert!(!ch.is_active());
        assert!(!ch.is_fading_out());
        assert_eq!(ch.time_remaining(), 0.0);
    }

    #[test]
    fn zero_transition_drops_previous_layer() {
        let mut ch = ChannelManager::default();
        ch.play_animation(Some(ramp("a", 2.0)), false, 0.0);
        ch.play_animation(Some(ramp("b", 2.0)), false, 0.5);
        assert!(ch.previous_layer().is_some());
        ch.play_animation(Some(ramp("c", 2.0)), false, 0.0);
        assert!(ch.previous_layer().is_none());
        assert_eq!(ch.current_clip().map(|c| c.name()), Some("c"));
    }

    #[test]
    fn third_layer_replaces_fading_previous() {
        let mut ch = ChannelManager::default();
        ch.play_animation(Some(ramp("a", 2.0)), false, 0.0);
        ch.play_animation(Some(ramp("b", 2.0)), false, 1.0);
        ch.update(0.25);
        ch.play_animation(Some(ramp("c", 2.0)), false, 1.0);
        let prev = ch.previous_layer().expect("previous layer");
        assert_eq!(prev.clip.name(), "b");
        assert_abs_diff_eq!(prev.time, 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(prev.timeout, 1.25, epsilon = 1e-6);
    }

    #[test]
    fn non_repeating_clip_expires_at_its_end() {
        let mut ch = ChannelManager::default();
        ch.play_animation(Some(ramp("a", 1.0)), false, 0.0);
        ch.update(0.6);
        assert!(ch.is_active());
        ch.update(0.6);
        assert!(!ch.is_active());
        assert_eq!(ch.current_time(), 0.0);
    }

    #[test]
    fn fade_ratio_without_window_is_full() {
        let mut ch = ChannelManager::default();
        ch.play_animation(Some(ramp("a", 1.0)), false, 0.0);
        assert_eq!(ch.fade_in_ratio(), 1.0);
    }
}
