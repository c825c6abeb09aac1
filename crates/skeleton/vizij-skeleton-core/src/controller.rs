//! State machine controller: owns the active state and the inter-channel fade
//! envelope, drives a [`ChannelManager`], and answers per-joint queries.
//!
//! Tick order:
//! - clear the joint activity cache
//! - evaluate automatic transitions (first match only)
//! - advance the channel
//! - integrate the inter-channel intensity
//!
//! Several controllers may drive disjoint joint sets of one skeleton; each is
//! self-contained and shares only the read-only description and clip library.

use std::sync::Arc;

use crate::cache::JointActivityCache;
use crate::channel::ChannelManager;
use crate::clip::{ClipHandle, ClipLibrary};
use crate::config::Config;
use crate::description::{AnimationState, StateMachineDescription, StateMotion, TransitionSource};
use crate::error::{ChannelError, ControllerError};
use crate::ids::{JointId, StateId};
use crate::skeleton::JointHierarchy;
use crate::transform::JointTransform;

/// Contract between a skeleton runtime and anything that animates a subset of its joints.
pub trait ChannelController {
    /// Advance by `dt` seconds.
    fn update(&mut self, dt: f32);

    /// Whether this controller currently drives `joint`.
    fn is_active(&mut self, joint: JointId, hierarchy: &dyn JointHierarchy) -> bool;

    fn is_fading_out(&self, joint: JointId, hierarchy: &dyn JointHierarchy) -> bool;

    /// Write the skeleton-space location of `joint` into `hierarchy`.
    /// The parent's location must already be final for this frame.
    fn compute_joint_location(
        &self,
        joint: JointId,
        hierarchy: &mut dyn JointHierarchy,
    ) -> Result<(), ControllerError>;

    /// Weight of this controller's output when layered over others, in [0, 1].
    fn inter_channel_fade_intensity(&self) -> f32;
}

impl<T: ChannelController + ?Sized> ChannelController for Box<T> {
    fn update(&mut self, dt: f32) {
        (**self).update(dt)
    }

    fn is_active(&mut self, joint: JointId, hierarchy: &dyn JointHierarchy) -> bool {
        (**self).is_active(joint, hierarchy)
    }

    fn is_fading_out(&self, joint: JointId, hierarchy: &dyn JointHierarchy) -> bool {
        (**self).is_fading_out(joint, hierarchy)
    }

    fn compute_joint_location(
        &self,
        joint: JointId,
        hierarchy: &mut dyn JointHierarchy,
    ) -> Result<(), ControllerError> {
        (**self).compute_joint_location(joint, hierarchy)
    }

    fn inter_channel_fade_intensity(&self) -> f32 {
        (**self).inter_channel_fade_intensity()
    }
}

pub struct StateMachineController {
    description: Arc<StateMachineDescription>,
    clips: Arc<ClipLibrary>,
    active_state: StateId,
    top_level_joints: Vec<JointId>,
    joint_cache: JointActivityCache,
    channel: ChannelManager,
    fade_intensity: f32,
    fade_velocity: f32,
    cfg: Config,
}

impl std::fmt::Debug for StateMachineController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachineController")
            .field("active_state", &self.active_state().name)
            .field("top_level_joints", &self.top_level_joints)
            .field("channel", &self.channel)
            .field("fade_intensity", &self.fade_intensity)
            .field("fade_velocity", &self.fade_velocity)
            .finish()
    }
}

impl StateMachineController {
    /// Create a controller with default [`Config`] and activate the default state.
    ///
    /// Fails when the description has no (or more than one) default state, or
    /// references a clip missing from `clips`.
    pub fn new(
        description: Arc<StateMachineDescription>,
        clips: Arc<ClipLibrary>,
        top_level_joints: impl IntoIterator<Item = JointId>,
    ) -> Result<Self, ControllerError> {
        Self::with_config(description, clips, top_level_joints, Config::default())
    }

    pub fn with_config(
        description: Arc<StateMachineDescription>,
        clips: Arc<ClipLibrary>,
        top_level_joints: impl IntoIterator<Item = JointId>,
        cfg: Config,
    ) -> Result<Self, ControllerError> {
        description.validate_clips(&clips)?;
        let default = description.default_state()?.id;

        let mut controller = Self {
            description,
            clips,
            active_state: default,
            top_level_joints: top_level_joints.into_iter().collect(),
            joint_cache: JointActivityCache::new(&cfg),
            channel: ChannelManager::new(),
            fade_intensity: 0.0,
            fade_velocity: 0.0,
            cfg,
        };
        controller.force_state_id(default);
        Ok(controller)
    }

    /// Take the first declared transition into `target` that is valid from the
    /// active state.
    ///
    /// Returns `Ok(false)` and leaves the state unchanged when no edge matches.
    pub fn request_transition(&mut self, target: &str) -> Result<bool, ControllerError> {
        let target_id = self.description.resolve(target)?;
        let active = self.active_state;
        let edge = self
            .description
            .transitions()
            .iter()
            .find(|t| t.target == target_id && t.source.matches(active))
            .map(|t| t.transition_time);

        match edge {
            Some(duration) => {
                self.execute_transition(target_id, duration);
                Ok(true)
            }
            None => {
                let from = self.active_state().name.as_str();
                if self.cfg.warn_on_unmatched_transition {
                    log::warn!("state machine: no transition from '{from}' to '{target}'");
                } else {
                    log::debug!("state machine: no transition from '{from}' to '{target}'");
                }
                Ok(false)
            }
        }
    }

    /// Snap to `target` with no cross-fade.
    pub fn force_state(&mut self, target: &str) -> Result<(), ControllerError> {
        let target_id = self.description.resolve(target)?;
        self.force_state_id(target_id);
        Ok(())
    }

    fn force_state_id(&mut self, target: StateId) {
        self.active_state = target;
        let clip = self.clip_for(target);
        self.fade_intensity = if clip.is_some() { 1.0 } else { 0.0 };
        self.fade_velocity = 0.0;
        log::debug!("state machine: forced '{}'", self.active_state().name);
        self.channel.play_animation(clip, false, 0.0);
    }

    fn execute_transition(&mut self, target: StateId, transition_time: f32) {
        self.active_state = target;
        let clip = self.clip_for(target);
        let goal = if clip.is_some() { 1.0 } else { 0.0 };
        if transition_time > 0.0 {
            self.fade_velocity = (goal - self.fade_intensity) / transition_time;
        } else {
            self.fade_intensity = goal;
            self.fade_velocity = 0.0;
        }
        log::debug!(
            "state machine: transition to '{}' over {}s",
            self.active_state().name,
            transition_time
        );
        self.channel.play_animation(clip, false, transition_time);
    }

    /// Fire the first end-of-animation transition out of the active state if its
    /// window has been reached.
    fn trigger_automatic_transitions(&mut self) {
        let source = TransitionSource::From(self.active_state);
        let Some((target, configured)) = self
            .description
            .transitions()
            .iter()
            .find(|t| t.trigger_on_animation_end && t.source == source)
            .map(|t| (t.target, t.transition_time))
        else {
            return;
        };

        if configured == 0.0 && !self.channel.is_active() {
            self.execute_transition(target, 0.0);
        } else {
            let remaining = self.channel.time_remaining();
            if remaining <= configured {
                // Blend over what is left so the fade ends with the clip.
                self.execute_transition(target, remaining);
            }
        }
    }

    fn clip_for(&self, state: StateId) -> Option<ClipHandle> {
        match self.description.state(state)?.motion {
            StateMotion::Rest => None,
            StateMotion::Clip(id) => self.clips.get(id).cloned(),
        }
    }

    /// Resolve whether `joint` sits under one of the top-level joints, memoized per tick.
    fn joint_is_controlled(&mut self, joint: JointId, hierarchy: &dyn JointHierarchy) -> bool {
        if let Some(controlled) = self.joint_cache.get(joint) {
            return controlled;
        }
        let controlled = match hierarchy.parent(joint) {
            None => self.top_level_joints.contains(&joint),
            Some(parent) => self.joint_is_controlled(parent, hierarchy),
        };
        self.joint_cache.insert(joint, controlled);
        controlled
    }

    /// Parent-relative blended sample of `joint`.
    pub fn joint_frame(&self, joint: JointId) -> Result<JointTransform, ChannelError> {
        self.channel.compute_joint_frame(joint)
    }

    pub fn active_state(&self) -> &AnimationState {
        &self.description[self.active_state]
    }

    #[inline]
    pub fn active_state_id(&self) -> StateId {
        self.active_state
    }

    #[inline]
    pub fn fade_velocity(&self) -> f32 {
        self.fade_velocity
    }

    pub fn channel(&self) -> &ChannelManager {
        &self.channel
    }

    pub fn description(&self) -> &Arc<StateMachineDescription> {
        &self.description
    }

    pub fn top_level_joints(&self) -> &[JointId] {
        &self.top_level_joints
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }
}

impl ChannelController for StateMachineController {
    fn update(&mut self, dt: f32) {
        self.joint_cache.begin_tick();
        self.trigger_automatic_transitions();
        self.channel.update(dt);

        if self.channel.is_active() {
            self.fade_intensity = (self.fade_intensity + self.fade_velocity * dt).clamp(0.0, 1.0);
        } else {
            self.fade_intensity = 0.0;
            self.fade_velocity = 0.0;
        }
        log::trace!(
            "state machine: intensity={} velocity={}",
            self.fade_intensity,
            self.fade_velocity
        );
    }

    fn is_active(&mut self, joint: JointId, hierarchy: &dyn JointHierarchy) -> bool {
        if !self.channel.is_active() {
            return false;
        }
        self.joint_is_controlled(joint, hierarchy)
    }

    fn is_fading_out(&self, _joint: JointId, _hierarchy: &dyn JointHierarchy) -> bool {
        self.channel.is_fading_out()
    }

    fn compute_joint_location(
        &self,
        joint: JointId,
        hierarchy: &mut dyn JointHierarchy,
    ) -> Result<(), ControllerError> {
        let mut location = self.channel.compute_joint_frame(joint)?;
        if let Some(parent) = hierarchy.parent(joint) {
            location.apply_preceding(&hierarchy.current_location(parent)?);
        }
        hierarchy.set_current_location(joint, location)?;
        Ok(())
    }

    #[inline]
    fn inter_channel_fade_intensity(&self) -> f32 {
        self.fade_intensity
    }
}
