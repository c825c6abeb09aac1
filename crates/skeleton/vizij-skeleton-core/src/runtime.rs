//! Skeleton runtime: a skeleton plus an ordered stack of channel controllers.
//!
//! Controllers later in the stack take priority. Per frame, joints are evaluated
//! root-to-leaf; each joint takes the location from the highest-priority controller
//! active on it, blended by that controller's inter-channel fade intensity over the
//! next active controller below it, or over the bind pose when none is left.

use crate::controller::{ChannelController, StateMachineController};
use crate::error::ControllerError;
use crate::ids::JointId;
use crate::skeleton::{JointHierarchy, Skeleton};
use crate::transform::JointTransform;

#[derive(Debug)]
pub struct SkeletonRuntime<C: ChannelController = StateMachineController> {
    skeleton: Skeleton,
    controllers: Vec<C>,
}

impl<C: ChannelController> SkeletonRuntime<C> {
    pub fn new(skeleton: Skeleton) -> Self {
        Self {
            skeleton,
            controllers: Vec::new(),
        }
    }

    /// Push a controller on top of the stack and return its index.
    pub fn add_controller(&mut self, controller: C) -> usize {
        self.controllers.push(controller);
        self.controllers.len() - 1
    }

    pub fn controller(&self, idx: usize) -> Option<&C> {
        self.controllers.get(idx)
    }

    pub fn controller_mut(&mut self, idx: usize) -> Option<&mut C> {
        self.controllers.get_mut(idx)
    }

    pub fn controllers(&self) -> &[C] {
        &self.controllers
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn joint_location(&self, joint: JointId) -> Option<JointTransform> {
        self.skeleton.current_location(joint).ok()
    }

    /// Advance every controller by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        for c in &mut self.controllers {
            c.update(dt);
        }
    }

    /// Recompute every joint's current location from the controller stack.
    pub fn evaluate(&mut self) -> Result<(), ControllerError> {
        let Self {
            skeleton,
            controllers,
        } = self;
        let count = controllers.len();
        for idx in 0..skeleton.len() {
            let joint = JointId::from(idx);
            let location = evaluate_joint(controllers, skeleton, joint, count)?;
            skeleton.set_current_location(joint, location)?;
        }
        Ok(())
    }

    /// `update` then `evaluate`.
    pub fn step(&mut self, dt: f32) -> Result<(), ControllerError> {
        self.update(dt);
        self.evaluate()
    }
}

/// Location of `joint` from the controllers below index `below`.
fn evaluate_joint<C: ChannelController>(
    controllers: &mut [C],
    skeleton: &mut Skeleton,
    joint: JointId,
    below: usize,
) -> Result<JointTransform, ControllerError> {
    let top = (0..below)
        .rev()
        .find(|&idx| controllers[idx].is_active(joint, &*skeleton));

    let Some(idx) = top else {
        return Ok(skeleton.rest_location(joint)?);
    };

    controllers[idx].compute_joint_location(joint, &mut *skeleton)?;
    let location = skeleton.current_location(joint)?;
    let intensity = controllers[idx].inter_channel_fade_intensity();
    if intensity >= 1.0 {
        return Ok(location);
    }
    let base = evaluate_joint(controllers, skeleton, joint, idx)?;
    Ok(JointTransform::interpolate(&base, &location, intensity.max(0.0)))
}
