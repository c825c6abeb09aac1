//! Joint hierarchy seam and a simple array-backed skeleton.
//!
//! Controllers never own joints. They read the parent topology and the parents'
//! already-evaluated locations through [`JointHierarchy`], and write the joint
//! they are asked to compute back through it.

use serde::{Deserialize, Serialize};

use crate::error::SkeletonError;
use crate::ids::JointId;
use crate::transform::JointTransform;

/// Read/write access to a skeleton's topology and current joint locations.
pub trait JointHierarchy {
    /// Parent of `joint`, `None` for roots and unknown joints.
    fn parent(&self, joint: JointId) -> Option<JointId>;

    /// Skeleton-space location of `joint` as of the last write.
    fn current_location(&self, joint: JointId) -> Result<JointTransform, SkeletonError>;

    fn set_current_location(
        &mut self,
        joint: JointId,
        location: JointTransform,
    ) -> Result<(), SkeletonError>;
}

/// Static description of one joint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointInfo {
    pub name: String,
    #[serde(default)]
    pub parent: Option<JointId>,
    /// Rest pose relative to the parent, used where no controller is active.
    #[serde(default)]
    pub bind_pose: JointTransform,
}

impl JointInfo {
    pub fn new(name: impl Into<String>, parent: Option<JointId>) -> Self {
        Self {
            name: name.into(),
            parent,
            bind_pose: JointTransform::IDENTITY,
        }
    }

    pub fn with_bind_pose(mut self, bind_pose: JointTransform) -> Self {
        self.bind_pose = bind_pose;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SkeletalJoint {
    pub info: JointInfo,
    pub current_location: JointTransform,
}

/// Joints stored parents-first, so index order is a valid root-to-leaf order.
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    joints: Vec<SkeletalJoint>,
}

impl Skeleton {
    /// Build from joint descriptions. Every parent must appear before its children.
    pub fn new(infos: Vec<JointInfo>) -> Result<Self, SkeletonError> {
        let mut joints: Vec<SkeletalJoint> = Vec::with_capacity(infos.len());
        for (idx, info) in infos.into_iter().enumerate() {
            if let Some(parent) = info.parent {
                if parent.index() >= idx {
                    return Err(SkeletonError::ParentOutOfOrder {
                        joint: JointId::from(idx),
                        parent,
                    });
                }
            }
            let current_location = match info.parent {
                Some(p) => info
                    .bind_pose
                    .composed_with(&joints[p.index()].current_location),
                None => info.bind_pose,
            };
            joints.push(SkeletalJoint {
                info,
                current_location,
            });
        }
        Ok(Self { joints })
    }

    /// Convenience: unnamed joints with identity bind poses from a parent list.
    pub fn from_parents(parents: &[Option<u32>]) -> Result<Self, SkeletonError> {
        Self::new(
            parents
                .iter()
                .enumerate()
                .map(|(i, p)| JointInfo::new(format!("joint{i}"), p.map(JointId)))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn joint(&self, id: JointId) -> Option<&SkeletalJoint> {
        self.joints.get(id.index())
    }

    pub fn find(&self, name: &str) -> Option<JointId> {
        self.joints
            .iter()
            .position(|j| j.info.name == name)
            .map(JointId::from)
    }

    /// Joint ids in root-to-leaf order.
    pub fn joint_ids(&self) -> impl Iterator<Item = JointId> {
        (0..self.joints.len()).map(JointId::from)
    }

    /// Bind pose of `joint` composed with its parent's current location.
    pub fn rest_location(&self, joint: JointId) -> Result<JointTransform, SkeletonError> {
        let j = self
            .joint(joint)
            .ok_or(SkeletonError::UnknownJoint { joint })?;
        match j.info.parent {
            Some(p) => Ok(j.info.bind_pose.composed_with(&self.current_location(p)?)),
            None => Ok(j.info.bind_pose),
        }
    }

}

impl JointHierarchy for Skeleton {
    fn parent(&self, joint: JointId) -> Option<JointId> {
        self.joint(joint).and_then(|j| j.info.parent)
    }

    fn current_location(&self, joint: JointId) -> Result<JointTransform, SkeletonError> {
        self.joint(joint)
            .map(|j| j.current_location)
            .ok_or(SkeletonError::UnknownJoint { joint })
    }

    fn set_current_location(
        &mut self,
        joint: JointId,
        location: JointTransform,
    ) -> Result<(), SkeletonError> {
        let j = self
            .joints
            .get_mut(joint.index())
            .ok_or(SkeletonError::UnknownJoint { joint })?;
        j.current_location = location;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn parents_must_precede_children() {
        let err = Skeleton::from_parents(&[None, Some(2), Some(0)]).unwrap_err();
        assert_eq!(
            err,
            SkeletonError::ParentOutOfOrder {
                joint: JointId(1),
                parent: JointId(2)
            }
        );
    }

    #[test]
    fn bind_pose_is_composed_down_the_chain() {
        let skel = Skeleton::new(vec![
            JointInfo::new("root", None)
                .with_bind_pose(JointTransform::from_translation([0.0, 1.0, 0.0])),
            JointInfo::new("spine", Some(JointId(0)))
                .with_bind_pose(JointTransform::from_translation([0.0, 0.5, 0.0])),
        ])
        .expect("skeleton");
        let spine = skel.current_location(JointId(1)).expect("spine");
        assert_abs_diff_eq!(spine.translation[1], 1.5, epsilon = 1e-6);
        assert_eq!(skel.find("spine"), Some(JointId(1)));
        assert_eq!(skel.parent(JointId(1)), Some(JointId(0)));
        assert_eq!(skel.parent(JointId(9)), None);
    }

    #[test]
    fn unknown_joint_is_an_error() {
        let mut skel = Skeleton::from_parents(&[None]).expect("skeleton");
        assert_eq!(
            skel.set_current_location(JointId(4), JointTransform::IDENTITY),
            Err(SkeletonError::UnknownJoint { joint: JointId(4) })
        );
    }
}
