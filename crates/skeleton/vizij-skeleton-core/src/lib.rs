//! Vizij Skeleton Core (engine-agnostic)
//!
//! Skeletal animation state machines. A [`StateMachineController`] owns the active
//! state of a [`StateMachineDescription`], drives a dual-layer [`ChannelManager`]
//! that cross-fades clips, and evaluates the joints under its top-level joints.
//! A [`SkeletonRuntime`] layers several controllers over one [`Skeleton`].

pub mod cache;
pub mod channel;
pub mod clip;
pub mod config;
pub mod controller;
pub mod description;
pub mod error;
pub mod ids;
pub mod keyframe;
pub mod runtime;
pub mod skeleton;
pub mod transform;

// Re-exports for consumers (adapters)
pub use cache::JointActivityCache;
pub use channel::{ChannelManager, FadingLayer};
pub use clip::{AnimationClip, ClipHandle, ClipLibrary};
pub use config::Config;
pub use controller::{ChannelController, StateMachineController};
pub use description::{
    parse_state_machine_json, AnimationState, DescriptionBuilder, StateMachineDescription,
    StateMachineDoc, StateMotion, TransitionInfo, TransitionSource,
};
pub use error::{ChannelError, ClipError, ControllerError, DescriptionError, SkeletonError};
pub use ids::{ClipId, IdAllocator, JointId, StateId};
pub use keyframe::{parse_keyframe_clip_json, JointKey, JointTrack, KeyframeClip};
pub use runtime::SkeletonRuntime;
pub use skeleton::{JointHierarchy, JointInfo, SkeletalJoint, Skeleton};
pub use transform::JointTransform;
