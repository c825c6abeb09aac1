//! Error types for clips, descriptions, channels and controllers.

use crate::ids::JointId;

/// Errors raised by the playback channel.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    /// A joint frame was requested while neither the current nor the previous
    /// layer is playing. Callers must check `is_active` first.
    #[error("attempted to compute a joint frame for joint {joint:?} from an inactive channel")]
    InactiveChannel { joint: JointId },
}

/// Errors raised while validating or loading clip data.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ClipError {
    #[error("clip '{clip}' must have a finite duration > 0 (got {duration})")]
    InvalidDuration { clip: String, duration: f32 },

    #[error("clip '{clip}': key times for joint {joint:?} must be finite and within [0, duration]")]
    KeyOutOfRange { clip: String, joint: JointId },

    #[error("clip '{clip}': key times for joint {joint:?} must be non-decreasing")]
    KeysNotSorted { clip: String, joint: JointId },

    #[error("clip '{clip}' has more than one track for joint {joint:?}")]
    DuplicateTrack { clip: String, joint: JointId },

    #[error("a clip named '{name}' is already registered")]
    DuplicateClip { name: String },

    #[error("clip parse error: {reason}")]
    Parse { reason: String },
}

/// Errors raised while building or resolving a state machine description.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DescriptionError {
    #[error("no default state is specified")]
    NoDefaultState,

    #[error("more than one default state is specified: {names:?}")]
    MultipleDefaultStates { names: Vec<String> },

    #[error("state '{name}' is declared more than once")]
    DuplicateState { name: String },

    #[error("unknown state '{name}'")]
    UnknownState { name: String },

    #[error("state '{state}' references unknown clip '{clip}'")]
    UnknownClip { state: String, clip: String },

    #[error("transition to '{target}' has an invalid duration {duration}")]
    InvalidDuration { target: String, duration: f32 },

    #[error("state machine parse error: {reason}")]
    Parse { reason: String },
}

/// Errors surfaced by the skeleton and the joint hierarchy.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SkeletonError {
    #[error("joint {joint:?} lists parent {parent:?}, which is not declared before it")]
    ParentOutOfOrder { joint: JointId, parent: JointId },

    #[error("joint {joint:?} does not exist in this skeleton")]
    UnknownJoint { joint: JointId },
}

/// Errors surfaced by the state machine controller and the skeleton runtime.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ControllerError {
    #[error(transparent)]
    Description(#[from] DescriptionError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Skeleton(#[from] SkeletonError),
}

impl ControllerError {
    /// Configuration and protocol errors are programmer mistakes; only a lookup
    /// of an unknown state name at runtime may be retried with a valid name.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Description(DescriptionError::UnknownState { .. })
        )
    }

    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Description(DescriptionError::UnknownState { .. }) => "lookup",
            Self::Description(_) => "configuration",
            Self::Channel(_) => "protocol",
            Self::Skeleton(_) => "skeleton",
        }
    }
}
