//! Animation clips as consumed by the playback channel, and the library that owns them.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::error::ClipError;
use crate::ids::{ClipId, IdAllocator, JointId};
use crate::transform::JointTransform;

/// A time-parameterized source of per-joint transforms with a fixed total duration.
///
/// Implementations must be immutable once handed to a [`ClipLibrary`]; controllers
/// share them across threads behind `Arc`.
pub trait AnimationClip: Send + Sync {
    fn name(&self) -> &str;

    /// Total duration in seconds.
    fn duration(&self) -> f32;

    /// Local (parent-relative) transform of `joint` at `time` seconds into the clip.
    fn sample(&self, joint: JointId, time: f32) -> JointTransform;
}

/// Shared handle to a clip.
pub type ClipHandle = Arc<dyn AnimationClip>;

/// Owns every clip a set of state machines can reference.
#[derive(Default)]
pub struct ClipLibrary {
    ids: IdAllocator,
    items: Vec<(ClipId, ClipHandle)>,
    by_name: HashMap<String, ClipId>,
}

impl fmt::Debug for ClipLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipLibrary")
            .field("clips", &self.by_name)
            .finish()
    }
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip under its own name. Names must be unique.
    pub fn insert<C: AnimationClip + 'static>(&mut self, clip: C) -> Result<ClipId, ClipError> {
        self.insert_shared(Arc::new(clip))
    }

    pub fn insert_shared(&mut self, clip: ClipHandle) -> Result<ClipId, ClipError> {
        let name = clip.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(ClipError::DuplicateClip { name });
        }
        let id = self.ids.alloc_clip();
        log::debug!("clip library: registered '{}' as {:?}", name, id);
        self.items.push((id, clip));
        self.by_name.insert(name, id);
        Ok(id)
    }

    pub fn get(&self, id: ClipId) -> Option<&ClipHandle> {
        self.items
            .iter()
            .find_map(|(c, clip)| if *c == id { Some(clip) } else { None })
    }

    pub fn id_of(&self, name: &str) -> Option<ClipId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClipId, &ClipHandle)> {
        self.items.iter().map(|(id, clip)| (*id, clip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Still(&'static str);

    impl AnimationClip for Still {
        fn name(&self) -> &str {
            self.0
        }
        fn duration(&self) -> f32 {
            1.0
        }
        fn sample(&self, _joint: JointId, _time: f32) -> JointTransform {
            JointTransform::IDENTITY
        }
    }

    #[test]
    fn names_resolve_to_allocated_ids() {
        let mut lib = ClipLibrary::new();
        let idle = lib.insert(Still("idle")).expect("insert idle");
        let walk = lib.insert(Still("walk")).expect("insert walk");
        assert_ne!(idle, walk);
        assert_eq!(lib.id_of("walk"), Some(walk));
        assert_eq!(lib.get(idle).map(|c| c.name()), Some("idle"));
        assert_eq!(lib.len(), 2);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut lib = ClipLibrary::new();
        lib.insert(Still("idle")).expect("first insert");
        let err = lib.insert(Still("idle")).unwrap_err();
        assert_eq!(
            err,
            ClipError::DuplicateClip {
                name: "idle".into()
            }
        );
    }
}
