//! Identifiers and simple allocators for core entities.

use serde::{Deserialize, Serialize};

/// Index of a joint inside a skeleton. Joints are addressed by their position
/// in the skeleton's joint list.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct JointId(pub u32);

impl JointId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for JointId {
    fn from(idx: usize) -> Self {
        JointId(idx as u32)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ClipId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct StateId(pub u32);

impl StateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Monotonic allocator for ClipId and StateId.
/// Dense indices keep lookups a plain slice index; IDs are opaque externally.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_clip: u32,
    next_state: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_clip(&mut self) -> ClipId {
        let id = ClipId(self.next_clip);
        self.next_clip = self.next_clip.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_state(&mut self) -> StateId {
        let id = StateId(self.next_state);
        self.next_state = self.next_state.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
