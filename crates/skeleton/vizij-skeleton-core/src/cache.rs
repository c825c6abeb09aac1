//! Per-tick joint activity cache and its lifecycle.
//!
//! Joint control is resolved by walking up to the root, so answers are memoized
//! per joint. The cache is cleared at the start of every controller tick.

use hashbrown::HashMap;

use crate::config::Config;
use crate::ids::JointId;

#[derive(Debug, Default, Clone)]
pub struct JointActivityCache {
    controlled: HashMap<JointId, bool>,
}

impl JointActivityCache {
    pub fn new(cfg: &Config) -> Self {
        Self {
            controlled: HashMap::with_capacity(cfg.joint_cache_capacity),
        }
    }

    /// Drop every cached answer. Called once per tick before any query.
    #[inline]
    pub fn begin_tick(&mut self) {
        self.controlled.clear();
    }

    #[inline]
    pub fn get(&self, joint: JointId) -> Option<bool> {
        self.controlled.get(&joint).copied()
    }

    #[inline]
    pub fn insert(&mut self, joint: JointId, controlled: bool) {
        self.controlled.insert(joint, controlled);
    }

    pub fn len(&self) -> usize {
        self.controlled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controlled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_tick_forgets_cached_answers() {
        let mut cache = JointActivityCache::new(&Config::default());
        cache.insert(JointId(2), true);
        assert_eq!(cache.get(JointId(2)), Some(true));
        cache.begin_tick();
        assert!(cache.is_empty());
        assert_eq!(cache.get(JointId(2)), None);
    }
}
