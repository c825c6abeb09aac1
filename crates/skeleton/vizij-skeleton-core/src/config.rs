//! Core configuration for vizij-skeleton-core.

use serde::{Deserialize, Serialize};

/// Configuration for state-machine controllers.
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial capacity hint for the per-tick joint activity cache.
    pub joint_cache_capacity: usize,

    /// Log unmatched `request_transition` calls at warn level instead of debug.
    pub warn_on_unmatched_transition: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            joint_cache_capacity: 64,
            warn_on_unmatched_transition: false,
        }
    }
}
