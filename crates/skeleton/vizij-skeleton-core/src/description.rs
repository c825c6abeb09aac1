//! State machine descriptions: named states bound to clips, and ordered transitions.
//!
//! Descriptions are plain data built once (via [`DescriptionBuilder`] or
//! [`parse_state_machine_json`]) and shared read-only between controllers.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::clip::ClipLibrary;
use crate::error::DescriptionError;
use crate::ids::{ClipId, IdAllocator, StateId};

/// What a state plays.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateMotion {
    /// No motion: the state machine fades its contribution out.
    Rest,
    Clip(ClipId),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationState {
    pub id: StateId,
    pub name: String,
    pub motion: StateMotion,
    pub is_default: bool,
}

/// Where a transition may be taken from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionSource {
    /// Matches departure from any active state.
    Any,
    From(StateId),
}

impl TransitionSource {
    #[inline]
    pub fn matches(&self, active: StateId) -> bool {
        match self {
            TransitionSource::Any => true,
            TransitionSource::From(s) => *s == active,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionInfo {
    pub source: TransitionSource,
    pub target: StateId,
    /// Blend window in seconds.
    pub transition_time: f32,
    /// Fire automatically when the source state's animation is about to end.
    pub trigger_on_animation_end: bool,
}

/// Immutable set of states (by name) and transitions (in declaration order).
#[derive(Clone, Debug, Default)]
pub struct StateMachineDescription {
    states: Vec<AnimationState>,
    by_name: HashMap<String, StateId>,
    transitions: Vec<TransitionInfo>,
}

impl StateMachineDescription {
    pub fn builder() -> DescriptionBuilder {
        DescriptionBuilder::default()
    }

    pub fn state(&self, id: StateId) -> Option<&AnimationState> {
        self.states.get(id.index())
    }

    pub fn state_by_name(&self, name: &str) -> Option<&AnimationState> {
        self.by_name.get(name).and_then(|id| self.state(*id))
    }

    /// Look up a state id by name.
    pub fn resolve(&self, name: &str) -> Result<StateId, DescriptionError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| DescriptionError::UnknownState { name: name.into() })
    }

    pub fn states(&self) -> impl Iterator<Item = &AnimationState> {
        self.states.iter()
    }

    pub fn transitions(&self) -> &[TransitionInfo] {
        &self.transitions
    }

    /// The single state marked default.
    pub fn default_state(&self) -> Result<&AnimationState, DescriptionError> {
        let mut defaults = self.states.iter().filter(|s| s.is_default);
        let first = defaults.next().ok_or(DescriptionError::NoDefaultState)?;
        let rest: Vec<String> = defaults.map(|s| s.name.clone()).collect();
        if rest.is_empty() {
            Ok(first)
        } else {
            let mut names = vec![first.name.clone()];
            names.extend(rest);
            Err(DescriptionError::MultipleDefaultStates { names })
        }
    }

    /// Check that every clip a state references exists in `clips`.
    pub fn validate_clips(&self, clips: &ClipLibrary) -> Result<(), DescriptionError> {
        for state in &self.states {
            if let StateMotion::Clip(id) = state.motion {
                if clips.get(id).is_none() {
                    return Err(DescriptionError::UnknownClip {
                        state: state.name.clone(),
                        clip: format!("{id:?}"),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Ids handed out by a description always index into it; foreign ids panic like a
/// slice index would.
impl std::ops::Index<StateId> for StateMachineDescription {
    type Output = AnimationState;

    fn index(&self, id: StateId) -> &AnimationState {
        &self.states[id.index()]
    }
}

struct PendingTransition {
    from: Option<String>,
    to: String,
    duration: f32,
    trigger_on_animation_end: bool,
}

/// Builder for [`StateMachineDescription`]. States and transitions are referenced by
/// name; names are resolved and validated in [`DescriptionBuilder::build`].
#[derive(Default)]
pub struct DescriptionBuilder {
    states: Vec<(String, StateMotion, bool)>,
    transitions: Vec<PendingTransition>,
}

impl DescriptionBuilder {
    pub fn state(mut self, name: impl Into<String>, motion: StateMotion) -> Self {
        self.states.push((name.into(), motion, false));
        self
    }

    pub fn clip_state(self, name: impl Into<String>, clip: ClipId) -> Self {
        self.state(name, StateMotion::Clip(clip))
    }

    pub fn rest_state(self, name: impl Into<String>) -> Self {
        self.state(name, StateMotion::Rest)
    }

    pub fn default_state(mut self, name: impl Into<String>, motion: StateMotion) -> Self {
        self.states.push((name.into(), motion, true));
        self
    }

    /// Manual transition. `from: None` matches any active state.
    pub fn transition(mut self, from: Option<&str>, to: &str, duration: f32) -> Self {
        self.transitions.push(PendingTransition {
            from: from.map(str::to_string),
            to: to.to_string(),
            duration,
            trigger_on_animation_end: false,
        });
        self
    }

    /// Transition fired automatically when `from`'s animation reaches its end.
    pub fn auto_transition(mut self, from: &str, to: &str, duration: f32) -> Self {
        self.transitions.push(PendingTransition {
            from: Some(from.to_string()),
            to: to.to_string(),
            duration,
            trigger_on_animation_end: true,
        });
        self
    }

    pub fn build(self) -> Result<StateMachineDescription, DescriptionError> {
        let mut ids = IdAllocator::new();
        let mut states = Vec::with_capacity(self.states.len());
        let mut by_name = HashMap::with_capacity(self.states.len());

        for (name, motion, is_default) in self.states {
            if by_name.contains_key(&name) {
                return Err(DescriptionError::DuplicateState { name });
            }
            let id = ids.alloc_state();
            by_name.insert(name.clone(), id);
            states.push(AnimationState {
                id,
                name,
                motion,
                is_default,
            });
        }

        let lookup = |name: &str| {
            by_name
                .get(name)
                .copied()
                .ok_or_else(|| DescriptionError::UnknownState { name: name.into() })
        };

        let mut transitions = Vec::with_capacity(self.transitions.len());
        for pending in self.transitions {
            if !pending.duration.is_finite() || pending.duration < 0.0 {
                return Err(DescriptionError::InvalidDuration {
                    target: pending.to,
                    duration: pending.duration,
                });
            }
            let source = match pending.from.as_deref() {
                None => TransitionSource::Any,
                Some(name) => TransitionSource::From(lookup(name)?),
            };
            transitions.push(TransitionInfo {
                source,
                target: lookup(&pending.to)?,
                transition_time: pending.duration,
                trigger_on_animation_end: pending.trigger_on_animation_end,
            });
        }

        Ok(StateMachineDescription {
            states,
            by_name,
            transitions,
        })
    }
}

// ----- JSON schema (serde) -----

/// JSON form of a description; clips are referenced by name.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateMachineDoc {
    pub states: Vec<StateDoc>,
    #[serde(default)]
    pub transitions: Vec<TransitionDoc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateDoc {
    pub name: String,
    /// Clip name; absent or null means a rest state.
    #[serde(default)]
    pub clip: Option<String>,
    #[serde(default)]
    pub default: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionDoc {
    /// Source state name; absent or null matches any state.
    #[serde(default)]
    pub from: Option<String>,
    pub to: String,
    /// Blend duration in seconds.
    #[serde(default)]
    pub duration: f32,
    #[serde(default)]
    pub trigger_on_animation_end: bool,
}

impl StateMachineDoc {
    /// Resolve clip names against `clips` and build the description.
    pub fn into_description(
        self,
        clips: &ClipLibrary,
    ) -> Result<StateMachineDescription, DescriptionError> {
        let mut builder = StateMachineDescription::builder();
        for st in self.states {
            let motion = match st.clip {
                None => StateMotion::Rest,
                Some(clip) => match clips.id_of(&clip) {
                    Some(id) => StateMotion::Clip(id),
                    None => {
                        return Err(DescriptionError::UnknownClip {
                            state: st.name,
                            clip,
                        })
                    }
                },
            };
            builder = if st.default {
                builder.default_state(st.name, motion)
            } else {
                builder.state(st.name, motion)
            };
        }
        for tr in self.transitions {
            builder.transitions.push(PendingTransition {
                from: tr.from,
                to: tr.to,
                duration: tr.duration,
                trigger_on_animation_end: tr.trigger_on_animation_end,
            });
        }
        builder.build()
    }
}

/// Public API: parse a state machine JSON document and resolve it against `clips`.
///
/// ```json
/// { "states": [ { "name": "idle", "clip": "idle", "default": true },
///               { "name": "rest" } ],
///   "transitions": [ { "from": "idle", "to": "rest", "duration": 0.5 },
///                    { "to": "idle", "duration": 0.25 } ] }
/// ```
pub fn parse_state_machine_json(
    s: &str,
    clips: &ClipLibrary,
) -> Result<StateMachineDescription, DescriptionError> {
    let doc: StateMachineDoc = serde_json::from_str(s).map_err(|e| DescriptionError::Parse {
        reason: e.to_string(),
    })?;
    doc.into_description(clips)
}
