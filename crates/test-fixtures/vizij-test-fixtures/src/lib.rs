use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    clips: HashMap<String, String>,
    #[serde(rename = "state-machines")]
    state_machines: HashMap<String, StateMachineEntry>,
}

/// A state machine fixture, optionally listing the clip fixtures it references.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StateMachineEntry {
    Path(String),
    Detailed {
        description: String,
        #[serde(default)]
        clips: Vec<String>,
    },
}

impl StateMachineEntry {
    fn as_path(&self) -> &str {
        match self {
            StateMachineEntry::Path(path) => path,
            StateMachineEntry::Detailed { description, .. } => description,
        }
    }

    fn clips(&self) -> &[String] {
        match self {
            StateMachineEntry::Path(_) => &[],
            StateMachineEntry::Detailed { clips, .. } => clips,
        }
    }
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod clips {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.clips.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.clips, "clip", name)?;
        read_to_string(rel)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.clips, "clip", name)?;
        Ok(resolve_path(rel))
    }
}

pub mod state_machines {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.state_machines.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.state_machines, "state machine", name)?;
        read_to_string(entry.as_path())
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.state_machines, "state machine", name)?;
        Ok(resolve_path(entry.as_path()))
    }

    /// Clip fixture names the state machine references, in manifest order.
    pub fn clip_names(name: &str) -> Result<Vec<String>> {
        let entry = lookup(&MANIFEST.state_machines, "state machine", name)?;
        Ok(entry.clips().to_vec())
    }
}
