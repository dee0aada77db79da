//! Native callables registered against `(skill, script path)`.
//!
//! Skills loaded from disk only carry script source text. Host code registers the function that
//! implements a script here so the dispatcher can still run it.

use std::collections::BTreeMap;

use crate::binder::FunctionScript;
use crate::skills::{Script, Skill};

#[derive(Debug, Default, Clone)]
pub struct CallableRegistry {
    scripts: BTreeMap<(String, String), FunctionScript>,
}

fn script_key(path: &str) -> &str {
    path.strip_prefix("scripts/").unwrap_or(path)
}

impl CallableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `function` as `skill`'s script at `path` (with or without the `scripts/` prefix).
    /// Returns the function previously registered there, if any.
    pub fn register(
        &mut self,
        skill: impl Into<String>,
        path: &str,
        function: FunctionScript,
    ) -> Option<FunctionScript> {
        let skill = skill.into();
        log::debug!("registered {} for {}/scripts/{}", function.name(), skill, script_key(path));
        self.scripts
            .insert((skill, script_key(path).to_string()), function)
    }

    pub fn get(&self, skill: &str, path: &str) -> Option<&FunctionScript> {
        self.scripts
            .get(&(skill.to_string(), script_key(path).to_string()))
    }

    /// Script paths registered for `skill`, sorted.
    pub fn scripts_for(&self, skill: &str) -> Vec<String> {
        self.scripts
            .keys()
            .filter(|(s, _)| s == skill)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Attach registered functions to `skill` as bound scripts, replacing source entries.
    pub fn bind_into(&self, skill: &mut Skill) {
        for ((owner, path), function) in &self.scripts {
            if owner == skill.name() {
                skill
                    .resources
                    .scripts
                    .insert(path.clone(), Script::Bound(function.clone()));
            }
        }
    }
}
