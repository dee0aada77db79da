//! Skill repositories: one contract, several storage backends.
//!
//! Callers depend on [`SkillRepository`] only. Reads take `&self`; mutations take `&mut self`, so a
//! single writer at a time is enforced by the borrow checker. Hosts that share a repository across
//! threads wrap it in their own lock.

mod file_system;
mod in_memory;

pub use file_system::FileSystemRepository;
pub use in_memory::InMemoryRepository;

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::binder::{Invocation, ScriptError};
use crate::skills::{format_skills_as_xml_with_location, validate_skill, Frontmatter, ParseError, Script, Skill};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("skill not found: {0}")]
    SkillNotFound(String),
    #[error("script '{script}' not found in skill '{skill}'")]
    ScriptNotFound { skill: String, script: String },
    #[error("{backend} repository does not support {operation}")]
    UnsupportedOperation {
        backend: &'static str,
        operation: &'static str,
    },
    #[error("skill '{name}' rejected: {}", .violations.join("; "))]
    Rejected { name: String, violations: Vec<String> },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("rendering SKILL.md: {0}")]
    Render(#[from] serde_yaml::Error),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where a listed skill came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillSource {
    /// The primary skill root (e.g. ~/.skillbox/skills).
    Skills,
    /// A root from config.skills.extraDirs.
    Extra,
    /// Held in process memory.
    Memory,
}

impl SkillSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillSource::Skills => "skills",
            SkillSource::Extra => "extra",
            SkillSource::Memory => "memory",
        }
    }
}

impl fmt::Display for SkillSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skills" => Ok(SkillSource::Skills),
            "extra" => Ok(SkillSource::Extra),
            "memory" => Ok(SkillSource::Memory),
            other => Err(format!("unknown skill source: {}", other)),
        }
    }
}

/// Storage-agnostic access to a collection of skills, keyed by identifier.
///
/// `enable`, `disable`, and `execute` are optional capabilities: the defaults accept
/// enablement toggles as no-ops and refuse to run anything but bound scripts. `create` and
/// `delete` default to [`RepositoryError::UnsupportedOperation`] for read-only backends.
pub trait SkillRepository: Send + Sync {
    /// Short backend name used in errors and logs.
    fn backend(&self) -> &'static str;

    /// Root of the repository's storage.
    fn workspace(&self) -> PathBuf;

    /// Frontmatter of every enabled skill, keyed by identifier. Never fails; storage that cannot
    /// be enumerated yields an empty map.
    fn list(&self, source: Option<SkillSource>) -> BTreeMap<String, Frontmatter>;

    fn retrieve(&self, id: &str) -> Result<Skill, RepositoryError>;

    /// Location of the skill's SKILL.md, when it has one.
    fn location(&self, id: &str) -> Option<PathBuf>;

    /// Store `skill` under its name, replacing any existing entry.
    fn create(&mut self, _skill: Skill) -> Result<Skill, RepositoryError> {
        Err(RepositoryError::UnsupportedOperation {
            backend: self.backend(),
            operation: "create",
        })
    }

    fn delete(&mut self, _id: &str, _version: Option<&str>) -> Result<(), RepositoryError> {
        Err(RepositoryError::UnsupportedOperation {
            backend: self.backend(),
            operation: "delete",
        })
    }

    fn enable(&mut self, id: &str) -> Result<(), RepositoryError> {
        log::debug!("{}: enable({}) ignored", self.backend(), id);
        Ok(())
    }

    fn disable(&mut self, id: &str) -> Result<(), RepositoryError> {
        log::debug!("{}: disable({}) ignored", self.backend(), id);
        Ok(())
    }

    /// Run a bound script of a skill. `args` is a command line, a token array, or an object of
    /// named arguments.
    fn execute(&self, id: &str, script: &str, args: &Value) -> Result<Value, RepositoryError> {
        let skill = self.retrieve(id)?;
        let path = script.strip_prefix("scripts/").unwrap_or(script);
        match skill.resources.get_script(path) {
            Some(Script::Bound(function)) => Ok(run_bound(function, args)?),
            Some(Script::Source { .. }) => Err(RepositoryError::UnsupportedOperation {
                backend: self.backend(),
                operation: "execute of source scripts",
            }),
            None => Err(RepositoryError::ScriptNotFound {
                skill: id.to_string(),
                script: path.to_string(),
            }),
        }
    }
}

/// Run a function script with JSON arguments: objects bind by keyword, anything else is an
/// invocation. A bare number or boolean is a single token.
pub(crate) fn run_bound(
    function: &crate::binder::FunctionScript,
    args: &Value,
) -> Result<Value, ScriptError> {
    match args {
        Value::Object(map) => function.call_with_keywords(map),
        other => {
            let invocation = Invocation::from_json(other)
                .unwrap_or_else(|| Invocation::Tokens(vec![other.clone()]));
            function.call(invocation)
        }
    }
}

/// Acceptance check applied on `create`. Strict repositories reject a skill with violations;
/// lenient ones log them and accept.
pub(crate) fn check_acceptance(skill: &Skill, strict: bool) -> Result<(), RepositoryError> {
    let violations = validate_skill(skill);
    if violations.is_empty() {
        return Ok(());
    }
    if strict {
        return Err(RepositoryError::Rejected {
            name: skill.name().to_string(),
            violations,
        });
    }
    for v in &violations {
        log::warn!("skill {}: {}", skill.name(), v);
    }
    Ok(())
}

/// `<available_skills>` listing of every enabled skill, with SKILL.md locations where the
/// backend has them.
pub fn available_skills_xml(repository: &dyn SkillRepository) -> String {
    let listed = repository.list(None);
    format_skills_as_xml_with_location(listed.iter().map(|(id, fm)| {
        let location = repository.location(id).map(|p| p.display().to_string());
        (location, fm)
    }))
}

/// Reject identifiers that would escape a storage root or name a hidden entry.
pub(crate) fn is_plain_id(id: &str) -> bool {
    !id.is_empty() && !id.starts_with('.') && !id.contains(['/', '\\'])
}
