//! In-memory repository: skills held in a map, typically built in code with bound scripts.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use super::{check_acceptance, RepositoryError, SkillRepository, SkillSource};
use crate::skills::{Frontmatter, Skill};

const WORKSPACE: &str = "/memory";

/// Skills keyed by name. Retrieval returns a clone of the stored aggregate; bound scripts share
/// their callable.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRepository {
    skills: BTreeMap<String, Skill>,
    disabled: BTreeSet<String>,
    strict: bool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject skills with validation violations on `create`.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Seed the repository without acceptance checks.
    pub fn with_skills(mut self, skills: impl IntoIterator<Item = Skill>) -> Self {
        for skill in skills {
            self.skills.insert(skill.name().to_string(), skill);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn is_disabled(&self, id: &str) -> bool {
        self.disabled.contains(id)
    }
}

impl SkillRepository for InMemoryRepository {
    fn backend(&self) -> &'static str {
        "in-memory"
    }

    fn workspace(&self) -> PathBuf {
        PathBuf::from(WORKSPACE)
    }

    fn list(&self, source: Option<SkillSource>) -> BTreeMap<String, Frontmatter> {
        if source.is_some_and(|s| s != SkillSource::Memory) {
            return BTreeMap::new();
        }
        self.skills
            .iter()
            .filter(|(id, _)| !self.disabled.contains(*id))
            .map(|(id, skill)| (id.clone(), skill.frontmatter.clone()))
            .collect()
    }

    fn retrieve(&self, id: &str) -> Result<Skill, RepositoryError> {
        self.skills
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::SkillNotFound(id.to_string()))
    }

    fn location(&self, _id: &str) -> Option<PathBuf> {
        None
    }

    fn create(&mut self, skill: Skill) -> Result<Skill, RepositoryError> {
        check_acceptance(&skill, self.strict)?;
        let id = skill.name().to_string();
        self.disabled.remove(&id);
        if self.skills.insert(id.clone(), skill.clone()).is_some() {
            log::info!("replaced skill {}", id);
        } else {
            log::info!("created skill {}", id);
        }
        Ok(skill)
    }

    fn delete(&mut self, id: &str, version: Option<&str>) -> Result<(), RepositoryError> {
        if let Some(v) = version {
            log::debug!("{}: versions are not tracked, ignoring {}", self.backend(), v);
        }
        self.disabled.remove(id);
        if self.skills.remove(id).is_some() {
            log::info!("deleted skill {}", id);
        }
        Ok(())
    }

    fn enable(&mut self, id: &str) -> Result<(), RepositoryError> {
        if !self.skills.contains_key(id) {
            return Err(RepositoryError::SkillNotFound(id.to_string()));
        }
        self.disabled.remove(id);
        Ok(())
    }

    fn disable(&mut self, id: &str) -> Result<(), RepositoryError> {
        if !self.skills.contains_key(id) {
            return Err(RepositoryError::SkillNotFound(id.to_string()));
        }
        self.disabled.insert(id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{FunctionScript, Signature, ValueType};
    use serde_json::json;

    fn skill(name: &str) -> Skill {
        Skill::new(
            Frontmatter::new(name, format!("The {} skill.", name)),
            "# Instructions",
        )
    }

    #[test]
    fn create_then_retrieve() {
        let mut repo = InMemoryRepository::new();
        repo.create(skill("weather")).unwrap();
        let got = repo.retrieve("weather").unwrap();
        assert_eq!(got.name(), "weather");
        assert_eq!(got.description(), "The weather skill.");
        assert_eq!(repo.workspace(), PathBuf::from("/memory"));
        assert_eq!(repo.location("weather"), None);
    }

    #[test]
    fn delete_missing_is_noop() {
        let mut repo = InMemoryRepository::new();
        repo.delete("ghost", None).unwrap();
        repo.delete("ghost", Some("v2")).unwrap();
        assert!(repo.is_empty());
    }

    #[test]
    fn retrieve_missing_is_not_found() {
        let repo = InMemoryRepository::new();
        assert!(matches!(
            repo.retrieve("ghost"),
            Err(RepositoryError::SkillNotFound(id)) if id == "ghost"
        ));
    }

    #[test]
    fn recreate_replaces() {
        let mut repo = InMemoryRepository::new();
        repo.create(skill("weather")).unwrap();
        let mut updated = skill("weather");
        updated.frontmatter.description = "Forecasts.".to_string();
        repo.create(updated).unwrap();
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.retrieve("weather").unwrap().description(), "Forecasts.");
    }

    #[test]
    fn disabled_skills_are_hidden_from_list_only() {
        let mut repo = InMemoryRepository::new().with_skills([skill("alpha"), skill("beta")]);
        repo.disable("alpha").unwrap();
        let listed: Vec<String> = repo.list(None).into_keys().collect();
        assert_eq!(listed, vec!["beta"]);
        assert!(repo.retrieve("alpha").is_ok());
        repo.enable("alpha").unwrap();
        assert_eq!(repo.list(None).len(), 2);
        assert!(repo.disable("ghost").is_err());
    }

    #[test]
    fn list_filters_by_source() {
        let repo = InMemoryRepository::new().with_skills([skill("alpha")]);
        assert_eq!(repo.list(Some(SkillSource::Memory)).len(), 1);
        assert!(repo.list(Some(SkillSource::Extra)).is_empty());
    }

    #[test]
    fn strict_create_rejects_invalid_names() {
        let mut repo = InMemoryRepository::new().with_strict(true);
        let err = repo.create(skill("Bad--Name")).unwrap_err();
        match err {
            RepositoryError::Rejected { name, violations } => {
                assert_eq!(name, "Bad--Name");
                assert!(!violations.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
        let mut lenient = InMemoryRepository::new();
        assert!(lenient.create(skill("Bad--Name")).is_ok());
    }

    #[test]
    fn execute_runs_bound_scripts() {
        let sig = Signature::new("greet")
            .positional("who", ValueType::String)
            .optional("shout", ValueType::Boolean, false);
        let greet = FunctionScript::new(sig, |args| {
            let who = args.get_str("who").ok_or("who missing")?;
            let text = format!("hello {}", who);
            let text = if args.get_bool("shout") == Some(true) {
                text.to_uppercase()
            } else {
                text
            };
            Ok(json!(text))
        });
        let mut s = skill("greeter");
        s.resources.scripts.insert("greet.py".to_string(), greet.into());
        let repo = InMemoryRepository::new().with_skills([s]);

        let out = repo
            .execute("greeter", "scripts/greet.py", &json!("world --shout"))
            .unwrap();
        assert_eq!(out, json!("HELLO WORLD"));
        let out = repo
            .execute("greeter", "greet.py", &json!({"who": "ada"}))
            .unwrap();
        assert_eq!(out, json!("hello ada"));
    }
}
