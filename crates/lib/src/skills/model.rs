//! Skill data model: frontmatter (discovery metadata), instructions (SKILL.md body),
//! and resources (references, assets, scripts).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::binder::FunctionScript;

/// Metadata parsed from the SKILL.md frontmatter, used for skill discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Skill name in kebab-case.
    pub name: String,
    /// What the skill does and when the model should use it.
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatibility: Option<String>,
    /// Tool patterns the skill requires (`allowed-tools` on the wire).
    #[serde(
        rename = "allowed-tools",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub allowed_tools: Option<String>,
    /// Client-specific key/value pairs. Values are always strings.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Frontmatter {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// Render the frontmatter as a YAML block (without `---` delimiters).
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Top-level frontmatter keys as they appear on the wire, with their values.
    /// Absent optional fields are omitted; `metadata` is omitted when empty.
    pub fn wire_fields(&self) -> BTreeMap<String, serde_yaml::Value> {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), self.name.clone().into());
        fields.insert("description".to_string(), self.description.clone().into());
        if let Some(ref v) = self.license {
            fields.insert("license".to_string(), v.clone().into());
        }
        if let Some(ref v) = self.compatibility {
            fields.insert("compatibility".to_string(), v.clone().into());
        }
        if let Some(ref v) = self.allowed_tools {
            fields.insert("allowed-tools".to_string(), v.clone().into());
        }
        if !self.metadata.is_empty() {
            let mapping: serde_yaml::Mapping = self
                .metadata
                .iter()
                .map(|(k, v)| (k.clone().into(), v.clone().into()))
                .collect();
            fields.insert("metadata".to_string(), serde_yaml::Value::Mapping(mapping));
        }
        fields
    }
}

/// One entry of a skill's `scripts` mapping.
#[derive(Debug, Clone)]
pub enum Script {
    /// Raw script source as read from disk. Never executed by this crate.
    Source { text: String },
    /// A native callable bound to this script path.
    Bound(FunctionScript),
}

impl Script {
    pub fn source(text: impl Into<String>) -> Self {
        Script::Source { text: text.into() }
    }

    /// Source text shown when the script is viewed.
    pub fn src(&self) -> &str {
        match self {
            Script::Source { text } => text,
            Script::Bound(f) => f.src(),
        }
    }

    pub fn as_bound(&self) -> Option<&FunctionScript> {
        match self {
            Script::Bound(f) => Some(f),
            Script::Source { .. } => None,
        }
    }
}

impl From<FunctionScript> for Script {
    fn from(f: FunctionScript) -> Self {
        Script::Bound(f)
    }
}

/// Additional content loaded as needed: references, assets, and scripts, keyed by relative path.
#[derive(Debug, Clone, Default)]
pub struct Resources {
    pub references: BTreeMap<String, String>,
    pub assets: BTreeMap<String, String>,
    pub scripts: BTreeMap<String, Script>,
}

impl Resources {
    pub fn get_reference(&self, path: &str) -> Option<&str> {
        self.references.get(path).map(String::as_str)
    }

    pub fn get_asset(&self, path: &str) -> Option<&str> {
        self.assets.get(path).map(String::as_str)
    }

    pub fn get_script(&self, path: &str) -> Option<&Script> {
        self.scripts.get(path)
    }

    pub fn list_references(&self) -> Vec<String> {
        self.references.keys().cloned().collect()
    }

    pub fn list_assets(&self) -> Vec<String> {
        self.assets.keys().cloned().collect()
    }

    pub fn list_scripts(&self) -> Vec<String> {
        self.scripts.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty() && self.assets.is_empty() && self.scripts.is_empty()
    }
}

/// A complete skill: frontmatter, markdown instructions, and resources.
#[derive(Debug, Clone)]
pub struct Skill {
    pub frontmatter: Frontmatter,
    /// Markdown body of SKILL.md (everything after the closing `---`, trimmed).
    pub instructions: String,
    pub resources: Resources,
}

impl Skill {
    pub fn new(frontmatter: Frontmatter, instructions: impl Into<String>) -> Self {
        Self {
            frontmatter,
            instructions: instructions.into(),
            resources: Resources::default(),
        }
    }

    pub fn with_resources(mut self, resources: Resources) -> Self {
        self.resources = resources;
        self
    }

    pub fn name(&self) -> &str {
        &self.frontmatter.name
    }

    pub fn description(&self) -> &str {
        &self.frontmatter.description
    }

    /// Render the full SKILL.md document (frontmatter block followed by instructions).
    pub fn to_skill_md(&self) -> Result<String, serde_yaml::Error> {
        let yaml = self.frontmatter.to_yaml()?;
        let mut out = String::with_capacity(yaml.len() + self.instructions.len() + 16);
        out.push_str("---\n");
        out.push_str(&yaml);
        if !yaml.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("---\n");
        if !self.instructions.is_empty() {
            out.push('\n');
            out.push_str(&self.instructions);
            out.push('\n');
        }
        Ok(out)
    }
}
