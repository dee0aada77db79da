//! Skill validation against the Agent Skills frontmatter rules.
//!
//! Every function returns a list of human-readable violations; an empty list means valid.
//! All rules are checked, so several violations can be reported for one field.

use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

use super::loader;
use super::model::Skill;

pub const MAX_SKILL_NAME_LENGTH: usize = 64;
pub const MAX_DESCRIPTION_LENGTH: usize = 1024;
pub const MAX_COMPATIBILITY_LENGTH: usize = 500;

/// Frontmatter keys permitted at the top level.
pub const ALLOWED_FRONTMATTER_FIELDS: [&str; 6] = [
    "allowed-tools",
    "compatibility",
    "description",
    "license",
    "metadata",
    "name",
];

fn normalize(s: &str) -> String {
    s.nfkc().collect()
}

/// Validate skill name format and, when `skill_dir` is given, that the directory name matches.
pub fn validate_name(name: &str, skill_dir: Option<&Path>) -> Vec<String> {
    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push("Field 'name' must be a non-empty string".to_string());
        return errors;
    }

    let name = normalize(name.trim());
    let len = name.chars().count();
    if len > MAX_SKILL_NAME_LENGTH {
        errors.push(format!(
            "Skill name '{}' exceeds {} character limit ({} chars)",
            name, MAX_SKILL_NAME_LENGTH, len
        ));
    }
    if name != name.to_lowercase() {
        errors.push(format!("Skill name '{}' must be lowercase", name));
    }
    if name.starts_with('-') || name.ends_with('-') {
        errors.push("Skill name cannot start or end with a hyphen".to_string());
    }
    if name.contains("--") {
        errors.push("Skill name cannot contain consecutive hyphens".to_string());
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '-') {
        errors.push(format!(
            "Skill name '{}' contains invalid characters. Only letters, digits, and hyphens are allowed.",
            name
        ));
    }

    if let Some(dir) = skill_dir {
        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if normalize(&dir_name) != name {
            errors.push(format!(
                "Directory name '{}' must match skill name '{}'",
                dir_name, name
            ));
        }
    }
    errors
}

pub fn validate_description(description: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if description.trim().is_empty() {
        errors.push("Field 'description' must be a non-empty string".to_string());
        return errors;
    }
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LENGTH {
        errors.push(format!(
            "Description exceeds {} character limit ({} chars)",
            MAX_DESCRIPTION_LENGTH, len
        ));
    }
    errors
}

pub fn validate_compatibility(compatibility: &Value) -> Vec<String> {
    let Value::String(s) = compatibility else {
        return vec!["Field 'compatibility' must be a string".to_string()];
    };
    let len = s.chars().count();
    if len > MAX_COMPATIBILITY_LENGTH {
        return vec![format!(
            "Compatibility exceeds {} character limit ({} chars)",
            MAX_COMPATIBILITY_LENGTH, len
        )];
    }
    Vec::new()
}

/// Report any top-level keys outside [`ALLOWED_FRONTMATTER_FIELDS`].
pub fn validate_metadata_fields<'a, I>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut extra: Vec<&str> = keys
        .into_iter()
        .filter(|k| !ALLOWED_FRONTMATTER_FIELDS.contains(k))
        .collect();
    if extra.is_empty() {
        return Vec::new();
    }
    extra.sort_unstable();
    extra.dedup();
    vec![format!(
        "Unexpected fields in frontmatter: {}. Only {} are allowed.",
        extra.join(", "),
        ALLOWED_FRONTMATTER_FIELDS.join(", ")
    )]
}

/// Validate already-parsed frontmatter fields (keyed by wire name).
pub fn validate_metadata(fields: &BTreeMap<String, Value>, skill_dir: Option<&Path>) -> Vec<String> {
    let mut errors = validate_metadata_fields(fields.keys().map(String::as_str));

    match fields.get("name") {
        None => errors.push("Missing required field in frontmatter: name".to_string()),
        Some(Value::String(name)) => errors.extend(validate_name(name, skill_dir)),
        Some(_) => errors.push("Field 'name' must be a non-empty string".to_string()),
    }
    match fields.get("description") {
        None => errors.push("Missing required field in frontmatter: description".to_string()),
        Some(Value::String(d)) => errors.extend(validate_description(d)),
        Some(_) => errors.push("Field 'description' must be a non-empty string".to_string()),
    }
    if let Some(c) = fields.get("compatibility") {
        errors.extend(validate_compatibility(c));
    }
    errors
}

/// Validate a skill directory and its SKILL.md, reading from the filesystem.
/// A missing directory, missing SKILL.md, or unparsable frontmatter yields a single violation.
pub fn validate(skill_dir: &Path) -> Vec<String> {
    if !skill_dir.exists() {
        return vec![format!(
            "Skill directory does not exist: {}",
            skill_dir.display()
        )];
    }
    if !skill_dir.is_dir() {
        return vec![format!("Path is not a directory: {}", skill_dir.display())];
    }
    let Some(path) = loader::find_skill_md(skill_dir) else {
        return vec![loader::ParseError::DefinitionNotFound(skill_dir.to_path_buf()).to_string()];
    };
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => return vec![format!("Could not read {}: {}", path.display(), e)],
    };
    let fields = loader::split_frontmatter(&content)
        .and_then(|(header, _)| loader::frontmatter_fields(header));
    match fields {
        Ok(fields) => validate_metadata(&fields, Some(skill_dir)),
        Err(e) => vec![e.to_string()],
    }
}

/// Validate an in-memory skill (no directory name check).
pub fn validate_skill(skill: &Skill) -> Vec<String> {
    validate_metadata(&skill.frontmatter.wire_fields(), None)
}
