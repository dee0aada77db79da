//! Load skills from directories: each skill is a directory with SKILL.md (YAML frontmatter + markdown)
//! and optional `references/`, `assets/`, and `scripts/` subdirectories.
//!
//! Resource files that cannot be read as UTF-8 text are skipped; a partial resource bundle is not an error.

use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::model::{Frontmatter, Resources, Script, Skill};

/// Header file names, in lookup order.
pub const SKILL_MD_NAMES: [&str; 2] = ["SKILL.md", "skill.md"];

const DELIMITER: &str = "---";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed frontmatter: {0}")]
    MalformedHeader(String),
    #[error("missing required field in frontmatter: {0}")]
    MissingRequiredField(&'static str),
    #[error("field '{field}' {reason}")]
    InvalidFieldValue { field: &'static str, reason: String },
    #[error("SKILL.md not found in {}", .0.display())]
    DefinitionNotFound(PathBuf),
    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Files loaded from one resource directory, plus how many entries were skipped.
#[derive(Debug, Default)]
pub struct LoadedFiles {
    pub files: BTreeMap<String, String>,
    pub skipped: usize,
}

/// Split SKILL.md content into the raw frontmatter block and the trimmed body.
/// The frontmatter is everything between the opening `---` and the next line that is exactly `---`.
pub fn split_frontmatter(content: &str) -> Result<(&str, &str), ParseError> {
    let rest = content.strip_prefix(DELIMITER).ok_or_else(|| {
        ParseError::MalformedHeader("SKILL.md must start with YAML frontmatter (---)".to_string())
    })?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        // The remainder of the opening delimiter line is never the closing delimiter.
        if offset > 0 && line.trim_end() == DELIMITER {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((header, body.trim()));
        }
        offset += line.len();
    }
    Err(ParseError::MalformedHeader(
        "frontmatter not properly closed with ---".to_string(),
    ))
}

/// Parse a frontmatter block into its top-level fields, keyed by their wire names.
pub fn frontmatter_fields(yaml: &str) -> Result<BTreeMap<String, Value>, ParseError> {
    let parsed: Value = serde_yaml::from_str(yaml)
        .map_err(|e| ParseError::MalformedHeader(format!("invalid YAML in frontmatter: {}", e)))?;
    let Value::Mapping(mapping) = parsed else {
        return Err(ParseError::MalformedHeader(
            "frontmatter must be a YAML mapping".to_string(),
        ));
    };
    Ok(mapping
        .into_iter()
        .map(|(k, v)| (scalar_to_string(&k), v))
        .collect())
}

/// Parse SKILL.md content into frontmatter and markdown body.
pub fn parse_skill_md(content: &str) -> Result<(Frontmatter, String), ParseError> {
    let (header, body) = split_frontmatter(content)?;
    let fields = frontmatter_fields(header)?;

    let name = fields
        .get("name")
        .ok_or(ParseError::MissingRequiredField("name"))?;
    let description = fields
        .get("description")
        .ok_or(ParseError::MissingRequiredField("description"))?;
    let name = required_string(name, "name")?;
    let description = required_string(description, "description")?;

    let mut frontmatter = Frontmatter::new(name, description);
    frontmatter.license = optional_string(&fields, "license")?;
    frontmatter.compatibility = optional_string(&fields, "compatibility")?;
    frontmatter.allowed_tools = optional_string(&fields, "allowed-tools")?;
    match fields.get("metadata") {
        None | Some(Value::Null) => {}
        Some(Value::Mapping(m)) => frontmatter.metadata = stringify_mapping(m),
        Some(_) => {
            return Err(ParseError::InvalidFieldValue {
                field: "metadata",
                reason: "must be a key/value mapping".to_string(),
            })
        }
    }

    Ok((frontmatter, body.to_string()))
}

fn required_string(value: &Value, field: &'static str) -> Result<String, ParseError> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(ParseError::InvalidFieldValue {
            field,
            reason: "must be a non-empty string".to_string(),
        }),
    }
}

/// Optional scalar fields are copied through as strings; null means not set.
fn optional_string(
    fields: &BTreeMap<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ParseError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => {
            Ok(Some(scalar_to_string(v)))
        }
        Some(_) => Err(ParseError::InvalidFieldValue {
            field,
            reason: "must be a string".to_string(),
        }),
    }
}

fn stringify_mapping(m: &Mapping) -> BTreeMap<String, String> {
    m.iter()
        .map(|(k, v)| (scalar_to_string(k), scalar_to_string(v)))
        .collect()
}

/// String form of a YAML value: scalars as written, null as empty, collections as flow YAML.
pub(crate) fn scalar_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Find the header file in a skill directory: SKILL.md preferred, skill.md accepted.
pub fn find_skill_md(skill_dir: &Path) -> Option<PathBuf> {
    SKILL_MD_NAMES
        .iter()
        .map(|name| skill_dir.join(name))
        .find(|p| p.is_file())
}

/// Locate, read, and parse the SKILL.md in `skill_dir`.
pub fn load_skill_md(skill_dir: &Path) -> Result<(Frontmatter, String), ParseError> {
    let path = find_skill_md(skill_dir)
        .ok_or_else(|| ParseError::DefinitionNotFound(skill_dir.to_path_buf()))?;
    let content = std::fs::read_to_string(&path).map_err(|source| ParseError::Io {
        path: path.clone(),
        source,
    })?;
    parse_skill_md(&content)
}

/// Load every readable text file under `dir` (recursively), keyed by path relative to `dir`
/// with `/` separators. A missing directory yields an empty result.
pub fn load_directory_files(dir: &Path) -> LoadedFiles {
    let mut out = LoadedFiles::default();
    if !dir.is_dir() {
        return out;
    }
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::debug!("skipping unreadable entry under {}: {}", dir.display(), e);
                out.skipped += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        match std::fs::read_to_string(entry.path()) {
            Ok(content) => {
                out.files.insert(key, content);
            }
            Err(e) => {
                log::debug!("skipping {}: {}", entry.path().display(), e);
                out.skipped += 1;
            }
        }
    }
    out
}

/// Load a complete skill: frontmatter, instructions, and all resource directories.
pub fn load_skill(skill_dir: &Path) -> Result<Skill, ParseError> {
    if !skill_dir.is_dir() || find_skill_md(skill_dir).is_none() {
        return Err(ParseError::DefinitionNotFound(skill_dir.to_path_buf()));
    }
    let (frontmatter, instructions) = load_skill_md(skill_dir)?;

    let references = load_directory_files(&skill_dir.join("references"));
    let assets = load_directory_files(&skill_dir.join("assets"));
    let scripts = load_directory_files(&skill_dir.join("scripts"));
    let skipped = references.skipped + assets.skipped + scripts.skipped;
    if skipped > 0 {
        log::debug!(
            "skill {}: skipped {} unreadable resource file(s)",
            frontmatter.name,
            skipped
        );
    }

    let resources = Resources {
        references: references.files,
        assets: assets.files,
        scripts: scripts
            .files
            .into_iter()
            .map(|(path, text)| (path, Script::source(text)))
            .collect(),
    };
    Ok(Skill::new(frontmatter, instructions).with_resources(resources))
}
