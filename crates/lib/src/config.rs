//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.skillbox/config.json`) and environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::repository::FileSystemRepository;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Skill roots and repository options.
    #[serde(default)]
    pub skills: SkillsConfig,
}

/// Skills load config (dirs, disabled list, acceptance mode).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillsConfig {
    /// Override the default skill root. Relative paths are resolved against the config file's parent. Omit or leave empty to use the `skills` subdirectory next to the config file (~/.skillbox/skills by default).
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Extra skill directories. A skill here overrides one with the same name in the primary root; later entries override earlier ones.
    #[serde(default)]
    pub extra_dirs: Vec<PathBuf>,
    /// Skill names hidden from listings for this process, without touching their directories.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// When true, creating a skill whose frontmatter has validation violations fails instead of logging a warning. Default: false.
    #[serde(default)]
    pub strict: bool,
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("SKILLBOX_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".skillbox").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or SKILLBOX_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used (for resolving the config directory).
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

fn config_parent(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn resolve_against(config_path: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        config_parent(config_path).join(dir)
    }
}

/// Default skill root when no override is set: `skills` subdirectory of the config file's parent.
pub fn skills_dir(config_path: &Path) -> PathBuf {
    config_parent(config_path).join("skills")
}

/// Resolve the primary skill root: uses `config.skills.directory` if set (relative paths resolved against the config file's parent), otherwise the default `skills` subdirectory.
pub fn resolve_skills_dir(config: &Config, config_path: &Path) -> PathBuf {
    match &config.skills.directory {
        Some(d) if !d.as_os_str().is_empty() => resolve_against(config_path, d),
        _ => skills_dir(config_path),
    }
}

/// Resolve `config.skills.extraDirs` in order; relative entries are resolved against the config file's parent.
pub fn resolve_extra_dirs(config: &Config, config_path: &Path) -> Vec<PathBuf> {
    config
        .skills
        .extra_dirs
        .iter()
        .filter(|d| !d.as_os_str().is_empty())
        .map(|d| resolve_against(config_path, d))
        .collect()
}

/// Build the file-system repository described by the config.
pub fn open_repository(config: &Config, config_path: &Path) -> FileSystemRepository {
    FileSystemRepository::new(resolve_skills_dir(config, config_path))
        .with_extra_dirs(resolve_extra_dirs(config, config_path))
        .with_disabled(config.skills.disabled.iter().cloned())
        .with_strict(config.skills.strict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{SkillRepository, SkillSource};

    #[test]
    fn parses_camel_case_keys() {
        let config: Config = serde_json::from_str(
            r#"{"skills": {"directory": "mine", "extraDirs": ["/opt/skills"], "disabled": ["old"], "strict": true}}"#,
        )
        .unwrap();
        assert_eq!(config.skills.directory, Some(PathBuf::from("mine")));
        assert_eq!(config.skills.extra_dirs, vec![PathBuf::from("/opt/skills")]);
        assert_eq!(config.skills.disabled, vec!["old".to_string()]);
        assert!(config.skills.strict);
        let empty: Config = serde_json::from_str("{}").unwrap();
        assert!(!empty.skills.strict);
    }

    #[test]
    fn resolve_skills_dir_default() {
        let config = Config::default();
        let path = Path::new("/home/user/.skillbox/config.json");
        assert_eq!(
            resolve_skills_dir(&config, path),
            PathBuf::from("/home/user/.skillbox/skills")
        );
    }

    #[test]
    fn resolve_skills_dir_override_relative() {
        let mut config = Config::default();
        config.skills.directory = Some(PathBuf::from("custom/skills"));
        let path = Path::new("/home/user/.skillbox/config.json");
        assert_eq!(
            resolve_skills_dir(&config, path),
            PathBuf::from("/home/user/.skillbox/custom/skills")
        );
    }

    #[test]
    fn resolve_skills_dir_override_absolute() {
        let mut config = Config::default();
        config.skills.directory = Some(PathBuf::from("/repo/skills"));
        let path = Path::new("/home/user/.skillbox/config.json");
        assert_eq!(
            resolve_skills_dir(&config, path),
            PathBuf::from("/repo/skills")
        );
    }

    #[test]
    fn extra_dirs_keep_order_and_resolve() {
        let mut config = Config::default();
        config.skills.extra_dirs = vec![
            PathBuf::from("team"),
            PathBuf::from(""),
            PathBuf::from("/abs/skills"),
        ];
        let path = Path::new("/home/user/.skillbox/config.json");
        assert_eq!(
            resolve_extra_dirs(&config, path),
            vec![
                PathBuf::from("/home/user/.skillbox/team"),
                PathBuf::from("/abs/skills")
            ]
        );
        let repo = open_repository(&config, path);
        let roots: Vec<SkillSource> = repo.roots().map(|(_, s)| s).collect();
        assert_eq!(
            roots,
            vec![SkillSource::Skills, SkillSource::Extra, SkillSource::Extra]
        );
        assert_eq!(repo.workspace(), PathBuf::from("/home/user/.skillbox/skills"));
    }
}
