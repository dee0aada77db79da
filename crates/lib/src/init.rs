//! Initialize the configuration directory: create ~/.skillbox, default config, and bundled skills.
//!
//! Layout mirrors `crates/lib/config/`: `config/skills/` → `~/.skillbox/skills/`.

use anyhow::{Context, Result};
use include_dir::{include_dir, Dir};
use std::path::{Path, PathBuf};

use crate::config;

static BUNDLED_SKILLS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/config/skills");

/// Names of the skills bundled into the binary.
pub fn bundled_skill_names() -> Vec<String> {
    BUNDLED_SKILLS
        .dirs()
        .filter_map(|d| d.path().file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect()
}

/// Ensure the configuration directory has been initialized (config file and skill root exist).
pub fn require_initialized(config_path: &Path, config: &config::Config) -> Result<()> {
    if !config_path.exists() {
        anyhow::bail!(
            "configuration not initialized; run `skillbox init` first (config file not found: {})",
            config_path.display()
        );
    }
    let skills_dir = config::resolve_skills_dir(config, config_path);
    if !skills_dir.exists() {
        anyhow::bail!(
            "configuration not initialized; run `skillbox init` first (skills directory not found: {})",
            skills_dir.display()
        );
    }
    Ok(())
}

/// Create the config directory and default files if they do not exist.
/// - Creates the config directory (parent of config file path).
/// - Writes `config.json` with `{}` if missing.
/// - Extracts bundled skills into the primary skill root if it does not exist.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        std::fs::write(config_path, b"{}")
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    }

    let (config, _) = config::load_config(Some(config_path.to_path_buf()))?;
    let skills_dir = config::resolve_skills_dir(&config, config_path);
    if !skills_dir.exists() {
        std::fs::create_dir_all(&skills_dir)
            .with_context(|| format!("creating skills directory {}", skills_dir.display()))?;
        BUNDLED_SKILLS.extract(&skills_dir).with_context(|| {
            format!("extracting bundled skills to {}", skills_dir.display())
        })?;
        log::info!("extracted bundled skills to {}", skills_dir.display());
    } else {
        log::debug!(
            "skills directory already exists at {}, skipping",
            skills_dir.display()
        );
    }

    Ok(config_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::{load_skill, validate};

    #[test]
    fn bundled_skills_are_valid() {
        let names = bundled_skill_names();
        assert!(names.contains(&"skill-authoring".to_string()));
        let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
        for name in names {
            let dir: PathBuf = [&manifest_dir, "config", "skills", &name].iter().collect();
            assert!(validate(&dir).is_empty(), "bundled skill {} is invalid", name);
            let skill = load_skill(&dir).unwrap();
            assert_eq!(skill.name(), name);
        }
    }
}
