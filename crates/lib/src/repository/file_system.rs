//! File-system repository: one directory per skill under one or more roots.
//!
//! Roots are searched in order and a later root wins on identifier collision, so extra
//! directories from config override the primary skill root. Every `retrieve` reparses from disk.
//! A skill is disabled by a `.disabled` marker file in its directory.
//!
//! `create` writes into the root that currently serves the identifier (the primary root for new
//! skills). The skill is written to a hidden staging directory first and renamed into place, so a
//! failed write leaves the previous version untouched. Hidden directories are never skills.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use super::{check_acceptance, is_plain_id, RepositoryError, SkillRepository, SkillSource};
use crate::skills::{find_skill_md, load_skill, load_skill_md, Frontmatter, Skill};

const DISABLED_MARKER: &str = ".disabled";

#[derive(Debug, Clone)]
pub struct FileSystemRepository {
    roots: Vec<(PathBuf, SkillSource)>,
    /// Disabled for this process only (config.skills.disabled), on top of marker files.
    disabled: BTreeSet<String>,
    strict: bool,
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> RepositoryError + '_ {
    move |source| RepositoryError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl FileSystemRepository {
    /// Repository over a single root. New skills are written here.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            roots: vec![(root.into(), SkillSource::Skills)],
            disabled: BTreeSet::new(),
            strict: false,
        }
    }

    /// Add lower-precedence-first extra roots; each later root overrides earlier ones.
    pub fn with_extra_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.roots
            .extend(dirs.into_iter().map(|d| (d, SkillSource::Extra)));
        self
    }

    /// Reject skills with validation violations on `create`.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Treat `ids` as disabled without touching their directories.
    pub fn with_disabled(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.disabled.extend(ids);
        self
    }

    pub fn roots(&self) -> impl Iterator<Item = (&Path, SkillSource)> {
        self.roots.iter().map(|(p, s)| (p.as_path(), *s))
    }

    /// Directory holding skill `id`, searching roots from highest precedence down.
    fn resolve(&self, id: &str) -> Option<(PathBuf, SkillSource)> {
        if !is_plain_id(id) {
            return None;
        }
        self.roots.iter().rev().find_map(|(root, source)| {
            let dir = root.join(id);
            find_skill_md(&dir).map(|_| (dir, *source))
        })
    }

    fn require(&self, id: &str) -> Result<PathBuf, RepositoryError> {
        self.resolve(id)
            .map(|(dir, _)| dir)
            .ok_or_else(|| RepositoryError::SkillNotFound(id.to_string()))
    }

    pub fn is_disabled(&self, id: &str) -> bool {
        if self.disabled.contains(id) {
            return true;
        }
        self.resolve(id)
            .map(|(dir, _)| dir.join(DISABLED_MARKER).exists())
            .unwrap_or(false)
    }

    /// Skill directories under one root, by directory name. Unreadable roots yield nothing.
    fn scan(root: &Path) -> Vec<(String, PathBuf)> {
        let read_dir = match std::fs::read_dir(root) {
            Ok(d) => d,
            Err(e) => {
                log::debug!("cannot read skill root {}: {}", root.display(), e);
                return Vec::new();
            }
        };
        let mut out = Vec::new();
        for entry in read_dir.flatten() {
            let path = entry.path();
            if !path.is_dir() || find_skill_md(&path).is_none() {
                continue;
            }
            let Some(id) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if id.starts_with('.') {
                continue;
            }
            out.push((id.to_string(), path.clone()));
        }
        out
    }

    fn write_file(dir: &Path, relative: &str, content: &str) -> Result<(), RepositoryError> {
        let rel = Path::new(relative);
        if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            log::warn!("skipping resource with unsafe path: {}", relative);
            return Ok(());
        }
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        std::fs::write(&path, content).map_err(io_err(&path))
    }

    /// Root that receives a created skill: the one serving `id` now, else the primary root.
    fn target_root(&self, id: &str) -> PathBuf {
        self.roots
            .iter()
            .rev()
            .map(|(root, _)| root)
            .find(|root| find_skill_md(&root.join(id)).is_some())
            .cloned()
            .unwrap_or_else(|| self.workspace())
    }

    /// Write SKILL.md and every resource of `skill` into a fresh directory `dir`.
    fn write_skill(dir: &Path, skill: &Skill) -> Result<(), RepositoryError> {
        let manifest = skill.to_skill_md()?;
        std::fs::create_dir(dir).map_err(io_err(dir))?;
        Self::write_file(dir, "SKILL.md", &manifest)?;
        let resources = &skill.resources;
        for (path, content) in &resources.references {
            Self::write_file(dir, &format!("references/{}", path), content)?;
        }
        for (path, content) in &resources.assets {
            Self::write_file(dir, &format!("assets/{}", path), content)?;
        }
        for (path, script) in &resources.scripts {
            Self::write_file(dir, &format!("scripts/{}", path), script.src())?;
        }
        Ok(())
    }

    /// Move a fully written `staging` directory to `dir`, replacing what was there.
    fn swap_in(staging: &Path, dir: &Path, id: &str) -> Result<(), RepositoryError> {
        if !dir.exists() {
            return std::fs::rename(staging, dir).map_err(io_err(dir));
        }
        let retired = dir.with_file_name(format!(".{}.old-{}", id, uuid::Uuid::new_v4()));
        std::fs::rename(dir, &retired).map_err(io_err(dir))?;
        if let Err(e) = std::fs::rename(staging, dir) {
            if let Err(restore) = std::fs::rename(&retired, dir) {
                log::error!("cannot restore {} from {}: {}", dir.display(), retired.display(), restore);
            }
            return Err(io_err(dir)(e));
        }
        if let Err(e) = std::fs::remove_dir_all(&retired) {
            log::warn!("cannot remove replaced skill at {}: {}", retired.display(), e);
        }
        log::info!("replaced skill {} at {}", id, dir.display());
        Ok(())
    }
}

impl SkillRepository for FileSystemRepository {
    fn backend(&self) -> &'static str {
        "file-system"
    }

    fn workspace(&self) -> PathBuf {
        self.roots
            .first()
            .map(|(root, _)| root.clone())
            .unwrap_or_default()
    }

    fn list(&self, source: Option<SkillSource>) -> BTreeMap<String, Frontmatter> {
        let mut merged: BTreeMap<String, (PathBuf, SkillSource)> = BTreeMap::new();
        for (root, root_source) in &self.roots {
            for (id, dir) in Self::scan(root) {
                merged.insert(id, (dir, *root_source));
            }
        }

        let mut out = BTreeMap::new();
        for (id, (dir, from)) in merged {
            if source.is_some_and(|s| s != from) {
                continue;
            }
            if self.disabled.contains(&id) || dir.join(DISABLED_MARKER).exists() {
                log::debug!("skill {} is disabled", id);
                continue;
            }
            match load_skill_md(&dir) {
                Ok((frontmatter, _)) => {
                    out.insert(id, frontmatter);
                }
                Err(e) => log::warn!("skipping skill at {}: {}", dir.display(), e),
            }
        }
        out
    }

    fn retrieve(&self, id: &str) -> Result<Skill, RepositoryError> {
        let dir = self.require(id)?;
        Ok(load_skill(&dir)?)
    }

    fn location(&self, id: &str) -> Option<PathBuf> {
        self.resolve(id).and_then(|(dir, _)| find_skill_md(&dir))
    }

    fn create(&mut self, skill: Skill) -> Result<Skill, RepositoryError> {
        check_acceptance(&skill, self.strict)?;
        let id = skill.name().to_string();
        if !is_plain_id(&id) {
            return Err(RepositoryError::Rejected {
                name: id,
                violations: vec!["Skill name cannot be used as a directory name".to_string()],
            });
        }
        let root = self.target_root(&id);
        std::fs::create_dir_all(&root).map_err(io_err(&root))?;
        let dir = root.join(&id);
        let staging = root.join(format!(".{}.tmp-{}", id, uuid::Uuid::new_v4()));

        let written = Self::write_skill(&staging, &skill)
            .and_then(|()| Self::swap_in(&staging, &dir, &id));
        if let Err(e) = written {
            if staging.exists() {
                if let Err(cleanup) = std::fs::remove_dir_all(&staging) {
                    log::warn!("cannot remove staging dir {}: {}", staging.display(), cleanup);
                }
            }
            return Err(e);
        }
        self.disabled.remove(&id);
        log::info!("created skill {} at {}", id, dir.display());
        Ok(load_skill(&dir)?)
    }

    fn delete(&mut self, id: &str, version: Option<&str>) -> Result<(), RepositoryError> {
        if let Some(v) = version {
            log::debug!("{}: versions are not tracked, ignoring {}", self.backend(), v);
        }
        let Some((dir, _)) = self.resolve(id) else {
            return Ok(());
        };
        std::fs::remove_dir_all(&dir).map_err(io_err(&dir))?;
        log::info!("deleted skill {} at {}", id, dir.display());
        Ok(())
    }

    fn enable(&mut self, id: &str) -> Result<(), RepositoryError> {
        let marker = self.require(id)?.join(DISABLED_MARKER);
        self.disabled.remove(id);
        if marker.exists() {
            std::fs::remove_file(&marker).map_err(io_err(&marker))?;
            log::info!("enabled skill {}", id);
        }
        Ok(())
    }

    fn disable(&mut self, id: &str) -> Result<(), RepositoryError> {
        let marker = self.require(id)?.join(DISABLED_MARKER);
        if !marker.exists() {
            std::fs::write(&marker, b"").map_err(io_err(&marker))?;
            log::info!("disabled skill {}", id);
        }
        Ok(())
    }
}
