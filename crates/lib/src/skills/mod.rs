//! Skills: AgentSkills-compatible SKILL.md definitions.
//!
//! A skill directory holds SKILL.md (YAML frontmatter + markdown instructions) and optional
//! `references/`, `assets/`, and `scripts/` subdirectories. The loader parses it into a [`Skill`];
//! the validator checks frontmatter against the naming and length rules.

mod loader;
mod model;
pub mod prompt;
pub mod validator;

pub use loader::{
    find_skill_md, frontmatter_fields, load_directory_files, load_skill, load_skill_md,
    parse_skill_md, split_frontmatter, LoadedFiles, ParseError, SKILL_MD_NAMES,
};
pub use model::{Frontmatter, Resources, Script, Skill};
pub use prompt::{format_skills_as_xml, format_skills_as_xml_with_location};
pub use validator::{validate, validate_skill};
