//! Integration test: file-system repository over throwaway skill trees in the temp dir.

use std::path::{Path, PathBuf};

use skillbox::binder::{FunctionScript, Signature, ValueType};
use skillbox::repository::{FileSystemRepository, RepositoryError, SkillRepository, SkillSource};
use skillbox::skills::{load_skill, validate, Frontmatter, Script, Skill};

fn temp_root(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("skillbox-{}-{}", label, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp root");
    dir
}

fn write_skill(root: &Path, name: &str, description: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).expect("create skill dir");
    std::fs::write(
        dir.join("SKILL.md"),
        format!("---\nname: {}\ndescription: {}\n---\n\n# {}\n", name, description, name),
    )
    .expect("write SKILL.md");
    dir
}

#[test]
fn minimal_directory_has_empty_resources() {
    let root = temp_root("minimal");
    let dir = write_skill(&root, "minimal", "Only a manifest.");
    let skill = load_skill(&dir).expect("load");
    assert!(skill.resources.references.is_empty());
    assert!(skill.resources.assets.is_empty());
    assert!(skill.resources.scripts.is_empty());
    assert_eq!(skill.instructions, "# minimal");
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn lowercase_manifest_and_nested_resources_load() {
    let root = temp_root("nested");
    let dir = root.join("pdf-tools");
    std::fs::create_dir_all(dir.join("references/api")).unwrap();
    std::fs::create_dir_all(dir.join("scripts")).unwrap();
    std::fs::write(
        dir.join("skill.md"),
        "---\nname: pdf-tools\ndescription: PDFs.\n---\nBody\n",
    )
    .unwrap();
    std::fs::write(dir.join("references/api/calls.md"), "calls").unwrap();
    std::fs::write(dir.join("scripts/extract.py"), "print('x')").unwrap();
    std::fs::write(dir.join("scripts/blob.bin"), [0xff, 0xfe, 0x00, 0x81]).unwrap();

    let skill = load_skill(&dir).expect("load");
    assert_eq!(skill.resources.get_reference("api/calls.md"), Some("calls"));
    assert_eq!(skill.resources.list_scripts(), vec!["extract.py"]);
    assert!(validate(&dir).is_empty());
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn create_then_retrieve_round_trips() {
    let root = temp_root("create");
    let mut repo = FileSystemRepository::new(&root);

    let mut frontmatter = Frontmatter::new("report-builder", "Builds reports: weekly & monthly.");
    frontmatter.license = Some("MIT".to_string());
    frontmatter
        .metadata
        .insert("owner".to_string(), "data-team".to_string());
    let mut skill = Skill::new(frontmatter.clone(), "# Reports\n\nRun the script.");
    skill
        .resources
        .references
        .insert("guide/style.md".to_string(), "Be brief.".to_string());
    let render = FunctionScript::new(
        Signature::new("render").positional("title", ValueType::String),
        |args| Ok(serde_json::json!(args.get_str("title"))),
    )
    .with_source("def render(title): ...");
    skill
        .resources
        .scripts
        .insert("render.py".to_string(), render.into());

    let created = repo.create(skill).expect("create");
    assert_eq!(created.frontmatter, frontmatter);

    let got = repo.retrieve("report-builder").expect("retrieve");
    assert_eq!(got.name(), "report-builder");
    assert_eq!(got.description(), "Builds reports: weekly & monthly.");
    assert_eq!(got.instructions, "# Reports\n\nRun the script.");
    assert_eq!(got.resources.get_reference("guide/style.md"), Some("Be brief."));
    match got.resources.get_script("render.py") {
        Some(Script::Source { text }) => assert_eq!(text, "def render(title): ..."),
        other => panic!("unexpected script entry: {:?}", other),
    }
    assert_eq!(
        repo.location("report-builder"),
        Some(root.join("report-builder").join("SKILL.md"))
    );
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn retrieve_rereads_disk() {
    let root = temp_root("reread");
    let dir = write_skill(&root, "notes", "First.");
    let repo = FileSystemRepository::new(&root);
    assert_eq!(repo.retrieve("notes").unwrap().description(), "First.");
    std::fs::write(
        dir.join("SKILL.md"),
        "---\nname: notes\ndescription: Second.\n---\n",
    )
    .unwrap();
    assert_eq!(repo.retrieve("notes").unwrap().description(), "Second.");
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn missing_root_lists_nothing_and_retrieve_fails() {
    let root = std::env::temp_dir().join(format!("skillbox-absent-{}", uuid::Uuid::new_v4()));
    let repo = FileSystemRepository::new(&root);
    assert!(repo.list(None).is_empty());
    assert!(matches!(
        repo.retrieve("anything"),
        Err(RepositoryError::SkillNotFound(_))
    ));
    assert!(matches!(
        repo.retrieve("../escape"),
        Err(RepositoryError::SkillNotFound(_))
    ));
}

#[test]
fn extra_roots_override_and_filter() {
    let primary = temp_root("primary");
    let extra = temp_root("extra");
    write_skill(&primary, "shared", "From primary.");
    write_skill(&primary, "only-primary", "Primary only.");
    write_skill(&extra, "shared", "From extra.");
    std::fs::create_dir_all(primary.join("not-a-skill")).unwrap();

    let repo = FileSystemRepository::new(&primary).with_extra_dirs([extra.clone()]);
    let all = repo.list(None);
    assert_eq!(
        all.keys().cloned().collect::<Vec<_>>(),
        vec!["only-primary", "shared"]
    );
    assert_eq!(all["shared"].description, "From extra.");
    assert_eq!(repo.retrieve("shared").unwrap().description(), "From extra.");

    let extra_only = repo.list(Some(SkillSource::Extra));
    assert_eq!(extra_only.keys().cloned().collect::<Vec<_>>(), vec!["shared"]);
    let primary_only = repo.list(Some(SkillSource::Skills));
    assert_eq!(
        primary_only.keys().cloned().collect::<Vec<_>>(),
        vec!["only-primary"]
    );
    let _ = std::fs::remove_dir_all(&primary);
    let _ = std::fs::remove_dir_all(&extra);
}

#[test]
fn broken_manifest_is_skipped_in_list() {
    let root = temp_root("broken");
    write_skill(&root, "good", "Fine.");
    let bad = root.join("bad");
    std::fs::create_dir_all(&bad).unwrap();
    std::fs::write(bad.join("SKILL.md"), "---\nname: bad\n---\n").unwrap();

    let repo = FileSystemRepository::new(&root);
    let listed = repo.list(None);
    assert!(listed.contains_key("good"));
    assert!(!listed.contains_key("bad"));
    assert!(matches!(
        repo.retrieve("bad"),
        Err(RepositoryError::Parse(_))
    ));
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn disable_persists_and_enable_restores() {
    let root = temp_root("toggle");
    write_skill(&root, "toggle-me", "Toggles.");
    let mut repo = FileSystemRepository::new(&root);

    repo.disable("toggle-me").unwrap();
    assert!(root.join("toggle-me").join(".disabled").exists());
    assert!(repo.list(None).is_empty());
    assert!(repo.retrieve("toggle-me").is_ok());

    let reopened = FileSystemRepository::new(&root);
    assert!(reopened.is_disabled("toggle-me"));

    repo.enable("toggle-me").unwrap();
    assert_eq!(repo.list(None).len(), 1);
    assert!(repo.enable("ghost").is_err());
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn config_disabled_hides_without_marker() {
    let root = temp_root("config-disabled");
    write_skill(&root, "quiet", "Hidden by config.");
    let repo = FileSystemRepository::new(&root).with_disabled(["quiet".to_string()]);
    assert!(repo.list(None).is_empty());
    assert!(!root.join("quiet").join(".disabled").exists());
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn delete_removes_and_missing_is_noop() {
    let root = temp_root("delete");
    write_skill(&root, "doomed", "Goes away.");
    let mut repo = FileSystemRepository::new(&root);
    repo.delete("doomed", None).unwrap();
    assert!(!root.join("doomed").exists());
    repo.delete("doomed", None).unwrap();
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn strict_create_rejects_and_writes_nothing() {
    let root = temp_root("strict");
    let mut repo = FileSystemRepository::new(&root).with_strict(true);
    let skill = Skill::new(Frontmatter::new("Not-Valid", "x"), "");
    match repo.create(skill) {
        Err(RepositoryError::Rejected { name, violations }) => {
            assert_eq!(name, "Not-Valid");
            assert!(!violations.is_empty());
        }
        other => panic!("expected rejection, got {:?}", other.map(|s| s.frontmatter)),
    }
    assert!(!root.join("Not-Valid").exists());
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn validate_reports_directory_mismatch_and_unknown_keys() {
    let root = temp_root("validate");
    let dir = root.join("wrong-dir");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("SKILL.md"),
        "---\nname: right-name\ndescription: ok\nbogus-key: x\n---\n",
    )
    .unwrap();
    let problems = validate(&dir);
    assert!(problems.iter().any(|p| p.contains("wrong-dir")));
    assert!(problems.iter().any(|p| p.contains("bogus-key")));
    let _ = std::fs::remove_dir_all(&root);
}

fn with_references(name: &str, description: &str, refs: &[(&str, &str)]) -> Skill {
    let mut skill = Skill::new(Frontmatter::new(name, description), "# Body");
    for (path, content) in refs {
        skill
            .resources
            .references
            .insert(path.to_string(), content.to_string());
    }
    skill
}

#[test]
fn failed_create_keeps_previous_version() {
    let root = temp_root("failed-create");
    let mut repo = FileSystemRepository::new(&root);
    repo.create(with_references("versioned", "Version one.", &[("guide.md", "v1")]))
        .expect("create v1");

    // "a" is written as a file, so "a/b" cannot get its parent directory.
    let broken = with_references("versioned", "Version two.", &[("a", "x"), ("a/b", "y")]);
    assert!(matches!(
        repo.create(broken),
        Err(RepositoryError::Io { .. })
    ));

    let kept = repo.retrieve("versioned").expect("v1 still present");
    assert_eq!(kept.description(), "Version one.");
    assert_eq!(kept.resources.list_references(), vec!["guide.md"]);
    let entries: Vec<String> = std::fs::read_dir(&root)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["versioned"]);

    let replaced = repo
        .create(with_references("versioned", "Version three.", &[("new.md", "v3")]))
        .expect("create v3");
    assert_eq!(replaced.resources.list_references(), vec!["new.md"]);
    assert_eq!(repo.retrieve("versioned").unwrap().description(), "Version three.");
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn create_replaces_the_skill_that_retrieve_serves() {
    let primary = temp_root("create-primary");
    let extra = temp_root("create-extra");
    write_skill(&extra, "dup", "From extra.");
    let mut repo = FileSystemRepository::new(&primary).with_extra_dirs([extra.clone()]);

    let created = repo
        .create(Skill::new(Frontmatter::new("dup", "Freshly created."), "# dup"))
        .expect("create");
    assert_eq!(created.description(), "Freshly created.");
    assert_eq!(repo.retrieve("dup").unwrap().description(), "Freshly created.");
    assert_eq!(repo.location("dup"), Some(extra.join("dup").join("SKILL.md")));
    assert!(!primary.join("dup").exists());

    let fresh = repo
        .create(Skill::new(Frontmatter::new("brand-new", "Not shadowed."), ""))
        .expect("create new");
    assert_eq!(fresh.description(), "Not shadowed.");
    assert!(primary.join("brand-new").join("SKILL.md").exists());
    let _ = std::fs::remove_dir_all(&primary);
    let _ = std::fs::remove_dir_all(&extra);
}
