//! The `manage_skills` tool: lets a model list skills, read their files, and run bound scripts.
//!
//! Every request yields a JSON payload. Failures are reported as `{"error": "..."}` with a hint
//! the model can act on; they never surface as Rust errors.

use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::{CallableRegistry, ToolDefinition, ToolExecutor};
use crate::binder::FunctionScript;
use crate::repository::{available_skills_xml, run_bound, SkillRepository, SkillSource};
use crate::skills::{Script, Skill};

pub const SKILL_TOOL_NAME: &str = "manage_skills";

pub const SKILL_TOOL_ACTIONS: [&str; 7] = [
    "list",
    "view_file",
    "view_manifest",
    "list_files",
    "load_reference",
    "load_asset",
    "run_script",
];

const CATEGORIES: [&str; 3] = ["references", "assets", "scripts"];

const TOOL_DESCRIPTION: &str = "Discover, read, and run agent skills.

Examples:
- Read a skill's instructions: manage_skills(action=\"view_file\", skill_name=\"SKILL_NAME\", file_path=\"SKILL.md\")
- Read a script: manage_skills(action=\"view_file\", skill_name=\"SKILL_NAME\", file_path=\"scripts/SCRIPT_NAME\")
- List files: manage_skills(action=\"list_files\", skill_name=\"SKILL_NAME\", file_path=\"references\")
- Run a script: manage_skills(action=\"run_script\", skill_name=\"SKILL_NAME\", file_path=\"scripts/SCRIPT_NAME\", args=\"--flag value\")
";

const SYSTEM_INSTRUCTION: &str = "You have access to skills: folders of instructions, scripts, and resources for specialized tasks. Use the `manage_skills` tool to work with them.

Each skill contains:
- SKILL.md: metadata and the full instructions.
- references/: optional supporting documentation.
- assets/: optional templates and data files.
- scripts/: optional helpers you can run.

When a skill looks relevant, read its SKILL.md with action \"view_file\" before doing anything else, then follow its instructions in order. Run skill scripts only through action \"run_script\". Use \"view_file\" only for files inside a skill.
";

/// Dispatcher over a repository plus natively registered scripts.
pub struct SkillTool {
    repository: Arc<dyn SkillRepository>,
    registry: CallableRegistry,
}

fn error(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

/// Split `path` into a resource category and the path inside it.
fn split_category(path: &str) -> Option<(&'static str, &str)> {
    CATEGORIES.iter().find_map(|c| {
        path.strip_prefix(c)
            .and_then(|rest| rest.strip_prefix('/'))
            .map(|rest| (*c, rest))
    })
}

fn clean_path(path: &str) -> &str {
    path.trim().trim_start_matches("./")
}

impl SkillTool {
    pub fn new(repository: Arc<dyn SkillRepository>) -> Self {
        Self {
            repository,
            registry: CallableRegistry::new(),
        }
    }

    pub fn with_registry(mut self, registry: CallableRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Tool definition; the description ends with the `<available_skills>` listing.
    pub fn definition(&self) -> ToolDefinition {
        let description = format!(
            "{}\n{}",
            TOOL_DESCRIPTION,
            available_skills_xml(self.repository.as_ref())
        );
        ToolDefinition::function(
            SKILL_TOOL_NAME,
            description,
            json!({
                "type": "object",
                "required": ["action"],
                "properties": {
                    "action": {
                        "type": "string",
                        "enum": SKILL_TOOL_ACTIONS,
                        "description": "What to do: list skills, view or list a skill's files, load a reference or asset, or run a script."
                    },
                    "skill_name": {
                        "type": "string",
                        "description": "Name of the target skill, exactly as listed."
                    },
                    "file_path": {
                        "type": "string",
                        "description": "Path inside the skill: 'SKILL.md', 'references/doc.md', 'scripts/tool.py'; for list_files a directory such as 'references'."
                    },
                    "args": {
                        "description": "Script arguments for run_script: a command line string, an array of tokens, or an object of named arguments.",
                        "anyOf": [
                            { "type": "string" },
                            { "type": "array" },
                            { "type": "object" }
                        ]
                    },
                    "source": {
                        "type": "string",
                        "enum": ["skills", "extra", "memory"],
                        "description": "For list: only skills from this source."
                    }
                }
            }),
        )
    }

    /// System prompt section introducing skills, followed by the listing.
    pub fn system_instruction(&self) -> String {
        format!(
            "{}\n{}",
            SYSTEM_INSTRUCTION,
            available_skills_xml(self.repository.as_ref())
        )
    }

    /// Handle one request and return its payload.
    pub fn dispatch(&self, args: &Value) -> Value {
        let action = args.get("action").and_then(Value::as_str).unwrap_or("");
        if !SKILL_TOOL_ACTIONS.contains(&action) {
            return error(format!(
                "Unknown action: '{}'. Valid actions are: {}",
                action,
                SKILL_TOOL_ACTIONS.join(", ")
            ));
        }
        if action == "list" {
            return self.list(args.get("source").and_then(Value::as_str));
        }

        let Some(skill_name) = args
            .get("skill_name")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
        else {
            return error(format!("skill_name is required for action '{}'.", action));
        };
        let skill = match self.repository.retrieve(skill_name) {
            Ok(s) => s,
            Err(e) => {
                log::debug!("retrieving {}: {}", skill_name, e);
                return error(format!(
                    "Failed to retrieve skill '{}'. Check the tool definition for the list of \
                     available skills and verify the skill name.",
                    skill_name
                ));
            }
        };
        let file_path = args
            .get("file_path")
            .and_then(Value::as_str)
            .map(clean_path)
            .filter(|p| !p.is_empty());

        match action {
            "view_manifest" => self.view_file(&skill, file_path.unwrap_or("SKILL.md")),
            "view_file" => match file_path {
                Some(p) => self.view_file(&skill, p),
                None => error("file_path is required for 'view_file' action."),
            },
            "list_files" => self.list_files(&skill, file_path),
            "load_reference" | "load_asset" => {
                let category = if action == "load_reference" {
                    "references"
                } else {
                    "assets"
                };
                match file_path {
                    Some(p) => self.load_resource(&skill, category, p),
                    None => error(format!("file_path is required for '{}' action.", action)),
                }
            }
            _ => match file_path {
                Some(p) => self.run_script(&skill, p, args.get("args").unwrap_or(&Value::Null)),
                None => error("file_path is required for 'run_script' action."),
            },
        }
    }

    fn list(&self, source: Option<&str>) -> Value {
        let source = match source.map(str::parse::<SkillSource>).transpose() {
            Ok(s) => s,
            Err(e) => return error(e),
        };
        let skills: Vec<Value> = self
            .repository
            .list(source)
            .into_iter()
            .map(|(id, fm)| {
                json!({
                    "id": id,
                    "name": fm.name,
                    "description": fm.description,
                })
            })
            .collect();
        json!({ "skills": skills })
    }

    fn view_file(&self, skill: &Skill, file_path: &str) -> Value {
        let content = if file_path.eq_ignore_ascii_case("SKILL.md") {
            Some(skill.instructions.clone())
        } else {
            match split_category(file_path) {
                Some(("references", rel)) => skill.resources.get_reference(rel).map(str::to_string),
                Some(("assets", rel)) => skill.resources.get_asset(rel).map(str::to_string),
                Some((_, rel)) => self
                    .script(skill, rel)
                    .map(|s| s.src().to_string()),
                None => {
                    return error(format!(
                        "Invalid file_path for view_file: '{}'. Expected 'SKILL.md' or a path \
                         starting with 'references/', 'assets/', or 'scripts/'.",
                        file_path
                    ))
                }
            }
        };
        match content {
            Some(content) => json!({
                "skill_name": skill.name(),
                "file_path": file_path,
                "content": content,
            }),
            None => not_found(skill, file_path),
        }
    }

    fn list_files(&self, skill: &Skill, file_path: Option<&str>) -> Value {
        let dir = file_path.unwrap_or(".").trim_end_matches('/');
        if dir.is_empty() || dir == "." {
            return json!({
                "skill_name": skill.name(),
                "files": ["SKILL.md"],
                "directories": CATEGORIES,
            });
        }
        let files = match dir {
            "references" => skill.resources.list_references(),
            "assets" => skill.resources.list_assets(),
            "scripts" => {
                let mut files = skill.resources.list_scripts();
                for p in self.registry.scripts_for(skill.name()) {
                    if !files.contains(&p) {
                        files.push(p);
                    }
                }
                files.sort();
                files
            }
            _ => {
                return error(format!(
                    "Invalid directory for list_files: '{}'. Must be 'references', 'assets', or \
                     'scripts'.",
                    dir
                ))
            }
        };
        json!({
            "skill_name": skill.name(),
            "directory": dir,
            "files": files,
        })
    }

    fn load_resource(&self, skill: &Skill, category: &str, file_path: &str) -> Value {
        let rel = match split_category(file_path) {
            Some((c, rel)) if c == category => rel,
            _ => file_path,
        };
        let content = if category == "references" {
            skill.resources.get_reference(rel)
        } else {
            skill.resources.get_asset(rel)
        };
        match content {
            Some(content) => json!({
                "skill_name": skill.name(),
                "file_path": format!("{}/{}", category, rel),
                "content": content,
            }),
            None => not_found(skill, file_path),
        }
    }

    /// Script at `path`: a bound script on the skill, else a registered function, else source.
    fn script(&self, skill: &Skill, path: &str) -> Option<Script> {
        match skill.resources.get_script(path) {
            Some(s @ Script::Bound(_)) => Some(s.clone()),
            other => self
                .registry
                .get(skill.name(), path)
                .map(|f| Script::Bound(f.clone()))
                .or_else(|| other.cloned()),
        }
    }

    fn run_script(&self, skill: &Skill, file_path: &str, args: &Value) -> Value {
        let script_name = file_path.strip_prefix("scripts/").unwrap_or(file_path);
        let result = match self.script(skill, script_name) {
            Some(Script::Bound(function)) => self.invoke(&function, args),
            Some(Script::Source { .. }) => Err(format!(
                "script '{}' has no registered function; only bound scripts can run",
                script_name
            )),
            None => Err(format!("script '{}' not found", script_name)),
        };
        match result {
            Ok(value) => json!({
                "skill_name": skill.name(),
                "file_path": format!("scripts/{}", script_name),
                "result": value,
            }),
            Err(e) => error(format!(
                "Error running script '{}' from skill '{}': {}. You may want to verify the script \
                 name using list_files(file_path='scripts') or check SKILL.md or the script itself \
                 for correct usage and arguments.",
                script_name,
                skill.name(),
                e
            )),
        }
    }

    fn invoke(&self, function: &FunctionScript, args: &Value) -> Result<Value, String> {
        run_bound(function, args).map_err(|e| e.to_string())
    }
}

fn not_found(skill: &Skill, file_path: &str) -> Value {
    error(format!(
        "File '{}' not found in skill '{}'. Use action='list_files' with file_path='references', \
         'assets', or 'scripts' to see available files in this skill.",
        file_path,
        skill.name()
    ))
}

impl ToolExecutor for SkillTool {
    fn execute(&self, name: &str, args: &Value) -> Result<String, String> {
        if name != SKILL_TOOL_NAME {
            return Err(format!("unknown tool: {}", name));
        }
        let args = match args {
            Value::Object(_) => args.clone(),
            Value::String(s) => serde_json::from_str(s)
                .map_err(|e| format!("invalid arguments for {}: {}", SKILL_TOOL_NAME, e))?,
            _ => Value::Object(Map::new()),
        };
        Ok(self.dispatch(&args).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{Signature, ValueType};
    use crate::repository::InMemoryRepository;
    use crate::skills::Frontmatter;

    fn tool() -> SkillTool {
        let sig = Signature::new("add")
            .positional("a", ValueType::Integer)
            .positional("b", ValueType::Integer);
        let add = FunctionScript::new(sig, |args| {
            Ok(json!(args.get_i64("a").unwrap_or(0) + args.get_i64("b").unwrap_or(0)))
        });
        let mut skill = Skill::new(
            Frontmatter::new("calc", "Arithmetic helpers."),
            "# Calc\n\nRun scripts/add.py A B.",
        );
        skill
            .resources
            .references
            .insert("usage.md".to_string(), "Add numbers.".to_string());
        skill.resources.scripts.insert("add.py".to_string(), add.into());
        skill
            .resources
            .scripts
            .insert("raw.sh".to_string(), Script::source("echo raw"));
        SkillTool::new(Arc::new(InMemoryRepository::new().with_skills([skill])))
    }

    #[test]
    fn view_skill_md_returns_instructions() {
        let out = tool().dispatch(&json!({
            "action": "view_file", "skill_name": "calc", "file_path": "SKILL.md"
        }));
        assert_eq!(out["content"], "# Calc\n\nRun scripts/add.py A B.");
        let out = tool().dispatch(&json!({"action": "view_manifest", "skill_name": "calc"}));
        assert_eq!(out["file_path"], "SKILL.md");
    }

    #[test]
    fn run_script_with_command_line_and_object() {
        let t = tool();
        let out = t.dispatch(&json!({
            "action": "run_script", "skill_name": "calc", "file_path": "scripts/add.py", "args": "2 3"
        }));
        assert_eq!(out["result"], 5);
        let out = t.dispatch(&json!({
            "action": "run_script", "skill_name": "calc", "file_path": "add.py", "args": {"a": 4, "b": "6"}
        }));
        assert_eq!(out["result"], 10);
    }

    #[test]
    fn source_scripts_do_not_run() {
        let out = tool().dispatch(&json!({
            "action": "run_script", "skill_name": "calc", "file_path": "scripts/raw.sh"
        }));
        let msg = out["error"].as_str().unwrap();
        assert!(msg.contains("raw.sh"));
        assert!(msg.contains("list_files"));
    }

    #[test]
    fn list_files_root_and_directory() {
        let t = tool();
        let out = t.dispatch(&json!({"action": "list_files", "skill_name": "calc"}));
        assert_eq!(out["files"], json!(["SKILL.md"]));
        assert_eq!(out["directories"], json!(["references", "assets", "scripts"]));
        let out = t.dispatch(&json!({
            "action": "list_files", "skill_name": "calc", "file_path": "scripts/"
        }));
        assert_eq!(out["files"], json!(["add.py", "raw.sh"]));
        let out = t.dispatch(&json!({
            "action": "list_files", "skill_name": "calc", "file_path": "bin"
        }));
        assert!(out.get("error").is_some());
    }

    #[test]
    fn load_reference_accepts_either_path_form() {
        let t = tool();
        for path in ["usage.md", "references/usage.md"] {
            let out = t.dispatch(&json!({
                "action": "load_reference", "skill_name": "calc", "file_path": path
            }));
            assert_eq!(out["content"], "Add numbers.");
        }
        let out = t.dispatch(&json!({
            "action": "load_asset", "skill_name": "calc", "file_path": "missing.txt"
        }));
        assert!(out["error"].as_str().unwrap().contains("not found"));
    }

    #[test]
    fn errors_for_bad_requests() {
        let t = tool();
        assert!(t.dispatch(&json!({"action": "explode"}))["error"]
            .as_str()
            .unwrap()
            .contains("Unknown action"));
        assert!(t.dispatch(&json!({"action": "view_file"}))["error"]
            .as_str()
            .unwrap()
            .contains("skill_name is required"));
        assert!(t.dispatch(&json!({"action": "view_file", "skill_name": "nope"}))["error"]
            .as_str()
            .unwrap()
            .contains("Failed to retrieve skill 'nope'"));
        assert!(t.dispatch(&json!({
            "action": "view_file", "skill_name": "calc", "file_path": "secret.txt"
        }))["error"]
            .as_str()
            .unwrap()
            .contains("Invalid file_path"));
    }

    #[test]
    fn list_and_definition_include_skills() {
        let t = tool();
        let out = t.dispatch(&json!({"action": "list"}));
        assert_eq!(out["skills"][0]["name"], "calc");
        let def = t.definition();
        assert_eq!(def.function.name, SKILL_TOOL_NAME);
        assert!(def
            .function
            .description
            .unwrap_or_default()
            .contains("<name>\ncalc\n</name>"));
        assert!(t.system_instruction().contains("<available_skills>"));
    }

    #[test]
    fn executor_rejects_other_tool_names() {
        let t = tool();
        assert!(t.execute("read_skill", &json!({})).is_err());
        let out = t
            .execute(SKILL_TOOL_NAME, &json!({"action": "list"}))
            .unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert!(parsed["skills"].is_array());
    }
}
