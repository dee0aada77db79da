use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use skillbox::repository::{SkillRepository, SkillSource};
use skillbox::tools::SkillTool;

#[derive(Parser)]
#[command(name = "skillbox")]
#[command(about = "Skillbox CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and default files (config and bundled skills).
    Init {
        /// Config file path (default: SKILLBOX_CONFIG_PATH or ~/.skillbox/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// List enabled skills from the skill root and extra dirs.
    List {
        /// Config file path (default: SKILLBOX_CONFIG_PATH or ~/.skillbox/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Only skills from this source: "skills" or "extra".
        #[arg(long, value_name = "SOURCE")]
        source: Option<SkillSource>,
    },

    /// Print one skill (frontmatter, instructions, and resource paths) as JSON.
    Show {
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Skill identifier (its directory name).
        id: String,
    },

    /// Check a skill directory against the SKILL.md rules. Exits with 1 when problems are found.
    Validate {
        /// Skill directory.
        dir: PathBuf,
    },

    /// Enable a skill (removes its .disabled marker).
    Enable {
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        id: String,
    },

    /// Disable a skill (writes a .disabled marker; the skill stays on disk).
    Disable {
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        id: String,
    },

    /// Print the system prompt section and the manage_skills tool definition.
    Prompt {
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run one manage_skills request (a JSON object) and print the JSON result.
    Call {
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Request, e.g. '{"action": "view_file", "skill_name": "skill-authoring", "file_path": "SKILL.md"}'
        request: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Version) => {
            println!("skillbox {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Init { config }) => run_init(config),
        Some(Commands::List { config, source }) => run_list(config, source),
        Some(Commands::Show { config, id }) => run_show(config, &id),
        Some(Commands::Validate { dir }) => run_validate(&dir),
        Some(Commands::Enable { config, id }) => run_toggle(config, &id, true),
        Some(Commands::Disable { config, id }) => run_toggle(config, &id, false),
        Some(Commands::Prompt { config }) => run_prompt(config),
        Some(Commands::Call { config, request }) => run_call(config, &request),
        None => {
            println!("Run with --help for usage");
            Ok(())
        }
    };
    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn open(config_path: Option<PathBuf>) -> anyhow::Result<skillbox::repository::FileSystemRepository> {
    let (config, path) = skillbox::config::load_config(config_path)?;
    skillbox::init::require_initialized(&path, &config)?;
    Ok(skillbox::config::open_repository(&config, &path))
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(skillbox::config::default_config_path);
    let dir = skillbox::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

fn run_list(config_path: Option<PathBuf>, source: Option<SkillSource>) -> anyhow::Result<()> {
    let repo = open(config_path)?;
    let listed = repo.list(source);
    if listed.is_empty() {
        println!("no skills found under {}", repo.workspace().display());
    }
    for (id, fm) in listed {
        println!("{:<24} {}", id, fm.description);
    }
    Ok(())
}

fn run_show(config_path: Option<PathBuf>, id: &str) -> anyhow::Result<()> {
    let repo = open(config_path)?;
    let skill = repo.retrieve(id)?;
    let out = json!({
        "id": id,
        "location": repo.location(id).map(|p| p.display().to_string()),
        "disabled": repo.is_disabled(id),
        "frontmatter": skill.frontmatter,
        "instructions": skill.instructions,
        "references": skill.resources.list_references(),
        "assets": skill.resources.list_assets(),
        "scripts": skill.resources.list_scripts(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn run_validate(dir: &std::path::Path) -> anyhow::Result<()> {
    let problems = skillbox::skills::validate(dir);
    if problems.is_empty() {
        println!("{}: ok", dir.display());
        return Ok(());
    }
    for p in &problems {
        println!("{}: {}", dir.display(), p);
    }
    anyhow::bail!("{} problem(s) found in {}", problems.len(), dir.display())
}

fn run_toggle(config_path: Option<PathBuf>, id: &str, enable: bool) -> anyhow::Result<()> {
    let mut repo = open(config_path)?;
    if enable {
        repo.enable(id)?;
        println!("enabled {}", id);
    } else {
        repo.disable(id)?;
        println!("disabled {}", id);
    }
    Ok(())
}

fn run_prompt(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let tool = SkillTool::new(Arc::new(open(config_path)?));
    println!("{}", tool.system_instruction());
    println!();
    println!("{}", serde_json::to_string_pretty(&tool.definition())?);
    Ok(())
}

fn run_call(config_path: Option<PathBuf>, request: &str) -> anyhow::Result<()> {
    let args: serde_json::Value = serde_json::from_str(request)
        .map_err(|e| anyhow::anyhow!("request is not valid JSON: {}", e))?;
    let tool = SkillTool::new(Arc::new(open(config_path)?));
    let out = tool.dispatch(&args);
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
