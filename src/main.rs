// ABOUTME: Entry point for the skillgate binary.
// ABOUTME: Lists discovered skills or prints the skills prompt block for a pair of skill roots.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use skillgate_agent::config::expand_tilde;
use skillgate_agent::{AgentMiddleware, SessionState, SkillsConfig, SkillsMiddleware};

#[derive(Parser, Debug)]
#[command(name = "skillgate", version, about = "Inspect agent skill catalogs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the merged skill catalog
    List {
        #[command(flatten)]
        roots: RootArgs,

        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the skills block exactly as it is appended to a system prompt
    Render {
        #[command(flatten)]
        roots: RootArgs,
    },
}

#[derive(Args, Debug)]
struct RootArgs {
    /// User skills root (overrides SKILLGATE_USER_SKILLS_DIR)
    #[arg(long, value_name = "DIR")]
    user_dir: Option<PathBuf>,

    /// Project skills root (overrides SKILLGATE_PROJECT_SKILLS_DIR)
    #[arg(long, value_name = "DIR")]
    project_dir: Option<PathBuf>,

    /// Report skill directories with broken descriptors
    #[arg(long)]
    strict: bool,
}

impl RootArgs {
    fn into_config(self) -> anyhow::Result<SkillsConfig> {
        let mut config = SkillsConfig::from_env()?;
        if let Some(user_dir) = self.user_dir {
            config.user_dir = expand_tilde(user_dir);
        }
        if let Some(project_dir) = self.project_dir {
            config = config.with_project_dir(project_dir);
        }
        if self.strict {
            config = config.strict(true);
        }
        Ok(config)
    }
}

/// Scan the configured roots into a fresh session state.
async fn load_state(middleware: &SkillsMiddleware) -> SessionState {
    let mut state = SessionState::new();
    middleware.before_agent(&mut state).await;
    state
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("skillgate=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(command = ?cli.command, "skillgate starting");

    match cli.command {
        Command::List { roots, json } => {
            let middleware = SkillsMiddleware::new(roots.into_config()?);
            let state = load_state(&middleware).await;
            let catalog = state.skills_catalog();

            if json {
                println!("{}", serde_json::to_string_pretty(&catalog)?);
            } else if catalog.is_empty() {
                println!("No skills found.");
            } else {
                for skill in &catalog {
                    println!("{:<8} {:<24} {}", skill.source.label(), skill.name, skill.description);
                    println!("{:<8} {:<24} {}", "", "", skill.path.display());
                }
            }

            for rejected in state.rejected_skills() {
                eprintln!("skipped {}: {}", rejected.dir.display(), rejected.reason);
            }
        }
        Command::Render { roots } => {
            let middleware = SkillsMiddleware::new(roots.into_config()?);
            let state = load_state(&middleware).await;
            print!("{}", middleware.render_section(&state));
        }
    }

    Ok(())
}
