//! ai-commit - CLI entry point.

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ai_commit::preferences::apply_config_action;
use ai_commit::{
    CommitWorkflow, Config, ConfigAction, FilePreferenceStore, GitGateway, Preferences,
    ProcessRunner, select_provider,
};

const AFTER_HELP: &str = "\
ENVIRONMENT VARIABLES:
    AI provider (the first configured one is used):

    1. OpenAI / OpenAI-compatible APIs (OpenRouter, Together, ...):
       OPENAI_API_KEY        API key (required)
       OPENAI_MODEL          Model name (default: gpt-4o-mini)
       OPENAI_BASE_URL       API endpoint (default: https://api.openai.com)

    2. Anthropic:
       ANTHROPIC_API_KEY     API key (required)
       ANTHROPIC_MODEL       Model name (default: claude-sonnet-4-0)
       ANTHROPIC_BASE_URL    API endpoint (default: https://api.anthropic.com)

    3. Google Gemini:
       GOOGLE_API_KEY        API key (required)
       GOOGLE_MODEL          Model name (default: gemini-2.0-flash)

    4. DeepSeek:
       DEEPSEEK_API_KEY      API key (required)
       DEEPSEEK_MODEL        Model name (default: deepseek-chat)

    5. Ollama (local models):
       OLLAMA_MODEL          Model name (required, e.g. llama3, qwen2.5)
       OLLAMA_BASE_URL       Server URL (default: http://localhost:11434)

    Optional settings:
       AI_LOG_LEVEL          Log filter: error, warn, info, debug (default: warn)
       AI_TEMPERATURE        Model temperature 0.0-2.0 (default: 0.1)
       AI_COMMAND_TIMEOUT    Git command timeout in seconds (default: 30)
       AI_COMMIT_CONFIG_DIR  Directory holding preferences.json

PRIORITY ORDER:
    OpenAI > Anthropic > Google > DeepSeek > Ollama

EXAMPLES:
    export OLLAMA_MODEL=\"llama3\"
    git add .
    ai-commit

    ai-commit config --auto-commit on";

const CONFIG_AFTER_HELP: &str = "\
NOTES:
    - Settings persist across runs
    - Auto-commit skips the regenerate, edit and cancel options
    - If AI generation fails, auto-commit does not commit";

/// Generate conventional commit messages for staged changes using AI.
#[derive(Parser, Debug)]
#[command(name = "ai-commit")]
#[command(about = "Generate conventional commit messages using AI")]
#[command(version, disable_version_flag = true)]
#[command(after_help = AFTER_HELP)]
struct Cli {
    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage persistent settings
    #[command(after_help = CONFIG_AFTER_HELP)]
    Config(ConfigArgs),
}

#[derive(Args, Debug, Default, PartialEq, Eq)]
#[group(multiple = false)]
struct ConfigArgs {
    /// Show current settings
    #[arg(long)]
    show: bool,

    /// Enable or disable auto-commit; prints the current state without a value
    #[arg(long, value_name = "on|off", value_parser = parse_switch)]
    auto_commit: Option<Option<bool>>,

    /// Enable or disable auto-push; prints the current state without a value
    #[arg(long, value_name = "on|off", value_parser = parse_switch)]
    auto_push: Option<Option<bool>>,

    /// Reset all settings to defaults
    #[arg(long)]
    reset: bool,
}

impl ConfigArgs {
    fn action(&self) -> ConfigAction {
        if self.show {
            ConfigAction::Show
        } else if let Some(value) = self.auto_commit {
            ConfigAction::AutoCommit(value)
        } else if let Some(value) = self.auto_push {
            ConfigAction::AutoPush(value)
        } else if self.reset {
            ConfigAction::Reset
        } else {
            ConfigAction::Usage
        }
    }
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => Err(format!("expected 'on' or 'off', got '{other}'")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!("{:?}", err);
            eprintln!("\nAn error occurred: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Install a stderr subscriber filtered by `AI_LOG_LEVEL`, then `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("AI_LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .without_time()
                .with_target(false),
        )
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Config(args)) => run_config(&args),
        None => run_commit().await,
    }
}

fn run_config(args: &ConfigArgs) -> Result<()> {
    let store = FilePreferenceStore::open_default()?;
    let mut stdout = io::stdout().lock();
    apply_config_action(args.action(), &store, &mut stdout)
        .with_context(|| format!("Failed to update {}", store.path().display()))?;
    Ok(())
}

async fn run_commit() -> Result<()> {
    let config = Config::from_env();
    debug!("Loaded configuration: {:?}", config);

    let client = select_provider(&config)?;
    let store = FilePreferenceStore::open_default()?;
    let preferences = Preferences::load(&store);
    let git = GitGateway::new(ProcessRunner::new(config.command_timeout), None);

    let mut workflow = CommitWorkflow::new(
        git,
        client,
        preferences,
        io::stdin().lock(),
        io::stdout(),
    );
    let outcome = workflow.generate_and_commit().await?;
    debug!("Workflow finished: {:?}", outcome);

    Ok(())
}
