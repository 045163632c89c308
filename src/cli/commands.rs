//! CLI command definitions for the jury.
//!
//! Every command opens the case store; only the commands that call a model
//! (`advance`, `run`) require an API key.

use async_trait::async_trait;
use clap::{Args, Parser};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::agents::{
    split_thinking, AgentInvoker, Case, CaseConfig, CaseSummary, DebateOrchestrator, DebateRole,
    ResponseNormalizer, DEFAULT_HISTORY_LIMIT,
};
use crate::config::JuryConfig;
use crate::error::LlmError;
use crate::llm::{GenerationRequest, GenerationResponse, LlmProvider, OpenRouterProvider, Pricing};
use crate::metrics::init_metrics;
use crate::report::{render_markdown, report_file_name};
use crate::storage::{CaseStore, SqliteCaseStore};

/// Proposer/Critic/Judge debate over LLM agents.
#[derive(Parser)]
#[command(name = "jury")]
#[command(about = "Run a Proposer/Critic/Judge debate over LLM agents")]
#[command(version)]
#[command(
    long_about = "jury sends a query through three LLM agents: a Proposer drafts a solution, a Critic attacks it and a Judge issues a verdict with a confidence score.\n\nExample usage:\n  jury run \"Design a rate limiter for a public API\"\n  jury advance 3 critic"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Case store URL (sqlite://path or sqlite::memory:).
    #[arg(long, env = "JURY_DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// OpenRouter API key.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Print machine-readable JSON instead of text.
    #[arg(short, long, global = true)]
    pub json: bool,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a case (or reuse a completed case with the same query).
    Start(StartArgs),

    /// Run one debate stage of a case.
    Advance(AdvanceArgs),

    /// Start a case and run all three stages.
    Run(StartArgs),

    /// Show a case with its transcript.
    Show(CaseArgs),

    /// List recent cases.
    #[command(alias = "ls")]
    History(HistoryArgs),

    /// Rate a case's verdict from 1 to 5.
    Rate(RateArgs),

    /// Export a case as Markdown.
    Report(ReportArgs),
}

/// Per-role model and persona overrides.
#[derive(Args, Debug, Default, Clone)]
pub struct RoleArgs {
    /// Model for the Proposer.
    #[arg(long)]
    pub proposer_model: Option<String>,

    /// Model for the Critic.
    #[arg(long)]
    pub critic_model: Option<String>,

    /// Model for the Judge.
    #[arg(long)]
    pub judge_model: Option<String>,

    /// Persona for the Proposer.
    #[arg(long)]
    pub proposer_persona: Option<String>,

    /// Persona for the Critic.
    #[arg(long)]
    pub critic_persona: Option<String>,

    /// Persona for the Judge.
    #[arg(long)]
    pub judge_persona: Option<String>,
}

impl RoleArgs {
    /// Builds the case configuration; unset values use the role defaults.
    pub fn to_case_config(&self) -> CaseConfig {
        let mut config = CaseConfig::default();
        let overrides = [
            (DebateRole::Proposer, &self.proposer_model, &self.proposer_persona),
            (DebateRole::Critic, &self.critic_model, &self.critic_persona),
            (DebateRole::Judge, &self.judge_model, &self.judge_persona),
        ];
        for (role, model, persona) in overrides {
            if let Some(model) = model {
                config = config.with_model(role, model.clone());
            }
            if let Some(persona) = persona {
                config = config.with_persona(role, persona.clone());
            }
        }
        config.normalized()
    }
}

/// Arguments for `jury start` and `jury run`.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// The question or problem to debate.
    pub query: String,

    #[command(flatten)]
    pub roles: RoleArgs,
}

/// Arguments for `jury advance`.
#[derive(Args, Debug)]
pub struct AdvanceArgs {
    /// Case id.
    pub case_id: i64,

    /// Stage to run: proposer, critic or judge.
    pub role: DebateRole,
}

/// Arguments for commands that take only a case id.
#[derive(Args, Debug)]
pub struct CaseArgs {
    /// Case id.
    pub case_id: i64,
}

/// Arguments for `jury history`.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Maximum number of cases to list.
    #[arg(short = 'n', long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    pub limit: usize,
}

/// Arguments for `jury rate`.
#[derive(Args, Debug)]
pub struct RateArgs {
    /// Case id.
    pub case_id: i64,

    /// Rating from 1 (poor) to 5 (excellent).
    pub rating: u8,

    /// Free-text feedback.
    #[arg(long)]
    pub feedback: Option<String>,
}

/// Arguments for `jury report`.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Case id.
    pub case_id: i64,

    /// Output file (defaults to stdout).
    #[arg(short, long, conflicts_with = "save")]
    pub output: Option<PathBuf>,

    /// Write to Case_<id>.md in the current directory.
    #[arg(long)]
    pub save: bool,
}

/// Parse CLI arguments and return the Cli struct.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    let needs_model = matches!(cli.command, Commands::Advance(_) | Commands::Run(_));
    if needs_model {
        config.require_api_key()?;
    }

    if let Err(e) = init_metrics() {
        tracing::warn!(error = %e, "Metrics unavailable");
    }

    let store: Arc<dyn CaseStore> = Arc::new(SqliteCaseStore::open(&config.database_url).await?);
    let orchestrator = DebateOrchestrator::builder()
        .invoker(build_invoker(&config)?)
        .store(store)
        .build()?;

    match cli.command {
        Commands::Start(args) => {
            let case = orchestrator
                .start_case(&args.query, args.roles.to_case_config())
                .await?;
            print_case(&case, cli.json)?;
        }
        Commands::Advance(args) => {
            let case = orchestrator.advance(args.case_id, args.role).await?;
            print_case(&case, cli.json)?;
        }
        Commands::Run(args) => {
            let case = orchestrator
                .start_case(&args.query, args.roles.to_case_config())
                .await?;
            let case = if case.is_completed() {
                info!(case_id = case.id, "Query already judged, returning existing case");
                case
            } else {
                run_stages(&orchestrator, case, cli.json).await?
            };
            print_case(&case, cli.json)?;
        }
        Commands::Show(args) => {
            let case = orchestrator.get_case(args.case_id).await?;
            print_case(&case, cli.json)?;
        }
        Commands::History(args) => {
            let history = orchestrator.list_history(args.limit).await?;
            print_history(&history, cli.json)?;
        }
        Commands::Rate(args) => {
            let case = orchestrator
                .rate_case(args.case_id, args.rating, args.feedback)
                .await?;
            if cli.json {
                print_json(&case)?;
            } else {
                println!("✓ Case #{} rated {}/5", case.id, args.rating);
            }
        }
        Commands::Report(args) => {
            let case = orchestrator.get_case(args.case_id).await?;
            let markdown = render_markdown(&case);
            let output = args
                .output
                .or_else(|| args.save.then(|| PathBuf::from(report_file_name(&case))));
            match output {
                Some(path) => {
                    std::fs::write(&path, markdown)?;
                    info!(case_id = case.id, path = %path.display(), "Report written");
                    println!("✓ Report written to {}", path.display());
                }
                None => print!("{}", markdown),
            }
        }
    }

    Ok(())
}

/// Applies CLI overrides on top of the environment configuration.
fn resolve_config(cli: &Cli) -> anyhow::Result<JuryConfig> {
    let mut config = JuryConfig::from_env()?;
    if let Some(url) = &cli.database_url {
        config = config.with_database_url(url.clone());
    }
    if let Some(key) = cli.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
        config = config.with_api_key(key.clone());
    }
    config.validate()?;
    Ok(config)
}

/// Builds the invoker around one shared provider.
fn build_invoker(config: &JuryConfig) -> anyhow::Result<AgentInvoker> {
    let provider: Arc<dyn LlmProvider> = match config.api_key {
        Some(_) => {
            let provider = OpenRouterProvider::from_config(config)?;
            info!(
                base_url = provider.base_url(),
                api_key = %provider.api_key_masked(),
                "Using OpenRouter"
            );
            Arc::new(provider)
        }
        None => Arc::new(UnconfiguredProvider),
    };

    Ok(AgentInvoker::new(provider).with_normalizer(ResponseNormalizer::new(Pricing::new(
        config.cost_per_million_tokens,
    ))))
}

/// Stands in for the model client when no API key is configured.
struct UnconfiguredProvider;

#[async_trait]
impl LlmProvider for UnconfiguredProvider {
    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        Err(LlmError::MissingApiKey)
    }
}

/// Runs the remaining stages, printing progress in text mode.
async fn run_stages(
    orchestrator: &DebateOrchestrator,
    mut case: Case,
    json: bool,
) -> anyhow::Result<Case> {
    for role in DebateRole::all() {
        if !json {
            println!("⏳ {} is working...", role);
        }
        case = orchestrator.advance(case.id, role).await?;
        if !json {
            println!(
                "✓ {} done ({:.2}s, {} tokens)",
                role,
                case.stage_time(role),
                case.stage_tokens(role)
            );
        }
    }
    Ok(case)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let json_output = serde_json::to_string_pretty(value)
        .map_err(|e| anyhow::anyhow!("Failed to serialize JSON output: {}", e))?;
    println!("{}", json_output);
    Ok(())
}

fn print_case(case: &Case, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(case);
    }

    println!("⚖️  Case #{} [{}]", case.id, case.state);
    println!("  Query:      {}", case.query);
    println!(
        "  Models:     {} / {} / {}",
        case.config.proposer.model, case.config.critic.model, case.config.judge.model
    );
    println!("  Cost:       ${:.5}", case.estimated_cost);
    println!(
        "  Tokens:     {} in {:.2}s",
        case.total_tokens, case.total_time
    );
    if case.is_completed() {
        println!("  Confidence: {:.0}%", case.judge_confidence);
    }
    if let Some(rating) = case.user_rating {
        println!("  Rating:     {}/5", rating);
    }

    for entry in &case.transcript {
        let (thinking, output) = split_thinking(&entry.content);
        println!();
        println!(
            "── {} ({}, {:.2}s, {} tokens) ──",
            entry.role, entry.model, entry.duration, entry.tokens
        );
        if let Some(thinking) = thinking {
            println!("[thinking: {} chars]", thinking.chars().count());
        }
        println!("{}", output);
    }

    let stale = case.stale_stages();
    if !stale.is_empty() {
        let names: Vec<&str> = stale.iter().map(|r| r.display_name()).collect();
        println!();
        println!(
            "⚠ {} output predates the latest earlier stage; re-run to refresh",
            names.join(", ")
        );
    }
    Ok(())
}

fn print_history(history: &[CaseSummary], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&history);
    }
    if history.is_empty() {
        println!("No cases yet.");
        return Ok(());
    }

    for summary in history {
        println!(
            "#{:<5} {}  ${:.5}  {:>3.0}%  {}",
            summary.id,
            summary.timestamp.format("%Y-%m-%d %H:%M"),
            summary.estimated_cost,
            summary.confidence,
            summary.query
        );
        println!("       {}", summary.verdict);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_advance_command() {
        let cli = Cli::try_parse_from(["jury", "advance", "7", "Critic"]).expect("should parse");
        match cli.command {
            Commands::Advance(args) => {
                assert_eq!(args.case_id, 7);
                assert_eq!(args.role, DebateRole::Critic);
            }
            _ => panic!("Expected Advance command"),
        }
        assert!(Cli::try_parse_from(["jury", "advance", "7", "bailiff"]).is_err());
    }

    #[test]
    fn test_start_with_overrides() {
        let cli = Cli::try_parse_from([
            "jury",
            "start",
            "Pick a queue",
            "--judge-model",
            "openai/gpt-4o",
            "--critic-persona",
            "SRE on call",
            "--json",
        ])
        .expect("should parse");
        assert!(cli.json);

        match cli.command {
            Commands::Start(args) => {
                assert_eq!(args.query, "Pick a queue");
                let config = args.roles.to_case_config();
                assert_eq!(config.judge.model, "openai/gpt-4o");
                assert_eq!(config.critic.persona, "SRE on call");
                assert_eq!(config.proposer, CaseConfig::default().proposer);
            }
            _ => panic!("Expected Start command"),
        }
    }

    #[test]
    fn test_history_defaults() {
        let cli = Cli::try_parse_from(["jury", "history"]).expect("should parse");
        match cli.command {
            Commands::History(args) => assert_eq!(args.limit, 20),
            _ => panic!("Expected History command"),
        }
    }

    #[test]
    fn test_rate_and_report_args() {
        let cli = Cli::try_parse_from(["jury", "rate", "3", "4", "--feedback", "solid"])
            .expect("should parse");
        match cli.command {
            Commands::Rate(args) => {
                assert_eq!((args.case_id, args.rating), (3, 4));
                assert_eq!(args.feedback.as_deref(), Some("solid"));
            }
            _ => panic!("Expected Rate command"),
        }

        let cli = Cli::try_parse_from(["jury", "report", "3", "-o", "case.md"])
            .expect("should parse");
        match cli.command {
            Commands::Report(args) => {
                assert_eq!(args.output, Some(PathBuf::from("case.md")));
            }
            _ => panic!("Expected Report command"),
        }
    }

    #[test]
    fn test_report_save_conflicts_with_output() {
        let cli = Cli::try_parse_from(["jury", "report", "9", "--save"]).expect("should parse");
        match cli.command {
            Commands::Report(args) => assert!(args.save && args.output.is_none()),
            _ => panic!("Expected Report command"),
        }
        assert!(Cli::try_parse_from(["jury", "report", "9", "--save", "-o", "x.md"]).is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_provider_fails() {
        let err = UnconfiguredProvider
            .generate(GenerationRequest::new("m", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_store_only_commands_without_key() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("cli.db");
        let url = format!("sqlite://{}", db.display());

        let cli = Cli::try_parse_from(["jury", "--database-url", &url, "start", "Offline"])
            .expect("should parse");
        let cli = Cli {
            api_key: None,
            ..cli
        };
        run_with_cli(cli).await.expect("start needs no key");

        let store = SqliteCaseStore::open(&url).await.unwrap();
        let cases = store.list_recent(10).await.unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].query, "Offline");
    }
}
