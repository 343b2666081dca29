//! `react-planner` — headless CLI around the reasoning core, for exercising
//! a single `plan()` call and inspecting configuration without embedding the
//! crate in a host service.
//!
//! Since model identity, quantization, and backend are configuration
//! concerns the core deliberately stays agnostic to, this CLI drives
//! the planner with a scripted LLM rather than a live inference backend —
//! it is a debugging/manifest tool, not a production entry point.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;

use react_core::config::{self, AppConfig};
use react_core::context::HttpMemoryBackend;
use react_core::llm::ScriptedLlm;
use react_core::model::IntentEnvelope;
use react_core::tools::generate_tool_manifest;
use react_core::{PlanRequest, Planner};

#[derive(Parser, Debug)]
#[command(name = "react-planner", about = "ReAct reasoning core CLI", version)]
struct Cli {
    /// Path to a TOML config file. Falls back to REACT_CORE_CONFIG / the
    /// default platform path / built-in defaults, in that order.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the tool manifest presented to the LLM.
    Manifest,
    /// Print the effective configuration as TOML.
    Config,
    /// Initialize the default config file with built-in defaults.
    Init,
    /// Run one `plan()` call, replaying canned LLM turns from a script file.
    Plan(PlanArgs),
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Opaque user identifier.
    #[arg(long)]
    user_id: String,
    /// Classified intent name (from the upstream NLU layer).
    #[arg(long)]
    intent_name: String,
    /// Raw user utterance, 1..=4096 chars.
    #[arg(long)]
    raw_query: String,
    /// JSON object of extracted entities. Defaults to `{}`.
    #[arg(long)]
    entities: Option<String>,
    /// Confirmation token for a resubmitted, previously-pending step.
    #[arg(long)]
    confirmation_token: Option<String>,
    /// Path to a file of LLM turns, one per call, separated by a line
    /// containing only `---`.
    #[arg(long)]
    llm_script: PathBuf,
}

fn load_config(path: Option<&PathBuf>) -> AppConfig {
    match path {
        Some(p) => config::load_config(p).unwrap_or_else(|e| {
            eprintln!("error: {e}");
            std::process::exit(1);
        }),
        None => config::load_default_config(),
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init().ok();
}

fn read_llm_script(path: &PathBuf) -> Vec<String> {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("error reading {}: {e}", path.display());
        std::process::exit(1);
    });
    content.split("\n---\n").map(|turn| turn.trim().to_owned()).collect()
}

fn parse_entities(raw: Option<&str>) -> HashMap<String, Value> {
    let Some(raw) = raw else { return HashMap::new() };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map.into_iter().collect(),
        Ok(_) => {
            eprintln!("error: --entities must be a JSON object");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("error: --entities is not valid JSON: {e}");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Manifest => println!("{}", generate_tool_manifest()),
        Commands::Config => {
            let cfg = load_config(cli.config.as_ref());
            println!("{}", toml::to_string_pretty(&cfg).unwrap_or_default());
        }
        Commands::Init => {
            let path = cli.config.clone().or_else(config::default_config_path).unwrap_or_else(|| PathBuf::from("config.toml"));
            match config::save_config(&path, &AppConfig::default()) {
                Ok(()) => println!("wrote default config to {}", path.display()),
                Err(e) => {
                    eprintln!("error: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Plan(args) => {
            let cfg = load_config(cli.config.as_ref());
            let script = read_llm_script(&args.llm_script);
            let llm = Arc::new(ScriptedLlm::new(script.iter().map(String::as_str).collect()));
            let memory = Arc::new(HttpMemoryBackend::new(
                cfg.memory.service_url.clone(),
                Duration::from_millis(cfg.memory.per_fetch_timeout_ms),
            ));

            let planner = Planner::new(llm, memory, cfg);

            let mut request = PlanRequest::new(IntentEnvelope {
                user_id: args.user_id.clone(),
                intent_name: args.intent_name.clone(),
                entities: parse_entities(args.entities.as_deref()),
                raw_query: args.raw_query.clone(),
            });
            request.confirmation_token = args.confirmation_token.clone();

            if let Err(e) = request.validate() {
                eprintln!("error: {e}");
                std::process::exit(1);
            }

            let plan = planner.plan(request, None).await;
            println!("{}", serde_json::to_string_pretty(&plan).unwrap_or_default());
            if !plan.success {
                std::process::exit(1);
            }
        }
    }
}
