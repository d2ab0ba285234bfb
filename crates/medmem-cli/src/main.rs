//! medmem - interactive medical assistant with long-term patient memory.
//!
//! Chat output goes to stdout; logs go to stderr and are filtered with
//! `RUST_LOG` (default `warn`).
//!
//! # Configuration
//!
//! A `.env` file in the working directory is loaded first. Without
//! `--config`, settings come from the environment:
//!
//! - `GROQ_API_KEY` - Required for the default Groq provider
//! - `MEDMEM_LLM_PROVIDER` - `groq`, `openai`, `anthropic` or `ollama`
//! - `MEDMEM_DATA_DIR` - Optional, defaults to `~/.medmem`

use std::io::Write;
use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::Parser;
use medmem_core::{ConversationSession, FactSearch, MedMemConfig, MemoryStores, SessionConfig};
use medmem_llm::LlmFactory;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const QUIT_WORDS: [&str; 4] = ["quit", "exit", "bye", "goodbye"];
const FACTS_COMMAND: &str = "/facts";
const FACT_MATCHES: usize = 5;

#[derive(Parser)]
#[command(name = "medmem")]
#[command(version)]
#[command(about = "Medical assistant chat with long-term patient memory")]
struct Cli {
    /// Configuration file path (.toml, .json or .yaml)
    #[arg(short, long, env = "MEDMEM_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    println!("🩺 Medical Memory Assistant");
    println!("{}", "=".repeat(45));
    println!("Hello! I'm your medical assistant with access to your complete medical records.");
    println!("Type 'quit' to end our conversation.\n");

    let (session, stores) = match initialize(cli.config).await {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("❌ Failed to initialize: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(session, stores).await {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

/// Load configuration, open the stores and connect the completion provider.
async fn initialize(config_path: Option<PathBuf>) -> Result<(ConversationSession, MemoryStores)> {
    let config = match config_path {
        Some(path) => MedMemConfig::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => MedMemConfig::from_env(),
    };
    tracing::info!(data_dir = %config.data_dir.display(), "Opening patient memory");

    let stores = MemoryStores::sqlite(&config).context("Failed to open patient memory databases")?;

    let llm = LlmFactory::from_config(&config.llm)?;
    let session = ConversationSession::new(llm, stores.clone()).with_config(SessionConfig {
        recent_visit_limit: config.recent_visit_limit,
    });
    tracing::info!(session_id = %session.session_id(), "Session started");
    Ok((session, stores))
}

/// The query of a `/facts` command, or `None` if the input is not one.
fn facts_query(input: &str) -> Option<&str> {
    let rest = input.strip_prefix(FACTS_COMMAND)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

async fn run(mut session: ConversationSession, stores: MemoryStores) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!("\n\nGoodbye!");
                return Ok(());
            }
        };
        // EOF ends the session like a quit word.
        let input = line.as_deref().map(str::trim).unwrap_or("quit");

        if input.is_empty() {
            continue;
        }
        if QUIT_WORDS.contains(&input.to_lowercase().as_str()) {
            print_farewell(&session);
            return Ok(());
        }
        if let Some(query) = facts_query(input) {
            print_facts(&session, stores.facts.as_ref(), query);
            continue;
        }

        let response = session.process_message(input).await;
        println!("\nAssistant: {}\n", response);
    }
}

fn print_facts(session: &ConversationSession, facts: &dyn FactSearch, query: &str) {
    let Some(patient_id) = session.identity().patient_id() else {
        println!("\nPlease tell me your name first.\n");
        return;
    };

    match facts.search(patient_id, query, FACT_MATCHES) {
        Ok(matches) if matches.is_empty() => println!("\nNo medical facts on file.\n"),
        Ok(matches) => {
            println!();
            for m in matches {
                println!("  [{:.2}] {}: {}", m.score, m.fact.fact_type, m.fact.fact_value);
            }
            println!();
        }
        Err(e) => println!("\nCould not search medical facts: {}\n", e),
    }
}

fn print_farewell(session: &ConversationSession) {
    let summary = session.summary();
    let name = summary
        .patient_name
        .as_deref()
        .map(|n| format!(", {}", n))
        .unwrap_or_default();
    println!("\nAssistant: Thank you for chatting with me{}! Take care!", name);

    println!("\n📊 Session Summary:");
    println!(
        "Patient: {}",
        summary.patient_name.as_deref().unwrap_or("Name not provided")
    );
    println!("Total exchanges: {}", summary.total_exchanges);
    println!("Memory systems used: {}", summary.memory_systems_used.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facts_query() {
        assert_eq!(facts_query("/facts"), Some(""));
        assert_eq!(facts_query("/facts  allergies "), Some("allergies"));
        assert_eq!(facts_query("/facts\tmedication"), Some("medication"));
        assert_eq!(facts_query("/factsheet"), None);
        assert_eq!(facts_query("my /facts"), None);
    }
}
