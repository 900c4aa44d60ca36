//! Willow Daemon - developmental screening engine
//!
//! Classifies parent messages, runs the adaptive question flow, and scores
//! answers into findings. This binary drives one interactive session over
//! stdin/stdout; richer presentation layers sit in front of the same engine.

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use willow_common::PatternStore;

use willowd::classifier::OllamaCompletion;
use willowd::config::Config;
use willowd::session::SessionEngine;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Willow Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::load();
    let store = Arc::new(PatternStore::open_default()?);
    info!("Pattern store ready: {} learned patterns", store.pattern_count()?);

    let completion = Arc::new(OllamaCompletion::new(&config.llm));
    let engine = SessionEngine::new(store, completion, config);
    let mut state = engine.new_session();

    println!("Willow is listening. Tell me about your child (Ctrl-D to finish).");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        let output = engine.handle_message(&mut state, message).await;
        println!("\n{}\n", output.message);
        if output.quick_replies {
            println!("[Yes] [No] [Sometimes]");
        }
    }

    info!("Session ended at stage {}", state.stage);
    Ok(())
}
