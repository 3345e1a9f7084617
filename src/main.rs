// Wardsim — simulated-patient trainer for nursing communication practice.
//
// Wires the engine together: config, rule store, turn history, reply
// policy, generative provider, and the HTTP server.

use anyhow::Context;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use wardsim::engine::config::Config;
use wardsim::engine::history::TurnLog;
use wardsim::engine::policy::{ReplyPolicy, SystemRandom};
use wardsim::engine::provider::GeminiProvider;
use wardsim::engine::server;
use wardsim::engine::session::ConversationSession;
use wardsim::engine::store::{JsonFileRules, ResponseStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("wardsim.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("load config {}", config_path.display()))?;

    let store = ResponseStore::load(Box::new(JsonFileRules::new(&config.rules_path)));
    info!("[main] Loaded {} response rules from {}", store.len(), config.rules_path.display());

    let history = TurnLog::open(&config.history_path)
        .with_context(|| format!("open history {}", config.history_path.display()))?;

    let session = ConversationSession::new(
        store,
        history,
        ReplyPolicy::new(Box::new(SystemRandom)),
        Box::new(GeminiProvider::new(&config.provider)),
        config.persona_prompt.clone(),
        Duration::from_secs(config.provider.timeout_secs),
    )
    .context("initialize session")?;
    let session = Arc::new(Mutex::new(session));

    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("[main] Shutdown requested");
            server::request_stop();
        }
    });

    server::run_server(&config, session)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(())
}
