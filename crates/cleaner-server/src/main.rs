//! CLI entry point for the cleaner-server.

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

use cleaner_core::config::Backend;
use cleaner_core::CleanerConfig;
use cleaner_graph::{GraphClient, GraphConfig, GraphStore, MemoryGraph};

use cleaner_server::{router, AppState};

#[derive(Parser)]
#[command(name = "cleaner-server")]
#[command(about = "Serves an authorized endpoint that empties the graph")]
struct Cli {
    /// Config file prefix (default: cleaner).
    #[arg(short, long, default_value = "cleaner")]
    config: String,

    /// Override the listen address (e.g., 127.0.0.1:7473).
    #[arg(short, long)]
    bind: Option<String>,

    /// Graph backend: memory, neo4j.
    #[arg(long)]
    backend: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let mut config = CleanerConfig::load(&cli.config)?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(backend) = cli.backend.as_deref() {
        config.store.backend = parse_backend(backend)?;
    }

    if config.server.delete_key.is_empty() {
        tracing::warn!("No delete key configured; every wipe request will be rejected");
    }

    match config.store.backend {
        Backend::Memory => {
            let graph = if config.store.reference_node {
                MemoryGraph::with_reference_node()
            } else {
                MemoryGraph::new()
            };
            serve(graph, &config).await
        }
        Backend::Neo4j => {
            let graph = GraphClient::connect(&graph_config(&config)).await?;
            serve(graph, &config).await
        }
    }
}

async fn serve<S: GraphStore>(store: S, config: &CleanerConfig) -> anyhow::Result<()> {
    let counts = store.counts().await?;
    let state = AppState::from_config(store, config)?;
    let app = router(state);

    let addr = config.server.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        mode = config.wipe.wipe_mode()?.name(),
        nodes = counts.nodes,
        relationships = counts.relationships,
        "Cleaner listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

fn parse_backend(s: &str) -> anyhow::Result<Backend> {
    match s.to_lowercase().as_str() {
        "memory" => Ok(Backend::Memory),
        "neo4j" => Ok(Backend::Neo4j),
        _ => anyhow::bail!("Invalid backend: {s}. Choose: memory, neo4j"),
    }
}

fn graph_config(config: &CleanerConfig) -> GraphConfig {
    GraphConfig {
        uri: config.neo4j.uri.clone(),
        user: config.neo4j.user.clone(),
        password: config.neo4j.password.clone(),
        reference_label: config.neo4j.reference_label.clone(),
        ..Default::default()
    }
}
