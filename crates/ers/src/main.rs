use clap::{Parser, Subcommand};
use ers_core::{ExtendedResource, ExtendedResourceClaim, Resource};
use ers_extender::{AppState, Config as ExtenderConfig, ExtenderServer};
use ers_scheduler::{ExtendedResourceScheduler, SchedulerConfig};
use ers_storage::{ApiClient, ExtendedResourceStore, KvResourceStore, RedbBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "ers", about = "Kubernetes scheduler extender for extended resources")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the filter and bind endpoints
    Serve {
        /// Address to listen on
        #[arg(long, env = "ERS_BIND", default_value = "0.0.0.0:8089")]
        bind: String,
        /// Path to the redb database file holding resources and claims
        #[arg(long, env = "ERS_DATA_DIR", default_value = "./ers.redb")]
        data_dir: String,
        /// Read and write resources through this API server instead of a local database
        #[arg(long, env = "ERS_API_SERVER")]
        api_server: Option<String>,
        /// Bearer token for the API server
        #[arg(long, env = "ERS_API_TOKEN", requires = "api_server")]
        token: Option<String>,
        /// Re-plans allowed when a reservation loses a write race
        #[arg(long, env = "ERS_CONFLICT_RETRIES", default_value_t = 3)]
        conflict_retries: u32,
    },
    /// Load ExtendedResource and ExtendedResourceClaim manifests into the local database
    Apply {
        /// Path to the redb database file
        #[arg(long, env = "ERS_DATA_DIR", default_value = "./ers.redb")]
        data_dir: String,
        /// YAML or JSON manifests, multi-document YAML allowed
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            data_dir,
            api_server,
            token,
            conflict_retries,
        } => {
            let store: Arc<dyn ExtendedResourceStore> = match api_server {
                Some(url) => remote_store(&url, token),
                None => Arc::new(open_local_store(&data_dir)?),
            };
            run_serve(&bind, store, SchedulerConfig { conflict_retries }).await
        }
        Commands::Apply { data_dir, files } => run_apply(&data_dir, &files),
    }
}

/// Run the extender until ctrl-c
async fn run_serve(
    bind: &str,
    store: Arc<dyn ExtendedResourceStore>,
    scheduler_config: SchedulerConfig,
) -> miette::Result<()> {
    info!("Starting ers scheduler extender");

    let config = ExtenderConfig {
        listen_addr: bind
            .parse()
            .map_err(|e| miette::miette!("Invalid bind address '{}': {}", bind, e))?,
    };

    let scheduler = Arc::new(ExtendedResourceScheduler::new(store, scheduler_config));
    let server = ExtenderServer::new(config, Arc::new(AppState::new(scheduler)));

    let token = CancellationToken::new();
    let server_token = token.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run(server_token).await {
            error!("Extender server error: {}", e);
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| miette::miette!("Failed to listen for ctrl-c: {}", e))?;

    info!("Shutting down gracefully...");
    token.cancel();

    let shutdown_timeout = std::time::Duration::from_secs(5);
    let _ = tokio::time::timeout(shutdown_timeout, server_handle).await;

    info!("Shutdown complete");

    Ok(())
}

/// Create or update every object found in `files`
fn run_apply(data_dir: &str, files: &[PathBuf]) -> miette::Result<()> {
    let store = open_local_store(data_dir)?;

    for file in files {
        let count = apply_file(&store, file)?;
        info!("Applied {} object(s) from {}", count, file.display());
    }

    Ok(())
}

fn apply_file(store: &KvResourceStore, file: &Path) -> miette::Result<usize> {
    let data = std::fs::read_to_string(file)
        .map_err(|e| miette::miette!("Failed to read '{}': {}", file.display(), e))?;
    let documents: Vec<serde_json::Value> = ers_core::from_yaml_documents(&data)?;

    for document in &documents {
        let kind = document
            .get("kind")
            .and_then(|k| k.as_str())
            .unwrap_or_default();

        match kind {
            "ExtendedResource" => apply_object::<ExtendedResource>(store, document)?,
            "ExtendedResourceClaim" => apply_object::<ExtendedResourceClaim>(store, document)?,
            other => {
                return Err(miette::miette!(
                    "Unsupported kind '{}' in '{}'; expected ExtendedResource or ExtendedResourceClaim",
                    other,
                    file.display()
                ))
            }
        }
    }

    Ok(documents.len())
}

fn apply_object<T: Resource>(store: &KvResourceStore, document: &serde_json::Value) -> miette::Result<()> {
    let object: T = serde_json::from_value(document.clone())
        .map_err(|e| miette::miette!("Invalid manifest: {}", e))?;
    let applied = store.apply(object)?;
    let key = applied.resource_key().map_err(|e| miette::miette!("{}", e))?;
    info!("Applied {} (resourceVersion {:?})", key, applied.resource_version());
    Ok(())
}

/// Open the local resource store
fn open_local_store(data_dir: &str) -> miette::Result<KvResourceStore> {
    let backend = RedbBackend::new(Path::new(data_dir))
        .map_err(|e| miette::miette!("Failed to open storage at '{}': {}", data_dir, e))?;
    Ok(KvResourceStore::new(Arc::new(backend)))
}

fn remote_store(url: &str, token: Option<String>) -> Arc<dyn ExtendedResourceStore> {
    info!("Using API server at {}", url);
    let client = ApiClient::new(url);
    match token {
        Some(token) => Arc::new(client.with_token(token)),
        None => Arc::new(client),
    }
}
