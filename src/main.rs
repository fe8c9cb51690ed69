use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use teamroute_api::RestApi;
use teamroute_core::ResolverConfig;
use teamroute_storage::StorageManager;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Address-to-healthcare-team resolution service
#[derive(Parser, Debug)]
#[command(name = "teamroute")]
#[command(about = "Resolves addresses to healthcare teams", long_about = None)]
struct Args {
    /// Path to the data directory
    #[arg(short, long, env = "DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// HTTP API port
    #[arg(long, env = "PORT", default_value_t = 8083)]
    http_port: u16,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Upper bound on a single catalog lookup, in milliseconds
    #[arg(long, env = "LOOKUP_TIMEOUT_MS", default_value_t = 2000)]
    lookup_timeout_ms: u64,

    /// Street-name similarity a segment must exceed to be considered
    #[arg(long, env = "SIMILARITY_THRESHOLD", default_value_t = 0.3)]
    similarity_threshold: f32,
}

impl Args {
    fn resolver_config(&self) -> anyhow::Result<ResolverConfig> {
        if !(0.0..1.0).contains(&self.similarity_threshold) {
            anyhow::bail!(
                "similarity threshold must be in [0, 1), got {}",
                self.similarity_threshold
            );
        }
        if self.lookup_timeout_ms == 0 {
            anyhow::bail!("lookup timeout must be greater than zero");
        }
        Ok(ResolverConfig {
            similarity_threshold: self.similarity_threshold,
            lookup_timeout: Duration::from_millis(self.lookup_timeout_ms),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = args.resolver_config()?;

    info!("Starting teamroute v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", args.data_dir);
    info!("HTTP API port: {}", args.http_port);
    info!(
        "Similarity threshold: {}, lookup timeout: {:?}",
        config.similarity_threshold, config.lookup_timeout
    );

    let storage = Arc::new(StorageManager::new(&args.data_dir)?);
    info!("Storage initialized");

    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(storage, http_port, config).await {
                error!("HTTP server error: {}", e);
            }
        })
    });

    info!("teamroute started successfully");
    info!("HTTP API: http://localhost:{}/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
