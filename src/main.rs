use anyhow::{anyhow, Context};
use clap::Parser;
use point_gateway::backend::{BackendClient, HttpBackendClient};
use point_gateway::config::{Config, Overrides};
use point_gateway::registration::Registration;
use point_gateway::router::CommandRouter;
use point_gateway::server::GatewayServer;
use point_gateway::shutdown::{signal_name, ShutdownSignals};
use point_gateway::store::{RedisStore, SharedStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Point Gateway - affinity-aware WebSocket gateway for point-serving request handlers
#[derive(Parser, Debug)]
#[command(name = "point-gateway")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long, env = "CONFIG")]
    config: Option<PathBuf>,

    /// Port the WebSocket server listens on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Public host name; keys this gateway's routing table entry
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Redis URL of the shared store
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_overrides(&Overrides {
        port: args.port,
        public_host: args.host.clone(),
        redis_url: args.redis_url.clone(),
    });
    config.validate().context("Invalid configuration")?;

    if args.test {
        println!("configuration is valid");
        return Ok(());
    }

    point_gateway::logging::init_with_format(config.logging.format)
        .map_err(|e| anyhow!("Failed to initialize logging subsystem: {}", e))?;

    tracing::info!(
        config_file = ?args.config,
        server_address = %config.server.address,
        server_port = config.server.port,
        public_host = %config.server.public_host,
        "Configuration loaded successfully"
    );

    let store: Arc<dyn SharedStore> = Arc::new(
        RedisStore::connect(&config.store)
            .await
            .context("Failed to connect to shared store")?,
    );

    // Installed before registering so an early signal still deregisters
    let mut signals = ShutdownSignals::install().context("Failed to install signal handlers")?;

    let registration = Registration::from_config(Arc::clone(&store), &config);
    registration
        .register()
        .await
        .context("Failed to register in routing table")?;

    let result = run(&config, store, &mut signals).await;

    registration.unregister().await;
    result
}

async fn run(
    config: &Config,
    store: Arc<dyn SharedStore>,
    signals: &mut ShutdownSignals,
) -> anyhow::Result<()> {
    let backend: Arc<dyn BackendClient> = Arc::new(HttpBackendClient::new(&config.backend)?);
    let router = Arc::new(CommandRouter::from_config(store, backend, config)?);

    let listen_addr = config.server.listen_addr();
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind WebSocket listener on {}", listen_addr))?;

    tracing::info!(address = %listen_addr, "Websocket server running");

    let server = GatewayServer::new(Arc::clone(&router), config.server.keepalive_interval());
    server
        .serve(listener, async {
            let signum = signals.recv().await;
            tracing::info!(signal = signal_name(signum), "Shutdown signal received");
        })
        .await;

    let pool = router.pool().stats();
    let affinity = router.affinity().stats();
    tracing::info!(
        pool_hits = pool.hits,
        pool_misses = pool.misses,
        pool_hit_rate = pool.hit_rate(),
        affinity_hits = affinity.hits,
        affinity_misses = affinity.misses,
        affinity_entries = affinity.entries,
        affinity_hit_rate = affinity.hit_rate(),
        "Cache statistics"
    );

    Ok(())
}
