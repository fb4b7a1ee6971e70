use {
    clap::{Parser, Subcommand},
    lumod_config::LumodConfig,
    lumod_driver::{AuthStore, BootstrapMode, Driver, DriverConfig, Session},
    lumod_gateway::{AppState, start_server},
    std::sync::Arc,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "lumod", about = "Drive the Lumo chat UI over HTTP")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Custom config directory (overrides default ~/.config/lumod/).
    #[arg(long, global = true, env = "LUMOD_CONFIG_DIR")]
    config_dir: Option<std::path::PathBuf>,
    /// Custom data directory (overrides default data dir).
    #[arg(long, global = true, env = "LUMOD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server against the saved sign-in (default when no
    /// subcommand is provided).
    Serve,
    /// Open a browser window, sign in to Lumo once, and save the session
    /// for later `serve` runs.
    Login,
}

/// Initialise tracing from `--log-level`, honouring `RUST_LOG` when set.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);
    info!(version = env!("CARGO_PKG_VERSION"), "lumod starting");

    // Apply directory overrides before loading config.
    if let Some(ref dir) = cli.config_dir {
        lumod_config::set_config_dir(dir.clone());
    }
    if let Some(ref dir) = cli.data_dir {
        lumod_config::set_data_dir(dir.clone());
    }

    let config = lumod_config::discover_and_load();

    match cli.command {
        None | Some(Commands::Serve) => {
            // CLI args override config values.
            let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());
            let port = cli.port.unwrap_or(config.server.port);
            serve(&bind, port, &config).await
        },
        Some(Commands::Login) => login(&config).await,
    }
}

async fn serve(bind: &str, port: u16, config: &LumodConfig) -> anyhow::Result<()> {
    let driver_config = DriverConfig::from(config);
    let driver = Arc::new(Driver::bootstrap(driver_config, BootstrapMode::Restore).await?);

    let state = AppState {
        prompts: driver.clone(),
    };
    let served = start_server(bind, port, state, shutdown_signal()).await;

    // The browser session must come down even when serving failed.
    driver.shutdown().await;
    served?;

    info!("lumod stopped");
    Ok(())
}

async fn login(config: &LumodConfig) -> anyhow::Result<()> {
    let driver_config = DriverConfig::from(config);
    let store = AuthStore::new(driver_config.auth_state_path.clone());

    let mut session =
        Session::bootstrap(&driver_config, &store, BootstrapMode::InteractiveLogin).await?;
    session.close().await;

    println!("Signed in. Auth state saved to {}", store.path().display());
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received, draining requests");
}
