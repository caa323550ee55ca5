use std::path::PathBuf;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinesync_config::{Config, ConfigLoad, ConfigLoader, DatabaseBackend};
use cinesync_core::database::PostgresCatalogStore;
use cinesync_core::sync::ImportRequest;
use cinesync_model::ContentKind;
use cinesync_server::create_app;
use cinesync_server::infra::startup::{build_importer, build_provider, build_state, open_store};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "cinesync-server")]
#[command(about = "Synchronizes TMDB movies and series into the cinesync catalog")]
struct Cli {
    /// Path to a cinesync.toml file
    #[arg(long, global = true, env = "CINESYNC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone, Default)]
struct ServeArgs {
    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve(ServeArgs),
    /// Import a single movie or series and print the summary as JSON
    Import {
        /// TMDB URL or numeric id
        input: String,
        /// Kind for bare ids (movie or tv)
        #[arg(long)]
        kind: Option<ContentKind>,
        /// Quality label stored on the record
        #[arg(long)]
        quality: Option<String>,
    },
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cinesync=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(cli.config.clone())?;

    match cli.command {
        Some(Command::Serve(args)) => run_server(config, args).await,
        Some(Command::Import {
            input,
            kind,
            quality,
        }) => run_import(config, input, kind, quality).await,
        Some(Command::Db(DbCommand::Migrate)) => run_db_migrate(config).await,
        None => run_server(config, cli.serve).await,
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = path {
        loader = loader.with_config_path(path);
    }
    let ConfigLoad { config, warnings } =
        loader.load().context("failed to load configuration")?;

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = config.metadata.config_path.as_ref() {
        info!(path = %path.display(), "loaded configuration file");
    }
    for warning in warnings.iter() {
        match warning.hint.as_deref() {
            Some(hint) => warn!(hint, "{}", warning.message),
            None => warn!("{}", warning.message),
        }
    }

    Ok(config)
}

async fn run_server(mut config: Config, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }

    let store = open_store(&config).await?;
    let state = build_state(&config, store).await?;
    let app = create_app(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, backend = %config.database.backend, "cinesync server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;
    Ok(())
}

async fn run_import(
    config: Config,
    input: String,
    kind: Option<ContentKind>,
    quality: Option<String>,
) -> anyhow::Result<()> {
    let store = open_store(&config).await?;
    let importer = build_importer(&config, build_provider(&config)?, store)?;

    let request = ImportRequest {
        input,
        kind,
        quality,
    };
    let summary = importer
        .import(&request)
        .await
        .with_context(|| format!("import of '{}' failed", request.input))?;

    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("failed to render summary")?
    );
    Ok(())
}

async fn run_db_migrate(config: Config) -> anyhow::Result<()> {
    if config.database.backend != DatabaseBackend::Postgres {
        anyhow::bail!("db migrate requires DATABASE_BACKEND=postgres");
    }
    let url = config
        .database
        .url
        .as_deref()
        .context("DATABASE_URL is required for migrations")?;
    let store = PostgresCatalogStore::connect(url, config.database.max_connections)
        .await
        .context("failed to connect to PostgreSQL for migration")?;
    store
        .migrate()
        .await
        .context("database migration failed")?;
    info!("Database migrations applied successfully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
