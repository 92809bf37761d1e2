use clap::{Parser, Subcommand};
use plex_shelf::config::{self, AppConfig, Overrides};
use plex_shelf::imaging::RustBackend;
use plex_shelf::server::{AppState, build_router};
use plex_shelf::upstream::PlexClient;
use plex_shelf::{output, sync};
use std::path::PathBuf;
use std::sync::Arc;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "plex-shelf")]
#[command(about = "Mirror a Plex library locally and browse it as a poster gallery")]
#[command(long_about = "\
Mirror a Plex library locally and browse it as a poster gallery

On start the server mirrors the configured library sections once: titles and
years go to data/library.json, artwork goes to images/ in three sizes. The
gallery is served while the mirror runs and picks up the new snapshot as soon
as it is written.

Files:

  plex-shelf.toml          # Config (optional; run 'plex-shelf gen-config')
  data/library.json        # Snapshot of the mirrored sections
  images/{id}-hi.jpg       # Original artwork
  images/{id}-400.jpg      # 400px wide
  images/{id}-200.jpg      # 200px wide (gallery tiles)
  html/                    # Extra static files served at the site root

The upstream address and token can also come from PLEX_SERVER and PLEX_TOKEN,
and the port from PORT.")]
#[command(version = version_string())]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Upstream server base URL
    #[arg(long, env = "PLEX_SERVER", global = true)]
    url: Option<String>,

    /// Upstream access token
    #[arg(long, env = "PLEX_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT", global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the gallery and mirror the library once in the background (default)
    Serve,
    /// Mirror the library once and exit
    Sync,
    /// Validate the effective configuration without contacting the server
    Check,
    /// Print a stock config file with all options documented
    GenConfig,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            url: self.url.clone(),
            token: self.token.clone(),
            port: self.port,
        }
    }

    fn load_config(&self) -> Result<AppConfig, config::ConfigError> {
        config::load_config(&self.config, &self.overrides())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    match cli.command.as_ref().unwrap_or(&Command::Serve) {
        Command::Serve => {
            let config = cli.load_config()?;
            serve(config).await?;
        }
        Command::Sync => {
            let config = cli.load_config()?;
            let client = PlexClient::from_config(&config.upstream, &config.processing)?;
            let report = sync::run(&config, &client, Arc::new(RustBackend)).await?;
            output::print_sync_report(&report);
        }
        Command::Check => {
            let config = cli.load_config()?;
            println!("==> Config is valid");
            println!("    Upstream: {}", config.upstream.url);
            println!("    Sections: {:?}", config.sections.ids);
            println!("    Listen:   {}", config.server.address());
            println!("    Snapshot: {}", config.snapshot_path().display());
            println!("    Images:   {}", config.paths.images_dir.display());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Bind, start the one-time mirror in the background, then serve until killed.
async fn serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Starting plex-shelf {} ({})",
        version_string(),
        env!("BUILD_PROFILE")
    );

    sync::ensure_dirs(&config)?;
    let client = PlexClient::from_config(&config.upstream, &config.processing)?;

    let address = config.server.address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server running on http://{}", listener.local_addr()?);

    let app = build_router(AppState::from_config(&config));

    tokio::spawn(async move {
        match sync::run(&config, &client, Arc::new(RustBackend)).await {
            Ok(report) => tracing::info!(
                sections = report.fetch.sections.len(),
                skipped = report.fetch.skipped.len(),
                images = report.materialize.completed.len(),
                failed = report.materialize.failed.len(),
                "Library sync complete"
            ),
            Err(e) => tracing::error!(error = %e, "Library sync failed"),
        }
    });

    axum::serve(listener, app).await?;
    Ok(())
}
