use std::net::{IpAddr, SocketAddr};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use person_registry::api::{self, AlertHeaders};
use person_registry::config::Config;
use person_registry::db;
use person_registry::service::PersonService;

#[derive(Parser)]
#[command(name = "person-registry")]
#[command(about = "Person registry with full-text search")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port for HTTP API
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(short, long)]
        bind: Option<IpAddr>,

        /// Keep the store in memory instead of on disk
        #[arg(long)]
        memory: bool,
    },
    /// Print the resolved configuration and exit
    CheckConfig,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "person_registry=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = Config::from_env().context("Invalid configuration")?;

    match cli.command {
        Some(Commands::Serve { port, bind, memory }) => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(bind) = bind {
                config.bind = bind;
            }
            serve(config, memory).await?;
        }
        Some(Commands::CheckConfig) => {
            let database = match &config.database_path {
                Some(path) => path.clone(),
                None => db::default_path()?,
            };
            println!("database:  {}", database.display());
            println!("index:     {:?}", config.index);
            println!("app name:  {}", config.app_name);
            println!("listen:    {}:{}", config.bind, config.port);
        }
        None => serve(config, false).await?,
    }

    Ok(())
}

async fn serve(mut config: Config, memory: bool) -> anyhow::Result<()> {
    let database = if memory {
        config.index.place_beside_store(None);
        db::Database::open_memory()?
    } else {
        let path = match &config.database_path {
            Some(path) => path.clone(),
            None => db::default_path()?,
        };
        config.index.place_beside_store(Some(&path));
        db::Database::open(path)?
    };
    database.migrate()?;

    let index = config
        .index
        .connect()
        .with_context(|| format!("Failed to open {} search index", config.index.name()))?;
    let alerts = AlertHeaders::new(&config.app_name)?;

    let app = api::create_router(PersonService::new(database, index), alerts);

    let addr = SocketAddr::new(config.bind, config.port);
    tracing::info!(
        "Starting person registry on http://{} (index: {})",
        addr,
        config.index.name()
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;
    Ok(())
}
