use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keystone::{api, config::Config, mcp};

#[derive(Parser)]
#[command(name = "ks")]
#[command(about = "Citation-backed project facts for construction onboarding")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Keystone HTTP server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, env = "KEYSTONE_PORT", default_value = "3000")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[command(flatten)]
        config: Config,
    },
    /// Start MCP server via stdio
    Mcp {
        #[command(flatten)]
        config: Config,
    },
    /// Check server status
    Status {
        /// Port the server listens on
        #[arg(short, long, env = "KEYSTONE_PORT", default_value = "3000")]
        port: u16,
    },
}

async fn serve(host: &str, port: u16, config: Config) -> anyhow::Result<()> {
    config.validate()?;
    let state = api::AppState {
        db: config.open_database()?,
        blobs: config.blob_store()?,
        generator: config.generator()?,
        pricing: config.pricing(),
    };
    tracing::info!(
        blobs = %state.blobs.root().display(),
        tax_rate = state.pricing.tax_rate,
        "Starting Keystone server"
    );

    let app = api::create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("Keystone server listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn status(port: u16) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;
    let url = format!("http://127.0.0.1:{}/health", port);
    match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => {
            let body: serde_json::Value = resp.json().await?;
            println!(
                "Keystone server running on port {} (version {})",
                port,
                body.get("version").and_then(|v| v.as_str()).unwrap_or("unknown")
            );
        }
        Ok(resp) => println!("Server on port {} answered {}", port, resp.status()),
        Err(_) => println!("No Keystone server on port {}", port),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "keystone=debug,keystone_core=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Default: start server, still honouring KEYSTONE_* variables
    let command = match cli.command {
        Some(command) => command,
        None => Cli::parse_from(["ks", "serve"])
            .command
            .ok_or_else(|| anyhow::anyhow!("no command"))?,
    };

    match command {
        Commands::Serve { port, host, config } => serve(&host, port, config).await?,
        Commands::Mcp { config } => {
            config.validate()?;
            let db = config.open_database()?;
            mcp::run_stdio_server(db, config.pricing()).await?;
        }
        Commands::Status { port } => status(port).await?,
    }

    Ok(())
}
