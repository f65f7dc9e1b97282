use anyhow::Context;
use clap::Parser;
use mockery::config::{Config, LogFormat};
use mockery::wiremock::wiremock_endpoints;
use mockery::{Mockery, MockServer};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "mockery",
    version,
    about = "Programmable HTTP test-double server"
)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "MOCKERY_PORT")]
    port: Option<u16>,

    /// Address to bind (overrides the config file)
    #[arg(long)]
    host: Option<std::net::IpAddr>,

    /// YAML server configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// WireMock directory with mappings/ and __files/
    #[arg(short, long, env = "MOCKERY_MAPPINGS")]
    mappings: Option<PathBuf>,

    /// Log filter, e.g. "info" or "mockery=debug"
    #[arg(long, env = "MOCKERY_LOG")]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<Format>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Format {
    Text,
    Json,
}

impl From<Format> for LogFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => LogFormat::Text,
            Format::Json => LogFormat::Json,
        }
    }
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(port) = args.port {
        config.listen.port = port;
    }
    if let Some(host) = args.host {
        config.listen.host = host;
    }
    if let Some(ref dir) = args.mappings {
        config.mappings = Some(dir.clone());
    }
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = args.log_format {
        config.logging.format = format.into();
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_tracing(&config.logging.level, config.logging.format);

    let mockery = Mockery::try_configure(|c| -> anyhow::Result<()> {
        if let Some(ref dir) = config.mappings {
            wiremock_endpoints(c, dir)?;
        }
        Ok(())
    })?;

    info!("Starting mockery v{}", env!("CARGO_PKG_VERSION"));
    let server = MockServer::new(config.listen.clone(), mockery);
    server
        .run_until(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
}
