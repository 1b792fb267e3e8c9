use clap::Parser;
use tracing_subscriber::EnvFilter;

use object_design::config::{Config, OpenAiConfig};
use object_design::error::Result;
use object_design::server;

#[derive(Parser, Debug)]
#[command(name = "object-designd")]
#[command(about = "Object Design System server")]
struct Cli {
    /// Path to a JSON config file.
    #[arg(long)]
    config: Option<String>,

    #[arg(long, env = "DATABASE_PATH")]
    database: Option<String>,

    #[arg(long, env = "HOST")]
    host: Option<String>,

    #[arg(long, env = "PORT")]
    port: Option<u16>,

    #[arg(long, env = "OPENAI_API_KEY")]
    openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_MODEL")]
    openai_model: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL")]
    openai_base_url: Option<String>,
}

fn apply_overrides(mut config: Config, cli: Cli) -> Config {
    if cli.database.is_some() {
        config.database_path = cli.database;
    }
    if cli.host.is_some() || cli.port.is_some() {
        let server = config.server.get_or_insert_with(Default::default);
        if cli.host.is_some() {
            server.host = cli.host;
        }
        if cli.port.is_some() {
            server.port = cli.port;
        }
    }
    if cli.openai_api_key.is_some() {
        let openai = config.openai.get_or_insert_with(OpenAiConfig::default);
        openai.api_key = cli.openai_api_key;
        if cli.openai_model.is_some() {
            openai.model = cli.openai_model;
        }
        if cli.openai_base_url.is_some() {
            openai.base_url = cli.openai_base_url;
        }
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let base = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let config = apply_overrides(base, cli);

    server::run(config).await
}
