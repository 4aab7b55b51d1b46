use rounds_server::{serve, ServerConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = ServerConfig::default();
    if let Ok(port) = std::env::var("ROUNDS_PORT") {
        config.port = port.parse()?;
    }
    if let Ok(dir) = std::env::var("ROUNDS_FIXTURES_DIR") {
        config.fixtures_dir = Some(dir.into());
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(serve(config))
}
