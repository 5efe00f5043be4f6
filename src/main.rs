use shellfyre::{Config, Interpreter};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::for_start_dir(&std::env::current_dir()?);
    tracing::debug!(?config, "starting");
    Interpreter::new(config).repl()?;
    Ok(())
}
