use clap::Parser;
use std::sync::Arc;

use cleanserve::config::{self, AppState, Config, Overrides};
use cleanserve::{logger, server};

/// Preview a static site locally with clean URLs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (without extension)
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: String,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory to serve (defaults to the executable's directory)
    #[arg(short, long)]
    root: Option<String>,

    /// Serve paths exactly as requested
    #[arg(long)]
    no_clean_urls: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            root: self.root.clone(),
            disable_clean_urls: self.no_clean_urls,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut cfg = Config::load_from(&cli.config)?;
    cfg.apply(cli.overrides());

    if cli.print_config {
        print!("{}", cfg.to_toml()?);
        return Ok(());
    }

    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    let state = AppState::new(cfg).inspect_err(|e| logger::log_error(&e.to_string()))?;
    let state = Arc::new(state);

    let listener =
        server::create_listener(addr).inspect_err(|e| logger::log_bind_failed(&addr, e))?;
    let local_addr = listener.local_addr()?;

    logger::log_server_start(&local_addr, state.config.site.clean_urls);
    logger::log_startup_details(&local_addr, &state.config, &state.root);

    server::start_server_loop(listener, state, async {
        match server::signal::wait_for_shutdown().await {
            Ok(signal) => logger::log_shutdown(signal),
            Err(e) => {
                logger::log_error(&format!("Failed to register signal handlers: {e}"));
                std::future::pending::<()>().await;
            }
        }
    })
    .await?;

    Ok(())
}
