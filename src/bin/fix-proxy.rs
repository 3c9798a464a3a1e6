//! Process entry point: parse the CLI, load the TOML config, merge CLI overrides onto it, wire up the TCP
//! transport and the scheduler, and run until a shutdown signal arrives. This binary installs the global tracing
//! subscriber; library code never does.

use fix_order_proxy::authfeed::NoAuthFeed;
use fix_order_proxy::cli::Cli;
use fix_order_proxy::config::ConfigFile;
use fix_order_proxy::router::Router;
use fix_order_proxy::scheduler;
use fix_order_proxy::shared::Shared;
use fix_order_proxy::transport;

use clap::Parser;
use tokio::sync::mpsc;

use std::time::Instant;

fn main()
{
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(err) = run()
    {
        tracing::error!(%err, "fix-proxy exiting on fatal error");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>>
{
    let cli = Cli::parse();

    let config_file = ConfigFile::load(&cli.config_path)?;
    let client_config = cli.client_config()?;
    let server_config = cli.server_config();
    let router_config = cli.router_config();
    let upstream_address = cli.upstream_address()?;

    let listen_address = client_config.listen_address;
    let client_decode_buffer_size = client_config.decode_buffer_size;
    let server_decode_buffer_size = server_config.decode_buffer_size;

    // seeds the request-id generator so ids never collide across restarts sharing an upstream session.
    let seed_nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or(1);
    let shared = Shared::new(config_file.users, config_file.symbols, seed_nanos);

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

    runtime.block_on(async move {
        let router = Router::new(shared, client_config, server_config, router_config, Instant::now());
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let listener_events = events_tx.clone();
        tokio::spawn(async move {
            if let Err(err) = transport::run_client_listener(listen_address, client_decode_buffer_size, listener_events).await
            {
                tracing::error!(%err, "client listener stopped");
            }
        });
        tokio::spawn(transport::run_server_dialer(upstream_address, server_decode_buffer_size, events_tx));

        scheduler::run(router, events_rx, Box::new(NoAuthFeed)).await
    })?;

    Ok(())
}
