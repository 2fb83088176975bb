use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use log::info;

use arenakv::{config::Config, store::Store};

/// Embedded key-value store server: binds a TCP listener and serves the
/// `/nosql/<key>` and `/snapshot/{backup,restore}` endpoints.
#[derive(Parser, Debug)]
#[command(name = "arenakv-server", version, about)]
struct Opt {
    /// Listen port. Overrides $PORT.
    #[arg(long)]
    port: Option<u16>,

    /// Bind address.
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Total arena size in bytes. Overrides $ARENA_TOTAL_MEMORY_SIZE.
    #[arg(long)]
    arena_size: Option<usize>,

    /// Index-region size in bytes. Overrides $ARENA_INDEX_SIZE.
    #[arg(long)]
    index_size: Option<usize>,

    /// Direct-mapped cache cell count. Overrides $CACHE_SIZE.
    #[arg(long)]
    cache_size: Option<usize>,
}

fn init_logger() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn run() -> Result<()> {
    let opt = Opt::parse();

    let mut cfg = Config::from_env();
    if let Some(port) = opt.port {
        cfg = cfg.with_port(port);
    }
    if let Some(bytes) = opt.arena_size {
        cfg = cfg.with_total_memory_size(bytes);
    }
    if let Some(bytes) = opt.index_size {
        cfg = cfg.with_index_size(bytes);
    }
    if let Some(cells) = opt.cache_size {
        cfg = cfg.with_cache_size(cells);
    }

    let store = Store::new(cfg.total_memory_size, cfg.index_size, cfg.cache_size);
    let addr = format!("{}:{}", opt.bind, cfg.port);
    info!("arena: {} bytes total, {} bytes index region, {} cache cells", cfg.total_memory_size, cfg.index_size, cfg.cache_size);
    arenakv::server::serve(&addr, store)
}

fn main() {
    init_logger();
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
