use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use toybot_server::ServerConfig;
use tracing_subscriber::EnvFilter;

/// HTTP service driving a single toy robot on a square board.
#[derive(Debug, Parser)]
#[command(name = "toybot-server", version)]
struct Cli {
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    host: IpAddr,

    /// The browser client expects port 8000.
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Side length of the starting board (at least 5).
    #[arg(long, default_value_t = toybot_engine::DEFAULT_BOARD_SIZE)]
    board_size: i64,

    /// Serve the browser client from this directory.
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Accept requests from any peer, not just loopback/Tailscale.
    #[arg(long)]
    allow_remote: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let addr = SocketAddr::new(cli.host, cli.port);
    let config = ServerConfig {
        board_size: cli.board_size,
        static_dir: cli.static_dir,
        allow_remote: cli.allow_remote,
    };

    toybot_server::serve(addr, config).await
}
