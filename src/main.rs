use std::path::PathBuf;

use clap::Parser;
use multisweeper::{data::Board, server::GameServer};
use tracing::{error, info};

const DEFAULT_SIZE: usize = 10;

/// Multiplayer minesweeper server speaking a line-oriented text protocol.
#[derive(Parser, Debug)]
#[command(name = "multisweeper", about = "Multiplayer minesweeper server", long_about = None)]
struct Args {
    /// Keep connections open after a BOOM reply
    #[arg(long)]
    debug: bool,

    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short, long, default_value_t = 4444)]
    port: u16,

    /// Generate a random board of the given size, e.g. --size 42,58
    #[arg(long, value_parser = parse_size, conflicts_with = "file")]
    size: Option<(usize, usize)>,

    /// Load the starting board from a serialized board file
    #[arg(long)]
    file: Option<PathBuf>,
}

fn parse_size(value: &str) -> Result<(usize, usize), String> {
    let Some((width, height)) = value.split_once(',') else {
        return Err(format!("expected WIDTH,HEIGHT, got {value:?}"));
    };
    let width = width
        .parse()
        .map_err(|_| format!("invalid width {width:?}"))?;
    let height = height
        .parse()
        .map_err(|_| format!("invalid height {height:?}"))?;
    Ok((width, height))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let board = match &args.file {
        Some(path) => Board::from_file(path),
        None => {
            let (width, height) = args.size.unwrap_or((DEFAULT_SIZE, DEFAULT_SIZE));
            Board::from_dimensions(width, height)
        }
    };
    let board = match board {
        Ok(board) => board,
        Err(e) => {
            error!("failed to set up the board: {e}");
            std::process::exit(1);
        }
    };
    info!(
        "starting with a {}x{} board, debug mode {}",
        board.width(),
        board.height(),
        if args.debug { "on" } else { "off" }
    );

    let server = match GameServer::bind((args.host.as_str(), args.port), board, args.debug).await {
        Ok(server) => server,
        Err(e) => {
            error!("failed to bind {}:{}: {e}", args.host, args.port);
            std::process::exit(1);
        }
    };
    if let Ok(addr) = server.local_addr() {
        info!("minesweeper server listening on {addr}");
    }

    if let Err(e) = server.serve().await {
        error!("server socket failed: {e}");
        std::process::exit(1);
    }
}
