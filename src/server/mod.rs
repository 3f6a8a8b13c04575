//! The TCP server: one accept loop, one task per connection, one shared board.

use std::{
    io,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream, ToSocketAddrs},
    sync::Mutex,
};
use tracing::debug;

use crate::{
    data::Board,
    model::{
        client::Request,
        server::{BOOM_MESSAGE, BYE_MESSAGE, HELP_MESSAGE, welcome_message},
    },
};

/// Whether the connection stays open after a reply has been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Continue,
    Close,
}

/// Multiplayer minesweeper server.
///
/// The board is the only state shared between connections; every request that
/// touches it runs under its mutex, so digs, flags and looks from different
/// clients always observe a consistent board.
pub struct GameServer {
    listener: TcpListener,
    board: Arc<Mutex<Board>>,
    debug_mode: bool,
    connected_clients: Arc<AtomicUsize>,
}

impl GameServer {
    /// Bind a listener on `addr` serving the given board.
    ///
    /// With `debug_mode` set, a client that digs up a bomb stays connected
    /// after the BOOM reply instead of being disconnected.
    pub async fn bind(
        addr: impl ToSocketAddrs,
        board: Board,
        debug_mode: bool,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            board: Arc::new(Mutex::new(board)),
            debug_mode,
            connected_clients: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// The address the server is listening on. Useful after binding port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever. Returns only if the listening socket
    /// itself fails; a failure on an individual connection is logged and
    /// never aborts the accept loop.
    pub async fn serve(self) -> io::Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            let board = Arc::clone(&self.board);
            let connected_clients = Arc::clone(&self.connected_clients);
            let debug_mode = self.debug_mode;

            connected_clients.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                debug!("client {peer} connected");
                if let Err(e) =
                    handle_connection(stream, &board, &connected_clients, debug_mode).await
                {
                    debug!("client {peer} connection error: {e}");
                }
                connected_clients.fetch_sub(1, Ordering::SeqCst);
                debug!("client {peer} disconnected");
            });
        }
    }
}

/// Serve one client: welcome line, then a read-line/reply loop until the
/// client disconnects, says bye, or (outside debug mode) digs up a bomb.
async fn handle_connection(
    stream: TcpStream,
    board: &Mutex<Board>,
    connected_clients: &AtomicUsize,
    debug_mode: bool,
) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let welcome = {
        let board = board.lock().await;
        welcome_message(
            connected_clients.load(Ordering::SeqCst),
            board.width(),
            board.height(),
        )
    };
    writer.write_all(format!("{welcome}\n").as_bytes()).await?;

    while let Some(line) = lines.next_line().await? {
        let (reply, action) = handle_request(&line, board, debug_mode).await;
        writer.write_all(format!("{reply}\n").as_bytes()).await?;
        if action == Action::Close {
            break;
        }
    }
    Ok(())
}

/// Turn one request line into a reply, mutating the shared board as needed.
///
/// The board lock is held across the whole of each arm, so the bomb check and
/// the dig that follows it form a single atomic step: no concurrent flag or
/// dig can slip in between.
async fn handle_request(line: &str, board: &Mutex<Board>, debug_mode: bool) -> (String, Action) {
    let Some(request) = Request::parse(line) else {
        return (HELP_MESSAGE.to_string(), Action::Continue);
    };

    match request {
        Request::Look => (board.lock().await.to_string(), Action::Continue),
        Request::Help => (HELP_MESSAGE.to_string(), Action::Continue),
        Request::Bye => (BYE_MESSAGE.to_string(), Action::Close),
        Request::Dig { x, y } => {
            let mut board = board.lock().await;
            if let Some(position) = board.position_at(x, y) {
                let contains_bomb = board.contains_bomb(position);
                board.dig_at(position, contains_bomb);
                if contains_bomb {
                    let action = if debug_mode {
                        Action::Continue
                    } else {
                        Action::Close
                    };
                    return (BOOM_MESSAGE.to_string(), action);
                }
            }
            (board.to_string(), Action::Continue)
        }
        Request::Flag { x, y } => {
            let mut board = board.lock().await;
            if let Some(position) = board.position_at(x, y) {
                board.flag_at(position);
            }
            (board.to_string(), Action::Continue)
        }
        Request::Deflag { x, y } => {
            let mut board = board.lock().await;
            if let Some(position) = board.position_at(x, y) {
                board.deflag_at(position);
            }
            (board.to_string(), Action::Continue)
        }
    }
}
