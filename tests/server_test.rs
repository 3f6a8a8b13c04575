//! End-to-end protocol tests over real sockets, driving a server bound to an
//! ephemeral port exactly like a telnet client would.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    time::timeout,
};

use multisweeper::{data::Board, model::server::HELP_MESSAGE, server::GameServer};

/// The 7x7 board from the published server exercise: one bomb at (4, 1), one
/// at (0, 6).
const PUBLISHED_BOARD: &str = "\
7 7
0 0 0 0 0 0 0
0 0 0 0 1 0 0
0 0 0 0 0 0 0
0 0 0 0 0 0 0
0 0 0 0 0 0 0
0 0 0 0 0 0 0
1 0 0 0 0 0 0";

async fn start_server(board: &str, debug_mode: bool) -> SocketAddr {
    let board = Board::from_serialized(board).expect("test board must parse");
    let server = GameServer::bind("127.0.0.1:0", board, debug_mode)
        .await
        .expect("failed to bind an ephemeral port");
    let addr = server.local_addr().expect("listener has no local address");
    tokio::spawn(server.serve());
    addr
}

struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("failed to connect");
        let (reader, writer) = stream.into_split();
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("failed to send");
    }

    async fn recv(&mut self) -> String {
        timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("timed out waiting for a reply")
            .expect("connection error")
            .expect("connection closed unexpectedly")
    }

    /// Receive a board rendering of the given height as one string.
    async fn recv_board(&mut self, height: usize) -> String {
        let mut rows = Vec::with_capacity(height);
        for _ in 0..height {
            rows.push(self.recv().await);
        }
        rows.join("\n")
    }

    /// Assert that the server has closed the connection.
    async fn recv_eof(&mut self) {
        let next = timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("timed out waiting for the connection to close")
            .expect("connection error");
        assert_eq!(next, None, "expected the server to close the connection");
    }
}

#[tokio::test]
async fn published_board_scenario() {
    let addr = start_server(PUBLISHED_BOARD, true).await;
    let mut client = TestClient::connect(addr).await;

    let welcome = client.recv().await;
    assert!(welcome.starts_with("Welcome"), "got {welcome:?}");
    assert!(welcome.contains("7 columns by 7 rows"), "got {welcome:?}");

    client.send("help").await;
    assert_eq!(client.recv().await, HELP_MESSAGE);

    client.send("look").await;
    assert_eq!(client.recv_board(7).await, ["- - - - - - -"; 7].join("\n"));

    client.send("dig 3 1").await;
    assert_eq!(
        client.recv_board(7).await,
        "- - - - - - -\n\
         - - - 1 - - -\n\
         - - - - - - -\n\
         - - - - - - -\n\
         - - - - - - -\n\
         - - - - - - -\n\
         - - - - - - -"
    );

    client.send("flag 1 1").await;
    assert_eq!(
        client.recv_board(7).await,
        "- - - - - - -\n\
         - F - 1 - - -\n\
         - - - - - - -\n\
         - - - - - - -\n\
         - - - - - - -\n\
         - - - - - - -\n\
         - - - - - - -"
    );

    client.send("deflag 1 1").await;
    assert_eq!(
        client.recv_board(7).await,
        "- - - - - - -\n\
         - - - 1 - - -\n\
         - - - - - - -\n\
         - - - - - - -\n\
         - - - - - - -\n\
         - - - - - - -\n\
         - - - - - - -"
    );

    client.send("dig 4 1").await;
    assert_eq!(client.recv().await, "BOOM!");

    // Debug mode is on: the connection survives the detonation, and the
    // removed bomb has cascaded the reveal across the whole zero region.
    let blank_row = "             ";
    client.send("look").await;
    assert_eq!(
        client.recv_board(7).await,
        [
            blank_row,
            blank_row,
            blank_row,
            blank_row,
            blank_row,
            "1 1          ",
            "- 1          ",
        ]
        .join("\n")
    );

    client.send("bye").await;
    assert_eq!(client.recv().await, "Bye");
    client.recv_eof().await;
}

#[tokio::test]
async fn two_clients_share_one_board() {
    let addr = start_server("3 1\n0 0 0", true).await;

    let mut first = TestClient::connect(addr).await;
    assert!(first.recv().await.contains("Players: 1"));

    let mut second = TestClient::connect(addr).await;
    assert!(second.recv().await.contains("Players: 2"));

    // A flag placed by one client is immediately visible to the other.
    first.send("flag 0 0").await;
    assert_eq!(first.recv().await, "F - -");

    second.send("look").await;
    assert_eq!(second.recv().await, "F - -");

    second.send("bye").await;
    assert_eq!(second.recv().await, "Bye");
    second.recv_eof().await;

    first.send("bye").await;
    assert_eq!(first.recv().await, "Bye");
    first.recv_eof().await;
}

#[tokio::test]
async fn single_square_game() {
    let addr = start_server("1 1\n0", true).await;
    let mut client = TestClient::connect(addr).await;
    client.recv().await;

    client.send("look").await;
    assert_eq!(client.recv().await, "-");

    client.send("dig 0 0").await;
    assert_eq!(client.recv().await, " ");
}

#[tokio::test]
async fn malformed_and_out_of_bounds_input_is_harmless() {
    let addr = start_server("1 1\n1", true).await;
    let mut client = TestClient::connect(addr).await;
    client.recv().await;

    client.send("mine 0 0").await;
    assert_eq!(client.recv().await, HELP_MESSAGE);

    // Out of bounds: the board comes back unchanged, bomb still in place.
    client.send("dig 9 9").await;
    assert_eq!(client.recv().await, "-");

    client.send("look").await;
    assert_eq!(client.recv().await, "-");
}

#[tokio::test]
async fn detonation_disconnects_outside_debug_mode() {
    let addr = start_server("1 1\n1", false).await;
    let mut client = TestClient::connect(addr).await;
    client.recv().await;

    client.send("dig 0 0").await;
    assert_eq!(client.recv().await, "BOOM!");
    client.recv_eof().await;
}

#[tokio::test]
async fn detonation_keeps_the_connection_in_debug_mode() {
    let addr = start_server("1 1\n1", true).await;
    let mut client = TestClient::connect(addr).await;
    client.recv().await;

    client.send("dig 0 0").await;
    assert_eq!(client.recv().await, "BOOM!");

    // Still connected, and the bomb square is now a dug blank.
    client.send("look").await;
    assert_eq!(client.recv().await, " ");
}
