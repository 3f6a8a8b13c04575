//! Fixed server reply text. These literals are the protocol surface: clients
//! key off them, so they never change shape.

/// Reply to `bye`, sent immediately before closing the connection.
pub const BYE_MESSAGE: &str = "Bye";

/// Reply to a dig that detonated a bomb.
pub const BOOM_MESSAGE: &str = "BOOM!";

/// One-line usage string, also the reply to any line that fails to parse.
pub const HELP_MESSAGE: &str = "Send a message to perform an action. Possible messages: \
    \"help\" (get this message again) / \"dig X Y\" (dig at position (X, Y)) / \
    \"flag X Y\" (flag position (X, Y)) / \"deflag X Y\" (remove the flag at position (X, Y)) / \
    \"look\" (have a look at the board) / \"bye\" (exit the game)";

/// Greeting sent once per connection, reporting the current player count and
/// the board dimensions.
pub fn welcome_message(players: usize, width: usize, height: usize) -> String {
    format!(
        "Welcome to Minesweeper. Players: {players} including you. \
         Board: {width} columns by {height} rows. Type 'help' for help."
    )
}
