/// One line of client input, parsed against the protocol grammar:
///
/// ```text
/// look | help | bye | dig X Y | flag X Y | deflag X Y
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Look,
    Help,
    Bye,
    Dig { x: i64, y: i64 },
    Flag { x: i64, y: i64 },
    Deflag { x: i64, y: i64 },
}

impl Request {
    /// Parse a request line. Keywords are case-sensitive, tokens are
    /// separated by exactly one space, and coordinates match `-?\d+`; they
    /// may be negative or otherwise out of bounds here, the server treats
    /// those as no-ops. Returns `None` for anything not in the grammar.
    pub fn parse(line: &str) -> Option<Self> {
        let tokens: Vec<&str> = line.split(' ').collect();
        match tokens[..] {
            ["look"] => Some(Self::Look),
            ["help"] => Some(Self::Help),
            ["bye"] => Some(Self::Bye),
            [command @ ("dig" | "flag" | "deflag"), x, y] => {
                let x = parse_coordinate(x)?;
                let y = parse_coordinate(y)?;
                Some(match command {
                    "dig" => Self::Dig { x, y },
                    "flag" => Self::Flag { x, y },
                    _ => Self::Deflag { x, y },
                })
            }
            _ => None,
        }
    }
}

/// Accepts exactly the token shape `-?\d+`.
fn parse_coordinate(token: &str) -> Option<i64> {
    let digits = token.strip_prefix('-').unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}
