//! In-band command grammar.
//!
//! A candidate chat line whose first word is a recognized `!`-command is
//! diverted to a handler instead of being broadcast. Anything else that
//! merely looks command-shaped falls through and is treated as chat.

/// Commands players can type into any bridged console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeCommand {
    /// List online players across the group.
    Online,
    /// Show the command list.
    Help,
    /// Show the sender's held item.
    Item,
}

/// Parse a chat line into a command, if its first word is one.
#[must_use]
pub fn parse(content: &str) -> Option<BridgeCommand> {
    if !content.starts_with('!') {
        return None;
    }
    let first_word = content.split_whitespace().next()?;
    match first_word.to_ascii_lowercase().as_str() {
        "!online" => Some(BridgeCommand::Online),
        "!help" => Some(BridgeCommand::Help),
        "!item" => Some(BridgeCommand::Item),
        _ => None,
    }
}
