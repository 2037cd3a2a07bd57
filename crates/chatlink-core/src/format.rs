//! Outbound console command builders.
//!
//! Minecraft consoles get tellraw JSON components; generic consoles get the
//! plain quoted-string variant. Every externally-sourced field is run
//! through the sanitizer here, at the point of interpolation.

use crate::sanitize::sanitize_for_console;
use crate::types::ConsoleKind;

/// Name colors the console accepts.
pub const NAME_COLORS: &[&str] = &[
    "black",
    "dark_blue",
    "dark_green",
    "dark_aqua",
    "dark_red",
    "dark_purple",
    "gold",
    "gray",
    "dark_gray",
    "blue",
    "green",
    "aqua",
    "red",
    "light_purple",
    "yellow",
    "white",
];

/// Fallback when a configured color is missing or unknown.
pub const DEFAULT_COLOR: &str = "aqua";

/// A configured color, or the default if it is not one the console accepts.
#[must_use]
pub fn color_or_default(color: &str) -> &str {
    if NAME_COLORS.contains(&color) {
        color
    } else {
        DEFAULT_COLOR
    }
}

/// Build the relay command for one bridged chat message.
#[must_use]
pub fn chat_command(
    kind: ConsoleKind,
    source_alias: &str,
    color: &str,
    sender: &str,
    content: &str,
) -> String {
    let alias = sanitize_for_console(source_alias);
    let sender = sanitize_for_console(sender);
    let content = sanitize_for_console(content);
    let color = color_or_default(color);
    match kind {
        ConsoleKind::Minecraft => format!(
            r#"tellraw @a ["",{{"text":"[{alias}] ", "color": "{color}"}}, {{ "text": "<{sender}> ", "color": "white" }}, {{ "text": "{content}", "color": "white" }}]"#
        ),
        ConsoleKind::Generic => format!(r#"tellraw @a "[{alias}] <{sender}> {content}""#),
    }
}

/// Build the `!online` reply, addressed to the asking player where the
/// console supports targeting.
#[must_use]
pub fn online_reply(
    kind: ConsoleKind,
    recipient: &str,
    online: &[(String, Vec<String>)],
) -> String {
    match kind {
        ConsoleKind::Minecraft => {
            let recipient = sanitize_for_console(recipient);
            let mut json = String::from(
                r#"["",{"text":"[System] ", "color": "gold"}, {"text": "Online Players:", "color": "yellow"}"#,
            );
            if online.is_empty() {
                json.push_str(r#",{"text":"\nNo players online.", "color": "gray"}]"#);
            } else {
                for (alias, players) in online {
                    let alias = sanitize_for_console(alias);
                    let list = if players.is_empty() {
                        "None".to_owned()
                    } else {
                        sanitize_for_console(&players.join(", "))
                    };
                    json.push_str(&format!(
                        r#", {{"text": "\n{alias}: ", "color": "aqua"}}, {{"text": "{list}", "color": "white"}}"#
                    ));
                }
                json.push(']');
            }
            format!("tellraw {recipient} {json}")
        }
        ConsoleKind::Generic => {
            let mut lines = vec!["[System] Online Players:".to_owned()];
            if online.is_empty() {
                lines.push("No players online.".to_owned());
            } else {
                for (alias, players) in online {
                    let list = if players.is_empty() {
                        "None".to_owned()
                    } else {
                        players.join(", ")
                    };
                    lines.push(format!("{alias}: {list}"));
                }
            }
            let text = sanitize_for_console(&lines.join(" | "));
            format!(r#"tellraw @a "{text}""#)
        }
    }
}

/// Build the `!help` reply.
#[must_use]
pub fn help_reply(kind: ConsoleKind, recipient: &str) -> String {
    match kind {
        ConsoleKind::Minecraft => {
            let recipient = sanitize_for_console(recipient);
            format!(
                r#"tellraw {recipient} ["",{{"text":"[System] ", "color": "gold"}}, {{"text": "Available Commands:\n", "color": "yellow"}}, {{"text": "!online ", "color": "aqua"}}, {{"text": "- List online players", "color": "white"}}, {{"text": "\n!item ", "color": "aqua"}}, {{"text": "- Show held item", "color": "white"}}]"#
            )
        }
        ConsoleKind::Generic => {
            r#"tellraw @a "[System] Available Commands: !online - List online players""#.to_owned()
        }
    }
}

/// Build the shared-item broadcast: `[Alias] <Player> [Item Name]`.
#[must_use]
pub fn item_broadcast(
    kind: ConsoleKind,
    source_alias: &str,
    color: &str,
    sender: &str,
    item: &str,
) -> String {
    let alias = sanitize_for_console(source_alias);
    let sender = sanitize_for_console(sender);
    let item = sanitize_for_console(item);
    let color = color_or_default(color);
    match kind {
        ConsoleKind::Minecraft => format!(
            r#"tellraw @a ["",{{"text":"[{alias}] ", "color": "{color}"}}, {{ "text": "<{sender}> ", "color": "white" }}, {{ "text": "[{item}]", "color": "light_purple" }}]"#
        ),
        ConsoleKind::Generic => format!(r#"tellraw @a "[{alias}] <{sender}> [{item}]""#),
    }
}

/// `gtceu:tritanium_coil_block` → `Tritanium Coil Block`.
#[must_use]
pub fn prettify_item(item_id: &str) -> String {
    item_id
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minecraft_chat_command_shape() {
        let cmd = chat_command(ConsoleKind::Minecraft, "Lobby", "gold", "Alice", "hello");
        assert!(cmd.starts_with("tellraw @a "));
        assert!(cmd.contains(r#""[Lobby] ""#));
        assert!(cmd.contains(r#""color": "gold""#));
        assert!(cmd.contains(r#"<Alice> "#));
        assert!(cmd.contains(r#""hello""#));
    }

    #[test]
    fn generic_chat_command_shape() {
        assert_eq!(
            chat_command(ConsoleKind::Generic, "Lobby", "aqua", "Alice", "hello"),
            r#"tellraw @a "[Lobby] <Alice> hello""#
        );
    }

    #[test]
    fn hostile_content_cannot_escape_quoting() {
        let cmd = chat_command(
            ConsoleKind::Minecraft,
            "Lobby",
            "aqua",
            "Alice",
            "\"},{\"text\":\"pwned",
        );
        // The injected quote arrives escaped, so the JSON string does not
        // terminate early.
        assert!(cmd.contains(r#"\"},{\"text\":\"pwned"#));
    }

    #[test]
    fn newline_in_content_never_reaches_the_console() {
        let cmd = chat_command(ConsoleKind::Generic, "Lobby", "aqua", "Alice", "hi\nstop");
        assert!(!cmd.contains('\n'));
    }

    #[test]
    fn unknown_color_falls_back() {
        let cmd = chat_command(ConsoleKind::Minecraft, "A", "chartreuse", "B", "c");
        assert!(cmd.contains(r#""color": "aqua""#));
    }

    #[test]
    fn online_reply_lists_servers() {
        let online = vec![
            ("Lobby".to_owned(), vec!["Alice".to_owned(), "Bob".to_owned()]),
            ("Creative".to_owned(), vec![]),
        ];
        let cmd = online_reply(ConsoleKind::Minecraft, "Alice", &online);
        assert!(cmd.starts_with("tellraw Alice "));
        assert!(cmd.contains("Lobby"));
        assert!(cmd.contains("Alice, Bob"));
        assert!(cmd.contains("None"));

        let plain = online_reply(ConsoleKind::Generic, "Alice", &online);
        assert_eq!(
            plain,
            r#"tellraw @a "[System] Online Players: | Lobby: Alice, Bob | Creative: None""#
        );
    }

    #[test]
    fn online_reply_empty_roster() {
        let cmd = online_reply(ConsoleKind::Minecraft, "Alice", &[]);
        assert!(cmd.contains("No players online."));
    }

    #[test]
    fn item_broadcast_targets_everyone() {
        let cmd = item_broadcast(ConsoleKind::Minecraft, "Lobby", "aqua", "Alice", "Iron Pickaxe");
        assert!(cmd.starts_with("tellraw @a "));
        assert!(cmd.contains("[Iron Pickaxe]"));
    }

    #[test]
    fn prettify_item_title_cases() {
        assert_eq!(prettify_item("tritanium_coil_block"), "Tritanium Coil Block");
        assert_eq!(prettify_item("stone"), "Stone");
        assert_eq!(prettify_item(""), "");
    }
}
