//! Slash commands accepted at the `friday` prompt.

/// Supported slash commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    /// Forget the conversation; the next turn sends a fresh system prompt.
    Reset,
    /// Print the long-term memory summary.
    Memory,
    /// Count a topic mention.
    Topic(String),
    /// Send the test prompt.
    Test,
    /// Set the API key for this run.
    Key(String),
    /// Drop the API key for this run.
    ClearKey,
    Help,
    Quit,
}

pub const HELP: &str = "commands: /reset, /memory, /topic <name>, /test, /key <value>|clear, /help, /quit";

/// Parse a slash command; plain utterances return `Ok(None)`.
pub fn parse_slash_command(input: &str) -> Result<Option<SlashCommand>, String> {
    let trimmed = input.trim();
    let Some(body) = trimmed.strip_prefix('/') else {
        return Ok(None);
    };
    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };
    match name {
        "reset" => Ok(Some(SlashCommand::Reset)),
        "memory" => Ok(Some(SlashCommand::Memory)),
        "test" => Ok(Some(SlashCommand::Test)),
        "help" => Ok(Some(SlashCommand::Help)),
        "quit" | "exit" => Ok(Some(SlashCommand::Quit)),
        "topic" if rest.is_empty() => Err("usage: /topic <name>".to_string()),
        "topic" => Ok(Some(SlashCommand::Topic(rest.to_string()))),
        "key" => match rest {
            "" => Err("usage: /key <value>|clear".to_string()),
            "clear" => Ok(Some(SlashCommand::ClearKey)),
            key => Ok(Some(SlashCommand::Key(key.to_string()))),
        },
        other => Err(format!("unknown command: /{other} ({HELP})")),
    }
}

#[cfg(test)]
mod tests {
    use super::{SlashCommand, parse_slash_command};
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_slash_command("hello /reset"), Ok(None));
    }

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(parse_slash_command(" /reset "), Ok(Some(SlashCommand::Reset)));
        assert_eq!(
            parse_slash_command("/topic english practice"),
            Ok(Some(SlashCommand::Topic("english practice".to_string())))
        );
        assert_eq!(
            parse_slash_command("/key gsk_123"),
            Ok(Some(SlashCommand::Key("gsk_123".to_string())))
        );
        assert_eq!(parse_slash_command("/key clear"), Ok(Some(SlashCommand::ClearKey)));
        assert_eq!(parse_slash_command("/exit"), Ok(Some(SlashCommand::Quit)));
    }

    #[test]
    fn rejects_missing_arguments_and_unknown_commands() {
        assert!(parse_slash_command("/topic").is_err());
        assert!(parse_slash_command("/key").is_err());
        let err = parse_slash_command("/dance").unwrap_err();
        assert!(err.contains("unknown command: /dance"));
    }
}
