//! Command parser - Splits prefixed text into command name and arguments

/// A parsed command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lowercased command name
    pub name: String,
    pub args: Vec<String>,
    /// Arguments joined by single spaces
    pub text: String,
}

/// Parses text into commands for a given prefix
pub struct CommandParser {
    prefix: String,
}

impl CommandParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_command(&self, text: &str) -> bool {
        !self.prefix.is_empty() && text.starts_with(&self.prefix)
    }

    /// `None` when the text is not a command or names no command
    pub fn parse(&self, text: &str) -> Option<ParsedCommand> {
        if !self.is_command(text) {
            return None;
        }

        let mut parts = text[self.prefix.len()..].split_whitespace();
        let name = parts.next()?.to_lowercase();
        let args: Vec<String> = parts.map(str::to_string).collect();
        let text = args.join(" ");

        Some(ParsedCommand { name, args, text })
    }
}
