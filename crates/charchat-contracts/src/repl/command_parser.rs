use super::command_registry::{
    CommandSpec, NO_ARG_COMMANDS, RAW_ARG_COMMANDS, SINGLE_ARG_COMMANDS,
};

/// One parsed line of interactive input.
///
/// Plain text becomes `say`; slash commands map through the registry and
/// anything unrecognised becomes `unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplCommand {
    pub action: String,
    pub raw: String,
    pub text: Option<String>,
    pub args: Vec<String>,
}

impl ReplCommand {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            text: None,
            args: Vec::new(),
        }
    }

    pub fn first_arg(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn split_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

fn single_arg(arg: &str) -> Vec<String> {
    let parts = split_args(arg);
    match parts.len() {
        0 => Vec::new(),
        1 => parts,
        _ => vec![parts.join(" ")],
    }
}

pub fn parse_command(text: &str) -> ReplCommand {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return ReplCommand::new("noop", text);
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let arg = slash_tail[command_len..].trim();

            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return ReplCommand::new(action, text);
            }

            if let Some(action) = find_action(&command, SINGLE_ARG_COMMANDS) {
                let mut parsed = ReplCommand::new(action, text);
                parsed.args = single_arg(arg);
                return parsed;
            }

            if let Some(action) = find_action(&command, RAW_ARG_COMMANDS) {
                let mut parsed = ReplCommand::new(action, text);
                if !arg.is_empty() {
                    parsed.text = Some(arg.to_string());
                }
                return parsed;
            }

            let mut parsed = ReplCommand::new("unknown", text);
            parsed.args = vec![command, arg.to_string()];
            return parsed;
        }
    }

    let mut parsed = ReplCommand::new("say", text);
    parsed.text = Some(raw_trimmed.to_string());
    parsed
}
