#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
    },
    CommandSpec {
        command: "clear",
        action: "clear",
    },
    CommandSpec {
        command: "whoami",
        action: "whoami",
    },
    CommandSpec {
        command: "list",
        action: "list_photos",
    },
    CommandSpec {
        command: "next",
        action: "next_photo",
    },
    CommandSpec {
        command: "prev",
        action: "prev_photo",
    },
    CommandSpec {
        command: "save",
        action: "save_photos",
    },
];

pub(crate) const SINGLE_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "character",
        action: "switch_character",
    },
    CommandSpec {
        command: "toggle",
        action: "toggle_photo",
    },
];

pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "generate",
    action: "generate_photo",
}];

pub const CHAT_HELP_COMMANDS: &[&str] = &["/character", "/clear", "/whoami", "/help", "/quit"];

pub const STUDIO_HELP_COMMANDS: &[&str] = &[
    "/generate",
    "/list",
    "/toggle",
    "/next",
    "/prev",
    "/save",
    "/whoami",
    "/help",
    "/quit",
];
