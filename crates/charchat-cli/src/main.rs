use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;

use anyhow::{bail, Result};
use charchat_client::photos::PHOTOS_SAVED;
use charchat_client::{
    describe_models, load_generation_settings, CharacterManager, ChatPipeline, ClientConfig,
    ConfigOverrides, HttpBackend, PhotoStudio, SaveOutcome, SendOutcome, SessionManager,
};
use charchat_contracts::characters::{Character, CharacterDraft};
use charchat_contracts::generation::PhotoSubject;
use charchat_contracts::photos::{IgnoreReason, ToggleOutcome, MAX_SELECTED_PHOTOS};
use charchat_contracts::repl::{
    parse_command, ReplCommand, CHAT_HELP_COMMANDS, STUDIO_HELP_COMMANDS,
};
use charchat_contracts::session::FileTokenStore;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "charchat", version, about = "Character chat client")]
struct Cli {
    /// Backend base URL (overrides CHARCHAT_API_BASE and the config file).
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Where the auth tokens are persisted.
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Store tokens issued by the backend and verify them.
    Login(LoginArgs),
    /// Consume the redirect URL of an OAuth sign-in.
    OauthCallback { url: String },
    Whoami,
    Logout,
    Models,
    /// Show the photo generation settings.
    Settings,
    #[command(subcommand)]
    Characters(CharactersCommand),
    Chat(ChatArgs),
    Photos(PhotosArgs),
}

#[derive(Debug, Args)]
struct LoginArgs {
    #[arg(long)]
    token: String,
    #[arg(long)]
    refresh_token: Option<String>,
}

#[derive(Debug, Subcommand)]
enum CharactersCommand {
    List {
        /// Only characters owned by the signed-in user.
        #[arg(long)]
        mine: bool,
    },
    Create(DraftArgs),
    Edit {
        /// Current name of the character.
        #[arg(value_name = "NAME")]
        target: String,
        #[command(flatten)]
        draft: DraftArgs,
    },
    Delete { name: String },
}

#[derive(Debug, Args)]
struct DraftArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    personality: String,
    #[arg(long)]
    situation: String,
    #[arg(long)]
    instructions: String,
    #[arg(long)]
    style: Option<String>,
    #[arg(long)]
    appearance: Option<String>,
    #[arg(long)]
    location: Option<String>,
}

impl From<DraftArgs> for CharacterDraft {
    fn from(args: DraftArgs) -> Self {
        CharacterDraft {
            name: args.name,
            personality: args.personality,
            situation: args.situation,
            instructions: args.instructions,
            style: args.style,
            appearance: args.appearance,
            location: args.location,
        }
    }
}

#[derive(Debug, Args)]
struct ChatArgs {
    #[arg(long, default_value = "anna")]
    character: String,
}

#[derive(Debug, Args)]
struct PhotosArgs {
    #[arg(long)]
    character: String,
    #[arg(long)]
    appearance: Option<String>,
    #[arg(long)]
    location: Option<String>,
}

struct App {
    backend: HttpBackend,
    sessions: SessionManager<FileTokenStore>,
}

fn main() {
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("charchat error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let mut app = open(ConfigOverrides {
        base_url: cli.base_url,
        token_file: cli.token_file,
        config_file: cli.config,
    })?;

    match cli.command {
        Command::Login(args) => {
            let verified = app.sessions.sign_in(
                &app.backend,
                &args.token,
                args.refresh_token.as_deref(),
            )?;
            if !verified {
                bail!("the backend did not accept the token");
            }
            print_user(&app.sessions);
        }
        Command::OauthCallback { url } => {
            match app.sessions.consume_oauth_callback(&app.backend, &url)? {
                Some(visible_url) => println!("Tokens stored. Continue at {visible_url}"),
                None => println!("No tokens in URL; kept the stored session."),
            }
            print_user(&app.sessions);
        }
        Command::Whoami => {
            app.sessions.load(&app.backend)?;
            print_user(&app.sessions);
        }
        Command::Logout => {
            app.sessions.logout()?;
            println!("Signed out.");
        }
        Command::Models => println!("{}", describe_models(&app.backend)),
        Command::Settings => {
            let settings = load_generation_settings(&app.backend);
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Command::Characters(command) => {
            app.sessions.load(&app.backend)?;
            run_characters(&mut app, command)?;
        }
        Command::Chat(args) => {
            app.sessions.load(&app.backend)?;
            run_chat(&mut app, args)?;
        }
        Command::Photos(args) => {
            app.sessions.load(&app.backend)?;
            run_photos(&mut app, args)?;
        }
    }
    Ok(0)
}

fn open(overrides: ConfigOverrides) -> Result<App> {
    let config = ClientConfig::resolve(overrides)?;
    tracing::debug!(base_url = %config.base_url, token_file = %config.token_file.display(), "resolved config");
    let backend = HttpBackend::new(&config)?;
    let sessions = SessionManager::new(FileTokenStore::new(&config.token_file));
    Ok(App { backend, sessions })
}

fn print_user(sessions: &SessionManager<FileTokenStore>) {
    match sessions.session().user() {
        Some(user) => println!(
            "Signed in as {} (id {}), {} coins",
            user.username, user.id, user.coins
        ),
        None => println!("Not signed in."),
    }
}

fn print_characters(characters: &[Character]) {
    if characters.is_empty() {
        println!("No characters.");
        return;
    }
    for character in characters {
        println!(
            "[{}] {}  {}  ({} photo(s))",
            character.avatar,
            character.name,
            character.description,
            character.photos.len()
        );
    }
}

fn run_characters(app: &mut App, command: CharactersCommand) -> Result<()> {
    let manager = CharacterManager::new();
    match command {
        CharactersCommand::List { mine } => {
            let characters = if mine {
                manager.list_mine(&mut app.sessions, &app.backend)?
            } else {
                manager.list_all(&app.sessions, &app.backend)?
            };
            print_characters(&characters);
        }
        CharactersCommand::Create(args) => {
            let created = manager.create(&mut app.sessions, &app.backend, args.into())?;
            println!("{}", serde_json::to_string_pretty(&created)?);
            print_user(&app.sessions);
        }
        CharactersCommand::Edit { target, draft } => {
            let updated = manager.update(&mut app.sessions, &app.backend, &target, draft.into())?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        CharactersCommand::Delete { name } => {
            manager.delete(&mut app.sessions, &app.backend, &name)?;
            println!("Deleted {name}.");
        }
    }
    Ok(())
}

/// Reads commands until EOF or until `handle` returns `false`.
fn repl_loop(mut handle: impl FnMut(ReplCommand) -> Result<bool>) -> Result<()> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let command = parse_command(line.trim_end_matches(['\n', '\r']));
        if command.action == "noop" {
            continue;
        }
        if !handle(command)? {
            break;
        }
    }
    Ok(())
}

fn run_chat(app: &mut App, args: ChatArgs) -> Result<()> {
    let mut pipeline = ChatPipeline::new(args.character);
    println!(
        "Chatting with {}. Type /help for commands.",
        pipeline.transcript().character_id()
    );
    if !app.sessions.session().is_authenticated() {
        println!("Not signed in; run `charchat login` before sending messages.");
    }

    repl_loop(|command| {
        match command.action.as_str() {
            "quit" => return Ok(false),
            "help" => println!("Commands: {}", CHAT_HELP_COMMANDS.join(" ")),
            "whoami" => print_user(&app.sessions),
            "clear" => {
                pipeline.clear();
                println!("Transcript cleared.");
            }
            "switch_character" => match command.first_arg() {
                Some(id) => {
                    pipeline.switch_character(id);
                    println!("Now chatting with {id}.");
                }
                None => println!("/character requires an id"),
            },
            "say" => {
                let text = command.text.as_deref().unwrap_or_default();
                match pipeline.send(&mut app.sessions, &app.backend, text) {
                    SendOutcome::Replied(reply) => {
                        println!("{}: {}", pipeline.transcript().character_id(), reply.content);
                        if let Some(url) = reply.image_url.as_deref() {
                            println!("  image: {url}");
                        }
                    }
                    SendOutcome::SignInRequired => println!("Sign in required"),
                    SendOutcome::Failed(message) => {
                        println!("Error: {message}");
                        pipeline.dismiss_error();
                    }
                    SendOutcome::Ignored | SendOutcome::Discarded => {}
                }
            }
            _ => println!("Unknown command. Type /help for commands."),
        }
        Ok(true)
    })
}

fn print_photos(studio: &PhotoStudio) {
    if studio.photos().is_empty() {
        println!("No photos yet. Use /generate to create one.");
        return;
    }
    let position = studio.carousel().position();
    for (index, photo) in studio.photos().iter().enumerate() {
        println!(
            "{} [{}] {}{}  {}",
            if index == position { ">" } else { " " },
            if photo.is_selected { "x" } else { " " },
            photo.id,
            if photo.is_main { " (main)" } else { "" },
            photo.url
        );
    }
    println!(
        "{}/{} selected",
        studio.selected_ids().len(),
        MAX_SELECTED_PHOTOS
    );
}

fn print_current_photo(studio: &PhotoStudio) {
    let position = studio.carousel().position();
    match studio.photos().get(position) {
        Some(photo) => println!(
            "Photo {}/{}: {} {}",
            position + 1,
            studio.photos().len(),
            photo.id,
            photo.url
        ),
        None => println!("No photos yet."),
    }
}

fn run_photos(app: &mut App, args: PhotosArgs) -> Result<()> {
    let mut studio = PhotoStudio::new(PhotoSubject {
        name: args.character,
        appearance: args.appearance,
        location: args.location,
    });
    studio.load_settings(&app.backend);
    studio.load_existing(&app.backend);
    println!(
        "Photo studio for {}. Type /help for commands.",
        studio.subject().name
    );
    print_photos(&studio);

    repl_loop(|command| {
        match command.action.as_str() {
            "quit" => return Ok(false),
            "help" => println!("Commands: {}", STUDIO_HELP_COMMANDS.join(" ")),
            "whoami" => print_user(&app.sessions),
            "generate_photo" => {
                match studio.generate(&mut app.sessions, &app.backend, command.text.as_deref()) {
                    Ok(photo) => {
                        println!("Generated {} {}", photo.id, photo.url);
                        print_user(&app.sessions);
                    }
                    Err(message) => println!("Error: {message}"),
                }
            }
            "toggle_photo" => match command.first_arg() {
                Some(id) => match studio.toggle(id) {
                    ToggleOutcome::Selected => println!(
                        "Selected {id} ({}/{MAX_SELECTED_PHOTOS})",
                        studio.selected_ids().len()
                    ),
                    ToggleOutcome::Deselected => println!("Deselected {id}"),
                    ToggleOutcome::Ignored(IgnoreReason::CapReached) => {
                        println!("At most {MAX_SELECTED_PHOTOS} photos can be selected")
                    }
                    ToggleOutcome::Ignored(IgnoreReason::UnknownPhoto) => {
                        println!("No photo with id {id}")
                    }
                },
                None => println!("/toggle requires a photo id"),
            },
            "list_photos" => print_photos(&studio),
            "next_photo" => {
                studio.next();
                print_current_photo(&studio);
            }
            "prev_photo" => {
                studio.prev();
                print_current_photo(&studio);
            }
            "save_photos" => match studio.save(&mut app.sessions, &app.backend) {
                Ok(SaveOutcome::Reload) => {
                    println!("{PHOTOS_SAVED}");
                    studio.load_existing(&app.backend);
                    print_photos(&studio);
                }
                Err(message) => println!("Error: {message}"),
            },
            "say" => println!("Use /generate [prompt] to create a photo."),
            _ => println!("Unknown command. Type /help for commands."),
        }
        Ok(true)
    })
}
