// Line-oriented terminal front end. Each input line is one command; the
// screen is re-rendered after every command that changes something.

use tokio::io::{AsyncBufReadExt, BufReader};

use super::rich_text::ToolbarCommand;
use super::root_view::RootView;

/// Commands shown by `help`, grouped the way the editor screen is laid out.
const HELP: &[(&str, &[(&str, &str)])] = &[
    (
        "Account",
        &[
            ("login", "Sign in with Google"),
            ("logout", "Sign out and forget the Drive token"),
            ("connect", "Grant access to Google Drive"),
        ],
    ),
    (
        "Writing",
        &[
            ("type <text>", "Type text at the cursor"),
            ("newline", "Start a new paragraph"),
            ("select <from> <to> | select all", "Select characters"),
            ("backspace", "Delete the selection or the previous character"),
            ("bold | italic | underline", "Toggle a style on the selection"),
            ("undo | redo", "Walk the edit history"),
        ],
    ),
    (
        "Saving",
        &[
            ("name <file name>", "Set the Google Drive file name"),
            ("save-draft", "Save the letter as a local draft"),
            ("load <n>", "Load draft number n"),
            ("clear-drafts", "Delete every local draft"),
            ("save-drive", "Save the letter to Google Drive"),
            ("fetch", "List letters saved in Google Drive"),
        ],
    ),
    (
        "Other",
        &[("show", "Redraw the screen"), ("help", "This list"), ("quit", "Exit")],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login,
    Logout,
    Connect,
    Type(String),
    Newline,
    Select(usize, usize),
    SelectAll,
    Backspace,
    Toolbar(ToolbarCommand),
    Name(String),
    SaveDraft,
    LoadDraft(usize),
    ClearDrafts,
    SaveDrive,
    Fetch,
    Show,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Type a command, or `help`.")]
    Empty,
    #[error("Unknown command `{0}`. Try `help`.")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();
    let (word, rest) = match trimmed.split_once(' ') {
        Some((word, rest)) => (word, rest),
        None => (trimmed, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "" => return Err(ParseError::Empty),
        "login" => Command::Login,
        "logout" => Command::Logout,
        "connect" => Command::Connect,
        // Typed text keeps its spacing.
        "type" => Command::Type(rest.to_string()),
        "newline" => Command::Newline,
        "select" => parse_selection(rest.trim())?,
        "backspace" => Command::Backspace,
        "bold" => Command::Toolbar(ToolbarCommand::Bold),
        "italic" => Command::Toolbar(ToolbarCommand::Italic),
        "underline" => Command::Toolbar(ToolbarCommand::Underline),
        "undo" => Command::Toolbar(ToolbarCommand::Undo),
        "redo" => Command::Toolbar(ToolbarCommand::Redo),
        "name" => Command::Name(rest.trim().to_string()),
        "save-draft" => Command::SaveDraft,
        "load" => {
            let n: usize = rest
                .trim()
                .parse()
                .map_err(|_| ParseError::Usage("load <n>"))?;
            if n == 0 {
                return Err(ParseError::Usage("load <n>, counting from 1"));
            }
            Command::LoadDraft(n - 1)
        }
        "clear-drafts" => Command::ClearDrafts,
        "save-drive" => Command::SaveDrive,
        "fetch" => Command::Fetch,
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(command)
}

fn parse_selection(args: &str) -> Result<Command, ParseError> {
    const USAGE: &str = "select <from> <to> | select all";
    if args.eq_ignore_ascii_case("all") {
        return Ok(Command::SelectAll);
    }
    let mut bounds = args.split_whitespace().map(str::parse::<usize>);
    match (bounds.next(), bounds.next(), bounds.next()) {
        (Some(Ok(from)), Some(Ok(to)), None) => Ok(Command::Select(from, to)),
        _ => Err(ParseError::Usage(USAGE)),
    }
}

pub fn help_text() -> String {
    let mut out = String::new();
    for (category, commands) in HELP {
        out.push_str(&format!("{}\n", category));
        for (usage, description) in *commands {
            out.push_str(&format!("  {:<34} {}\n", usage, description));
        }
    }
    out
}

/// What the loop should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Redraw,
    Quiet,
    Quit,
}

pub async fn dispatch(root: &mut RootView, command: Command) -> Flow {
    match command {
        Command::Quit => return Flow::Quit,
        Command::Help => {
            print!("{}", help_text());
            return Flow::Quiet;
        }
        Command::Show => return Flow::Redraw,
        Command::Login => {
            if !root.sign_in().await {
                println!("Sign-in did not complete.");
            }
            return Flow::Redraw;
        }
        Command::Logout => {
            root.sign_out().await;
            return Flow::Redraw;
        }
        _ => {}
    }

    let Some(editor) = root.editor() else {
        println!("Please sign in first. Type `login`.");
        return Flow::Quiet;
    };

    match command {
        Command::Connect => editor.handle_connect_drive().await,
        Command::Type(text) => {
            editor.editor_mut().focus();
            editor.editor_mut().insert_text(&text);
        }
        Command::Newline => {
            editor.editor_mut().focus();
            editor.editor_mut().insert_text("\n");
        }
        Command::Select(from, to) => {
            editor.editor_mut().focus();
            editor.editor_mut().select(from, to);
        }
        Command::SelectAll => {
            editor.editor_mut().focus();
            editor.editor_mut().select_all();
        }
        Command::Backspace => editor.editor_mut().delete_backward(),
        Command::Toolbar(toolbar) => {
            if !editor.toolbar(toolbar) {
                println!("Nothing to apply that to. Select some text first.");
                return Flow::Quiet;
            }
        }
        Command::Name(name) => editor.set_file_name(name),
        Command::SaveDraft => editor.handle_save_draft(),
        Command::LoadDraft(index) => editor.handle_load_draft(index),
        Command::ClearDrafts => editor.handle_clear_drafts(),
        Command::SaveDrive => editor.handle_save_to_drive().await,
        Command::Fetch => editor.handle_fetch_letters().await,
        Command::Quit | Command::Help | Command::Show | Command::Login | Command::Logout => {}
    }
    Flow::Redraw
}

/// Reads commands from stdin until `quit` or end of input.
pub async fn run(mut root: RootView) -> std::io::Result<()> {
    println!("{}", root.render().await);
    println!("Type `help` for the list of commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(ParseError::Empty) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        tracing::debug!(?command, "Dispatching command");
        match dispatch(&mut root, command).await {
            Flow::Quit => break,
            Flow::Redraw => println!("\n{}", root.render().await),
            Flow::Quiet => {}
        }
    }

    tracing::info!("Editor closed");
    Ok(())
}
