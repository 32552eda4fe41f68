//! Parsing of the lines typed at the prompt.

use rook_net::{Move, MoveParseError};

/// Shown by `help` and after an unknown command.
pub const USAGE: &str = "\
commands:
  create              start a new game (you play white)
  join <game id>      join a game (you play black)
  move <from> <to>    play a move, e.g. `move e2 e4` or just `e2e4`
  leave               abandon the current game
  show                redraw the board
  help                show this text
  quit                leave and exit";

/// One user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create,
    Join(String),
    Move(Move),
    Leave,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command {0:?}, type `help` for the list")]
    Unknown(String),

    #[error("usage: join <game id>")]
    JoinUsage,

    #[error("usage: move <from> <to>")]
    MoveUsage,

    #[error(transparent)]
    BadMove(#[from] MoveParseError),
}

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match verb.to_ascii_lowercase().as_str() {
            "create" | "new" => Self::Create,
            "join" => match args.as_slice() {
                [id] => Self::Join((*id).to_string()),
                _ => return Err(CommandError::JoinUsage),
            },
            "move" | "mv" => match args.as_slice() {
                [compact] => Self::Move(compact.parse()?),
                [from, to] => Self::Move(Move::try_new(from, to)?),
                _ => return Err(CommandError::MoveUsage),
            },
            "leave" => Self::Leave,
            "show" | "board" => Self::Show,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => match verb.parse::<Move>() {
                Ok(mv) if args.is_empty() => Self::Move(mv),
                _ => return Err(CommandError::Unknown(verb.to_string())),
            },
        };
        Ok(Some(command))
    }
}
