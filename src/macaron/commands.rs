//! Chat command parser.
//!
//! Commands are slash-prefixed words with whitespace separated positional
//! arguments, e.g. `/add 3 4` or `/eat@macaronbot 2 1`. The `@botname` suffix
//! that group chats append is ignored and the command word is matched
//! case-insensitively.
//!
//! Arity and number formats are checked here so handlers only ever see
//! well-formed commands; anything else becomes [`BotCommand::Invalid`] with the
//! offending command name, or [`BotCommand::Unknown`].
//!
//! Inline-keyboard answers arrive separately as callback data and are parsed
//! by [`parse_callback`].
use log::trace;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Add { rows: usize, cols: usize },
    Request(String),
    SetDefault(String),
    Show(Option<String>),
    ShowName,
    ShowAll,
    Get,
    /// One-based coordinates as typed by the user
    Eat { row: usize, col: usize },
    Feed,
    Remove(String),
    Admin,
    Invalid(&'static str),
    Unknown,
}

/// Accept/deny answer to an access request prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackAnswer {
    pub granted: bool,
    pub request: Uuid,
}

impl CallbackAnswer {
    pub fn encode(&self) -> String {
        format!("{}:{}", if self.granted { '1' } else { '0' }, self.request)
    }
}

pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, raw: &str) -> BotCommand {
        let trimmed = raw.trim();
        let Some(body) = trimmed.strip_prefix('/') else {
            return BotCommand::Unknown;
        };
        let mut parts = body.split_whitespace();
        let Some(head) = parts.next() else {
            return BotCommand::Unknown;
        };
        // Drop "@botname" addressed forms used in group chats
        let word = head.split('@').next().unwrap_or(head).to_ascii_lowercase();
        let args: Vec<&str> = parts.collect();
        trace!("Parsed command '{}' with {} args from '{}'", word, args.len(), raw);

        match word.as_str() {
            "start" => BotCommand::Start,
            "help" => BotCommand::Help,
            "add" => match parse_pair(&args) {
                Some((rows, cols)) => BotCommand::Add { rows, cols },
                None => BotCommand::Invalid("add"),
            },
            "request" => single(&args)
                .map(BotCommand::Request)
                .unwrap_or(BotCommand::Invalid("request")),
            "set_default" => single(&args)
                .map(BotCommand::SetDefault)
                .unwrap_or(BotCommand::Invalid("set_default")),
            "show" => match args.len() {
                0 => BotCommand::Show(None),
                1 => BotCommand::Show(Some(args[0].to_string())),
                _ => BotCommand::Invalid("show"),
            },
            "show_name" => BotCommand::ShowName,
            "show_all" => BotCommand::ShowAll,
            "get" => BotCommand::Get,
            "eat" => match parse_pair(&args) {
                Some((row, col)) if row > 0 && col > 0 => BotCommand::Eat { row, col },
                _ => BotCommand::Invalid("eat"),
            },
            "feed" => BotCommand::Feed,
            "remove" => single(&args)
                .map(BotCommand::Remove)
                .unwrap_or(BotCommand::Invalid("remove")),
            "admin" => BotCommand::Admin,
            _ => BotCommand::Unknown,
        }
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

fn single(args: &[&str]) -> Option<String> {
    match args {
        [one] => Some(one.to_string()),
        _ => None,
    }
}

fn parse_pair(args: &[&str]) -> Option<(usize, usize)> {
    match args {
        [a, b] => Some((parse_small(a)?, parse_small(b)?)),
        _ => None,
    }
}

// Grid sides and coordinates both fit in a byte
fn parse_small(s: &str) -> Option<usize> {
    s.parse::<u8>().ok().map(usize::from)
}

/// Parse `1:<uuid>` / `0:<uuid>` callback data.
pub fn parse_callback(data: &str) -> Option<CallbackAnswer> {
    let (flag, id) = data.split_once(':')?;
    let granted = match flag {
        "1" => true,
        "0" => false,
        _ => return None,
    };
    let request = Uuid::parse_str(id).ok()?;
    Some(CallbackAnswer { granted, request })
}
