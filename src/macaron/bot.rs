//! # Macaron Bot - command handlers
//!
//! [`MacaronBot`] is the explicitly owned context every command runs against:
//! configuration, the persistent [`Store`], the [`NamePool`] and the random
//! source. It knows nothing about Telegram; each incoming message or button
//! press is turned into a list of [`Outgoing`] items that the transport
//! delivers.
//!
//! ## Error handling
//!
//! Handlers never fail. Every ledger or grid error is mapped to one of the
//! canned texts in [`replies`]. A failed save is logged and counted but the
//! user still gets the normal reply; the in-memory ledger stays authoritative
//! and the next successful save catches the file up.
//!
//! ## Example
//!
//! ```rust,no_run
//! use macaronbot::config::Config;
//! use macaronbot::macaron::MacaronBot;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut bot = MacaronBot::new(Config::default()).await?;
//!     for out in bot.handle_message(42, "/add 3 4").await {
//!         println!("{:?}", out);
//!     }
//!     Ok(())
//! }
//! ```

use anyhow::Result;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};

use super::commands::{parse_callback, BotCommand, CallbackAnswer, CommandParser};
use super::grid::Bite;
use super::ledger::{LedgerError, Resolution, UserId};
use super::names::NamePool;
use super::replies;
use crate::config::Config;
use crate::logutil::preview;
use crate::metrics;
use crate::storage::Store;

macro_rules! sec_log {
    ($($arg:tt)*) => { log::warn!(target: "security", $($arg)*); };
}

pub const ANIMATION_WELCOME: &str = "macarons-1.gif";
pub const ANIMATION_EMPTY: &str = "macarons-2.gif";
pub const ANIMATION_GONE: &str = "macaron-gone.gif";

/// Something the transport should deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Text {
        chat: UserId,
        text: String,
    },
    /// Text with an accept/deny inline keyboard.
    Prompt {
        chat: UserId,
        text: String,
        accept: String,
        deny: String,
    },
    Animation {
        chat: UserId,
        path: PathBuf,
    },
}

impl Outgoing {
    pub fn chat(&self) -> UserId {
        match self {
            Outgoing::Text { chat, .. } | Outgoing::Prompt { chat, .. } | Outgoing::Animation { chat, .. } => *chat,
        }
    }

    fn text(chat: UserId, text: impl Into<String>) -> Self {
        Outgoing::Text {
            chat,
            text: text.into(),
        }
    }
}

pub struct MacaronBot {
    config: Config,
    store: Store,
    names: NamePool,
    rng: StdRng,
    parser: CommandParser,
    images_dir: Option<PathBuf>,
}

impl MacaronBot {
    /// Open the store and name pool described by `config`.
    pub async fn new(config: Config) -> Result<Self> {
        let store = Store::open(&config.storage.data_dir, &config.storage.db_file).await?;
        let names = NamePool::load(&config.storage.names_path()).await?;
        Ok(Self::with_parts(config, store, names, StdRng::from_entropy()))
    }

    /// Assemble a bot from already opened parts; tests pass a seeded rng here.
    pub fn with_parts(config: Config, store: Store, names: NamePool, rng: StdRng) -> Self {
        let images = Path::new(&config.storage.images_dir);
        let images_dir = if images.is_dir() {
            info!("Animations enabled from {}", images.display());
            Some(images.to_path_buf())
        } else {
            debug!("No images directory at {}; animations disabled", images.display());
            None
        };
        MacaronBot {
            config,
            store,
            names,
            rng,
            parser: CommandParser::new(),
            images_dir,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle one chat message from `chat`.
    pub async fn handle_message(&mut self, chat: UserId, text: &str) -> Vec<Outgoing> {
        let cmd = self.parser.parse(text);
        debug!("chat {} -> {:?} ({})", chat, cmd, preview(text));
        metrics::record_command(command_name(&cmd));
        let mut out = Vec::new();
        match cmd {
            BotCommand::Start => self.cmd_start(chat, &mut out).await,
            BotCommand::Help => out.push(Outgoing::text(chat, replies::HELP)),
            BotCommand::Add { rows, cols } => self.cmd_add(chat, rows, cols, &mut out).await,
            BotCommand::Request(name) => self.cmd_request(chat, &name, &mut out).await,
            BotCommand::SetDefault(name) => self.cmd_set_default(chat, &name, &mut out).await,
            BotCommand::Show(name) => self.cmd_show(chat, name.as_deref(), &mut out),
            BotCommand::ShowName => self.cmd_show_name(chat, &mut out),
            BotCommand::ShowAll => self.cmd_show_all(chat, &mut out),
            BotCommand::Get => {
                self.cmd_get(chat, &mut out);
            }
            BotCommand::Eat { row, col } => self.eat_at(chat, row - 1, col - 1, &mut out).await,
            BotCommand::Feed => {
                if let Some((row, col)) = self.cmd_get(chat, &mut out) {
                    self.eat_at(chat, row, col, &mut out).await;
                }
            }
            BotCommand::Remove(name) => self.cmd_remove(chat, &name, &mut out).await,
            BotCommand::Admin => self.cmd_admin(chat, &mut out),
            BotCommand::Invalid(which) => {
                debug!("Malformed /{} from {}", which, chat);
                if self.store.ledger().is_registered(chat) || which == "add" {
                    out.push(Outgoing::text(chat, replies::BAD_ARGUMENTS));
                } else {
                    out.push(Outgoing::text(chat, replies::NOT_REGISTERED));
                }
            }
            BotCommand::Unknown => out.push(Outgoing::text(chat, replies::UNKNOWN)),
        }
        out
    }

    /// Handle an inline-keyboard answer pressed by `from`.
    pub async fn handle_callback(&mut self, from: UserId, data: &str) -> Vec<Outgoing> {
        let mut out = Vec::new();
        let Some(CallbackAnswer { granted, request }) = parse_callback(data) else {
            warn!("Ignoring malformed callback data from {}: {}", from, preview(data));
            return out;
        };
        match self.store.ledger().request_owner(request) {
            None => {
                out.push(Outgoing::text(from, replies::REQUEST_GONE));
                return out;
            }
            Some(owner) if owner != from => {
                sec_log!("chat {} tried to answer request {} owned by {}", from, request, owner);
                out.push(Outgoing::text(from, replies::NOT_YOURS));
                return out;
            }
            Some(_) => {}
        }

        match self.store.ledger_mut().resolve_request(request, granted) {
            Ok(Resolution::Granted {
                requester,
                box_name,
                ..
            }) => {
                info!("{} granted {} access to {}", from, requester, box_name);
                metrics::inc_requests_granted();
                self.persist().await;
                out.push(Outgoing::text(requester, replies::GRANTED));
                out.push(Outgoing::text(from, replies::owner_granted(requester, &box_name)));
            }
            Ok(Resolution::Denied { requester }) => {
                info!("{} denied request {} from {}", from, request, requester);
                metrics::inc_requests_denied();
                self.persist().await;
                out.push(Outgoing::text(requester, replies::DENIED));
                out.push(Outgoing::text(from, replies::OWNER_DENIED));
            }
            Err(e) => {
                debug!("Resolving {} failed: {}", request, e);
                out.push(Outgoing::text(from, replies::REQUEST_GONE));
            }
        }
        out
    }

    async fn persist(&mut self) {
        if let Err(e) = self.store.save().await {
            metrics::inc_save_failures();
            error!("Failed to save ledger to {}: {}", self.store.db_path().display(), e);
        }
    }

    fn animation(&self, chat: UserId, file: &str) -> Option<Outgoing> {
        let path = self.images_dir.as_ref()?.join(file);
        path.is_file().then_some(Outgoing::Animation { chat, path })
    }

    fn render_box(&mut self, chat: UserId, id: u32) -> Option<Outgoing> {
        let b = self.store.ledger().box_by_id(id)?;
        Some(Outgoing::text(chat, b.grid.render(&mut self.rng)))
    }

    async fn cmd_start(&mut self, chat: UserId, out: &mut Vec<Outgoing>) {
        out.push(Outgoing::text(chat, replies::START));
        if self.store.ledger_mut().register_user(chat) {
            info!("Registered new user {}", chat);
            self.persist().await;
        }
        out.extend(self.animation(chat, ANIMATION_WELCOME));
    }

    async fn cmd_add(&mut self, chat: UserId, rows: usize, cols: usize, out: &mut Vec<Outgoing>) {
        let created = self
            .store
            .ledger_mut()
            .create_box(chat, rows, cols, &mut self.names, &mut self.rng)
            .map(|b| (b.id, b.name.clone()));
        match created {
            Ok((id, name)) => {
                info!("{} created box {} ({}x{})", chat, name, rows, cols);
                metrics::inc_boxes_created();
                self.persist().await;
                out.push(Outgoing::text(chat, replies::box_ready(&name)));
                out.extend(self.render_box(chat, id));
            }
            Err(e) => {
                debug!("add {}x{} for {} failed: {}", rows, cols, chat, e);
                out.push(Outgoing::text(chat, replies::BAD_ARGUMENTS));
            }
        }
    }

    async fn cmd_request(&mut self, chat: UserId, name: &str, out: &mut Vec<Outgoing>) {
        match self.store.ledger_mut().request_access(chat, name) {
            Ok((request, owner)) => {
                info!("{} requested access to {} (request {})", chat, name, request.id);
                self.persist().await;
                let accept = CallbackAnswer {
                    granted: true,
                    request: request.id,
                };
                let deny = CallbackAnswer {
                    granted: false,
                    request: request.id,
                };
                out.push(Outgoing::Prompt {
                    chat: owner,
                    text: replies::access_prompt(chat, name),
                    accept: accept.encode(),
                    deny: deny.encode(),
                });
                out.push(Outgoing::text(chat, replies::request_sent(name)));
            }
            Err(LedgerError::NotRegistered(_)) => out.push(Outgoing::text(chat, replies::NOT_REGISTERED)),
            Err(LedgerError::AlreadyHasAccess(_)) => out.push(Outgoing::text(chat, replies::ALREADY_SHARED)),
            Err(LedgerError::AlreadyRequested(_)) => out.push(Outgoing::text(chat, replies::ALREADY_REQUESTED)),
            Err(_) => out.push(Outgoing::text(chat, replies::NOT_FOUND)),
        }
    }

    async fn cmd_set_default(&mut self, chat: UserId, name: &str, out: &mut Vec<Outgoing>) {
        match self.store.ledger_mut().set_default(chat, name) {
            Ok(_) => {
                self.persist().await;
                out.push(Outgoing::text(chat, replies::DEFAULT_SET));
            }
            Err(LedgerError::NotRegistered(_)) => out.push(Outgoing::text(chat, replies::NOT_REGISTERED)),
            Err(_) => out.push(Outgoing::text(chat, replies::NOT_FOUND)),
        }
    }

    fn cmd_show(&mut self, chat: UserId, name: Option<&str>, out: &mut Vec<Outgoing>) {
        let ledger = self.store.ledger();
        let found = match name {
            Some(name) => ledger.accessible_box(chat, name),
            None => ledger.default_box(chat),
        };
        match found.map(|b| b.id) {
            Ok(id) => out.extend(self.render_box(chat, id)),
            Err(e) => out.push(Outgoing::text(chat, lookup_failure(&e))),
        }
    }

    fn cmd_show_name(&self, chat: UserId, out: &mut Vec<Outgoing>) {
        match self.store.ledger().default_box(chat) {
            Ok(b) => out.push(Outgoing::text(chat, b.name.clone())),
            Err(e) => out.push(Outgoing::text(chat, lookup_failure(&e))),
        }
    }

    fn cmd_show_all(&self, chat: UserId, out: &mut Vec<Outgoing>) {
        let ledger = self.store.ledger();
        let (owned, eaten) = match (ledger.owned_boxes(chat), ledger.eaten_boxes(chat)) {
            (Ok(o), Ok(e)) => (o, e),
            _ => {
                out.push(Outgoing::text(chat, replies::NOT_REGISTERED));
                return;
            }
        };
        if owned.is_empty() && eaten.is_empty() {
            out.push(Outgoing::text(chat, replies::NO_BOXES));
            return;
        }
        let mut msg = String::new();
        for (title, boxes) in [("Owner:\n", &owned), ("Not an owner:\n", &eaten)] {
            if boxes.is_empty() {
                continue;
            }
            msg.push_str(title);
            for b in boxes.iter() {
                let (rows, cols) = b.grid.dimensions();
                msg.push_str(&replies::box_line(&b.name, rows, cols, b.grid.remaining()));
            }
        }
        out.push(Outgoing::text(chat, msg));
    }

    /// Pick a random macaron from the default box. Returns zero-based
    /// coordinates unless the box is empty or the pick had to be put back.
    fn cmd_get(&mut self, chat: UserId, out: &mut Vec<Outgoing>) -> Option<(usize, usize)> {
        let picked = match self.store.ledger().default_box(chat) {
            Ok(b) => b.grid.pick_random(&mut self.rng),
            Err(e) => {
                out.push(Outgoing::text(chat, lookup_failure(&e)));
                return None;
            }
        };
        match picked {
            Ok((row, col)) => {
                out.push(Outgoing::text(chat, replies::picking(row + 1, col + 1)));
                if self.rng.gen::<f64>() < self.config.fail_chance() {
                    info!("{} has to put macaron ({}, {}) back", chat, row + 1, col + 1);
                    out.push(Outgoing::text(chat, replies::PUT_IT_BACK));
                    return None;
                }
                Some((row, col))
            }
            Err(_) => {
                out.push(Outgoing::text(chat, replies::BOX_EMPTY));
                None
            }
        }
    }

    /// Eat zero-based `(row, col)` from the default box.
    async fn eat_at(&mut self, chat: UserId, row: usize, col: usize, out: &mut Vec<Outgoing>) {
        let bitten = match self.store.ledger_mut().default_box_mut(chat) {
            Ok(b) => {
                let before = b.grid.remaining();
                b.grid.consume(row, col).map(|bite| (bite, b.grid.remaining() < before))
            }
            Err(LedgerError::NotRegistered(_)) => {
                out.push(Outgoing::text(chat, replies::NOT_REGISTERED));
                return;
            }
            Err(_) => {
                out.push(Outgoing::text(chat, replies::NO_BOXES));
                return;
            }
        };
        match bitten {
            Ok((bite, flipped)) => {
                if flipped {
                    metrics::inc_macarons_eaten();
                    self.persist().await;
                }
                match bite {
                    Bite::Eaten => out.push(Outgoing::text(chat, replies::YUMMY)),
                    Bite::AlreadyGone => {
                        out.extend(self.animation(chat, ANIMATION_GONE));
                        out.push(Outgoing::text(chat, replies::ALREADY_EATEN));
                    }
                    Bite::Emptied => {
                        info!("{} finished their default box", chat);
                        out.extend(self.animation(chat, ANIMATION_EMPTY));
                        out.push(Outgoing::text(chat, replies::ATE_EVERYTHING));
                    }
                }
            }
            Err(e) => {
                debug!("eat ({}, {}) for {} failed: {}", row + 1, col + 1, chat, e);
                out.push(Outgoing::text(chat, replies::BAD_COORDINATES));
            }
        }
    }

    async fn cmd_remove(&mut self, chat: UserId, name: &str, out: &mut Vec<Outgoing>) {
        match self.store.ledger_mut().remove_box(name, chat) {
            Ok(removed) => {
                info!(
                    "{} removed box {} ({} eaters affected)",
                    chat,
                    removed.name,
                    removed.eaters.len()
                );
                metrics::inc_boxes_removed();
                self.persist().await;
                out.push(Outgoing::text(chat, replies::REMOVED));
            }
            Err(LedgerError::NotOwner(_)) => {
                sec_log!("chat {} tried to remove box {} they do not own", chat, name);
                out.push(Outgoing::text(chat, replies::NOT_YOURS));
            }
            Err(LedgerError::NotRegistered(_)) => out.push(Outgoing::text(chat, replies::NOT_REGISTERED)),
            Err(_) => out.push(Outgoing::text(chat, replies::NOT_FOUND)),
        }
    }

    fn cmd_admin(&self, chat: UserId, out: &mut Vec<Outgoing>) {
        if self.config.bot.admin_chat_id != Some(chat) {
            sec_log!("chat {} attempted /admin", chat);
            return;
        }
        match self.store.dump() {
            Ok(dump) => {
                out.push(Outgoing::text(chat, dump));
                out.push(Outgoing::text(chat, metrics::snapshot().summary()));
            }
            Err(e) => {
                error!("Admin dump failed: {}", e);
                out.push(Outgoing::text(chat, format!("dump failed: {e}")));
            }
        }
    }
}

fn lookup_failure(e: &LedgerError) -> &'static str {
    match e {
        LedgerError::NotRegistered(_) => replies::NOT_REGISTERED,
        LedgerError::NoDefaultBox => replies::NO_DEFAULT,
        _ => replies::NOT_FOUND,
    }
}

fn command_name(cmd: &BotCommand) -> &'static str {
    match cmd {
        BotCommand::Start => "start",
        BotCommand::Help => "help",
        BotCommand::Add { .. } => "add",
        BotCommand::Request(_) => "request",
        BotCommand::SetDefault(_) => "set_default",
        BotCommand::Show(_) => "show",
        BotCommand::ShowName => "show_name",
        BotCommand::ShowAll => "show_all",
        BotCommand::Get => "get",
        BotCommand::Eat { .. } => "eat",
        BotCommand::Feed => "feed",
        BotCommand::Remove(_) => "remove",
        BotCommand::Admin => "admin",
        BotCommand::Invalid(_) => "invalid",
        BotCommand::Unknown => "unknown",
    }
}
