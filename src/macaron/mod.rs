//! # Macaron Core Module
//!
//! Everything the bot knows about boxes of macarons and who may eat them.
//!
//! ## Components
//!
//! - [`grid`] - the boolean matrix behind a box: count, pick, eat, render
//! - [`names`] - unique display names drawn from a refilling pool
//! - [`ledger`] - users, boxes and pending access requests
//! - [`commands`] - slash-command and callback parsing
//! - [`replies`] - canned reply texts
//! - [`bot`] - command handlers producing outgoing messages
//! - [`server`] - Telegram polling loop (feature `telegram`)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  BotServer      │ ← polls Telegram, delivers replies
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  MacaronBot     │ ← one command in, a list of replies out
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  Ledger + Store │ ← state, saved after every mutation
//! └─────────────────┘
//! ```
//!
//! ## Access flow
//!
//! 1. Alice runs `/add 3 4` and gets box `pistachio_0`
//! 2. Bob runs `/request pistachio_0`
//! 3. Alice receives an accept/deny prompt
//! 4. On accept Bob becomes an eater and, if he had none, the box becomes his default
//! 5. Bob can now `/get`, `/eat` and `/feed` from it

pub mod bot;
pub mod commands;
pub mod grid;
pub mod ledger;
pub mod names;
pub mod replies;
#[cfg(feature = "telegram")]
pub mod server;

pub use bot::{MacaronBot, Outgoing};
#[cfg(feature = "telegram")]
pub use server::BotServer;
