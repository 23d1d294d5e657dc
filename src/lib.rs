//! # macaronbot - share a box of macarons over Telegram
//!
//! A small chat bot that keeps track of boxes of macarons: who owns which box,
//! who else may eat from it, and which macarons are still there.
//!
//! ## Features
//!
//! - **Boxes as grids**: every box is a rows×cols matrix rendered with emoji.
//! - **Random picks**: `/get` and `/feed` choose a remaining macaron for you.
//! - **Sharing**: `/request` asks a box owner for access through an inline accept/deny prompt.
//! - **Persistence**: the whole ledger is saved as JSON after every change, with an atomic rename.
//! - **Telegram transport**: long-polling Bot API client behind the `telegram` feature.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use macaronbot::config::Config;
//! use macaronbot::macaron::BotServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?.apply_env();
//!     let mut server = BotServer::new(config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`macaron`] - grids, ledger, command parsing and handlers
//! - [`storage`] - ledger persistence
//! - [`config`] - configuration loading and environment overrides
//! - [`telegram`] - Bot API client
//! - [`metrics`] - process-wide counters
//! - [`logutil`] - log formatting helpers

pub mod config;
pub mod logutil;
pub mod macaron;
pub mod metrics;
pub mod storage;
#[cfg(feature = "telegram")]
pub mod telegram;
