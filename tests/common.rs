//! Test utilities & fixtures.
//! Builds a bot over a throwaway data directory with a seeded rng.
#![allow(dead_code)] // each test binary uses a different subset

use macaronbot::config::Config;
use macaronbot::macaron::names::NamePool;
use macaronbot::macaron::{MacaronBot, Outgoing};
use macaronbot::storage::Store;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const ADMIN: i64 = 1;
pub const ALICE: i64 = 100;
pub const BOB: i64 = 200;
pub const CAROL: i64 = 300;

/// Config pointing every path into `tmp`.
pub fn test_config(tmp: &tempfile::TempDir, fail_chance: f64) -> Config {
    let mut cfg = Config::default();
    cfg.bot.admin_chat_id = Some(ADMIN);
    cfg.bot.fail_chance = fail_chance;
    cfg.storage.data_dir = tmp.path().join("data").to_string_lossy().to_string();
    cfg.storage.images_dir = tmp.path().join("images").to_string_lossy().to_string();
    cfg.logging.level = "error".into();
    cfg
}

/// Bot whose name pool only holds "pistachio", so boxes are `pistachio_<id>`.
pub async fn test_bot(tmp: &tempfile::TempDir, fail_chance: f64) -> MacaronBot {
    let cfg = test_config(tmp, fail_chance);
    let store = Store::open(&cfg.storage.data_dir, &cfg.storage.db_file)
        .await
        .expect("open store");
    MacaronBot::with_parts(cfg, store, NamePool::new(["pistachio"]), StdRng::seed_from_u64(7))
}

/// Text bodies of every `Outgoing::Text`, in order.
pub fn texts(out: &[Outgoing]) -> Vec<String> {
    out.iter()
        .filter_map(|o| match o {
            Outgoing::Text { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

/// Last text sent to `chat`.
pub fn last_text_to(out: &[Outgoing], chat: i64) -> Option<String> {
    out.iter().rev().find_map(|o| match o {
        Outgoing::Text { chat: c, text } if *c == chat => Some(text.clone()),
        _ => None,
    })
}
