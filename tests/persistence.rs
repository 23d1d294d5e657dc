//! State survives a restart: every mutation lands in db.json.
mod common;

use common::*;
use macaronbot::macaron::names::NamePool;
use macaronbot::macaron::replies;
use macaronbot::macaron::MacaronBot;
use macaronbot::storage::Store;
use rand::rngs::StdRng;
use rand::SeedableRng;

async fn reopen(tmp: &tempfile::TempDir) -> MacaronBot {
    let cfg = test_config(tmp, 0.0);
    let store = Store::open(&cfg.storage.data_dir, &cfg.storage.db_file).await.unwrap();
    MacaronBot::with_parts(cfg, store, NamePool::new(["pistachio"]), StdRng::seed_from_u64(99))
}

#[tokio::test]
async fn ledger_survives_restart() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let mut bot = test_bot(&tmp, 0.0).await;
        bot.handle_message(ALICE, "/add 2 2").await;
        bot.handle_message(ALICE, "/eat 2 2").await;
        bot.handle_message(BOB, "/start").await;
        bot.handle_message(BOB, "/request pistachio_0").await;
        assert!(bot.store().db_path().exists());
    }

    let mut bot = reopen(&tmp).await;
    let ledger = bot.store().ledger();
    assert_eq!(ledger.users.len(), 2);
    assert_eq!(ledger.requests.len(), 1);
    let b = ledger.box_by_name("pistachio_0").unwrap();
    assert_eq!(b.grid.remaining(), 3);
    assert!(!b.grid.is_present(1, 1).unwrap());

    // the pending request can still be answered after the restart
    let id = ledger.requests[0].id;
    let out = bot.handle_callback(ALICE, &format!("1:{id}")).await;
    assert_eq!(last_text_to(&out, BOB).as_deref(), Some(replies::GRANTED));

    let bot = reopen(&tmp).await;
    let b = bot.store().ledger().box_by_name("pistachio_0").unwrap();
    assert_eq!(b.eaters, vec![BOB]);
}

#[tokio::test]
async fn new_box_ids_continue_after_restart() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let mut bot = test_bot(&tmp, 0.0).await;
        bot.handle_message(ALICE, "/add 1 1").await;
    }
    let mut bot = reopen(&tmp).await;
    let out = bot.handle_message(ALICE, "/add 1 1").await;
    assert_eq!(texts(&out)[0], replies::box_ready("pistachio_1"));
}

#[tokio::test]
async fn db_file_is_plain_json() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = test_bot(&tmp, 0.0).await;
    bot.handle_message(ALICE, "/add 1 2").await;

    let raw = std::fs::read_to_string(bot.store().db_path()).unwrap();
    let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(v["boxes"][0]["grid"]["rows"], 1);
    assert_eq!(v["boxes"][0]["grid"]["cols"], 2);
    assert_eq!(v["users"][ALICE.to_string()]["default"], 0);
}

#[tokio::test]
async fn tampered_grid_is_rejected_on_load() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(
        data.join("db.json"),
        r#"{"users":{},"boxes":[{"id":0,"name":"x_0","owner":1,"grid":{"rows":2,"cols":2,"cells":[true]}}],"requests":[]}"#,
    )
    .unwrap();
    assert!(Store::open(&data, "db.json").await.is_err());

    std::fs::write(
        data.join("db.json"),
        r#"{"users":{},"boxes":[{"id":0,"name":"x_0","owner":1,"grid":{"rows":3,"cols":0,"cells":[]}}],"requests":[]}"#,
    )
    .unwrap();
    assert!(Store::open(&data, "db.json").await.is_err());
}
