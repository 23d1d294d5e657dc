//! Removing boxes and the admin dump.
mod common;

use common::*;
use macaronbot::macaron::replies;

#[tokio::test]
async fn only_owner_removes() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = test_bot(&tmp, 0.0).await;
    bot.handle_message(ALICE, "/add 2 2").await;
    bot.handle_message(BOB, "/start").await;

    let out = bot.handle_message(BOB, "/remove pistachio_0").await;
    assert_eq!(texts(&out), vec![replies::NOT_YOURS.to_string()]);
    let out = bot.handle_message(ALICE, "/remove pistachio_9").await;
    assert_eq!(texts(&out), vec![replies::NOT_FOUND.to_string()]);
    assert_eq!(bot.store().ledger().boxes.len(), 1);

    let out = bot.handle_message(ALICE, "/remove pistachio_0").await;
    assert_eq!(texts(&out), vec![replies::REMOVED.to_string()]);
    assert!(bot.store().ledger().boxes.is_empty());

    let out = bot.handle_message(ALICE, "/show").await;
    assert_eq!(texts(&out), vec![replies::NO_DEFAULT.to_string()]);
    let out = bot.handle_message(ALICE, "/show_all").await;
    assert_eq!(texts(&out), vec![replies::NO_BOXES.to_string()]);
}

#[tokio::test]
async fn removal_clears_eaters() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = test_bot(&tmp, 0.0).await;
    bot.handle_message(ALICE, "/add 1 1").await;
    bot.handle_message(BOB, "/start").await;
    let out = bot.handle_message(BOB, "/request pistachio_0").await;
    let accept = match &out[0] {
        macaronbot::macaron::Outgoing::Prompt { accept, .. } => accept.clone(),
        other => panic!("expected prompt, got {:?}", other),
    };
    bot.handle_callback(ALICE, &accept).await;

    // an eater cannot throw the box away
    let out = bot.handle_message(BOB, "/remove pistachio_0").await;
    assert_eq!(texts(&out), vec![replies::NOT_YOURS.to_string()]);

    bot.handle_message(ALICE, "/remove pistachio_0").await;
    let bob = bot.store().ledger().user(BOB).unwrap();
    assert!(bob.eats.is_empty());
    assert_eq!(bob.default, None);
    let out = bot.handle_message(BOB, "/get").await;
    assert_eq!(texts(&out), vec![replies::NO_DEFAULT.to_string()]);
}

#[tokio::test]
async fn admin_dump_only_for_admin() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = test_bot(&tmp, 0.0).await;
    bot.handle_message(ALICE, "/add 1 3").await;

    assert!(bot.handle_message(ALICE, "/admin").await.is_empty());

    let out = bot.handle_message(ADMIN, "/admin").await;
    let t = texts(&out);
    assert_eq!(t.len(), 2);
    let dump: serde_json::Value = serde_json::from_str(&t[0]).expect("dump is json");
    assert_eq!(dump["boxes"][0]["name"], "pistachio_0");
    assert_eq!(dump["boxes"][0]["owner"], ALICE);
    assert!(t[1].contains("boxes +"));
    assert!(t[1].contains("admin="));
}
