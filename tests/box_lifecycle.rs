//! Owning a box: register, add, look at it, eat from it.
mod common;

use common::*;
use macaronbot::macaron::grid::MACARON;
use macaronbot::macaron::replies;
use macaronbot::macaron::Outgoing;

#[tokio::test]
async fn start_registers_once() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = test_bot(&tmp, 0.0).await;

    let out = bot.handle_message(ALICE, "/start").await;
    assert_eq!(texts(&out), vec![replies::START.to_string()]);
    assert!(bot.store().ledger().is_registered(ALICE));

    // no images directory, so no animation and no duplicate user
    let again = bot.handle_message(ALICE, "/start").await;
    assert_eq!(again.len(), 1);
    assert_eq!(bot.store().ledger().users.len(), 1);
}

#[tokio::test]
async fn add_sets_default_and_renders_full_box() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = test_bot(&tmp, 0.0).await;

    let out = bot.handle_message(ALICE, "/add 2 3").await;
    let t = texts(&out);
    assert_eq!(t[0], replies::box_ready("pistachio_0"));
    let expected_row: String = std::iter::repeat(MACARON).take(3).collect();
    assert_eq!(t[1], format!("{expected_row}\n{expected_row}"));

    let name = bot.handle_message(ALICE, "/show_name").await;
    assert_eq!(texts(&name), vec!["pistachio_0".to_string()]);

    let listing = bot.handle_message(ALICE, "/show_all").await;
    assert_eq!(texts(&listing), vec!["Owner:\npistachio_0: 2x3, 6 left\n".to_string()]);
}

#[tokio::test]
async fn add_rejects_bad_dimensions() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = test_bot(&tmp, 0.0).await;

    for cmd in ["/add", "/add 3", "/add 0 3", "/add 3 256", "/add x y", "/add 1 2 3"] {
        let out = bot.handle_message(ALICE, cmd).await;
        assert_eq!(texts(&out), vec![replies::BAD_ARGUMENTS.to_string()], "{cmd}");
    }
    assert!(bot.store().ledger().boxes.is_empty());
}

#[tokio::test]
async fn unregistered_users_are_told_so() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = test_bot(&tmp, 0.0).await;

    for cmd in ["/show", "/show_name", "/show_all", "/get", "/eat 1 1", "/feed", "/remove x", "/set_default x"] {
        let out = bot.handle_message(BOB, cmd).await;
        assert_eq!(last_text_to(&out, BOB).as_deref(), Some(replies::NOT_REGISTERED), "{cmd}");
    }
    let out = bot.handle_message(BOB, "/eat").await;
    assert_eq!(texts(&out), vec![replies::NOT_REGISTERED.to_string()]);
}

#[tokio::test]
async fn registered_without_boxes() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = test_bot(&tmp, 0.0).await;
    bot.handle_message(ALICE, "/start").await;

    let out = bot.handle_message(ALICE, "/show_all").await;
    assert_eq!(texts(&out), vec![replies::NO_BOXES.to_string()]);
    let out = bot.handle_message(ALICE, "/show").await;
    assert_eq!(texts(&out), vec![replies::NO_DEFAULT.to_string()]);
    let out = bot.handle_message(ALICE, "/eat 1 1").await;
    assert_eq!(texts(&out), vec![replies::NO_BOXES.to_string()]);
    let out = bot.handle_message(ALICE, "/eat 0 1").await;
    assert_eq!(texts(&out), vec![replies::BAD_ARGUMENTS.to_string()]);
}

#[tokio::test]
async fn eating_a_two_macaron_box() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = test_bot(&tmp, 0.0).await;
    bot.handle_message(ALICE, "/add 1 2").await;

    let out = bot.handle_message(ALICE, "/eat 1 1").await;
    assert_eq!(texts(&out), vec![replies::YUMMY.to_string()]);

    let out = bot.handle_message(ALICE, "/eat 1 1").await;
    assert_eq!(texts(&out), vec![replies::ALREADY_EATEN.to_string()]);

    let out = bot.handle_message(ALICE, "/eat 2 1").await;
    assert_eq!(texts(&out), vec![replies::BAD_COORDINATES.to_string()]);

    let out = bot.handle_message(ALICE, "/eat 1 2").await;
    assert_eq!(texts(&out), vec![replies::ATE_EVERYTHING.to_string()]);

    let b = bot.store().ledger().box_by_name("pistachio_0").unwrap();
    assert!(b.grid.is_empty());

    let out = bot.handle_message(ALICE, "/get").await;
    assert_eq!(texts(&out), vec![replies::BOX_EMPTY.to_string()]);

    let shown = bot.handle_message(ALICE, "/show pistachio_0").await;
    let rendered = &texts(&shown)[0];
    assert!(!rendered.contains(MACARON));
    assert_eq!(rendered.chars().count(), 2);
}

#[tokio::test]
async fn get_names_coordinates_without_eating() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = test_bot(&tmp, 0.0).await;
    bot.handle_message(ALICE, "/add 1 1").await;

    let out = bot.handle_message(ALICE, "/get").await;
    assert_eq!(texts(&out), vec![replies::picking(1, 1)]);
    let b = bot.store().ledger().box_by_name("pistachio_0").unwrap();
    assert_eq!(b.grid.remaining(), 1);
}

#[tokio::test]
async fn feed_eats_until_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = test_bot(&tmp, 0.0).await;
    bot.handle_message(ALICE, "/add 2 2").await;

    for left in (0..4).rev() {
        let out = bot.handle_message(ALICE, "/feed").await;
        let t = texts(&out);
        assert!(t[0].starts_with("Picking a macaron at row"));
        let expected = if left == 0 { replies::ATE_EVERYTHING } else { replies::YUMMY };
        assert_eq!(t[1], expected);
        let b = bot.store().ledger().box_by_name("pistachio_0").unwrap();
        assert_eq!(b.grid.remaining(), left);
    }
    let out = bot.handle_message(ALICE, "/feed").await;
    assert_eq!(texts(&out), vec![replies::BOX_EMPTY.to_string()]);
}

#[tokio::test]
async fn certain_failure_puts_the_macaron_back() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = test_bot(&tmp, 1.0).await;
    bot.handle_message(ALICE, "/add 1 1").await;

    let out = bot.handle_message(ALICE, "/feed").await;
    assert_eq!(texts(&out), vec![replies::picking(1, 1), replies::PUT_IT_BACK.to_string()]);
    let b = bot.store().ledger().box_by_name("pistachio_0").unwrap();
    assert_eq!(b.grid.remaining(), 1);
}

#[tokio::test]
async fn set_default_switches_between_owned_boxes() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = test_bot(&tmp, 0.0).await;
    bot.handle_message(ALICE, "/add 1 1").await;
    bot.handle_message(ALICE, "/add 2 2").await;

    let out = bot.handle_message(ALICE, "/show_name").await;
    assert_eq!(texts(&out), vec!["pistachio_1".to_string()]);

    let out = bot.handle_message(ALICE, "/set_default pistachio_0").await;
    assert_eq!(texts(&out), vec![replies::DEFAULT_SET.to_string()]);
    let out = bot.handle_message(ALICE, "/show_name").await;
    assert_eq!(texts(&out), vec!["pistachio_0".to_string()]);

    let out = bot.handle_message(ALICE, "/set_default nope").await;
    assert_eq!(texts(&out), vec![replies::NOT_FOUND.to_string()]);
}

#[tokio::test]
async fn animations_are_sent_when_images_exist() {
    let tmp = tempfile::tempdir().unwrap();
    let images = tmp.path().join("images");
    std::fs::create_dir_all(&images).unwrap();
    std::fs::write(images.join("macarons-1.gif"), b"GIF89a").unwrap();
    std::fs::write(images.join("macarons-2.gif"), b"GIF89a").unwrap();
    let mut bot = test_bot(&tmp, 0.0).await;

    let out = bot.handle_message(ALICE, "/start").await;
    assert!(matches!(&out[1], Outgoing::Animation { path, .. } if path.ends_with("macarons-1.gif")));

    bot.handle_message(ALICE, "/add 1 1").await;
    let out = bot.handle_message(ALICE, "/eat 1 1").await;
    assert!(matches!(&out[0], Outgoing::Animation { path, .. } if path.ends_with("macarons-2.gif")));
    assert_eq!(texts(&out), vec![replies::ATE_EVERYTHING.to_string()]);

    // macaron-gone.gif is missing, so only the text goes out
    bot.handle_message(ALICE, "/add 1 2").await;
    bot.handle_message(ALICE, "/eat 1 1").await;
    let out = bot.handle_message(ALICE, "/eat 1 1").await;
    assert_eq!(out.len(), 1);
}

#[tokio::test]
async fn help_and_unknown() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = test_bot(&tmp, 0.0).await;
    let out = bot.handle_message(CAROL, "/help").await;
    assert_eq!(texts(&out), vec![replies::HELP.to_string()]);
    let out = bot.handle_message(CAROL, "/dance").await;
    assert_eq!(texts(&out), vec![replies::UNKNOWN.to_string()]);
    let out = bot.handle_message(CAROL, "hello there").await;
    assert_eq!(texts(&out), vec![replies::UNKNOWN.to_string()]);
}
