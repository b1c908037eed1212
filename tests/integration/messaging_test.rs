// tests/integration/messaging_test.rs

//! End-to-end tests of the message loop: broadcast, private messages, and leave notices.

use super::test_helpers::{TestClient, TestServer, strip_timestamp};
use chatrelay::config::AuthMode;
use chatrelay::core::protocol::messages;

/// Starts a name-only server with alice, bob and carol online and all join
/// notices drained.
async fn room() -> (TestServer, TestClient, TestClient, TestClient) {
    let server = TestServer::start(AuthMode::Name).await;
    let mut alice = server.join_by_name("alice").await;
    let mut bob = server.join_by_name("bob").await;
    alice.expect("bob joined the chat!").await;
    let carol = server.join_by_name("carol").await;
    alice.expect("carol joined the chat!").await;
    bob.expect("carol joined the chat!").await;
    (server, alice, bob, carol)
}

#[tokio::test]
async fn test_chat_line_is_broadcast_to_others_but_not_sender() {
    let (_server, mut alice, mut bob, mut carol) = room().await;

    bob.send("hello everyone").await;

    assert_eq!(strip_timestamp(&alice.recv().await), "bob: hello everyone");
    assert_eq!(strip_timestamp(&carol.recv().await), "bob: hello everyone");
    bob.expect_silence().await;
}

#[tokio::test]
async fn test_blank_lines_are_ignored() {
    let (_server, mut alice, mut bob, _carol) = room().await;

    bob.send("").await;
    bob.send("    ").await;

    alice.expect_silence().await;
    bob.expect_silence().await;
}

#[tokio::test]
async fn test_lines_from_one_sender_arrive_in_order() {
    let (_server, mut alice, mut bob, _carol) = room().await;

    for i in 0..25 {
        bob.send(&format!("line {i}")).await;
    }
    for i in 0..25 {
        assert_eq!(strip_timestamp(&alice.recv().await), format!("bob: line {i}"));
    }
}

#[tokio::test]
async fn test_private_message_to_single_recipient() {
    let (_server, mut alice, mut bob, mut carol) = room().await;

    alice.send("> bob : hello").await;

    assert_eq!(
        strip_timestamp(&bob.recv().await),
        "Private message from alice: hello"
    );
    assert_eq!(
        strip_timestamp(&alice.recv().await),
        "Private message to bob: hello"
    );
    carol.expect_silence().await;
}

#[tokio::test]
async fn test_private_message_to_several_recipients() {
    let server = TestServer::start(AuthMode::Name).await;
    let mut alice = server.join_by_name("alice").await;
    let mut bob = server.join_by_name("bob").await;
    alice.expect("bob joined the chat!").await;
    let mut carol = server.join_by_name("carol").await;
    alice.expect("carol joined the chat!").await;
    bob.expect("carol joined the chat!").await;
    let mut dave = server.join_by_name("dave").await;
    alice.expect("dave joined the chat!").await;
    bob.expect("dave joined the chat!").await;
    carol.expect("dave joined the chat!").await;

    alice.send("> bob, carol: hi there").await;

    assert_eq!(
        strip_timestamp(&bob.recv().await),
        "Private message from alice: hi there"
    );
    assert_eq!(
        strip_timestamp(&carol.recv().await),
        "Private message from alice: hi there"
    );
    assert_eq!(
        strip_timestamp(&alice.recv().await),
        "Private message to bob, carol: hi there"
    );
    dave.expect_silence().await;
}

#[tokio::test]
async fn test_private_message_is_all_or_nothing() {
    let (_server, mut alice, mut bob, mut carol) = room().await;

    alice.send("> bob, ghost, carol, phantom : secret").await;

    alice.expect("User \"ghost\" not found.").await;
    alice.expect("User \"phantom\" not found.").await;
    alice.expect_silence().await;
    bob.expect_silence().await;
    carol.expect_silence().await;
}

#[tokio::test]
async fn test_private_message_without_colon_is_rejected() {
    let (_server, mut alice, mut bob, _carol) = room().await;

    alice.send(">no-colon-here").await;
    alice.expect(messages::INVALID_PRIVATE_FORMAT).await;

    alice.send(">: body without recipients").await;
    alice.expect(messages::INVALID_PRIVATE_FORMAT).await;

    bob.expect_silence().await;

    // The session keeps working after a format error.
    alice.send("still here").await;
    assert_eq!(strip_timestamp(&bob.recv().await), "alice: still here");
}

#[tokio::test]
async fn test_private_message_to_self_is_delivered() {
    let (_server, mut alice, _bob, _carol) = room().await;

    alice.send("> alice : note to self").await;

    let mut lines = vec![
        strip_timestamp(&alice.recv().await).to_string(),
        strip_timestamp(&alice.recv().await).to_string(),
    ];
    lines.sort();
    assert_eq!(
        lines,
        vec![
            "Private message from alice: note to self".to_string(),
            "Private message to alice: note to self".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_leave_notice_reaches_remaining_sessions_exactly_once() {
    let (server, mut alice, mut bob, carol) = room().await;

    drop(carol);
    server.wait_for_sessions(2).await;

    alice.expect("carol left the chat :с").await;
    bob.expect("carol left the chat :с").await;
    alice.expect_silence().await;
    bob.expect_silence().await;
}

#[tokio::test]
async fn test_registry_eviction_closes_the_connection() {
    let (server, mut alice, mut bob, _carol) = room().await;

    let bob_id = server.state.registry.find_by_username("bob").unwrap().id;
    assert!(server.state.registry.remove(bob_id).is_some());
    // Removing again is a no-op.
    assert!(server.state.registry.remove(bob_id).is_none());

    bob.expect_closed().await;
    alice.expect("bob left the chat :с").await;
    alice.expect_silence().await;
}

#[tokio::test]
async fn test_over_long_line_is_rejected_and_session_continues() {
    let server = TestServer::start_with(AuthMode::Name, |config| {
        config.max_line_length = 32;
    })
    .await;
    let mut alice = server.join_by_name("alice").await;
    let mut bob = server.join_by_name("bob").await;
    alice.expect("bob joined the chat!").await;

    bob.send(&"x".repeat(100)).await;
    bob.expect(messages::LINE_TOO_LONG).await;
    alice.expect_silence().await;

    bob.send("short").await;
    assert_eq!(strip_timestamp(&alice.recv().await), "bob: short");
}

#[tokio::test]
async fn test_password_mode_chat_round_trip() {
    let server = TestServer::start(AuthMode::Password).await;
    let mut alice = server.join_with_password("alice", "a").await;
    let mut bob = server.join_with_password("bob", "b").await;
    alice.expect("bob joined the chat!").await;

    alice.send("hi bob").await;
    assert_eq!(strip_timestamp(&bob.recv().await), "alice: hi bob");

    bob.send("> alice : psst").await;
    assert_eq!(
        strip_timestamp(&alice.recv().await),
        "Private message from bob: psst"
    );
}
