//! End-to-end listener tests over a real loopback socket.

use pretty_assertions::assert_eq;

use udpbar_core::{Command, CommandSink, IconColor, ShutdownReason, VisualState};
use udpbar_test_utils::{TestConfigBuilder, TestListener};

#[tokio::test]
async fn test_datagrams_apply_in_arrival_order() {
    let harness = TestListener::spawn().await;
    let mut rx = harness.store.subscribe();

    harness.send(b"red").await;
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), VisualState::Color(IconColor::Red));

    harness.send(b"3").await;
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), VisualState::Image(3));

    harness.send(b"green").await;
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), VisualState::Color(IconColor::Green));

    assert_eq!(
        harness.renderer.states(),
        vec![
            VisualState::Color(IconColor::Red),
            VisualState::Image(3),
            VisualState::Color(IconColor::Green),
        ]
    );
}

#[tokio::test]
async fn test_burst_ends_on_last_state() {
    let harness = TestListener::spawn().await;

    harness.send(b"red").await;
    harness.send(b"3").await;
    harness.send(b"green").await;
    harness.wait_for_renders(3).await;

    assert_eq!(harness.store.get(), VisualState::Color(IconColor::Green));
}

#[test_log::test(tokio::test)]
async fn test_quit_datagram_closes_listener() {
    let harness = TestListener::spawn().await;
    harness.send(b"quit\n").await;

    let closed = harness.join().await.unwrap();
    assert_eq!(closed.reason(), ShutdownReason::QuitCommand);
}

#[tokio::test]
async fn test_custom_quit_token() {
    let config = TestConfigBuilder::new().quit_token("bye").build();
    let harness = TestListener::spawn_with(&config).await;

    // The default token is just an unknown word now.
    harness.send(b"quit").await;
    harness.send(b"orange").await;
    harness.wait_for_renders(1).await;
    assert!(!harness.is_finished());

    harness.send(b"BYE").await;
    let closed = harness.join().await.unwrap();
    assert_eq!(closed.reason(), ShutdownReason::QuitCommand);
}

#[test_log::test(tokio::test)]
async fn test_garbage_datagram_is_dropped() {
    let harness = TestListener::spawn().await;
    let before = harness.store.get();

    harness.send(&[0xFF; 300]).await;
    harness.send(b"").await;
    harness.send(b"not-a-color").await;
    harness.send(b"blue").await;
    harness.wait_for_renders(1).await;

    // Only the valid command rendered; the listener survived the rest.
    assert_eq!(before, VisualState::Color(IconColor::White));
    assert_eq!(harness.renderer.states(), vec![VisualState::Color(IconColor::Blue)]);
    assert!(!harness.is_finished());
}

#[tokio::test]
async fn test_garbage_leaves_state_unchanged() {
    let harness = TestListener::spawn().await;
    harness.send(b"purple").await;
    harness.wait_for_renders(1).await;

    harness.send(&[0xFF; 300]).await;
    // A quit after the garbage proves the garbage was processed first.
    harness.send(b"quit").await;
    let store = harness.store.clone();
    let renderer = harness.renderer.clone();
    harness.join().await.unwrap();

    assert_eq!(store.get(), VisualState::Color(IconColor::Purple));
    assert_eq!(renderer.len(), 1);
}

#[tokio::test]
async fn test_oversized_datagram_is_dropped() {
    let config = TestConfigBuilder::new().max_datagram_len(8).build();
    let harness = TestListener::spawn_with(&config).await;

    let mut long = b"red".to_vec();
    long.resize(64, b' ');
    harness.send(&long).await;
    harness.send(b"  yellow").await;
    harness.wait_for_renders(1).await;

    assert_eq!(harness.renderer.states(), vec![VisualState::Color(IconColor::Yellow)]);
}

#[tokio::test]
async fn test_out_of_range_index_is_silent_no_op() {
    let config = TestConfigBuilder::new().images(&["a", "b"]).build();
    let harness = TestListener::spawn_with(&config).await;

    harness.send(b"2").await;
    harness.send(b"1").await;
    harness.wait_for_renders(1).await;

    assert_eq!(harness.renderer.states(), vec![VisualState::Image(1)]);
}

#[tokio::test]
async fn test_repeated_command_keeps_state() {
    let harness = TestListener::spawn().await;

    harness.send(b"cyan").await;
    harness.send(b"CYAN").await;
    harness.wait_for_renders(2).await;

    assert_eq!(harness.store.get(), VisualState::Color(IconColor::Cyan));
    assert_eq!(
        harness.renderer.states(),
        vec![VisualState::Color(IconColor::Cyan); 2]
    );
}

#[tokio::test]
async fn test_in_process_commands_share_the_network_path() {
    let harness = TestListener::spawn().await;

    harness.sender.submit(Command::color(IconColor::Black)).unwrap();
    harness.wait_for_renders(1).await;
    harness.send(b"0").await;
    harness.wait_for_renders(2).await;
    harness.sender.submit(Command::IndexedImage(999)).unwrap();
    harness.sender.submit(Command::QuitRequest).unwrap();

    let store = harness.store.clone();
    let renderer = harness.renderer.clone();
    let closed = harness.join().await.unwrap();

    assert_eq!(closed.reason(), ShutdownReason::QuitCommand);
    assert_eq!(store.get(), VisualState::Image(0));
    assert_eq!(
        renderer.states(),
        vec![VisualState::Color(IconColor::Black), VisualState::Image(0)]
    );
}

#[tokio::test]
async fn test_external_shutdown_closes_listener() {
    let harness = TestListener::spawn().await;
    harness.shutdown();

    let closed = harness.join().await.unwrap();
    assert_eq!(closed.reason(), ShutdownReason::External);
}

#[tokio::test]
async fn test_socket_is_released_after_close() {
    let harness = TestListener::spawn().await;
    let addr = harness.addr;
    harness.shutdown();
    harness.join().await.unwrap();

    // The port can be bound again once the listener is closed.
    let rebound = std::net::UdpSocket::bind(addr);
    assert!(rebound.is_ok(), "port {addr} still held: {rebound:?}");
}

#[tokio::test]
async fn test_udp_client_drives_listener() {
    let harness = TestListener::spawn().await;
    let client = udpbar_core::UdpCommandClient::connect(harness.addr).unwrap();

    client.submit(Command::color(IconColor::Exclamation)).unwrap();
    harness.wait_for_renders(1).await;
    assert_eq!(
        harness.store.get(),
        VisualState::Color(IconColor::Exclamation)
    );

    client.submit(Command::QuitRequest).unwrap();
    let closed = harness.join().await.unwrap();
    assert_eq!(closed.reason(), ShutdownReason::QuitCommand);
}

#[tokio::test]
async fn test_initial_state_from_config() {
    let config = TestConfigBuilder::new()
        .images(&["a", "b", "c"])
        .initial("2")
        .build();
    let harness = TestListener::spawn_with(&config).await;
    assert_eq!(harness.store.get(), VisualState::Image(2));

    harness.send(b"white").await;
    harness.wait_for_renders(1).await;
    assert_eq!(harness.store.get(), VisualState::Color(IconColor::White));
}

#[tokio::test]
async fn test_image_dir_indices_are_addressable() {
    let icons = tempfile::TempDir::new().unwrap();
    for name in ["beta.png", "alpha.png", "notes.txt"] {
        std::fs::write(icons.path().join(name), b"").unwrap();
    }
    let config = TestConfigBuilder::new()
        .images(&["base"])
        .image_dir(icons.path())
        .build();
    let harness = TestListener::spawn_with(&config).await;
    assert_eq!(harness.catalog.images(), ["base", "alpha", "beta"]);

    // Index 3 would be the text file; it is not part of the catalog.
    harness.send(b"3").await;
    harness.send(b"2").await;
    harness.wait_for_renders(1).await;
    assert_eq!(harness.renderer.states(), vec![VisualState::Image(2)]);
}
