//! Daemon tests driven from real config files.

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use udpbar_config::AppConfig;
use udpbar_core::{IconColor, VisualState};
use udpbar_test_utils::TestDaemon;

#[tokio::test]
async fn test_default_config_starts_white() {
    let harness = TestDaemon::default_config().await;
    assert_eq!(harness.daemon.config().listener.port, 1738);
    assert_eq!(
        harness.daemon.store().get(),
        VisualState::Color(IconColor::White)
    );
    assert!(harness.renderer.is_empty());
}

#[tokio::test]
async fn test_daemon_config_matches_file_on_disk() {
    let harness = TestDaemon::with_toml(
        r#"
            [listener]
            port = 4242
            quit_token = "stop"
        "#,
    )
    .await;

    let reloaded = AppConfig::load(&harness.config_path).await.unwrap();
    assert_eq!(&reloaded, harness.daemon.config());
    assert_eq!(reloaded.listener.quit_token, "stop");
}

#[tokio::test]
async fn test_initial_image_from_config_file() {
    let harness = TestDaemon::with_toml(
        r#"
            [icon]
            initial = "1"
            images = ["build", "deploy"]
        "#,
    )
    .await;

    assert_eq!(harness.daemon.store().get(), VisualState::Image(1));
    assert_eq!(harness.daemon.catalog().image(1), Some("deploy"));
}

#[tokio::test]
async fn test_image_dir_extends_catalog() {
    let icons = TempDir::new().unwrap();
    std::fs::write(icons.path().join("rocket.png"), b"").unwrap();
    let toml = format!(
        "[icon]\nimages = [\"hollow\"]\nimage_dir = {:?}\n",
        icons.path().display().to_string()
    );

    let harness = TestDaemon::with_toml(&toml).await;
    let catalog = harness.daemon.catalog();
    assert_eq!(catalog.image_count(), 2);
    assert_eq!(catalog.image(1), Some("rocket"));
}

#[test_log::test(tokio::test)]
async fn test_occupied_port_is_fatal() {
    let taken = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();
    let harness = TestDaemon::with_toml(&format!("[listener]\nport = {port}\n")).await;

    let err = harness.daemon.run().await.unwrap_err();
    assert!(err.is_bind_failure());

    let fatal = harness.renderer.fatal_messages();
    assert_eq!(fatal.len(), 1);
    assert!(fatal[0].contains(&port.to_string()), "{fatal:?}");
    assert!(harness.renderer.is_empty());
}
