use super::*;
use crate::test_support::{LauncherCall, RecordingPlatform};
use flow_storage::MemoryPreferences;

const HOST: &str = "com.example.flow_app";

fn setup(cooldown: Duration) -> (ForegroundMonitor, Arc<BlockList>, Arc<RecordingPlatform>) {
    let host = RecordingPlatform::new();
    let block_list = Arc::new(BlockList::new(Arc::new(MemoryPreferences::new())));
    let monitor = ForegroundMonitor::new(
        block_list.clone(),
        host.clone(),
        host.clone(),
        HOST,
        Duration::from_millis(100),
    )
    .with_cooldown(cooldown);
    (monitor, block_list, host)
}

#[tokio::test(start_paused = true)]
async fn test_blocked_app_shows_overlay_then_goes_home() {
    let (monitor, block_list, host) = setup(Duration::ZERO);
    host.install("com.instagram.android", "Instagram", true);
    block_list.add("com.instagram.android").unwrap();

    let outcome = monitor
        .handle_event(&ForegroundEvent::now("com.instagram.android"))
        .unwrap();
    assert_eq!(outcome, EventOutcome::Blocked);

    let calls = host.launcher_calls();
    assert_eq!(calls.len(), 1);
    let LauncherCall::ShowOverlay(overlay) = &calls[0] else {
        panic!("expected overlay, got {calls:?}");
    };
    assert_eq!(overlay.message, "Instagram is blocked to help you stay focused");

    tokio::time::sleep(Duration::from_millis(99)).await;
    assert_eq!(host.launcher_calls().len(), 1);

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(host.launcher_calls()[1], LauncherCall::GoHome);
}

#[test]
fn test_blocked_app_without_runtime_goes_home_immediately() {
    let (monitor, block_list, host) = setup(Duration::ZERO);
    host.install("com.instagram.android", "Instagram", true);
    block_list.add("com.instagram.android").unwrap();

    let outcome = monitor
        .handle_event(&ForegroundEvent::now("com.instagram.android"))
        .unwrap();
    assert_eq!(outcome, EventOutcome::Blocked);

    let calls = host.launcher_calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[0], LauncherCall::ShowOverlay(_)));
    assert_eq!(calls[1], LauncherCall::GoHome);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_label_falls_back_to_package_id() {
    let (monitor, block_list, host) = setup(Duration::ZERO);
    block_list.add("com.mystery.app").unwrap();

    monitor
        .handle_event(&ForegroundEvent::now("com.mystery.app"))
        .unwrap();

    let LauncherCall::ShowOverlay(overlay) = &host.launcher_calls()[0] else {
        panic!("expected overlay");
    };
    assert_eq!(overlay.app_name, "com.mystery.app");
}

#[tokio::test]
async fn test_host_and_system_packages_are_ignored() {
    let (monitor, block_list, host) = setup(Duration::ZERO);
    for package in [HOST, "com.android.settings", "android", "com.androidx.thing"] {
        block_list.add(package).unwrap();
    }

    assert_eq!(
        monitor.handle_event(&ForegroundEvent::now(HOST)).unwrap(),
        EventOutcome::Ignored(IgnoreReason::HostApp)
    );
    assert_eq!(
        monitor
            .handle_event(&ForegroundEvent::now("com.android.settings"))
            .unwrap(),
        EventOutcome::Ignored(IgnoreReason::SystemPackage)
    );
    // Prefix match has no dot boundary
    assert_eq!(
        monitor
            .handle_event(&ForegroundEvent::now("com.androidx.thing"))
            .unwrap(),
        EventOutcome::Ignored(IgnoreReason::SystemPackage)
    );
    assert!(host.launcher_calls().is_empty());
}

#[tokio::test]
async fn test_unblocked_app_is_allowed() {
    let (monitor, _block_list, host) = setup(Duration::ZERO);
    assert_eq!(
        monitor
            .handle_event(&ForegroundEvent::now("org.mozilla.firefox"))
            .unwrap(),
        EventOutcome::Allowed
    );
    assert!(host.launcher_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_retriggers_on_every_event_without_cooldown() {
    let (monitor, block_list, _host) = setup(Duration::ZERO);
    block_list.add("com.reddit.frontpage").unwrap();
    let event = ForegroundEvent::now("com.reddit.frontpage");

    assert_eq!(monitor.handle_event(&event).unwrap(), EventOutcome::Blocked);
    assert_eq!(monitor.handle_event(&event).unwrap(), EventOutcome::Blocked);
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_suppresses_repeats() {
    let (monitor, block_list, _host) = setup(Duration::from_secs(2));
    block_list.add("com.reddit.frontpage").unwrap();
    let event = ForegroundEvent::now("com.reddit.frontpage");

    assert_eq!(monitor.handle_event(&event).unwrap(), EventOutcome::Blocked);
    assert_eq!(
        monitor.handle_event(&event).unwrap(),
        EventOutcome::Ignored(IgnoreReason::CoolingDown)
    );

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(monitor.handle_event(&event).unwrap(), EventOutcome::Blocked);
}
