use super::*;
use crate::blocking_service::{ServiceState, NOTIFICATION_ID};
use crate::test_support::{LauncherCall, RecordingPlatform};
use flow_storage::{MemoryPreferences, PreferenceStore, SESSION_NOTIFICATIONS_PREFS};

struct Fixture {
    channel: CommandChannel,
    host: Arc<RecordingPlatform>,
    store: Arc<MemoryPreferences>,
    service: Arc<BlockingService>,
}

fn fixture() -> Fixture {
    let host = RecordingPlatform::new();
    let store = Arc::new(MemoryPreferences::new());
    let block_list = Arc::new(BlockList::new(store.clone()));
    let service = Arc::new(BlockingService::new(block_list.clone(), host.clone()));
    block_list.subscribe(service.clone());
    let scheduler = Arc::new(ReminderScheduler::new(store.clone(), host.clone()));
    let channel = CommandChannel::new(
        host.platform(),
        block_list,
        service.clone(),
        scheduler,
        "com.example.flow_app",
    );
    Fixture {
        channel,
        host,
        store,
        service,
    }
}

fn call(channel: &CommandChannel, method: &str, arguments: Value) -> ChannelResponse {
    channel.invoke(&MethodCall::new(method, arguments))
}

fn success(value: Value) -> ChannelResponse {
    ChannelResponse::Success { result: value }
}

#[test]
fn test_unknown_method_is_not_implemented() {
    let f = fixture();
    assert_eq!(
        call(&f.channel, "launchRockets", json!({})),
        ChannelResponse::NotImplemented
    );
}

#[test]
fn test_error_codes() {
    assert_eq!(ChannelError::NoAccess(String::new()).code(), "NO_ACCESS");
    assert_eq!(ChannelError::Unsupported(String::new()).code(), "UNSUPPORTED");
    assert_eq!(ChannelError::Error(String::new()).code(), "ERROR");
}

#[test]
fn test_enable_and_disable_dnd() {
    let f = fixture();
    assert_eq!(call(&f.channel, "enableDnd", Value::Null), success(json!(true)));
    assert_eq!(f.host.interruption_filter(), Some(InterruptionFilter::Priority));

    assert_eq!(call(&f.channel, "disableDnd", Value::Null), success(json!(true)));
    assert_eq!(f.host.interruption_filter(), Some(InterruptionFilter::All));
}

#[test]
fn test_dnd_without_access() {
    let f = fixture();
    RecordingPlatform::set(&f.host.dnd_denied, true);

    assert_eq!(call(&f.channel, "isDndAccessGranted", Value::Null), success(json!(false)));
    let response = call(&f.channel, "enableDnd", Value::Null);
    assert_eq!(
        response,
        ChannelResponse::Error {
            code: "NO_ACCESS".to_string(),
            message: "Do Not Disturb access not granted".to_string(),
        }
    );
    assert!(f.host.interruption_filter().is_none());
}

#[test]
fn test_dnd_unsupported_wins_over_access() {
    let f = fixture();
    RecordingPlatform::set(&f.host.dnd_unsupported, true);
    RecordingPlatform::set(&f.host.dnd_denied, true);

    let ChannelResponse::Error { code, .. } = call(&f.channel, "disableDnd", Value::Null) else {
        panic!("expected an error");
    };
    assert_eq!(code, "UNSUPPORTED");
}

#[test]
fn test_block_and_unblock_drive_the_service() {
    let f = fixture();
    let args = json!({ "packageName": "com.instagram.android" });

    assert_eq!(call(&f.channel, "blockApp", args.clone()), success(json!(true)));
    assert_eq!(f.service.state(), ServiceState::Running);
    assert!(f.host.active_notification(NOTIFICATION_ID).is_some());

    assert_eq!(call(&f.channel, "unblockApp", args), success(json!(true)));
    assert_eq!(f.service.state(), ServiceState::Stopped);
    assert!(f.host.active_notification(NOTIFICATION_ID).is_none());
}

#[test]
fn test_blockable_apps_lists_catalog() {
    let f = fixture();
    f.host.install("com.google.android.youtube", "YouTube", true);
    call(
        &f.channel,
        "blockApp",
        json!({ "packageName": "com.google.android.youtube" }),
    );

    let ChannelResponse::Success { result } = call(&f.channel, "getBlockableApps", json!({}))
    else {
        panic!("expected success");
    };
    assert_eq!(result[0]["packageName"], "com.google.android.youtube");
    assert_eq!(result[0]["category"], "video");
    assert_eq!(result[0]["isBlocked"], true);
}

#[test]
fn test_schedule_and_cancel_native_alarm() {
    let f = fixture();
    let args = json!({
        "notificationId": 12,
        "sessionId": "abc",
        "title": "Write",
        "body": "Starting soon",
        "offsetMinutes": 5,
        "scheduledTime": 4_102_444_800_000_i64,
    });

    assert_eq!(call(&f.channel, "scheduleNativeAlarm", args), success(json!(true)));
    let alarm = f.host.alarm(12).unwrap();
    assert_eq!(alarm.session_id, "abc");
    assert_eq!(alarm.offset_minutes, 5);
    assert!(f
        .store
        .get_string(SESSION_NOTIFICATIONS_PREFS, "notif_12")
        .unwrap()
        .is_some());

    let cancel = json!({ "notificationId": 12 });
    assert_eq!(call(&f.channel, "cancelNativeAlarm", cancel), success(json!(true)));
    assert!(f.host.alarm(12).is_none());
    assert!(f.store.entries(SESSION_NOTIFICATIONS_PREFS).unwrap().is_empty());
}

#[test]
fn test_missing_arguments_default() {
    let f = fixture();
    assert_eq!(call(&f.channel, "scheduleNativeAlarm", json!({})), success(json!(true)));

    let alarm = f.host.alarm(0).unwrap();
    assert_eq!(alarm.session_id, "");
    assert_eq!(alarm.scheduled_time, 0);
}

#[test]
fn test_permission_probes_and_settings() {
    let f = fixture();
    RecordingPlatform::set(&f.host.accessibility, true);

    assert_eq!(call(&f.channel, "hasUsageStatsPermission", Value::Null), success(json!(false)));
    assert_eq!(call(&f.channel, "hasAccessibilityPermission", Value::Null), success(json!(true)));

    call(&f.channel, "openUsageStatsSettings", Value::Null);
    call(&f.channel, "openDndSettings", Value::Null);
    assert_eq!(
        f.host.launcher_calls(),
        vec![
            LauncherCall::OpenSettings(SettingsPage::UsageAccess),
            LauncherCall::OpenSettings(SettingsPage::DndAccess),
        ]
    );
}

#[test]
fn test_explicit_service_control() {
    let f = fixture();
    assert_eq!(call(&f.channel, "startAppBlockingService", Value::Null), success(json!(true)));
    assert_eq!(f.service.state(), ServiceState::Stopped);

    call(&f.channel, "blockApp", json!({ "packageName": "a.app" }));
    assert_eq!(call(&f.channel, "stopAppBlockingService", Value::Null), success(json!(true)));
    assert_eq!(f.service.state(), ServiceState::Stopped);
}

#[test]
fn test_response_json_shape() {
    let json = ChannelResponse::Error {
        code: "ERROR".to_string(),
        message: "boom".to_string(),
    }
    .to_json()
    .unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["status"], "error");
    assert_eq!(value["code"], "ERROR");

    let roundtrip = ChannelResponse::from_json(&success(json!([1, 2])).to_json().unwrap()).unwrap();
    assert_eq!(roundtrip, success(json!([1, 2])));
}
