//! In-memory host that records every platform call.

use flow_storage::PendingNotification;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::overlay::Overlay;
use crate::platform::{
    AlarmManager, DndController, HostScreen, InstalledPackage, InterruptionFilter, Launcher,
    Notification, NotificationChannel, NotificationManager, PackageRegistry, PermissionProbe,
    Platform, PlatformError, SettingsPage,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LauncherCall {
    ShowOverlay(Overlay),
    DismissOverlay,
    GoHome,
    OpenHost(HostScreen),
    OpenSettings(SettingsPage),
}

#[derive(Default)]
pub struct RecordingPlatform {
    launcher_calls: Mutex<Vec<LauncherCall>>,
    channels: Mutex<Vec<NotificationChannel>>,
    active: Mutex<BTreeMap<i32, Notification>>,
    posted: Mutex<Vec<Notification>>,
    alarms: Mutex<BTreeMap<i32, PendingNotification>>,
    packages: Mutex<Vec<InstalledPackage>>,
    icons: Mutex<BTreeMap<String, Vec<u8>>>,
    filter: Mutex<Option<InterruptionFilter>>,
    pub deny_alarms: AtomicBool,
    pub deny_notifications: AtomicBool,
    pub dnd_unsupported: AtomicBool,
    pub dnd_denied: AtomicBool,
    pub usage_stats: AtomicBool,
    pub system_alert: AtomicBool,
    pub accessibility: AtomicBool,
}

impl RecordingPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn platform(self: &Arc<Self>) -> Platform {
        Platform {
            launcher: self.clone(),
            notifications: self.clone(),
            alarms: self.clone(),
            packages: self.clone(),
            permissions: self.clone(),
            dnd: self.clone(),
        }
    }

    pub fn set(flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }

    pub fn install(&self, package: &str, label: &str, launchable: bool) {
        self.packages.lock().unwrap().push(InstalledPackage {
            package: package.to_string(),
            label: label.to_string(),
            launchable,
        });
    }

    pub fn set_icon(&self, package: &str, png: &[u8]) {
        self.icons
            .lock()
            .unwrap()
            .insert(package.to_string(), png.to_vec());
    }

    pub fn launcher_calls(&self) -> Vec<LauncherCall> {
        self.launcher_calls.lock().unwrap().clone()
    }

    pub fn channels(&self) -> Vec<NotificationChannel> {
        self.channels.lock().unwrap().clone()
    }

    pub fn active_notification(&self, id: i32) -> Option<Notification> {
        self.active.lock().unwrap().get(&id).cloned()
    }

    pub fn posted(&self) -> Vec<Notification> {
        self.posted.lock().unwrap().clone()
    }

    pub fn alarm(&self, id: i32) -> Option<PendingNotification> {
        self.alarms.lock().unwrap().get(&id).cloned()
    }

    pub fn alarm_count(&self) -> usize {
        self.alarms.lock().unwrap().len()
    }

    pub fn interruption_filter(&self) -> Option<InterruptionFilter> {
        *self.filter.lock().unwrap()
    }

    fn record(&self, call: LauncherCall) {
        self.launcher_calls.lock().unwrap().push(call);
    }
}

impl Launcher for RecordingPlatform {
    fn show_overlay(&self, overlay: &Overlay) -> Result<(), PlatformError> {
        self.record(LauncherCall::ShowOverlay(overlay.clone()));
        Ok(())
    }

    fn dismiss_overlay(&self) {
        self.record(LauncherCall::DismissOverlay);
    }

    fn go_home(&self) -> Result<(), PlatformError> {
        self.record(LauncherCall::GoHome);
        Ok(())
    }

    fn open_host(&self, screen: HostScreen) -> Result<(), PlatformError> {
        self.record(LauncherCall::OpenHost(screen));
        Ok(())
    }

    fn open_settings(&self, page: SettingsPage) -> Result<(), PlatformError> {
        self.record(LauncherCall::OpenSettings(page));
        Ok(())
    }
}

impl NotificationManager for RecordingPlatform {
    fn ensure_channel(&self, channel: &NotificationChannel) {
        let mut channels = self.channels.lock().unwrap();
        if !channels.iter().any(|c| c.id == channel.id) {
            channels.push(channel.clone());
        }
    }

    fn notify(&self, notification: &Notification) -> Result<(), PlatformError> {
        if self.deny_notifications.load(Ordering::SeqCst) {
            return Err(PlatformError::PermissionDenied(
                "POST_NOTIFICATIONS".to_string(),
            ));
        }
        self.posted.lock().unwrap().push(notification.clone());
        self.active
            .lock()
            .unwrap()
            .insert(notification.id, notification.clone());
        Ok(())
    }

    fn cancel(&self, id: i32) {
        self.active.lock().unwrap().remove(&id);
    }
}

impl AlarmManager for RecordingPlatform {
    fn set_exact(&self, reminder: &PendingNotification) -> Result<(), PlatformError> {
        if self.deny_alarms.load(Ordering::SeqCst) {
            return Err(PlatformError::PermissionDenied(
                "SCHEDULE_EXACT_ALARM".to_string(),
            ));
        }
        self.alarms
            .lock()
            .unwrap()
            .insert(reminder.notification_id, reminder.clone());
        Ok(())
    }

    fn cancel(&self, notification_id: i32) {
        self.alarms.lock().unwrap().remove(&notification_id);
    }
}

impl PackageRegistry for RecordingPlatform {
    fn installed_packages(&self) -> Result<Vec<InstalledPackage>, PlatformError> {
        Ok(self.packages.lock().unwrap().clone())
    }

    fn label_for(&self, package: &str) -> Option<String> {
        self.packages
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.package == package)
            .map(|p| p.label.clone())
    }

    fn icon_png(&self, package: &str) -> Result<Vec<u8>, PlatformError> {
        self.icons
            .lock()
            .unwrap()
            .get(package)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("icon for {package}")))
    }
}

impl PermissionProbe for RecordingPlatform {
    fn has_usage_stats(&self) -> bool {
        self.usage_stats.load(Ordering::SeqCst)
    }

    fn has_system_alert(&self) -> bool {
        self.system_alert.load(Ordering::SeqCst)
    }

    fn has_accessibility(&self) -> bool {
        self.accessibility.load(Ordering::SeqCst)
    }
}

impl DndController for RecordingPlatform {
    fn is_supported(&self) -> bool {
        !self.dnd_unsupported.load(Ordering::SeqCst)
    }

    fn is_access_granted(&self) -> bool {
        !self.dnd_denied.load(Ordering::SeqCst)
    }

    fn set_interruption_filter(&self, filter: InterruptionFilter) -> Result<(), PlatformError> {
        *self.filter.lock().unwrap() = Some(filter);
        Ok(())
    }
}
