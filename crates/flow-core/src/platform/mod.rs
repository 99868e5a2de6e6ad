//! Host operating-system surfaces.
//!
//! Everything the blocking and reminder logic needs from the host (launcher
//! navigation, notifications, alarms, the package registry, permission probes
//! and Do-Not-Disturb) sits behind a trait here. The daemon wires in the
//! desktop implementations from [`desktop`].

pub mod desktop;

use flow_storage::PendingNotification;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::deep_link::DeepLink;
use crate::overlay::Overlay;

/// Failures reported by host surfaces
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Failed(String),
}

/// Screens of the host app that can be opened from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostScreen {
    Main,
    AppBlocking,
}

/// System settings pages the host app links to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingsPage {
    DndAccess,
    AppDetails,
    UsageAccess,
    OverlayPermission,
    Accessibility,
}

/// Do-Not-Disturb interruption filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterruptionFilter {
    /// Only priority interruptions; the device is not forced fully silent
    Priority,
    /// Every interruption allowed (DND off)
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Importance {
    Low,
    High,
}

/// Notification channel registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationChannel {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub importance: Importance,
}

/// What happens when the notification body is tapped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tap {
    OpenScreen(HostScreen),
    DeepLink { request_code: i32, link: DeepLink },
}

/// Action button on a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationButton {
    pub label: String,
    pub request_code: i32,
    pub link: DeepLink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: i32,
    pub channel_id: &'static str,
    pub title: String,
    pub body: String,
    pub importance: Importance,
    /// Ongoing notifications cannot be swiped away
    pub ongoing: bool,
    pub auto_cancel: bool,
    pub tap: Option<Tap>,
    pub actions: Vec<NotificationButton>,
}

/// Installed package as reported by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub package: String,
    pub label: String,
    pub launchable: bool,
}

/// Window and activity navigation
pub trait Launcher: Send + Sync {
    fn show_overlay(&self, overlay: &Overlay) -> Result<(), PlatformError>;
    fn dismiss_overlay(&self);
    fn go_home(&self) -> Result<(), PlatformError>;
    fn open_host(&self, screen: HostScreen) -> Result<(), PlatformError>;
    fn open_settings(&self, page: SettingsPage) -> Result<(), PlatformError>;
}

/// Status-bar notifications
pub trait NotificationManager: Send + Sync {
    fn ensure_channel(&self, channel: &NotificationChannel);
    fn notify(&self, notification: &Notification) -> Result<(), PlatformError>;
    fn cancel(&self, id: i32);
}

/// One-shot wall-clock alarms carrying a reminder payload
pub trait AlarmManager: Send + Sync {
    /// Register (or replace) the alarm for `reminder.notification_id`
    fn set_exact(&self, reminder: &PendingNotification) -> Result<(), PlatformError>;
    fn cancel(&self, notification_id: i32);
}

/// Installed application registry
pub trait PackageRegistry: Send + Sync {
    fn installed_packages(&self) -> Result<Vec<InstalledPackage>, PlatformError>;
    fn label_for(&self, package: &str) -> Option<String>;
    /// PNG bytes of the application icon
    fn icon_png(&self, package: &str) -> Result<Vec<u8>, PlatformError>;
}

/// Special-access permission probes
pub trait PermissionProbe: Send + Sync {
    fn has_usage_stats(&self) -> bool;
    fn has_system_alert(&self) -> bool;
    fn has_accessibility(&self) -> bool;
}

/// Do-Not-Disturb policy control
pub trait DndController: Send + Sync {
    fn is_supported(&self) -> bool;
    fn is_access_granted(&self) -> bool;
    fn set_interruption_filter(&self, filter: InterruptionFilter) -> Result<(), PlatformError>;
}

/// Bundle of host surfaces handed to each component at construction
#[derive(Clone)]
pub struct Platform {
    pub launcher: Arc<dyn Launcher>,
    pub notifications: Arc<dyn NotificationManager>,
    pub alarms: Arc<dyn AlarmManager>,
    pub packages: Arc<dyn PackageRegistry>,
    pub permissions: Arc<dyn PermissionProbe>,
    pub dnd: Arc<dyn DndController>,
}
