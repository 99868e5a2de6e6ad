//! Desktop host.
//!
//! Launcher navigation and notifications are kept in memory and logged, alarms
//! are tokio timers, and installed applications come from XDG `.desktop`
//! entries.

use flow_storage::PendingNotification;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use super::{
    AlarmManager, DndController, HostScreen, InstalledPackage, InterruptionFilter, Launcher,
    Notification, NotificationChannel, NotificationManager, PackageRegistry, PermissionProbe,
    Platform, PlatformError, SettingsPage,
};
use crate::overlay::Overlay;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[derive(Default)]
pub struct DesktopLauncher {
    overlay: Mutex<Option<Overlay>>,
    screen: Mutex<Option<HostScreen>>,
}

impl DesktopLauncher {
    #[must_use]
    pub fn current_overlay(&self) -> Option<Overlay> {
        lock(&self.overlay).clone()
    }

    #[must_use]
    pub fn current_screen(&self) -> Option<HostScreen> {
        *lock(&self.screen)
    }
}

impl Launcher for DesktopLauncher {
    fn show_overlay(&self, overlay: &Overlay) -> Result<(), PlatformError> {
        log::info!("[overlay] {}: {}", overlay.title, overlay.message);
        *lock(&self.overlay) = Some(overlay.clone());
        Ok(())
    }

    fn dismiss_overlay(&self) {
        if lock(&self.overlay).take().is_some() {
            log::info!("[overlay] dismissed");
        }
    }

    fn go_home(&self) -> Result<(), PlatformError> {
        log::info!("[launcher] returning to home screen");
        *lock(&self.screen) = None;
        Ok(())
    }

    fn open_host(&self, screen: HostScreen) -> Result<(), PlatformError> {
        log::info!("[launcher] opening host app on {screen:?}");
        *lock(&self.screen) = Some(screen);
        Ok(())
    }

    fn open_settings(&self, page: SettingsPage) -> Result<(), PlatformError> {
        log::info!("[launcher] opening settings page {page:?}");
        Ok(())
    }
}

#[derive(Default)]
pub struct DesktopNotifications {
    channels: Mutex<BTreeMap<&'static str, NotificationChannel>>,
    active: Mutex<BTreeMap<i32, Notification>>,
}

impl DesktopNotifications {
    #[must_use]
    pub fn active(&self) -> Vec<Notification> {
        lock(&self.active).values().cloned().collect()
    }
}

impl NotificationManager for DesktopNotifications {
    fn ensure_channel(&self, channel: &NotificationChannel) {
        let mut channels = lock(&self.channels);
        if !channels.contains_key(channel.id) {
            log::debug!("Notification channel created: {}", channel.id);
            channels.insert(channel.id, channel.clone());
        }
    }

    fn notify(&self, notification: &Notification) -> Result<(), PlatformError> {
        if !lock(&self.channels).contains_key(notification.channel_id) {
            return Err(PlatformError::NotFound(format!(
                "notification channel {}",
                notification.channel_id
            )));
        }
        log::info!(
            "[notification {}] {} - {}",
            notification.id,
            notification.title,
            notification.body
        );
        for action in &notification.actions {
            log::debug!("  action '{}': {}", action.label, action.link.to_uri());
        }
        lock(&self.active).insert(notification.id, notification.clone());
        Ok(())
    }

    fn cancel(&self, id: i32) {
        if lock(&self.active).remove(&id).is_some() {
            log::debug!("Notification {id} cancelled");
        }
    }
}

/// One-shot alarms backed by tokio timers.
///
/// A fired alarm sends its reminder to the daemon loop.
pub struct TokioAlarms {
    fired: UnboundedSender<PendingNotification>,
    timers: Mutex<HashMap<i32, JoinHandle<()>>>,
}

impl TokioAlarms {
    #[must_use]
    pub fn new(fired: UnboundedSender<PendingNotification>) -> Self {
        Self {
            fired,
            timers: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn armed(&self) -> usize {
        lock(&self.timers).values().filter(|h| !h.is_finished()).count()
    }
}

impl AlarmManager for TokioAlarms {
    fn set_exact(&self, reminder: &PendingNotification) -> Result<(), PlatformError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PlatformError::Failed(format!("no timer runtime: {e}")))?;

        let remaining = reminder
            .scheduled_time
            .saturating_sub(chrono::Utc::now().timestamp_millis());
        let delay = Duration::from_millis(u64::try_from(remaining).unwrap_or(0));

        let fired = self.fired.clone();
        let payload = reminder.clone();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if fired.send(payload).is_err() {
                log::warn!("Alarm fired after the daemon loop stopped");
            }
        });

        let mut timers = lock(&self.timers);
        timers.retain(|_, h| !h.is_finished());
        if let Some(previous) = timers.insert(reminder.notification_id, handle) {
            previous.abort();
        }
        log::debug!(
            "Alarm {} armed, fires in {delay:?}",
            reminder.notification_id
        );
        Ok(())
    }

    fn cancel(&self, notification_id: i32) {
        if let Some(handle) = lock(&self.timers).remove(&notification_id) {
            handle.abort();
        }
    }
}

/// Installed applications from XDG desktop entries
pub struct DesktopPackages {
    search_dirs: Vec<PathBuf>,
    icon_dirs: Vec<PathBuf>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct DesktopEntry {
    name: Option<String>,
    icon: Option<String>,
    launchable: bool,
}

impl DesktopEntry {
    /// Parse the `[Desktop Entry]` group of a `.desktop` file
    fn parse(contents: &str) -> Self {
        let mut entry = Self::default();
        let mut in_group = false;
        let mut is_application = false;
        let mut has_exec = false;
        let mut hidden = false;

        for line in contents.lines().map(str::trim) {
            if line.starts_with('[') {
                in_group = line == "[Desktop Entry]";
                continue;
            }
            if !in_group || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                "Name" => entry.name = Some(value.trim().to_string()),
                "Icon" => entry.icon = Some(value.trim().to_string()),
                "Exec" => has_exec = !value.trim().is_empty(),
                "Type" => is_application = value.trim() == "Application",
                "NoDisplay" | "Hidden" => hidden |= value.trim() == "true",
                _ => {}
            }
        }

        entry.launchable = is_application && has_exec && !hidden;
        entry
    }
}

impl DesktopPackages {
    #[must_use]
    pub fn new(search_dirs: Vec<PathBuf>, icon_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs,
            icon_dirs,
        }
    }

    /// User and system application directories
    #[must_use]
    pub fn system() -> Self {
        let mut search_dirs = Vec::new();
        if let Some(data) = dirs::data_dir() {
            search_dirs.push(data.join("applications"));
        }
        search_dirs.push(PathBuf::from("/usr/share/applications"));
        search_dirs.push(PathBuf::from("/usr/local/share/applications"));

        let icon_dirs = vec![
            PathBuf::from("/usr/share/icons/hicolor/48x48/apps"),
            PathBuf::from("/usr/share/icons/hicolor/64x64/apps"),
            PathBuf::from("/usr/share/icons/hicolor/128x128/apps"),
            PathBuf::from("/usr/share/pixmaps"),
        ];
        Self::new(search_dirs, icon_dirs)
    }

    fn entry_path(&self, package: &str) -> Option<PathBuf> {
        self.search_dirs
            .iter()
            .map(|dir| dir.join(format!("{package}.desktop")))
            .find(|path| path.is_file())
    }

    fn read_entry(path: &Path) -> Option<DesktopEntry> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Some(DesktopEntry::parse(&contents)),
            Err(e) => {
                log::debug!("Skipping unreadable desktop entry {}: {e}", path.display());
                None
            }
        }
    }
}

impl PackageRegistry for DesktopPackages {
    fn installed_packages(&self) -> Result<Vec<InstalledPackage>, PlatformError> {
        // Earlier directories shadow later ones, as in XDG lookup
        let mut packages: BTreeMap<String, InstalledPackage> = BTreeMap::new();

        for dir in &self.search_dirs {
            let Ok(read_dir) = std::fs::read_dir(dir) else {
                continue;
            };
            for path in read_dir.flatten().map(|e| e.path()) {
                if path.extension().and_then(|e| e.to_str()) != Some("desktop") {
                    continue;
                }
                let Some(package) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                if packages.contains_key(package) {
                    continue;
                }
                let Some(entry) = Self::read_entry(&path) else {
                    continue;
                };
                packages.insert(
                    package.to_string(),
                    InstalledPackage {
                        package: package.to_string(),
                        label: entry.name.unwrap_or_else(|| package.to_string()),
                        launchable: entry.launchable,
                    },
                );
            }
        }

        Ok(packages.into_values().collect())
    }

    fn label_for(&self, package: &str) -> Option<String> {
        let path = self.entry_path(package)?;
        Self::read_entry(&path)?.name
    }

    fn icon_png(&self, package: &str) -> Result<Vec<u8>, PlatformError> {
        let path = self
            .entry_path(package)
            .ok_or_else(|| PlatformError::NotFound(package.to_string()))?;
        let icon = Self::read_entry(&path)
            .and_then(|entry| entry.icon)
            .ok_or_else(|| PlatformError::NotFound(format!("icon for {package}")))?;

        let candidate = if Path::new(&icon).is_absolute() {
            Some(PathBuf::from(&icon))
        } else {
            self.icon_dirs
                .iter()
                .map(|dir| dir.join(format!("{icon}.png")))
                .find(|p| p.is_file())
        };

        match candidate {
            Some(path) if path.extension().and_then(|e| e.to_str()) == Some("png") => {
                std::fs::read(&path).map_err(|e| PlatformError::Failed(e.to_string()))
            }
            _ => Err(PlatformError::NotFound(format!("png icon {icon}"))),
        }
    }
}

/// Special-access permissions do not exist on the desktop host
pub struct DesktopPermissions;

impl PermissionProbe for DesktopPermissions {
    fn has_usage_stats(&self) -> bool {
        true
    }

    fn has_system_alert(&self) -> bool {
        true
    }

    fn has_accessibility(&self) -> bool {
        true
    }
}

pub struct DesktopDnd {
    access_granted: bool,
    filter: Mutex<InterruptionFilter>,
}

impl DesktopDnd {
    #[must_use]
    pub fn new(access_granted: bool) -> Self {
        Self {
            access_granted,
            filter: Mutex::new(InterruptionFilter::All),
        }
    }

    #[must_use]
    pub fn filter(&self) -> InterruptionFilter {
        *lock(&self.filter)
    }
}

impl DndController for DesktopDnd {
    fn is_supported(&self) -> bool {
        true
    }

    fn is_access_granted(&self) -> bool {
        self.access_granted
    }

    fn set_interruption_filter(&self, filter: InterruptionFilter) -> Result<(), PlatformError> {
        if !self.access_granted {
            return Err(PlatformError::PermissionDenied(String::from("notification policy")));
        }
        *lock(&self.filter) = filter;
        Ok(())
    }
}

/// Concrete desktop surfaces, kept so the daemon can report their state
pub struct DesktopHost {
    pub launcher: Arc<DesktopLauncher>,
    pub notifications: Arc<DesktopNotifications>,
    pub alarms: Arc<TokioAlarms>,
    pub dnd: Arc<DesktopDnd>,
    packages: Arc<DesktopPackages>,
}

impl DesktopHost {
    #[must_use]
    pub fn new(
        fired: UnboundedSender<PendingNotification>,
        packages: DesktopPackages,
        dnd_access_granted: bool,
    ) -> Self {
        Self {
            launcher: Arc::new(DesktopLauncher::default()),
            notifications: Arc::new(DesktopNotifications::default()),
            alarms: Arc::new(TokioAlarms::new(fired)),
            dnd: Arc::new(DesktopDnd::new(dnd_access_granted)),
            packages: Arc::new(packages),
        }
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        Platform {
            launcher: self.launcher.clone(),
            notifications: self.notifications.clone(),
            alarms: self.alarms.clone(),
            packages: self.packages.clone(),
            permissions: Arc::new(DesktopPermissions),
            dnd: self.dnd.clone(),
        }
    }
}
