//! Foreground-app monitoring.
//!
//! Every window-focus change is checked against the block list. A blocked app
//! gets the overlay and, after a short delay, the user is sent to the home
//! screen.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::blocklist::BlockList;
use crate::overlay::Overlay;
use crate::platform::{Launcher, PackageRegistry};

#[cfg(test)]
mod tests;

/// Namespaces that belong to the OS itself
const SYSTEM_PREFIXES: &[&str] = &["com.android", "android"];

/// A window-state change reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForegroundEvent {
    pub package: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ForegroundEvent {
    #[must_use]
    pub fn now(package: &str) -> Self {
        Self {
            package: package.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    HostApp,
    SystemPackage,
    /// Overlay already shown for this package within the cooldown window
    CoolingDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Ignored(IgnoreReason),
    Allowed,
    Blocked,
}

impl std::fmt::Display for EventOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ignored(reason) => write!(f, "ignored ({reason:?})"),
            Self::Allowed => f.write_str("allowed"),
            Self::Blocked => f.write_str("blocked"),
        }
    }
}

pub struct ForegroundMonitor {
    block_list: Arc<BlockList>,
    launcher: Arc<dyn Launcher>,
    packages: Arc<dyn PackageRegistry>,
    host_package: String,
    home_delay: Duration,
    cooldown: Duration,
    last_overlay: Mutex<HashMap<String, Instant>>,
}

impl ForegroundMonitor {
    #[must_use]
    pub fn new(
        block_list: Arc<BlockList>,
        launcher: Arc<dyn Launcher>,
        packages: Arc<dyn PackageRegistry>,
        host_package: &str,
        home_delay: Duration,
    ) -> Self {
        Self {
            block_list,
            launcher,
            packages,
            host_package: host_package.to_string(),
            home_delay,
            cooldown: Duration::ZERO,
            last_overlay: Mutex::new(HashMap::new()),
        }
    }

    /// Suppress repeat overlays for the same package within `cooldown`
    #[must_use]
    pub const fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    fn ignore_reason(&self, package: &str) -> Option<IgnoreReason> {
        if package == self.host_package {
            return Some(IgnoreReason::HostApp);
        }
        if SYSTEM_PREFIXES.iter().any(|p| package.starts_with(p)) {
            return Some(IgnoreReason::SystemPackage);
        }
        None
    }

    /// Record an overlay for `package`; false while the previous one is within the cooldown
    fn should_trigger(&self, package: &str) -> bool {
        if self.cooldown.is_zero() {
            return true;
        }

        let now = Instant::now();
        let mut last = self
            .last_overlay
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(previous) = last.get(package) {
            if now.duration_since(*previous) < self.cooldown {
                return false;
            }
        }
        last.insert(package.to_string(), now);
        true
    }

    /// Process one foreground change
    ///
    /// # Errors
    ///
    /// Returns an error if the block list cannot be read
    pub fn handle_event(&self, event: &ForegroundEvent) -> Result<EventOutcome> {
        if let Some(reason) = self.ignore_reason(&event.package) {
            return Ok(EventOutcome::Ignored(reason));
        }

        if !self.block_list.is_blocked(&event.package)? {
            return Ok(EventOutcome::Allowed);
        }

        if !self.should_trigger(&event.package) {
            log::debug!("Overlay for {} suppressed by cooldown", event.package);
            return Ok(EventOutcome::Ignored(IgnoreReason::CoolingDown));
        }

        log::info!("Blocking access to: {}", event.package);
        let label = self
            .packages
            .label_for(&event.package)
            .unwrap_or_else(|| event.package.clone());
        let overlay = Overlay::new(&event.package, Some(&label));
        if let Err(e) = self.launcher.show_overlay(&overlay) {
            log::error!("Failed to show overlay for {}: {e}", event.package);
        }

        self.schedule_go_home();
        Ok(EventOutcome::Blocked)
    }

    /// Return to the home screen after the redirect delay. Without a runtime
    /// to wait on, the redirect happens right away.
    fn schedule_go_home(&self) {
        let launcher = Arc::clone(&self.launcher);
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::warn!("No async runtime for the delayed redirect, going home now");
            go_home(launcher.as_ref());
            return;
        };

        let delay = self.home_delay;
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            go_home(launcher.as_ref());
        });
    }
}

fn go_home(launcher: &dyn Launcher) {
    if let Err(e) = launcher.go_home() {
        log::error!("Failed to return to home screen: {e}");
    }
}
