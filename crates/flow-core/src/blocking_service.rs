use anyhow::Result;
use std::sync::{Arc, Mutex};

use crate::blocklist::{BlockList, BlockListChange, BlockListObserver};
use crate::platform::{
    HostScreen, Importance, Notification, NotificationChannel, NotificationManager, Tap,
};

pub const CHANNEL_ID: &str = "APP_BLOCKING_CHANNEL";
pub const NOTIFICATION_ID: i32 = 1001;

const CHANNEL: NotificationChannel = NotificationChannel {
    id: CHANNEL_ID,
    name: "App Blocking",
    description: "Shows when apps are being blocked",
    importance: Importance::Low,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Stopped,
    Running,
}

/// Keeps an ongoing status notification alive while any app is blocked
pub struct BlockingService {
    block_list: Arc<BlockList>,
    notifications: Arc<dyn NotificationManager>,
    state: Mutex<ServiceState>,
}

impl BlockingService {
    #[must_use]
    pub fn new(block_list: Arc<BlockList>, notifications: Arc<dyn NotificationManager>) -> Self {
        Self {
            block_list,
            notifications,
            state: Mutex::new(ServiceState::Stopped),
        }
    }

    #[must_use]
    pub fn state(&self) -> ServiceState {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn set_state(&self, state: ServiceState) {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = state;
    }

    /// Start (or refresh) the service; stops itself when nothing is blocked
    ///
    /// # Errors
    ///
    /// Returns an error if the block list cannot be read
    pub fn start(&self) -> Result<ServiceState> {
        self.notifications.ensure_channel(&CHANNEL);
        let count = self.block_list.count()?;
        Ok(self.refresh(count))
    }

    pub fn stop(&self) {
        self.notifications.cancel(NOTIFICATION_ID);
        if self.state() == ServiceState::Running {
            log::info!("App blocking service stopped");
        }
        self.set_state(ServiceState::Stopped);
    }

    fn refresh(&self, blocked_count: usize) -> ServiceState {
        if blocked_count == 0 {
            self.stop();
            return ServiceState::Stopped;
        }

        if let Err(e) = self.notifications.notify(&Self::status_notification(blocked_count)) {
            log::error!("Failed to post blocking status notification: {e}");
        }
        if self.state() == ServiceState::Stopped {
            log::info!("App blocking service started with {blocked_count} blocked apps");
        }
        self.set_state(ServiceState::Running);
        ServiceState::Running
    }

    fn status_notification(blocked_count: usize) -> Notification {
        Notification {
            id: NOTIFICATION_ID,
            channel_id: CHANNEL_ID,
            title: format!("\u{1f6ab} {blocked_count} apps blocked"),
            body: String::from("Tap to manage blocked apps"),
            importance: Importance::Low,
            ongoing: true,
            auto_cancel: false,
            tap: Some(Tap::OpenScreen(HostScreen::AppBlocking)),
            actions: Vec::new(),
        }
    }
}

impl BlockListObserver for BlockingService {
    fn block_list_changed(&self, change: &BlockListChange) {
        if change.blocked_count > 0 {
            self.notifications.ensure_channel(&CHANNEL);
        }
        self.refresh(change.blocked_count);
    }
}
