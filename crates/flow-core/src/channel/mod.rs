//! Method-call bridge between the app UI and the native side.
//!
//! Calls arrive by name with a JSON object of arguments and answer with a
//! success value, a coded error, or "not implemented" for unknown names.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::blocking_service::BlockingService;
use crate::blocklist::BlockList;
use crate::catalog::AppCatalog;
use crate::platform::{InterruptionFilter, Platform, PlatformError, SettingsPage};
use crate::reminder::ReminderScheduler;
use flow_storage::PendingNotification;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("{0}")]
    NoAccess(String),
    #[error("{0}")]
    Unsupported(String),
    #[error("{0}")]
    Error(String),
}

impl ChannelError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoAccess(_) => "NO_ACCESS",
            Self::Unsupported(_) => "UNSUPPORTED",
            Self::Error(_) => "ERROR",
        }
    }
}

impl From<anyhow::Error> for ChannelError {
    fn from(e: anyhow::Error) -> Self {
        Self::Error(format!("{e:#}"))
    }
}

impl From<PlatformError> for ChannelError {
    fn from(e: PlatformError) -> Self {
        Self::Error(e.to_string())
    }
}

/// Incoming call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    #[must_use]
    pub fn new(method: &str, arguments: Value) -> Self {
        Self {
            method: method.to_string(),
            arguments,
        }
    }

    fn int(&self, name: &str) -> i64 {
        self.arguments.get(name).and_then(Value::as_i64).unwrap_or(0)
    }

    fn int32(&self, name: &str) -> i32 {
        i32::try_from(self.int(name)).unwrap_or(0)
    }

    fn string(&self, name: &str) -> String {
        self.arguments
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChannelResponse {
    Success { result: Value },
    Error { code: String, message: String },
    NotImplemented,
}

impl ChannelResponse {
    /// # Errors
    ///
    /// Returns an error if the response cannot be encoded
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// # Errors
    ///
    /// Returns an error if the text is not an encoded response
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

impl From<Result<Value, ChannelError>> for ChannelResponse {
    fn from(result: Result<Value, ChannelError>) -> Self {
        match result {
            Ok(result) => Self::Success { result },
            Err(e) => Self::Error {
                code: e.code().to_string(),
                message: e.to_string(),
            },
        }
    }
}

const DND_UNSUPPORTED: &str = "Do Not Disturb control is not supported on this host";
const DND_NO_ACCESS: &str = "Do Not Disturb access not granted";

pub struct CommandChannel {
    platform: Platform,
    block_list: Arc<BlockList>,
    service: Arc<BlockingService>,
    scheduler: Arc<ReminderScheduler>,
    catalog: AppCatalog,
}

impl CommandChannel {
    #[must_use]
    pub fn new(
        platform: Platform,
        block_list: Arc<BlockList>,
        service: Arc<BlockingService>,
        scheduler: Arc<ReminderScheduler>,
        host_package: &str,
    ) -> Self {
        let catalog = AppCatalog::new(platform.packages.clone(), block_list.clone(), host_package);
        Self {
            platform,
            block_list,
            service,
            scheduler,
            catalog,
        }
    }

    pub fn invoke(&self, call: &MethodCall) -> ChannelResponse {
        log::debug!("Channel call: {}", call.method);
        let Some(result) = self.dispatch(call) else {
            log::warn!("Channel method not implemented: {}", call.method);
            return ChannelResponse::NotImplemented;
        };
        if let Err(e) = &result {
            log::warn!("Channel call {} failed: {} {e}", call.method, e.code());
        }
        result.into()
    }

    fn dispatch(&self, call: &MethodCall) -> Option<Result<Value, ChannelError>> {
        let result = match call.method.as_str() {
            "isDndAccessGranted" => Ok(json!(
                self.platform.dnd.is_supported() && self.platform.dnd.is_access_granted()
            )),
            "openDndSettings" => self.open_settings(SettingsPage::DndAccess),
            "openAppSettings" => self.open_settings(SettingsPage::AppDetails),
            "enableDnd" => self.set_dnd(InterruptionFilter::Priority),
            "disableDnd" => self.set_dnd(InterruptionFilter::All),
            "scheduleNativeAlarm" => self.schedule_alarm(call),
            "cancelNativeAlarm" => self
                .scheduler
                .cancel(call.int32("notificationId"))
                .map(|_| json!(true))
                .map_err(ChannelError::from),
            "getBlockableApps" => self.blockable_apps(),
            "blockApp" => self
                .block_list
                .add(&call.string("packageName"))
                .map(|_| json!(true))
                .map_err(ChannelError::from),
            "unblockApp" => self
                .block_list
                .remove(&call.string("packageName"))
                .map(|_| json!(true))
                .map_err(ChannelError::from),
            "hasUsageStatsPermission" => Ok(json!(self.platform.permissions.has_usage_stats())),
            "hasSystemAlertPermission" => Ok(json!(self.platform.permissions.has_system_alert())),
            "hasAccessibilityPermission" => {
                Ok(json!(self.platform.permissions.has_accessibility()))
            }
            "openUsageStatsSettings" => self.open_settings(SettingsPage::UsageAccess),
            "openSystemAlertSettings" => self.open_settings(SettingsPage::OverlayPermission),
            "openAccessibilitySettings" => self.open_settings(SettingsPage::Accessibility),
            "startAppBlockingService" => self
                .service
                .start()
                .map(|_| json!(true))
                .map_err(ChannelError::from),
            "stopAppBlockingService" => {
                self.service.stop();
                Ok(json!(true))
            }
            _ => return None,
        };
        Some(result)
    }

    fn open_settings(&self, page: SettingsPage) -> Result<Value, ChannelError> {
        self.platform.launcher.open_settings(page)?;
        Ok(json!(true))
    }

    fn set_dnd(&self, filter: InterruptionFilter) -> Result<Value, ChannelError> {
        let dnd = &self.platform.dnd;
        if !dnd.is_supported() {
            return Err(ChannelError::Unsupported(DND_UNSUPPORTED.to_string()));
        }
        if !dnd.is_access_granted() {
            return Err(ChannelError::NoAccess(DND_NO_ACCESS.to_string()));
        }
        dnd.set_interruption_filter(filter).map_err(|e| match e {
            PlatformError::PermissionDenied(_) => ChannelError::NoAccess(DND_NO_ACCESS.to_string()),
            PlatformError::Unsupported(_) => ChannelError::Unsupported(DND_UNSUPPORTED.to_string()),
            other => ChannelError::from(other),
        })?;
        log::info!("Interruption filter set to {filter:?}");
        Ok(json!(true))
    }

    fn schedule_alarm(&self, call: &MethodCall) -> Result<Value, ChannelError> {
        let reminder = PendingNotification {
            notification_id: call.int32("notificationId"),
            session_id: call.string("sessionId"),
            title: call.string("title"),
            body: call.string("body"),
            offset_minutes: call.int32("offsetMinutes"),
            scheduled_time: call.int("scheduledTime"),
        };
        self.scheduler.schedule(&reminder)?;
        Ok(json!(true))
    }

    fn blockable_apps(&self) -> Result<Value, ChannelError> {
        let apps = self.catalog.blockable_apps()?;
        serde_json::to_value(apps).map_err(|e| ChannelError::Error(e.to_string()))
    }
}
