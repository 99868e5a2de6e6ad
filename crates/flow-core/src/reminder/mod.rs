//! Focus-session reminders.
//!
//! A reminder is persisted before its alarm is registered, so it can be
//! replayed after a restart. The record is removed when the alarm fires, when
//! the reminder is cancelled, or when replay finds it already expired.

mod dispatch;


pub use dispatch::{snooze_label, DispatchOutcome, NotificationDispatcher, SCHEDULED_SESSIONS_CHANNEL};

use anyhow::{Context, Result};
use flow_storage::{
    PendingNotification, PreferenceStore, NOTIFICATION_KEY_PREFIX, SESSION_NOTIFICATIONS_PREFS,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::platform::AlarmManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled,
    /// Record persisted but the host refused the alarm
    AlarmRejected,
}

/// Result of replaying persisted reminders after a restart
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub rescheduled: usize,
    pub expired: usize,
    pub corrupt: usize,
    pub rejected: usize,
    /// Records the store could not rewrite or delete
    pub failed: usize,
}

pub struct ReminderScheduler {
    store: Arc<dyn PreferenceStore>,
    alarms: Arc<dyn AlarmManager>,
}

impl ReminderScheduler {
    #[must_use]
    pub fn new(store: Arc<dyn PreferenceStore>, alarms: Arc<dyn AlarmManager>) -> Self {
        Self { store, alarms }
    }

    /// Persist a reminder and register its alarm, replacing any previous one with the same id
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written
    pub fn schedule(&self, reminder: &PendingNotification) -> Result<ScheduleOutcome> {
        log::debug!(
            "Scheduling reminder: id={} sessionId={} scheduledTime={} now={}",
            reminder.notification_id,
            reminder.session_id,
            reminder.scheduled_time,
            chrono::Utc::now().timestamp_millis()
        );

        match reminder.to_json() {
            Ok(json) => {
                self.store
                    .put_string(SESSION_NOTIFICATIONS_PREFS, &reminder.key(), &json)
                    .with_context(|| {
                        format!("Failed to store reminder {}", reminder.notification_id)
                    })?;
            }
            Err(e) => log::error!("Error encoding reminder {}: {e}", reminder.notification_id),
        }

        Ok(self.register(reminder))
    }

    fn register(&self, reminder: &PendingNotification) -> ScheduleOutcome {
        match self.alarms.set_exact(reminder) {
            Ok(()) => {
                log::info!(
                    "Reminder alarm scheduled: id={} fireAt={}",
                    reminder.notification_id,
                    reminder.scheduled_time
                );
                ScheduleOutcome::Scheduled
            }
            Err(e) => {
                log::error!(
                    "Failed to schedule alarm for reminder {}: {e}",
                    reminder.notification_id
                );
                ScheduleOutcome::AlarmRejected
            }
        }
    }

    /// Cancel the alarm and delete the record. Returns whether a record existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be deleted
    pub fn cancel(&self, notification_id: i32) -> Result<bool> {
        self.alarms.cancel(notification_id);
        let removed = self.complete(notification_id)?;
        log::info!("Cancelled reminder {notification_id}");
        Ok(removed)
    }

    /// Delete the record of a fired reminder
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be deleted
    pub fn complete(&self, notification_id: i32) -> Result<bool> {
        self.store.remove(
            SESSION_NOTIFICATIONS_PREFS,
            &PendingNotification::storage_key(notification_id),
        )
    }

    /// The persisted record for `notification_id`, `None` if missing or unreadable
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read
    pub fn stored(&self, notification_id: i32) -> Result<Option<PendingNotification>> {
        let key = PendingNotification::storage_key(notification_id);
        let Some(raw) = self.store.get_string(SESSION_NOTIFICATIONS_PREFS, &key)? else {
            return Ok(None);
        };
        match PendingNotification::from_json(&raw) {
            Ok(reminder) => Ok(Some(reminder)),
            Err(e) => {
                log::warn!("Unreadable reminder {key}: {e}");
                Ok(None)
            }
        }
    }

    /// Persisted reminders that parse, ordered by fire time
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read
    pub fn pending(&self) -> Result<Vec<PendingNotification>> {
        let mut reminders: Vec<PendingNotification> = self
            .reminder_entries()?
            .into_iter()
            .filter_map(|(key, raw)| match PendingNotification::from_json(&raw) {
                Ok(reminder) => Some(reminder),
                Err(e) => {
                    log::warn!("Skipping unreadable reminder {key}: {e}");
                    None
                }
            })
            .collect();
        reminders.sort_by_key(|r| r.scheduled_time);
        Ok(reminders)
    }

    /// Re-register every persisted reminder whose fire time is still ahead of `now_millis`.
    /// Expired and unreadable records are deleted. A record the store fails on is
    /// counted as failed and left for the next replay.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be listed
    pub fn replay(&self, now_millis: i64) -> Result<ReplayReport> {
        let mut report = ReplayReport::default();

        for (key, raw) in self.reminder_entries()? {
            if let Err(e) = self.replay_one(&key, &raw, now_millis, &mut report) {
                log::error!("Failed to replay reminder {key}: {e:#}");
                report.failed += 1;
            }
        }

        log::info!(
            "Replayed reminders: {} rescheduled, {} expired, {} corrupt, {} rejected, {} failed",
            report.rescheduled,
            report.expired,
            report.corrupt,
            report.rejected,
            report.failed
        );
        Ok(report)
    }

    fn replay_one(
        &self,
        key: &str,
        raw: &str,
        now_millis: i64,
        report: &mut ReplayReport,
    ) -> Result<()> {
        let reminder = match PendingNotification::from_json(raw) {
            Ok(reminder) => reminder,
            Err(e) => {
                log::error!("Error parsing stored reminder {key}: {e}");
                self.store.remove(SESSION_NOTIFICATIONS_PREFS, key)?;
                report.corrupt += 1;
                return Ok(());
            }
        };

        if !reminder.is_due_after(now_millis) {
            self.store.remove(SESSION_NOTIFICATIONS_PREFS, key)?;
            log::debug!("Cleaned up expired reminder: {key}");
            report.expired += 1;
            return Ok(());
        }

        match self.schedule(&reminder)? {
            ScheduleOutcome::Scheduled => report.rescheduled += 1,
            ScheduleOutcome::AlarmRejected => report.rejected += 1,
        }
        Ok(())
    }

    fn reminder_entries(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .store
            .entries(SESSION_NOTIFICATIONS_PREFS)?
            .into_iter()
            .filter(|(key, _)| key.starts_with(NOTIFICATION_KEY_PREFIX))
            .collect())
    }
}
