use anyhow::Result;
use chrono::{DateTime, Local, TimeZone, Timelike};
use flow_storage::PendingNotification;
use std::sync::Arc;

use super::ReminderScheduler;
use crate::deep_link::{DeepLink, ACTION_SNOOZE, ACTION_START_NOW};
use crate::platform::{
    Importance, Notification, NotificationButton, NotificationChannel, NotificationManager, Tap,
};

pub const SCHEDULED_SESSIONS_CHANNEL: &str = "scheduled_sessions";

const CHANNEL: NotificationChannel = NotificationChannel {
    id: SCHEDULED_SESSIONS_CHANNEL,
    name: "Scheduled Sessions",
    description: "Notifications for scheduled focus sessions",
    importance: Importance::High,
};

const START_NOW_REQUEST_OFFSET: i32 = 1000;
const SNOOZE_REQUEST_OFFSET: i32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Posted,
    /// Title or body missing; nothing shown
    Skipped,
    /// The host refused the notification
    Rejected,
    /// The stored record is gone or now fires at another time
    Stale,
}

/// Label of the snooze button: the session start time on a 12-hour clock
#[must_use]
pub fn snooze_label<Tz: TimeZone>(now: &DateTime<Tz>, offset_minutes: i32) -> String {
    let start = now.clone() + chrono::Duration::minutes(i64::from(offset_minutes));
    let (is_pm, hour) = start.hour12();
    format!(
        "I'll start at {hour}:{:02} {}",
        start.minute(),
        if is_pm { "PM" } else { "AM" }
    )
}

/// Turns a fired reminder alarm into a notification with two responses
pub struct NotificationDispatcher {
    notifications: Arc<dyn NotificationManager>,
    scheduler: Arc<ReminderScheduler>,
}

impl NotificationDispatcher {
    #[must_use]
    pub fn new(
        notifications: Arc<dyn NotificationManager>,
        scheduler: Arc<ReminderScheduler>,
    ) -> Self {
        Self {
            notifications,
            scheduler,
        }
    }

    /// Post the reminder notification using the local clock
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted record cannot be deleted
    pub fn dispatch(&self, reminder: &PendingNotification) -> Result<DispatchOutcome> {
        self.dispatch_at(reminder, &Local::now())
    }

    /// # Errors
    ///
    /// Returns an error if the persisted record cannot be read or deleted
    pub fn dispatch_at<Tz: TimeZone>(
        &self,
        reminder: &PendingNotification,
        now: &DateTime<Tz>,
    ) -> Result<DispatchOutcome> {
        log::info!(
            "Reminder alarm fired: id={} sessionId={}",
            reminder.notification_id,
            reminder.session_id
        );

        let current = self.scheduler.stored(reminder.notification_id)?;
        if current.map(|r| r.scheduled_time) != Some(reminder.scheduled_time) {
            log::info!(
                "Reminder {} was cancelled or rescheduled, not posting",
                reminder.notification_id
            );
            return Ok(DispatchOutcome::Stale);
        }

        if reminder.title.is_empty() || reminder.body.is_empty() {
            log::error!(
                "Missing notification data for reminder {}, skipping",
                reminder.notification_id
            );
            return Ok(DispatchOutcome::Skipped);
        }

        self.notifications.ensure_channel(&CHANNEL);

        let notification = Self::build(reminder, now);
        let outcome = match self.notifications.notify(&notification) {
            Ok(()) => {
                log::info!("Notification shown: id={}", reminder.notification_id);
                DispatchOutcome::Posted
            }
            Err(e) => {
                log::error!(
                    "Failed to show notification {}: {e}",
                    reminder.notification_id
                );
                DispatchOutcome::Rejected
            }
        };

        self.scheduler.complete(reminder.notification_id)?;
        log::debug!("Cleaned up stored data for id={}", reminder.notification_id);
        Ok(outcome)
    }

    fn build<Tz: TimeZone>(reminder: &PendingNotification, now: &DateTime<Tz>) -> Notification {
        let id = reminder.notification_id;
        let session_id = reminder.session_id.as_str();

        Notification {
            id,
            channel_id: SCHEDULED_SESSIONS_CHANNEL,
            title: reminder.title.clone(),
            body: reminder.body.clone(),
            importance: Importance::High,
            ongoing: false,
            auto_cancel: true,
            tap: Some(Tap::DeepLink {
                request_code: id,
                link: DeepLink::reminder(session_id, reminder.offset_minutes),
            }),
            actions: vec![
                NotificationButton {
                    label: String::from("Start Now"),
                    request_code: id.wrapping_add(START_NOW_REQUEST_OFFSET),
                    link: DeepLink::action(session_id, ACTION_START_NOW),
                },
                NotificationButton {
                    label: snooze_label(now, reminder.offset_minutes),
                    request_code: id.wrapping_add(SNOOZE_REQUEST_OFFSET),
                    link: DeepLink::action(session_id, ACTION_SNOOZE),
                },
            ],
        }
    }
}
