/// Reminder command handlers
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::path::Path;

use super::helpers::invoke;

pub struct ReminderArgs {
    pub id: i32,
    pub session: String,
    pub title: String,
    pub body: String,
    pub offset: i32,
    pub fire_at: DateTime<Utc>,
}

/// Resolve the fire time from `--at` or `--in-minutes`
pub fn fire_time(at: Option<&str>, in_minutes: Option<i64>) -> Result<DateTime<Utc>> {
    match (at, in_minutes) {
        (Some(at), _) => Ok(DateTime::parse_from_rfc3339(at)
            .with_context(|| format!("Invalid fire time '{at}', expected RFC 3339"))?
            .with_timezone(&Utc)),
        (None, Some(minutes)) => Ok(Utc::now() + chrono::Duration::minutes(minutes)),
        (None, None) => bail!("Pass either --at or --in-minutes"),
    }
}

pub async fn schedule(data_dir: &Path, args: ReminderArgs) -> Result<()> {
    if args.fire_at <= Utc::now() {
        log::warn!("Fire time {} is in the past; the reminder will fire immediately", args.fire_at);
    }

    let arguments = json!({
        "notificationId": args.id,
        "sessionId": args.session,
        "title": args.title,
        "body": args.body,
        "offsetMinutes": args.offset,
        "scheduledTime": args.fire_at.timestamp_millis(),
    });
    invoke(data_dir, "scheduleNativeAlarm", &arguments).await?;

    println!(
        "Reminder {} scheduled for {}",
        args.id,
        args.fire_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
    );
    Ok(())
}

pub async fn cancel(data_dir: &Path, id: i32) -> Result<()> {
    invoke(data_dir, "cancelNativeAlarm", &json!({ "notificationId": id })).await?;
    println!("Reminder {id} cancelled");
    Ok(())
}
