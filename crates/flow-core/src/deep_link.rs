//! Deep links from reminder notifications back into the app, and the relay
//! that hands them to the app's command channel once it is ready.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use url::Url;

pub const SCHEME: &str = "flow";
const HOST: &str = "notification";

pub const ACTION_START_NOW: &str = "START_NOW";
pub const ACTION_SNOOZE: &str = "SNOOZE";
/// Tag of the notification body tap
pub const ACTION_REMINDER: &str = "reminder";

#[derive(Debug, thiserror::Error)]
pub enum DeepLinkError {
    #[error("invalid deep link: {0}")]
    InvalidUri(#[from] url::ParseError),
    #[error("unexpected deep link scheme '{0}'")]
    WrongScheme(String),
}

/// Parameters carried by a notification deep link
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepLink {
    pub session_id: Option<String>,
    pub action: Option<String>,
    pub from_notification: bool,
    pub offset_minutes: Option<i32>,
}

impl DeepLink {
    /// Link for a notification action button
    #[must_use]
    pub fn action(session_id: &str, action: &str) -> Self {
        Self {
            session_id: Some(session_id.to_string()),
            action: Some(action.to_string()),
            from_notification: true,
            offset_minutes: None,
        }
    }

    /// Link for the notification body; opens the app without an actionable response
    #[must_use]
    pub fn reminder(session_id: &str, offset_minutes: i32) -> Self {
        Self {
            session_id: Some(session_id.to_string()),
            action: Some(ACTION_REMINDER.to_string()),
            from_notification: false,
            offset_minutes: Some(offset_minutes),
        }
    }

    #[must_use]
    pub fn to_uri(&self) -> String {
        let mut uri = format!("{SCHEME}://{HOST}");
        let mut pairs = url::form_urlencoded::Serializer::new(String::new());
        if let Some(session_id) = &self.session_id {
            pairs.append_pair("sessionId", session_id);
        }
        if let Some(action) = &self.action {
            pairs.append_pair("action", action);
        }
        if self.from_notification {
            pairs.append_pair("fromNotification", "true");
        }
        if let Some(offset) = self.offset_minutes {
            pairs.append_pair("offsetMinutes", &offset.to_string());
        }
        let query = pairs.finish();
        if !query.is_empty() {
            uri.push('?');
            uri.push_str(&query);
        }
        uri
    }

    /// Parse a `flow://` URI. Unknown parameters are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a URI or uses another scheme
    pub fn parse(uri: &str) -> Result<Self, DeepLinkError> {
        let url = Url::parse(uri)?;
        if url.scheme() != SCHEME {
            return Err(DeepLinkError::WrongScheme(url.scheme().to_string()));
        }

        let mut link = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "sessionId" => link.session_id = Some(value.into_owned()),
                "action" => link.action = Some(value.into_owned()),
                "fromNotification" => link.from_notification = value == "true",
                "offsetMinutes" => link.offset_minutes = value.parse().ok(),
                _ => {}
            }
        }
        Ok(link)
    }
}

/// Notification response delivered to the running app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationActionEvent {
    pub session_id: String,
    pub action: String,
}

/// App-side receiver of notification responses
pub trait ActionSink: Send + Sync {
    fn deliver(&self, event: &NotificationActionEvent);
}

/// Queue of delivered responses, drained by the app when it polls
#[derive(Default)]
pub struct ActionQueue {
    events: Mutex<Vec<NotificationActionEvent>>,
}

impl ActionQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<NotificationActionEvent> {
        std::mem::take(&mut *lock(&self.events))
    }
}

impl ActionSink for ActionQueue {
    fn deliver(&self, event: &NotificationActionEvent) {
        lock(&self.events).push(event.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Delivered,
    /// No channel attached yet; held until one is
    Buffered,
    /// Missing session id, action or the notification flag
    Incomplete,
    /// Not a notification link at all
    Ignored,
}

#[derive(Default)]
struct RelayState {
    sink: Option<Arc<dyn ActionSink>>,
    pending: Option<NotificationActionEvent>,
}

/// Routes notification deep links to the app's command channel.
///
/// Holds a single pending slot; a newer link replaces an older undelivered one.
pub struct ActionRelay {
    settle_delay: Duration,
    state: Mutex<RelayState>,
}

impl ActionRelay {
    #[must_use]
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            settle_delay,
            state: Mutex::new(RelayState::default()),
        }
    }

    pub fn handle_deep_link(&self, link: &DeepLink) -> RelayOutcome {
        let (Some(session_id), Some(action), true) =
            (&link.session_id, &link.action, link.from_notification)
        else {
            if link.session_id.is_some() || link.action.is_some() {
                log::debug!(
                    "Notification link incomplete: sessionId={:?} action={:?} fromNotification={}",
                    link.session_id,
                    link.action,
                    link.from_notification
                );
                return RelayOutcome::Incomplete;
            }
            return RelayOutcome::Ignored;
        };

        let event = NotificationActionEvent {
            session_id: session_id.clone(),
            action: action.clone(),
        };

        let sink = {
            let mut state = lock(&self.state);
            match state.sink.clone() {
                Some(sink) => {
                    state.pending = None;
                    sink
                }
                None => {
                    log::info!("Channel not ready, storing pending action {action} for {session_id}");
                    state.pending = Some(event);
                    return RelayOutcome::Buffered;
                }
            }
        };

        sink.deliver(&event);
        log::info!("Sent notification action {action} for {session_id}");
        RelayOutcome::Delivered
    }

    /// Attach the app's channel. A buffered action is flushed after the settle delay.
    pub fn attach(self: &Arc<Self>, sink: Arc<dyn ActionSink>) -> Option<tokio::task::JoinHandle<()>> {
        let has_pending = {
            let mut state = lock(&self.state);
            state.sink = Some(sink);
            state.pending.is_some()
        };
        if !has_pending {
            return None;
        }

        log::info!("Channel ready, flushing pending action in {:?}", self.settle_delay);
        let relay = Arc::clone(self);
        Some(tokio::spawn(async move {
            tokio::time::sleep(relay.settle_delay).await;
            relay.flush();
        }))
    }

    pub fn detach(&self) {
        lock(&self.state).sink = None;
    }

    #[must_use]
    pub fn pending(&self) -> Option<NotificationActionEvent> {
        lock(&self.state).pending.clone()
    }

    fn flush(&self) {
        let (sink, event) = {
            let mut state = lock(&self.state);
            match (state.sink.clone(), state.pending.take()) {
                (Some(sink), Some(event)) => (sink, event),
                (None, event) => {
                    // Detached during the settle delay; keep the action for the next attach
                    state.pending = event;
                    return;
                }
                (Some(_), None) => return,
            }
        };
        sink.deliver(&event);
        log::info!(
            "Sent pending notification action {} for {}",
            event.action,
            event.session_id
        );
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
