pub mod blocking_service;
pub mod blocklist;
pub mod catalog;
pub mod channel;
pub mod classifier;
pub mod config;
pub mod daemon;
pub mod deep_link;
pub mod ipc;
pub mod monitor;
pub mod overlay;
pub mod platform;
pub mod reminder;

#[cfg(test)]
mod test_support;

pub use blocking_service::{BlockingService, ServiceState};
pub use blocklist::{BlockList, BlockListChange, BlockListObserver, ChangeKind};
pub use catalog::{AppCatalog, BlockableApp};
pub use channel::{ChannelError, ChannelResponse, CommandChannel, MethodCall};
pub use classifier::{categorize, AppCategory};
pub use config::FlowConfig;
pub use daemon::Daemon;
pub use deep_link::{DeepLink, NotificationActionEvent};
pub use ipc::{IpcClient, IpcRequest, IpcResponse, LifecycleEvent};
pub use monitor::{EventOutcome, ForegroundEvent, ForegroundMonitor};
pub use overlay::{Overlay, OverlayAction};
pub use reminder::{NotificationDispatcher, ReminderScheduler, ReplayReport};
