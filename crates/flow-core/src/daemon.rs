use crate::{
    blocking_service::{BlockingService, ServiceState},
    blocklist::BlockList,
    channel::{CommandChannel, MethodCall},
    config::FlowConfig,
    deep_link::{ActionQueue, ActionRelay, DeepLink},
    ipc::{listen, socket_path, Command, DaemonIpcHandler, IpcRequest, IpcResponse, LifecycleEvent},
    monitor::{ForegroundEvent, ForegroundMonitor},
    overlay::{self, OverlayAction},
    platform::desktop::{DesktopHost, DesktopPackages},
    reminder::{NotificationDispatcher, ReminderScheduler},
};
use anyhow::Result;
use flow_storage::{Database, PendingNotification, PreferenceStore};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::mpsc;

/// Long-running host process.
///
/// Every callback (IPC request, fired alarm) is handled on one loop, so the
/// components never see concurrent calls.
pub struct Daemon {
    host: DesktopHost,
    block_list: Arc<BlockList>,
    service: Arc<BlockingService>,
    scheduler: Arc<ReminderScheduler>,
    dispatcher: NotificationDispatcher,
    monitor: ForegroundMonitor,
    channel: CommandChannel,
    relay: Arc<ActionRelay>,
    actions: Arc<ActionQueue>,
    channel_attached: bool,
    fired: mpsc::UnboundedReceiver<PendingNotification>,
    started_at: chrono::DateTime<chrono::Utc>,
    shutdown_signal: Arc<AtomicBool>,
}

impl Daemon {
    /// Build a daemon on the on-disk preference database
    #[must_use]
    pub fn new(db: Database, config: &FlowConfig) -> Self {
        Self::with_store(Arc::new(db), config, DesktopPackages::system())
    }

    #[must_use]
    pub fn with_store(
        store: Arc<dyn PreferenceStore>,
        config: &FlowConfig,
        packages: DesktopPackages,
    ) -> Self {
        let (fired_tx, fired) = mpsc::unbounded_channel();
        let host = DesktopHost::new(fired_tx, packages, config.dnd_access_granted);
        let platform = host.platform();

        let block_list = Arc::new(BlockList::new(store.clone()));
        let service = Arc::new(BlockingService::new(
            block_list.clone(),
            platform.notifications.clone(),
        ));
        block_list.subscribe(service.clone());

        let scheduler = Arc::new(ReminderScheduler::new(store, platform.alarms.clone()));
        let dispatcher =
            NotificationDispatcher::new(platform.notifications.clone(), scheduler.clone());
        let monitor = ForegroundMonitor::new(
            block_list.clone(),
            platform.launcher.clone(),
            platform.packages.clone(),
            &config.host_package,
            config.home_redirect_delay(),
        )
        .with_cooldown(config.overlay_cooldown());
        let channel = CommandChannel::new(
            platform,
            block_list.clone(),
            service.clone(),
            scheduler.clone(),
            &config.host_package,
        );

        Self {
            host,
            block_list,
            service,
            scheduler,
            dispatcher,
            monitor,
            channel,
            relay: Arc::new(ActionRelay::new(config.action_settle_delay())),
            actions: Arc::new(ActionQueue::new()),
            channel_attached: false,
            fired,
            started_at: chrono::Utc::now(),
            shutdown_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replay persisted reminders and bring the blocking service up
    pub fn startup(&self) {
        self.replay_reminders();
        match self.service.start() {
            Ok(state) => log::info!("Blocking service {state:?} at startup"),
            Err(e) => log::error!("Failed to start blocking service: {e}"),
        }
    }

    fn replay_reminders(&self) -> IpcResponse {
        match self.scheduler.replay(chrono::Utc::now().timestamp_millis()) {
            Ok(report) => IpcResponse::Ack {
                message: format!(
                    "Reminders replayed: {} rescheduled, {} expired, {} corrupt, {} rejected, {} failed",
                    report.rescheduled,
                    report.expired,
                    report.corrupt,
                    report.rejected,
                    report.failed
                ),
            },
            Err(e) => {
                log::error!("Reminder replay failed: {e}");
                IpcResponse::Error {
                    message: format!("Reminder replay failed: {e}"),
                }
            }
        }
    }

    pub async fn run_with_signals(&mut self) -> Result<()> {
        let sock_path = socket_path()?;
        let (command_tx, mut commands) = mpsc::channel::<Command>(32);
        let ipc_handler = Arc::new(DaemonIpcHandler::new(command_tx));

        tokio::spawn(async move {
            if let Err(e) = listen(ipc_handler, &sock_path).await {
                log::error!("IPC listener failed: {e}");
            }
        });

        self.startup();
        log::info!("Daemon started with signal handling and IPC");

        loop {
            tokio::select! {
                Some((request, reply)) = commands.recv() => {
                    let response = self.handle_request(request);
                    if reply.send(response).is_err() {
                        log::debug!("IPC client went away before the reply");
                    }
                }
                Some(reminder) = self.fired.recv() => {
                    self.on_alarm(&reminder);
                }
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Received Ctrl-C, shutting down...");
                    self.shutdown_signal.store(true, Ordering::SeqCst);
                }
            }

            if self.shutdown_signal.load(Ordering::SeqCst) {
                break;
            }
        }

        self.relay.detach();
        log::info!("Daemon shut down gracefully.");
        Ok(())
    }

    fn on_alarm(&self, reminder: &PendingNotification) {
        if let Err(e) = self.dispatcher.dispatch(reminder) {
            log::error!(
                "Failed to dispatch reminder {}: {e}",
                reminder.notification_id
            );
        }
    }

    /// Handle one IPC request
    pub fn handle_request(&mut self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Status => self.status(),
            IpcRequest::Shutdown => {
                self.shutdown_signal.store(true, Ordering::SeqCst);
                IpcResponse::Shutdown
            }
            IpcRequest::Invoke {
                method,
                arguments_json,
            } => self.invoke(&method, &arguments_json),
            IpcRequest::Foreground { package } => {
                match self.monitor.handle_event(&ForegroundEvent::now(&package)) {
                    Ok(outcome) => IpcResponse::Ack {
                        message: format!("{package}: {outcome}"),
                    },
                    Err(e) => error_response(&e),
                }
            }
            IpcRequest::OpenDeepLink { uri } => match DeepLink::parse(&uri) {
                Ok(link) => IpcResponse::Ack {
                    message: format!("{:?}", self.relay.handle_deep_link(&link)),
                },
                Err(e) => IpcResponse::Error {
                    message: e.to_string(),
                },
            },
            IpcRequest::AttachChannel => {
                let flush = self.relay.attach(self.actions.clone());
                self.channel_attached = true;
                IpcResponse::Ack {
                    message: if flush.is_some() {
                        String::from("Channel attached, pending action queued")
                    } else {
                        String::from("Channel attached")
                    },
                }
            }
            IpcRequest::DetachChannel => {
                self.relay.detach();
                self.channel_attached = false;
                IpcResponse::Ack {
                    message: String::from("Channel detached"),
                }
            }
            IpcRequest::DrainActions => IpcResponse::Actions {
                actions: self.actions.drain(),
            },
            IpcRequest::Overlay { action } => self.overlay_action(action),
            IpcRequest::Lifecycle { event } => {
                log::info!("Lifecycle event {event:?}, rescheduling reminders");
                match event {
                    LifecycleEvent::BootCompleted | LifecycleEvent::PackageReplaced => {
                        self.replay_reminders()
                    }
                }
            }
        }
    }

    fn invoke(&self, method: &str, arguments_json: &str) -> IpcResponse {
        let arguments = if arguments_json.trim().is_empty() {
            serde_json::Value::Null
        } else {
            match serde_json::from_str(arguments_json) {
                Ok(value) => value,
                Err(e) => {
                    return IpcResponse::Error {
                        message: format!("Invalid arguments: {e}"),
                    }
                }
            }
        };

        let response = self.channel.invoke(&MethodCall::new(method, arguments));
        match response.to_json() {
            Ok(response_json) => IpcResponse::Channel { response_json },
            Err(e) => IpcResponse::Error {
                message: e.to_string(),
            },
        }
    }

    fn overlay_action(&self, action: OverlayAction) -> IpcResponse {
        if self.host.launcher.current_overlay().is_none() {
            return IpcResponse::Error {
                message: String::from("No overlay is showing"),
            };
        }
        match overlay::handle_action(action, self.host.launcher.as_ref()) {
            Ok(()) => IpcResponse::Ack {
                message: format!("{} pressed", action.label()),
            },
            Err(e) => IpcResponse::Error {
                message: e.to_string(),
            },
        }
    }

    fn status(&self) -> IpcResponse {
        let uptime = chrono::Utc::now().signed_duration_since(self.started_at);
        IpcResponse::Status {
            running: true,
            blocked_apps: self.block_list.count().unwrap_or_else(|e| {
                log::warn!("Failed to read block list: {e}");
                0
            }),
            service_running: self.service.state() == ServiceState::Running,
            pending_reminders: self.scheduler.pending().map_or(0, |p| p.len()),
            armed_alarms: self.host.alarms.armed(),
            channel_attached: self.channel_attached,
            current_overlay: self.host.launcher.current_overlay().map(|o| o.message),
            host_screen: self.host.launcher.current_screen(),
            interruption_filter: self.host.dnd.filter(),
            uptime_seconds: u64::try_from(uptime.num_seconds()).unwrap_or(0),
        }
    }
}

fn error_response(e: &anyhow::Error) -> IpcResponse {
    IpcResponse::Error {
        message: format!("{e:#}"),
    }
}
