use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{UnixListener, UnixStream},
    sync::{mpsc, oneshot},
};

use crate::config::get_data_dir;
use crate::deep_link::NotificationActionEvent;
use crate::overlay::OverlayAction;
use crate::platform::{HostScreen, InterruptionFilter};

/// Socket file name inside the data directory
pub const SOCKET_NAME: &str = "flow.sock";

/// Get the daemon socket path
///
/// # Errors
///
/// Returns an error if the data directory cannot be determined
pub fn socket_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(SOCKET_NAME))
}

/// Host lifecycle broadcasts that trigger a reminder replay
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    BootCompleted,
    PackageReplaced,
}

/// IPC request from CLI to daemon
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum IpcRequest {
    Status,
    Shutdown,
    /// Command-channel call; arguments travel as a JSON object string
    Invoke {
        method: String,
        arguments_json: String,
    },
    /// Window-focus change reported by the host
    Foreground {
        package: String,
    },
    OpenDeepLink {
        uri: String,
    },
    AttachChannel,
    DetachChannel,
    DrainActions,
    Overlay {
        action: OverlayAction,
    },
    Lifecycle {
        event: LifecycleEvent,
    },
}

/// IPC response from daemon to CLI
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum IpcResponse {
    Status {
        running: bool,
        blocked_apps: usize,
        service_running: bool,
        pending_reminders: usize,
        armed_alarms: usize,
        channel_attached: bool,
        current_overlay: Option<String>,
        /// Host screen last opened from outside, `None` after going home
        host_screen: Option<HostScreen>,
        interruption_filter: InterruptionFilter,
        uptime_seconds: u64,
    },
    Shutdown,
    /// Encoded `ChannelResponse`
    Channel {
        response_json: String,
    },
    Ack {
        message: String,
    },
    Actions {
        actions: Vec<NotificationActionEvent>,
    },
    Error {
        message: String,
    },
}

#[derive(Debug)]
pub struct IpcClient {
    sock_path: PathBuf,
}

impl IpcClient {
    #[must_use]
    pub fn new(sock_path: &Path) -> Self {
        Self {
            sock_path: sock_path.to_path_buf(),
        }
    }

    /// Send one request and wait for the reply
    ///
    /// # Errors
    ///
    /// Returns an error if the daemon is unreachable or the reply cannot be decoded
    pub async fn send_command(&self, request: IpcRequest) -> Result<IpcResponse> {
        let mut stream = UnixStream::connect(&self.sock_path)
            .await
            .with_context(|| format!("Failed to connect to {}", self.sock_path.display()))?;

        let encoded = bincode::serialize(&request)?;
        stream.write_all(&encoded).await?;
        stream.shutdown().await?;

        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).await?;
        let response: IpcResponse = bincode::deserialize(&buffer)?;

        Ok(response)
    }
}

/// A request paired with the slot its reply goes into
pub type Command = (IpcRequest, oneshot::Sender<IpcResponse>);

/// Forwards decoded requests to the daemon loop, which owns all state
pub struct DaemonIpcHandler {
    commands: mpsc::Sender<Command>,
}

impl DaemonIpcHandler {
    #[must_use]
    pub fn new(commands: mpsc::Sender<Command>) -> Self {
        Self { commands }
    }

    async fn forward(&self, request: IpcRequest) -> IpcResponse {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.commands.send((request, reply_tx)).await.is_err() {
            return IpcResponse::Error {
                message: String::from("daemon is shutting down"),
            };
        }
        reply_rx.await.unwrap_or_else(|_| IpcResponse::Error {
            message: String::from("daemon dropped the request"),
        })
    }

    pub async fn handle(&self, stream: &mut UnixStream, request: IpcRequest) -> Result<()> {
        let response = self.forward(request).await;
        let encoded = bincode::serialize(&response)?;
        stream.write_all(&encoded).await?;
        Ok(())
    }
}

pub async fn listen(handler: Arc<DaemonIpcHandler>, sock_path: &Path) -> io::Result<()> {
    if sock_path.exists() {
        fs::remove_file(sock_path)?;
    }
    let listener = UnixListener::bind(sock_path)?;
    log::info!("IPC listening on {}", sock_path.display());

    loop {
        match listener.accept().await {
            Ok((mut stream, _)) => {
                let handler = handler.clone();
                tokio::spawn(async move {
                    // Clients shut down their write half after the request
                    let mut buf = Vec::new();
                    match stream.read_to_end(&mut buf).await {
                        Ok(n) if n > 0 => match bincode::deserialize::<IpcRequest>(&buf) {
                            Ok(request) => {
                                if let Err(e) = handler.handle(&mut stream, request).await {
                                    log::error!("IPC handle error: {e}");
                                }
                            }
                            Err(e) => {
                                log::error!("IPC deserialize error: {e}");
                            }
                        },
                        Ok(_) => {} // Connection closed
                        Err(e) => {
                            log::error!("IPC read error: {e}");
                        }
                    }
                });
            }
            Err(e) => {
                log::error!("IPC accept error: {e}");
            }
        }
    }
}
