//! Helper utility functions for CLI commands

use anyhow::{bail, Result};
use flow_core::{
    ipc::{IpcClient, IpcRequest, IpcResponse, SOCKET_NAME},
    ChannelResponse,
};
use serde_json::Value;
use std::path::Path;

/// Safely truncate a string to a maximum number of characters (not bytes).
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Render seconds as `HH:MM:SS`
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let seconds = seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Send one request to the running daemon
pub async fn send(data_dir: &Path, request: IpcRequest) -> Result<IpcResponse> {
    let sock_path = data_dir.join(SOCKET_NAME);
    if !sock_path.exists() {
        bail!("Daemon is not running. Start it with `flow start`.");
    }
    IpcClient::new(&sock_path).send_command(request).await
}

/// Decode a command-channel reply into its success value
pub fn channel_result(method: &str, response: IpcResponse) -> Result<Value> {
    match response {
        IpcResponse::Channel { response_json } => match ChannelResponse::from_json(&response_json)? {
            ChannelResponse::Success { result } => Ok(result),
            ChannelResponse::Error { code, message } => bail!("{code}: {message}"),
            ChannelResponse::NotImplemented => bail!("Method not implemented: {method}"),
        },
        IpcResponse::Error { message } => bail!("{message}"),
        other => bail!("Unexpected response from daemon: {other:?}"),
    }
}

/// Call a command-channel method on the daemon
pub async fn invoke(data_dir: &Path, method: &str, arguments: &Value) -> Result<Value> {
    let response = send(
        data_dir,
        IpcRequest::Invoke {
            method: method.to_string(),
            arguments_json: arguments.to_string(),
        },
    )
    .await?;
    channel_result(method, response)
}

/// Print an acknowledgement, failing on daemon errors
pub fn print_ack(response: IpcResponse) -> Result<()> {
    match response {
        IpcResponse::Ack { message } => {
            println!("{message}");
            Ok(())
        }
        IpcResponse::Error { message } => bail!("{message}"),
        other => bail!("Unexpected response from daemon: {other:?}"),
    }
}
