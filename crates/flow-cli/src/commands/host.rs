/// Host event injection: foreground changes, overlay buttons, deep links and lifecycle
use anyhow::{bail, Result};
use flow_core::{
    ipc::{IpcRequest, IpcResponse, LifecycleEvent},
    OverlayAction,
};
use std::path::Path;

use super::helpers::{print_ack, send};

pub async fn focus(data_dir: &Path, package: String) -> Result<()> {
    print_ack(send(data_dir, IpcRequest::Foreground { package }).await?)
}

pub async fn overlay(data_dir: &Path, action: &str) -> Result<()> {
    let action: OverlayAction = action.parse()?;
    print_ack(send(data_dir, IpcRequest::Overlay { action }).await?)
}

pub async fn open(data_dir: &Path, uri: String) -> Result<()> {
    print_ack(send(data_dir, IpcRequest::OpenDeepLink { uri }).await?)
}

pub async fn attach(data_dir: &Path) -> Result<()> {
    print_ack(send(data_dir, IpcRequest::AttachChannel).await?)
}

pub async fn detach(data_dir: &Path) -> Result<()> {
    print_ack(send(data_dir, IpcRequest::DetachChannel).await?)
}

pub async fn actions(data_dir: &Path) -> Result<()> {
    match send(data_dir, IpcRequest::DrainActions).await? {
        IpcResponse::Actions { actions } if actions.is_empty() => {
            println!("No notification actions delivered.");
            Ok(())
        }
        IpcResponse::Actions { actions } => {
            for event in actions {
                println!("{} {}", event.action, event.session_id);
            }
            Ok(())
        }
        IpcResponse::Error { message } => bail!("{message}"),
        other => bail!("Unexpected response from daemon: {other:?}"),
    }
}

pub async fn boot(data_dir: &Path, package_replaced: bool) -> Result<()> {
    let event = if package_replaced {
        LifecycleEvent::PackageReplaced
    } else {
        LifecycleEvent::BootCompleted
    };
    print_ack(send(data_dir, IpcRequest::Lifecycle { event }).await?)
}
