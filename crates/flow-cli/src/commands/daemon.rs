/// Starting, stopping and inspecting the background daemon
use anyhow::{Context, Result};
use flow_core::{
    config::{get_data_dir, FlowConfig},
    ipc::{IpcClient, IpcRequest, IpcResponse, SOCKET_NAME},
    Daemon,
};
use flow_storage::Database;
use std::{
    env, fs,
    fs::OpenOptions,
    path::{Path, PathBuf},
    process::Command,
    time::Duration,
};
use sysinfo::{Pid, System};

use super::helpers::format_duration;

const PID_FILE: &str = "flow.pid";
const LOG_FILE: &str = "flow.log";
const STOP_GRACE: Duration = Duration::from_secs(2);
const STOP_POLL: Duration = Duration::from_millis(200);

/// Pid of the detached daemon, recorded next to its socket
struct PidFile {
    path: PathBuf,
}

impl PidFile {
    fn in_dir(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(PID_FILE),
        }
    }

    /// Recorded pid, `None` if the file is missing or unreadable
    fn read(&self) -> Option<usize> {
        fs::read_to_string(&self.path).ok()?.trim().parse().ok()
    }

    /// Recorded pid, only if that process is still alive
    fn live_pid(&self) -> Option<usize> {
        self.read().filter(|pid| is_alive(*pid))
    }

    fn write(&self, pid: u32) -> Result<()> {
        fs::write(&self.path, pid.to_string())
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    fn remove(&self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                log::warn!("Could not remove {}: {e}", self.path.display());
            }
        }
    }
}

fn is_alive(pid: usize) -> bool {
    System::new().refresh_process(Pid::from(pid))
}

fn kill(pid: usize) -> bool {
    let mut sys = System::new();
    sys.refresh_process(Pid::from(pid));
    sys.process(Pid::from(pid)).is_some_and(sysinfo::Process::kill)
}

fn remove_socket(sock_path: &Path) -> Result<()> {
    if sock_path.exists() {
        fs::remove_file(sock_path)
            .with_context(|| format!("Failed to remove {}", sock_path.display()))?;
    }
    Ok(())
}

pub fn start_daemon(data_dir: &Path) -> Result<()> {
    let pid_file = PidFile::in_dir(data_dir);
    if let Some(pid) = pid_file.live_pid() {
        log::info!("flow daemon already running (pid {pid})");
        return Ok(());
    }
    if pid_file.read().is_some() {
        log::warn!("Discarding pid file of a dead daemon");
    }
    pid_file.remove();
    remove_socket(&data_dir.join(SOCKET_NAME))?;

    fs::create_dir_all(data_dir)?;
    let child = Command::new(env::current_exe()?)
        .arg("daemon-internal-start")
        .current_dir(env::current_dir()?)
        .spawn()
        .context("Failed to spawn the daemon process")?;

    pid_file.write(child.id())?;
    log::info!("flow daemon started (pid {})", child.id());
    Ok(())
}

/// Entry point of the detached process
pub async fn run_daemon_process() -> Result<()> {
    init_daemon_logging()?;
    log::info!("Daemon process starting");

    let result = async {
        let config = FlowConfig::load_default()?;
        let db = Database::new(None)?;
        Daemon::new(db, &config).run_with_signals().await
    }
    .await;

    if let Err(e) = &result {
        log::error!("Daemon exited with an error: {e:#}");
    }
    result
}

pub async fn stop_daemon(data_dir: &Path) -> Result<()> {
    let pid_file = PidFile::in_dir(data_dir);
    let sock_path = data_dir.join(SOCKET_NAME);

    let Some(pid) = pid_file.read() else {
        log::info!("flow daemon is not running");
        return remove_socket(&sock_path);
    };

    log::info!("Stopping flow daemon (pid {pid})");
    match IpcClient::new(&sock_path)
        .send_command(IpcRequest::Shutdown)
        .await
    {
        Ok(IpcResponse::Shutdown) => {
            let mut waited = Duration::ZERO;
            while is_alive(pid) && waited < STOP_GRACE {
                tokio::time::sleep(STOP_POLL).await;
                waited += STOP_POLL;
            }
            if is_alive(pid) {
                log::warn!("Daemon ignored shutdown, killing pid {pid}");
                kill(pid);
            } else {
                log::info!("flow daemon stopped");
            }
        }
        Ok(other) => log::error!("Shutdown answered with {other:?}"),
        Err(e) => {
            log::error!("Daemon unreachable ({e}), killing pid {pid}");
            if kill(pid) {
                log::info!("Killed pid {pid}");
            }
        }
    }

    pid_file.remove();
    remove_socket(&sock_path)
}

pub async fn show_status(data_dir: &Path) -> Result<()> {
    let sock_path = data_dir.join(SOCKET_NAME);
    if !sock_path.exists() {
        println!("flow daemon: not running");
        return Ok(());
    }

    let response = match IpcClient::new(&sock_path)
        .send_command(IpcRequest::Status)
        .await
    {
        Ok(response) => response,
        Err(e) => {
            log::error!("Status request failed: {e}");
            println!("flow daemon: not responding");
            return Ok(());
        }
    };

    let IpcResponse::Status {
        running,
        blocked_apps,
        service_running,
        pending_reminders,
        armed_alarms,
        channel_attached,
        current_overlay,
        host_screen,
        interruption_filter,
        uptime_seconds,
    } = response
    else {
        anyhow::bail!("Unexpected status reply from daemon");
    };

    let on_off = |flag: bool, on: &'static str, off: &'static str| if flag { on } else { off };
    println!("flow daemon: {}", on_off(running, "running", "stopped"));
    println!("Uptime: {}", format_duration(uptime_seconds));
    println!("\nApp Blocking:");
    println!("  Blocked apps: {blocked_apps}");
    println!(
        "  Status notification: {}",
        on_off(service_running, "shown", "hidden")
    );
    println!(
        "  Overlay: {}",
        current_overlay.as_deref().unwrap_or("none")
    );
    println!(
        "  Host screen: {}",
        host_screen.map_or_else(|| "home".to_string(), |screen| format!("{screen:?}"))
    );
    println!("  Do Not Disturb: {interruption_filter:?}");
    println!("\nReminders:");
    println!("  Pending: {pending_reminders}");
    println!("  Armed alarms: {armed_alarms}");
    println!(
        "\nApp channel: {}",
        on_off(channel_attached, "attached", "detached")
    );
    Ok(())
}

/// The detached process has no terminal, so everything goes to `flow.log`
fn init_daemon_logging() -> Result<()> {
    let data_dir = get_data_dir()?;
    fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join(LOG_FILE);
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open {}", log_path.display()))?;

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter_level(log::LevelFilter::Debug)
        .init();
    Ok(())
}
