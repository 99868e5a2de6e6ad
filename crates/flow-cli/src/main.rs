mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use flow_core::config::get_data_dir;

use commands::daemon::{run_daemon_process, show_status, start_daemon, stop_daemon};

#[derive(Parser)]
#[command(name = "flow")]
#[command(about = "Focus-session app blocking and reminders", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the flow daemon
    Start,
    /// (Internal) Run the daemon process
    #[command(hide = true)]
    DaemonInternalStart,
    /// Stop the flow daemon
    Stop,
    /// Check daemon status
    Status,
    /// Block an app by package id
    Block { package: String },
    /// Unblock an app by package id
    Unblock { package: String },
    /// List installed apps that can be blocked
    Apps {
        /// Only show blocked apps
        #[arg(short, long)]
        blocked: bool,
    },
    /// Schedule a focus-session reminder
    Remind {
        /// Notification id; reusing an id replaces the reminder
        #[arg(long)]
        id: i32,
        #[arg(long)]
        session: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        /// Minutes between the reminder and the session start
        #[arg(long, default_value_t = 0)]
        offset: i32,
        /// Fire time (RFC 3339)
        #[arg(long, conflicts_with = "in_minutes")]
        at: Option<String>,
        /// Fire this many minutes from now
        #[arg(long)]
        in_minutes: Option<i64>,
    },
    /// Cancel a scheduled reminder
    CancelReminder { id: i32 },
    /// Do-Not-Disturb control
    Dnd {
        #[arg(value_enum)]
        action: DndAction,
    },
    /// Show special-access permission state
    Permissions,
    /// Control the blocking status service
    Service {
        #[arg(value_enum)]
        action: ServiceAction,
    },
    /// Open a system settings page
    Settings {
        #[arg(value_enum)]
        page: SettingsTarget,
    },
    /// Call a command-channel method directly
    Invoke {
        method: String,
        /// Arguments as a JSON object
        #[arg(default_value = "{}")]
        args: String,
    },
    /// Report a foreground app change to the daemon
    Focus { package: String },
    /// Press a button on the blocking overlay (go-back, manage-blocks, back)
    Overlay { action: String },
    /// Open a notification deep link (flow://notification?...)
    Open { uri: String },
    /// Attach the app's notification-action channel
    Attach,
    /// Detach the app's notification-action channel
    Detach,
    /// Print and clear notification actions delivered to the app
    Actions,
    /// Replay reminders as after a reboot or app update
    Boot {
        /// Treat as an app update instead of a reboot
        #[arg(long)]
        package_replaced: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DndAction {
    On,
    Off,
    Status,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ServiceAction {
    Start,
    Stop,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SettingsTarget {
    Dnd,
    App,
    UsageStats,
    Overlay,
    Accessibility,
}

impl SettingsTarget {
    const fn method(self) -> &'static str {
        match self {
            Self::Dnd => "openDndSettings",
            Self::App => "openAppSettings",
            Self::UsageStats => "openUsageStatsSettings",
            Self::Overlay => "openSystemAlertSettings",
            Self::Accessibility => "openAccessibilitySettings",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if !matches!(cli.command, Commands::DaemonInternalStart) {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_secs()
            .init();
    }

    let data_dir = get_data_dir()?;

    match cli.command {
        Commands::Start => start_daemon(&data_dir),
        Commands::DaemonInternalStart => run_daemon_process().await,
        Commands::Stop => stop_daemon(&data_dir).await,
        Commands::Status => show_status(&data_dir).await,
        Commands::Block { package } => commands::apps::block(&data_dir, &package).await,
        Commands::Unblock { package } => commands::apps::unblock(&data_dir, &package).await,
        Commands::Apps { blocked } => commands::apps::list(&data_dir, blocked).await,
        Commands::Remind {
            id,
            session,
            title,
            body,
            offset,
            at,
            in_minutes,
        } => {
            let fire_at = commands::reminders::fire_time(at.as_deref(), in_minutes)?;
            let request = commands::reminders::ReminderArgs {
                id,
                session,
                title,
                body,
                offset,
                fire_at,
            };
            commands::reminders::schedule(&data_dir, request).await
        }
        Commands::CancelReminder { id } => commands::reminders::cancel(&data_dir, id).await,
        Commands::Dnd { action } => {
            let method = match action {
                DndAction::On => "enableDnd",
                DndAction::Off => "disableDnd",
                DndAction::Status => "isDndAccessGranted",
            };
            commands::system::call_and_print(&data_dir, method).await
        }
        Commands::Permissions => commands::system::permissions(&data_dir).await,
        Commands::Service { action } => {
            let method = match action {
                ServiceAction::Start => "startAppBlockingService",
                ServiceAction::Stop => "stopAppBlockingService",
            };
            commands::system::call_and_print(&data_dir, method).await
        }
        Commands::Settings { page } => {
            commands::system::call_and_print(&data_dir, page.method()).await
        }
        Commands::Invoke { method, args } => {
            commands::system::invoke_raw(&data_dir, &method, &args).await
        }
        Commands::Focus { package } => commands::host::focus(&data_dir, package).await,
        Commands::Overlay { action } => commands::host::overlay(&data_dir, &action).await,
        Commands::Open { uri } => commands::host::open(&data_dir, uri).await,
        Commands::Attach => commands::host::attach(&data_dir).await,
        Commands::Detach => commands::host::detach(&data_dir).await,
        Commands::Actions => commands::host::actions(&data_dir).await,
        Commands::Boot { package_replaced } => {
            commands::host::boot(&data_dir, package_replaced).await
        }
    }
}
