use serde::{Deserialize, Serialize};

use crate::platform::{HostScreen, Launcher, PlatformError};

pub const OVERLAY_TITLE: &str = "App Blocked";
const FALLBACK_APP_NAME: &str = "This app";

/// Full-screen presentation shown over a blocked app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlay {
    pub package_name: String,
    pub app_name: String,
    pub title: String,
    pub message: String,
}

impl Overlay {
    #[must_use]
    pub fn new(package_name: &str, app_name: Option<&str>) -> Self {
        let app_name = app_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(FALLBACK_APP_NAME);

        Self {
            package_name: package_name.to_string(),
            app_name: app_name.to_string(),
            title: OVERLAY_TITLE.to_string(),
            message: format!("{app_name} is blocked to help you stay focused"),
        }
    }
}

/// User responses to the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlayAction {
    GoBack,
    ManageBlocks,
    /// System back gesture; behaves like `GoBack`
    BackPressed,
}

impl OverlayAction {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::GoBack | Self::BackPressed => "Go Back",
            Self::ManageBlocks => "Manage Blocks",
        }
    }
}

impl std::str::FromStr for OverlayAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "goback" => Ok(Self::GoBack),
            "manageblocks" | "manage" => Ok(Self::ManageBlocks),
            "back" | "backpressed" => Ok(Self::BackPressed),
            _ => anyhow::bail!("Unknown overlay action: {s}"),
        }
    }
}

/// Apply an overlay action. The overlay is dismissed even if navigation fails.
///
/// # Errors
///
/// Returns the launcher error when navigation fails
pub fn handle_action(action: OverlayAction, launcher: &dyn Launcher) -> Result<(), PlatformError> {
    let result = match action {
        OverlayAction::GoBack | OverlayAction::BackPressed => launcher.go_home(),
        OverlayAction::ManageBlocks => launcher.open_host(HostScreen::AppBlocking),
    };
    launcher.dismiss_overlay();

    if let Err(e) = &result {
        log::warn!("Overlay action {action:?} failed: {e}");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{LauncherCall, RecordingPlatform};

    #[test]
    fn test_overlay_text() {
        let overlay = Overlay::new("com.instagram.android", Some("Instagram"));
        assert_eq!(overlay.title, "App Blocked");
        assert_eq!(overlay.message, "Instagram is blocked to help you stay focused");
    }

    #[test]
    fn test_missing_app_name_falls_back() {
        let overlay = Overlay::new("com.unknown", None);
        assert_eq!(overlay.app_name, "This app");
        assert_eq!(overlay.message, "This app is blocked to help you stay focused");

        assert_eq!(Overlay::new("com.unknown", Some("  ")).app_name, "This app");
    }

    #[test]
    fn test_go_back_and_back_gesture_return_home() {
        for action in [OverlayAction::GoBack, OverlayAction::BackPressed] {
            let host = RecordingPlatform::default();
            handle_action(action, &host).unwrap();
            assert_eq!(
                host.launcher_calls(),
                vec![LauncherCall::GoHome, LauncherCall::DismissOverlay]
            );
        }
    }

    #[test]
    fn test_manage_blocks_opens_blocking_screen() {
        let host = RecordingPlatform::default();
        handle_action(OverlayAction::ManageBlocks, &host).unwrap();
        assert_eq!(
            host.launcher_calls(),
            vec![
                LauncherCall::OpenHost(HostScreen::AppBlocking),
                LauncherCall::DismissOverlay
            ]
        );
    }

    #[test]
    fn test_parse_action_names() {
        assert_eq!("go-back".parse::<OverlayAction>().unwrap(), OverlayAction::GoBack);
        assert_eq!(
            "Manage Blocks".parse::<OverlayAction>().unwrap(),
            OverlayAction::ManageBlocks
        );
        assert_eq!("back".parse::<OverlayAction>().unwrap(), OverlayAction::BackPressed);
        assert!("explode".parse::<OverlayAction>().is_err());
    }
}
