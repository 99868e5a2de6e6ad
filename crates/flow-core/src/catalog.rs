use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::blocklist::BlockList;
use crate::classifier::{categorize, AppCategory};
use crate::platform::PackageRegistry;

/// System packages that are never offered for blocking
const EXCLUDED_PACKAGES: &[&str] = &["com.google.android.packageinstaller", "com.android.vending"];
const EXCLUDED_PREFIXES: &[&str] = &["com.android.", "android."];

/// Installed app as offered in the blocking picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockableApp {
    pub package_name: String,
    pub app_name: String,
    pub category: AppCategory,
    /// PNG icon as standard base64, empty when it could not be loaded
    pub icon_base64: String,
    pub is_blocked: bool,
}

pub struct AppCatalog {
    packages: Arc<dyn PackageRegistry>,
    block_list: Arc<BlockList>,
    host_package: String,
}

impl AppCatalog {
    #[must_use]
    pub fn new(
        packages: Arc<dyn PackageRegistry>,
        block_list: Arc<BlockList>,
        host_package: &str,
    ) -> Self {
        Self {
            packages,
            block_list,
            host_package: host_package.to_string(),
        }
    }

    fn is_excluded(&self, package: &str) -> bool {
        package == self.host_package
            || EXCLUDED_PACKAGES.contains(&package)
            || EXCLUDED_PREFIXES.iter().any(|p| package.starts_with(p))
    }

    /// Launchable user apps, sorted by display name
    ///
    /// # Errors
    ///
    /// Returns an error if the registry or the block list cannot be read
    pub fn blockable_apps(&self) -> Result<Vec<BlockableApp>> {
        let installed = self
            .packages
            .installed_packages()
            .context("Failed to list installed packages")?;
        let blocked = self.block_list.blocked()?;

        let mut apps: Vec<BlockableApp> = installed
            .into_iter()
            .filter(|p| p.launchable && !self.is_excluded(&p.package))
            .map(|p| {
                let icon_base64 = match self.packages.icon_png(&p.package) {
                    Ok(png) => STANDARD.encode(png),
                    Err(e) => {
                        log::warn!("Failed to load icon for {}: {e}", p.package);
                        String::new()
                    }
                };
                BlockableApp {
                    category: categorize(&p.package, &p.label),
                    is_blocked: blocked.contains(&p.package),
                    package_name: p.package,
                    app_name: p.label,
                    icon_base64,
                }
            })
            .collect();

        apps.sort_by(|a, b| a.app_name.cmp(&b.app_name));
        log::debug!("Found {} blockable apps", apps.len());
        Ok(apps)
    }
}
