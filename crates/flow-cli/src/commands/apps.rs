/// Block-list command handlers
use anyhow::{Context, Result};
use flow_core::BlockableApp;
use serde_json::json;
use std::path::Path;
use tabled::{Table, Tabled};

use super::helpers::{invoke, truncate_str};

#[derive(Tabled)]
struct AppRow {
    #[tabled(rename = "App")]
    name: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Blocked")]
    blocked: String,
}

impl From<BlockableApp> for AppRow {
    fn from(app: BlockableApp) -> Self {
        Self {
            name: truncate_str(&app.app_name, 30),
            package: app.package_name,
            category: app.category.to_string(),
            blocked: if app.is_blocked { "yes" } else { "" }.to_string(),
        }
    }
}

pub async fn block(data_dir: &Path, package: &str) -> Result<()> {
    invoke(data_dir, "blockApp", &json!({ "packageName": package })).await?;
    println!("Blocked {package}");
    Ok(())
}

pub async fn unblock(data_dir: &Path, package: &str) -> Result<()> {
    invoke(data_dir, "unblockApp", &json!({ "packageName": package })).await?;
    println!("Unblocked {package}");
    Ok(())
}

pub async fn list(data_dir: &Path, blocked_only: bool) -> Result<()> {
    let value = invoke(data_dir, "getBlockableApps", &json!({})).await?;
    let apps: Vec<BlockableApp> =
        serde_json::from_value(value).context("Daemon returned a malformed app list")?;

    let rows: Vec<AppRow> = apps
        .into_iter()
        .filter(|app| !blocked_only || app.is_blocked)
        .map(AppRow::from)
        .collect();

    if rows.is_empty() {
        println!(
            "{}",
            if blocked_only {
                "No apps are blocked."
            } else {
                "No blockable apps found."
            }
        );
        return Ok(());
    }

    let count = rows.len();
    let table = Table::new(rows).to_string();
    println!("{table}");
    println!("\n{count} apps");
    Ok(())
}
