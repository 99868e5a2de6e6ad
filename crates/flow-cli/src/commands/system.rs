/// Permission, Do-Not-Disturb, service and raw channel commands
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::path::Path;

use super::helpers::invoke;

const PERMISSION_METHODS: &[(&str, &str)] = &[
    ("Usage stats", "hasUsageStatsPermission"),
    ("Draw over apps", "hasSystemAlertPermission"),
    ("Accessibility", "hasAccessibilityPermission"),
    ("Do Not Disturb", "isDndAccessGranted"),
];

pub async fn call_and_print(data_dir: &Path, method: &str) -> Result<()> {
    let result = invoke(data_dir, method, &json!({})).await?;
    println!("{method}: {result}");
    Ok(())
}

pub async fn permissions(data_dir: &Path) -> Result<()> {
    for (label, method) in PERMISSION_METHODS {
        let granted = invoke(data_dir, method, &json!({}))
            .await?
            .as_bool()
            .unwrap_or(false);
        println!(
            "{label:<16} {}",
            if granted { "granted" } else { "not granted" }
        );
    }
    Ok(())
}

pub async fn invoke_raw(data_dir: &Path, method: &str, args: &str) -> Result<()> {
    let arguments: Value =
        serde_json::from_str(args).with_context(|| format!("Arguments are not JSON: {args}"))?;
    let result = invoke(data_dir, method, &arguments).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
