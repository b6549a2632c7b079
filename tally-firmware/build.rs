//! Build script for tally-firmware
//!
//! Validates dashboard.toml at compile time so a bad config fails the
//! build instead of the boot.

use std::fs;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=dashboard.toml");
    println!("cargo:rerun-if-changed=build.rs");
    validate_config();
}

fn validate_config() {
    let config_path = Path::new("dashboard.toml");
    if !config_path.exists() {
        panic!(
            "dashboard.toml not found. The firmware embeds its configuration; \
             create dashboard.toml in the tally-firmware directory."
        );
    }

    let content = fs::read_to_string(config_path)
        .unwrap_or_else(|e| panic!("failed to read dashboard.toml: {e}"));

    let config: toml::Value = toml::from_str(&content)
        .unwrap_or_else(|e| panic!("invalid TOML in dashboard.toml:\n{e}"));

    let mut errors = Vec::new();

    let secrets = match config.get("secrets").and_then(|s| s.as_table()) {
        Some(t) => t,
        None => {
            panic!("dashboard.toml is missing the [secrets] section");
        }
    };

    for key in ["ssid", "password"] {
        match secrets.get(key).and_then(|v| v.as_str()) {
            Some(v) if !v.is_empty() => {}
            _ => errors.push(format!("[secrets] missing '{key}'")),
        }
    }

    // A panel identifier without its token renders nothing but a skip
    // loop; catch it here.
    let ident = |key: &str| {
        config
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty())
    };
    let token = |key: &str| {
        secrets
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty())
    };

    if ident("github_repo").is_some() && token("github_token").is_none() {
        errors.push("github_repo is set but [secrets] github_token is empty".into());
    }
    if ident("youtube_channel").is_some() && token("youtube_token").is_none() {
        errors.push("youtube_channel is set but [secrets] youtube_token is empty".into());
    }

    if let Some(dwell) = config.get("dwell_s").and_then(|v| v.as_integer()) {
        if !(1..=3600).contains(&dwell) {
            errors.push(format!("dwell_s must be 1-3600, got {dwell}"));
        }
    }

    if !errors.is_empty() {
        panic!(
            "invalid dashboard.toml:\n{}",
            errors
                .iter()
                .map(|e| format!("  - {e}"))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}
