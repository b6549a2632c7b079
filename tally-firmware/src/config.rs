//! Configuration loading
//!
//! The dashboard configuration is TOML compiled into the firmware.
//! A config that fails to parse or validate falls back to an empty
//! default so the board still boots far enough to show what is wrong
//! on the serial console.

use log::{error, info};

use tally_core::config::DashboardConfig;

/// Embedded configuration (compiled into firmware)
/// Edit dashboard.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../dashboard.toml");

pub fn load() -> DashboardConfig {
    let config: DashboardConfig = match toml::from_str(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("dashboard.toml did not parse: {e}");
            return DashboardConfig::default();
        }
    };

    if let Err(e) = config.validate() {
        error!("dashboard.toml is incomplete: {e:?}");
        return DashboardConfig::default();
    }

    info!(
        "config loaded: dwell {}s, panels: github={} reddit={} twitter={} youtube={}",
        config.dwell_s,
        !config.github_repo.is_empty(),
        !config.subreddit.is_empty(),
        !config.twitter_user.is_empty(),
        !config.youtube_channel.is_empty(),
    );
    config
}
