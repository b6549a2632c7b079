//! Dashboard configuration types
//!
//! The firmware embeds a TOML file with the Wi-Fi credentials, API
//! tokens and panel selection; these are the types it deserializes
//! into. Everything is bounded heapless storage so a config can live
//! in a static.

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum SSID length per 802.11
pub const MAX_SSID_LEN: usize = 32;

/// Maximum passphrase / token length
pub const MAX_SECRET_LEN: usize = 64;

/// Maximum length of an assembled request URL
pub const MAX_URL_LEN: usize = 192;

/// Maximum length of a repo / channel / user identifier
pub const MAX_IDENT_LEN: usize = 64;

/// Seconds a panel stays on screen by default
pub const DEFAULT_DWELL_S: u32 = 60;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A required key is empty or absent
    MissingKey(&'static str),
}

/// Network credentials and API tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Secrets {
    /// Wi-Fi network name
    pub ssid: String<MAX_SSID_LEN>,
    /// Wi-Fi passphrase
    pub password: String<MAX_SECRET_LEN>,
    /// GitHub API token, required only by the GitHub panel
    #[cfg_attr(feature = "serde", serde(default))]
    pub github_token: String<MAX_SECRET_LEN>,
    /// YouTube Data API key, required only by the YouTube panels
    #[cfg_attr(feature = "serde", serde(default))]
    pub youtube_token: String<MAX_SECRET_LEN>,
}

impl Secrets {
    /// Check that the keys every boot needs are present.
    ///
    /// Panel-specific tokens are checked by the panel constructors, not
    /// here; a dashboard with no GitHub panel needs no GitHub token.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() {
            return Err(ConfigError::MissingKey("ssid"));
        }
        if self.password.is_empty() {
            return Err(ConfigError::MissingKey("password"));
        }
        Ok(())
    }
}

/// Which optional peripherals this board actually carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Capabilities {
    #[cfg_attr(feature = "serde", serde(default))]
    pub has_audio: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub has_sd: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub has_touch: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub has_ambient_sensor: bool,
}

impl Capabilities {
    /// Everything populated, the full production board
    pub const fn full() -> Self {
        Self {
            has_audio: true,
            has_sd: true,
            has_touch: true,
            has_ambient_sensor: true,
        }
    }

    /// Display and radio only
    pub const fn minimal() -> Self {
        Self {
            has_audio: false,
            has_sd: false,
            has_touch: false,
            has_ambient_sensor: false,
        }
    }
}

/// Top-level dashboard configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DashboardConfig {
    pub secrets: Secrets,
    #[cfg_attr(feature = "serde", serde(default))]
    pub capabilities: Capabilities,
    /// Seconds each panel stays on screen
    #[cfg_attr(feature = "serde", serde(default = "default_dwell"))]
    pub dwell_s: u32,
    /// `owner/name` of the repository for the GitHub panel
    #[cfg_attr(feature = "serde", serde(default))]
    pub github_repo: String<MAX_IDENT_LEN>,
    /// Subreddit name for the Reddit panel
    #[cfg_attr(feature = "serde", serde(default))]
    pub subreddit: String<MAX_IDENT_LEN>,
    /// Screen name for the Twitter panel
    #[cfg_attr(feature = "serde", serde(default))]
    pub twitter_user: String<MAX_IDENT_LEN>,
    /// Channel id for the YouTube panels
    #[cfg_attr(feature = "serde", serde(default))]
    pub youtube_channel: String<MAX_IDENT_LEN>,
    /// Optional splash image to download to storage at boot
    #[cfg_attr(feature = "serde", serde(default))]
    pub splash_url: String<MAX_URL_LEN>,
    /// LAN proxy that terminates TLS; `https` panel URLs are fetched
    /// through it as plain HTTP
    #[cfg_attr(feature = "serde", serde(default))]
    pub proxy_base: String<MAX_URL_LEN>,
}

#[cfg(feature = "serde")]
fn default_dwell() -> u32 {
    DEFAULT_DWELL_S
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            secrets: Secrets::default(),
            capabilities: Capabilities::default(),
            dwell_s: DEFAULT_DWELL_S,
            github_repo: String::new(),
            subreddit: String::new(),
            twitter_user: String::new(),
            youtube_channel: String::new(),
            splash_url: String::new(),
            proxy_base: String::new(),
        }
    }
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.secrets.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets(ssid: &str, password: &str) -> Secrets {
        let mut s = Secrets::default();
        s.ssid = String::try_from(ssid).unwrap();
        s.password = String::try_from(password).unwrap();
        s
    }

    #[test]
    fn test_validate_requires_network_keys() {
        assert_eq!(
            secrets("", "pw").validate(),
            Err(ConfigError::MissingKey("ssid"))
        );
        assert_eq!(
            secrets("net", "").validate(),
            Err(ConfigError::MissingKey("password"))
        );
        assert_eq!(secrets("net", "pw").validate(), Ok(()));
    }

    #[test]
    fn test_tokens_are_optional_at_boot() {
        let s = secrets("net", "pw");
        assert!(s.github_token.is_empty());
        assert_eq!(s.validate(), Ok(()));
    }

    #[test]
    fn test_capability_presets() {
        assert!(Capabilities::full().has_sd);
        assert!(!Capabilities::minimal().has_touch);
        assert_eq!(Capabilities::default(), Capabilities::minimal());
    }
}
