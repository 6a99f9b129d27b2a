use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown host platform: {0}")]
pub struct ParsePlatformError(String);

/// Bridges exposed by the hosting environment, probed once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostCapabilities {
    pub telegram_web_app: bool,
    pub vk_bridge: bool,
}

/// Environment the course runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostPlatform {
    /// Plain web or terminal; no host bridge.
    #[default]
    Standalone,
    /// Telegram mini app.
    Telegram,
    /// VK mini app.
    Vk,
}

impl HostPlatform {
    /// Telegram wins when both bridges are visible.
    #[must_use]
    pub fn classify(capabilities: HostCapabilities) -> Self {
        if capabilities.telegram_web_app {
            HostPlatform::Telegram
        } else if capabilities.vk_bridge {
            HostPlatform::Vk
        } else {
            HostPlatform::Standalone
        }
    }

    /// Bridge calls the host expects once the app has started.
    #[must_use]
    pub fn handshake(self) -> &'static [&'static str] {
        match self {
            HostPlatform::Standalone => &[],
            HostPlatform::Telegram => &["ready", "expand"],
            HostPlatform::Vk => &["VKWebAppInit"],
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HostPlatform::Standalone => "standalone",
            HostPlatform::Telegram => "telegram",
            HostPlatform::Vk => "vk",
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostPlatform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standalone" | "web" => Ok(HostPlatform::Standalone),
            "telegram" | "tg" => Ok(HostPlatform::Telegram),
            "vk" => Ok(HostPlatform::Vk),
            _ => Err(ParsePlatformError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_prefers_telegram() {
        let both = HostCapabilities {
            telegram_web_app: true,
            vk_bridge: true,
        };
        assert_eq!(HostPlatform::classify(both), HostPlatform::Telegram);
        let vk = HostCapabilities {
            telegram_web_app: false,
            vk_bridge: true,
        };
        assert_eq!(HostPlatform::classify(vk), HostPlatform::Vk);
        assert_eq!(
            HostPlatform::classify(HostCapabilities::default()),
            HostPlatform::Standalone
        );
    }

    #[test]
    fn handshake_matches_host() {
        assert!(HostPlatform::Standalone.handshake().is_empty());
        assert_eq!(HostPlatform::Telegram.handshake(), &["ready", "expand"]);
        assert_eq!(HostPlatform::Vk.handshake(), &["VKWebAppInit"]);
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("TG".parse::<HostPlatform>().unwrap(), HostPlatform::Telegram);
        assert_eq!("web".parse::<HostPlatform>().unwrap(), HostPlatform::Standalone);
        assert!("ok".parse::<HostPlatform>().is_err());
    }
}
