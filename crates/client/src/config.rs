//! Client configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use url::Host;

/// Public STUN pair used whenever the signaling endpoint is not local.
pub const DEFAULT_STUN_SERVERS: [&str; 2] = [
    "stun:stun.l.google.com:19302",
    "stun:global.stun.twilio.com:3478",
];

/// Label of the single control data channel; must match what the server
/// listens for.
pub const DATA_CHANNEL_LABEL: &str = "datachannel";

/// Configuration for a client session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Signaling endpoint accepting `POST {sdp, type}` and answering in kind
    pub signaling_url: String,

    /// STUN servers used against non-loopback signaling endpoints
    pub stun_servers: Vec<String>,

    /// Control data channel label
    pub data_channel_label: String,

    /// Draw messages per second while a draw gesture is held
    pub draw_frequency: u32,

    /// Upper bound for the brush size
    pub max_draw_size: u32,

    /// Initial brush size
    pub draw_size: u32,

    /// Zoom step per key press
    pub zoom_velocity: f64,

    /// Pan step per key press, scaled by the current zoom
    pub move_velocity: f64,

    /// Smallest zoom window (most zoomed in)
    pub min_zoom: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            signaling_url: "http://127.0.0.1:8080/offer".to_string(),
            stun_servers: DEFAULT_STUN_SERVERS.iter().map(|s| s.to_string()).collect(),
            data_channel_label: DATA_CHANNEL_LABEL.to_string(),
            draw_frequency: 60,
            max_draw_size: 75,
            draw_size: 15,
            zoom_velocity: 0.1,
            move_velocity: 0.1,
            min_zoom: 0.05,
        }
    }
}

impl ClientConfig {
    /// Default configuration pointed at the given signaling endpoint
    pub fn new(signaling_url: impl Into<String>) -> Self {
        Self {
            signaling_url: signaling_url.into(),
            ..Default::default()
        }
    }

    /// Set the draw sampling frequency
    ///
    /// Useful for chaining with [`ClientConfig::new`].
    pub fn with_draw_frequency(mut self, draw_frequency: u32) -> Self {
        self.draw_frequency = draw_frequency;
        self
    }

    /// Replace the STUN server list
    pub fn with_stun_servers(mut self, stun_servers: Vec<String>) -> Self {
        self.stun_servers = stun_servers;
        self
    }

    /// Validate configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `signaling_url` is not a valid http(s) URL
    /// - `draw_frequency` or `max_draw_size` is zero
    /// - `draw_size` is outside `[1, max_draw_size]`
    /// - `min_zoom` is outside `(0, 1]`
    /// - either velocity is not positive
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.signaling_url).map_err(|e| {
            Error::InvalidConfig(format!("invalid signaling_url {}: {e}", self.signaling_url))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::InvalidConfig(format!(
                "signaling_url must be http or https, got {}",
                parsed.scheme()
            )));
        }

        if self.draw_frequency == 0 {
            return Err(Error::InvalidConfig(
                "draw_frequency must be at least 1 Hz".to_string(),
            ));
        }

        if self.max_draw_size == 0 {
            return Err(Error::InvalidConfig(
                "max_draw_size must be at least 1".to_string(),
            ));
        }

        if self.draw_size == 0 || self.draw_size > self.max_draw_size {
            return Err(Error::InvalidConfig(format!(
                "draw_size must be in range 1-{}, got {}",
                self.max_draw_size, self.draw_size
            )));
        }

        if self.min_zoom <= 0.0 || self.min_zoom > 1.0 {
            return Err(Error::InvalidConfig(format!(
                "min_zoom must be in (0, 1], got {}",
                self.min_zoom
            )));
        }

        if self.zoom_velocity <= 0.0 || self.move_velocity <= 0.0 {
            return Err(Error::InvalidConfig(
                "zoom_velocity and move_velocity must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// ICE servers for this session.
    ///
    /// A loopback signaling endpoint gets an empty list so local development
    /// never leaks local network topology to public STUN; everything else
    /// gets the configured STUN servers. No TURN relay is ever attempted.
    pub fn ice_servers(&self) -> Vec<String> {
        if self.is_local_signaling() {
            Vec::new()
        } else {
            self.stun_servers.clone()
        }
    }

    fn is_local_signaling(&self) -> bool {
        let Ok(parsed) = url::Url::parse(&self.signaling_url) else {
            return false;
        };
        match parsed.host() {
            Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
            Some(Host::Ipv4(addr)) => addr.is_loopback(),
            Some(Host::Ipv6(addr)) => addr.is_loopback(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ClientConfig::default().validate().is_ok());
    }

    #[test]
    fn test_non_http_signaling_url_fails() {
        let config = ClientConfig::new("ws://example.com/offer");
        assert!(config.validate().is_err());

        let config = ClientConfig::new("not a url");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_draw_frequency_fails() {
        let mut config = ClientConfig::default();
        config.draw_frequency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_draw_size_out_of_range_fails() {
        let mut config = ClientConfig::default();
        config.draw_size = 0;
        assert!(config.validate().is_err());

        config.draw_size = config.max_draw_size + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_zoom_out_of_range_fails() {
        let mut config = ClientConfig::default();
        config.min_zoom = 0.0;
        assert!(config.validate().is_err());

        config.min_zoom = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_loopback_signaling_gets_no_ice_servers() {
        for url in [
            "http://localhost:8080/offer",
            "http://127.0.0.1:8080/offer",
            "http://[::1]:8080/offer",
        ] {
            let config = ClientConfig::new(url);
            assert!(config.ice_servers().is_empty(), "expected empty for {url}");
        }
    }

    #[test]
    fn test_public_signaling_gets_the_stun_pair() {
        let config = ClientConfig::new("https://universe.example.com/offer");
        let servers = config.ice_servers();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0], DEFAULT_STUN_SERVERS[0]);
        assert_eq!(servers[1], DEFAULT_STUN_SERVERS[1]);
    }

    #[test]
    fn test_builder_chain() {
        let config = ClientConfig::new("http://127.0.0.1:9000/offer").with_draw_frequency(30);
        assert!(config.validate().is_ok());
        assert_eq!(config.draw_frequency, 30);
    }
}
