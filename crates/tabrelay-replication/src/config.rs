//! Replication configuration.

use serde::{Deserialize, Serialize};

/// When a write to the target counts as done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionMode {
    /// Respond once injections are dispatched. A kind is reported as copied
    /// when its source read succeeded; write failures are only logged and
    /// emitted as events.
    #[default]
    FireAndForget,

    /// Await every injection before responding and leave out kinds whose
    /// write failed.
    Confirmed,
}

/// Configuration for the replication dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// How cookie passes and "copy all" injections are awaited.
    #[serde(default)]
    pub injection_mode: InjectionMode,

    /// Capacity of the event broadcast channel.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            injection_mode: InjectionMode::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_event_channel_capacity() -> usize {
    256
}

impl RelayConfig {
    /// Parse a JSON configuration document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Configuration that waits for every write to finish.
    pub fn confirmed() -> Self {
        Self {
            injection_mode: InjectionMode::Confirmed,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_fire_and_forget() {
        let config = RelayConfig::default();
        assert_eq!(config.injection_mode, InjectionMode::FireAndForget);
        assert_eq!(config.event_channel_capacity, 256);
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config = RelayConfig::from_json(r#"{"injection_mode": "confirmed"}"#).unwrap();
        assert_eq!(config.injection_mode, InjectionMode::Confirmed);
        assert_eq!(config.event_channel_capacity, 256);

        let config = RelayConfig::from_json("{}").unwrap();
        assert_eq!(config.injection_mode, InjectionMode::FireAndForget);

        assert!(RelayConfig::from_json(r#"{"injection_mode": "eventually"}"#).is_err());
    }
}
