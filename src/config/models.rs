use crate::humanize::HumanDuration;
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerSettings,
    #[serde(default)]
    pub events: EventSettings,
    #[serde(default)]
    pub service: ServiceSettings,
}

/// Ledger behaviour
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LedgerSettings {
    /// Echo every recorded message to the console
    #[serde(default)]
    pub mirror_to_stdout: bool,
}

/// Event publication
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventSettings {
    /// Broadcast buffer per subscriber; lagging subscribers drop oldest events
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    256
}

/// Ledger service (single-consumer command queue)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceSettings {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Upper bound on a submit-and-acknowledge round trip
    #[serde(default = "default_ack_timeout")]
    pub ack_timeout: HumanDuration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            ack_timeout: default_ack_timeout(),
        }
    }
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_ack_timeout() -> HumanDuration {
    HumanDuration::from_millis(5_000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(!config.ledger.mirror_to_stdout);
        assert_eq!(config.events.channel_capacity, 256);
        assert_eq!(config.service.queue_capacity, 1024);
        assert_eq!(config.service.ack_timeout.as_duration(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[service]
ack_timeout = "750ms"
            "#,
        )
        .unwrap();

        assert_eq!(config.service.queue_capacity, 1024);
        assert_eq!(
            config.service.ack_timeout.as_duration(),
            Duration::from_millis(750)
        );
    }
}
