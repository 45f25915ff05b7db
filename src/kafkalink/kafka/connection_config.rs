//! Connection configuration shared by producer and consumer sessions
//!
//! A `BrokerConnectionConfig` accumulates the handful of settings a client
//! handle needs before it is created. Sessions take it by value, so each
//! session owns exactly one snapshot and nothing mutates the settings of a
//! handle once it exists.

use rdkafka::config::{ClientConfig, RDKafkaLogLevel};
use std::collections::HashMap;

pub const BOOTSTRAP_SERVERS: &str = "bootstrap.servers";
pub const GROUP_ID: &str = "group.id";
pub const CLIENT_ID: &str = "client.id";
pub const LOG_LEVEL: &str = "log_level";
pub const DEBUG_CONTEXTS: &str = "debug";
pub const BROKER_ADDRESS_FAMILY: &str = "broker.address.family";

/// syslog(3) LOG_DEBUG, the most detailed librdkafka level
pub const MOST_DETAILED_LOG_LEVEL: &str = "7";

/// Environment variable overriding the broker address family
pub const BROKER_ADDRESS_FAMILY_ENV: &str = "KAFKALINK_BROKER_ADDRESS_FAMILY";

/// IP family librdkafka uses when resolving broker addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerAddressFamily {
    V4,
    V6,
    /// librdkafka default
    Any,
}

impl BrokerAddressFamily {
    pub fn as_librdkafka_value(&self) -> &'static str {
        match self {
            BrokerAddressFamily::V4 => "v4",
            BrokerAddressFamily::V6 => "v6",
            BrokerAddressFamily::Any => "any",
        }
    }

    /// Parse from string (case-insensitive); `None` for unknown values
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "v4" | "ipv4" => Some(BrokerAddressFamily::V4),
            "v6" | "ipv6" => Some(BrokerAddressFamily::V6),
            "any" | "both" => Some(BrokerAddressFamily::Any),
            _ => None,
        }
    }

    /// Reads `KAFKALINK_BROKER_ADDRESS_FAMILY`, ignoring invalid values
    pub fn from_env() -> Option<Self> {
        let value = std::env::var(BROKER_ADDRESS_FAMILY_ENV).ok()?;
        let family = Self::parse(&value);
        if family.is_none() {
            log::warn!(
                "Invalid broker address family '{}' in {}, leaving librdkafka default. \
                 Valid values: v4, v6, any",
                value,
                BROKER_ADDRESS_FAMILY_ENV
            );
        }
        family
    }
}

/// Builder and owner of the broker client configuration
///
/// Supports both in-place setters (`set_bootstrap_server`, `set_group_id`,
/// `enable_debug`) and consuming builder methods:
///
/// ```rust
/// use kafkalink::BrokerConnectionConfig;
///
/// let config = BrokerConnectionConfig::new()
///     .with_bootstrap_servers("broker1:9092,broker2:9092")
///     .with_group_id("billing")
///     .with_client_id(Some("billing-consumer"));
///
/// assert_eq!(config.bootstrap_servers(), Some("broker1:9092,broker2:9092"));
/// ```
#[derive(Debug, Clone)]
pub struct BrokerConnectionConfig {
    config: ClientConfig,
}

impl BrokerConnectionConfig {
    /// Creates an empty configuration
    ///
    /// The broker address family is taken from the environment when
    /// `KAFKALINK_BROKER_ADDRESS_FAMILY` holds a valid value.
    pub fn new() -> Self {
        let mut connection = Self {
            config: ClientConfig::new(),
        };
        if let Some(family) = BrokerAddressFamily::from_env() {
            connection.set_broker_address_family(family);
        }
        connection
    }

    /// Sets the broker address list (host:port or comma-separated list)
    ///
    /// Reachability is not checked here; the client validates it when it
    /// connects.
    pub fn set_bootstrap_server(&mut self, address: &str) -> &mut Self {
        self.config.set(BOOTSTRAP_SERVERS, address);
        self
    }

    /// Sets the consumer group id. Producer handles accept and ignore it.
    pub fn set_group_id(&mut self, group_id: &str) -> &mut Self {
        self.config.set(GROUP_ID, group_id);
        self
    }

    /// Switches librdkafka to its most detailed log level with every debug context
    pub fn enable_debug(&mut self) -> &mut Self {
        self.config
            .set(LOG_LEVEL, MOST_DETAILED_LOG_LEVEL)
            .set(DEBUG_CONTEXTS, "all")
            .set_log_level(RDKafkaLogLevel::Debug);
        self
    }

    pub fn set_client_id(&mut self, client_id: &str) -> &mut Self {
        self.config.set(CLIENT_ID, client_id);
        self
    }

    pub fn set_broker_address_family(&mut self, family: BrokerAddressFamily) -> &mut Self {
        self.config
            .set(BROKER_ADDRESS_FAMILY, family.as_librdkafka_value());
        self
    }

    /// Sets an arbitrary librdkafka property
    pub fn set_property(&mut self, key: &str, value: &str) -> &mut Self {
        self.config.set(key, value);
        self
    }

    /// Sets a property only when it has not been set yet
    pub fn set_default_property(&mut self, key: &str, value: &str) -> &mut Self {
        if self.config.get(key).is_none() {
            self.config.set(key, value);
        }
        self
    }

    /// Builder variant of `set_bootstrap_server`
    pub fn with_bootstrap_servers(mut self, address: &str) -> Self {
        self.set_bootstrap_server(address);
        self
    }

    /// Builder variant of `set_group_id`
    pub fn with_group_id(mut self, group_id: &str) -> Self {
        self.set_group_id(group_id);
        self
    }

    /// Builder variant of `enable_debug`, applied only when `enabled`
    pub fn with_debug(mut self, enabled: bool) -> Self {
        if enabled {
            self.enable_debug();
        }
        self
    }

    pub fn with_client_id(mut self, client_id: Option<&str>) -> Self {
        if let Some(id) = client_id {
            self.set_client_id(id);
        }
        self
    }

    pub fn with_broker_address_family(mut self, family: BrokerAddressFamily) -> Self {
        self.set_broker_address_family(family);
        self
    }

    /// Add a single custom property
    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.set_property(key, value);
        self
    }

    /// Add custom configuration properties
    pub fn with_properties(mut self, properties: &HashMap<String, String>) -> Self {
        for (key, value) in properties {
            self.set_property(key, value);
        }
        self
    }

    /// The assembled settings, ready to be handed to a client constructor
    pub fn get_config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn into_client_config(self) -> ClientConfig {
        self.config
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.config.get(key)
    }

    pub fn bootstrap_servers(&self) -> Option<&str> {
        self.get(BOOTSTRAP_SERVERS)
    }

    pub fn group_id(&self) -> Option<&str> {
        self.get(GROUP_ID)
    }

    /// True once `enable_debug` has been applied
    pub fn is_debug(&self) -> bool {
        self.get(DEBUG_CONTEXTS) == Some("all")
    }
}

impl Default for BrokerConnectionConfig {
    fn default() -> Self {
        Self::new()
    }
}
