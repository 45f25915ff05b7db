//! Session settings
//!
//! Supports layered configuration:
//! 1. Defaults (`kafka:9092`, 1s flush and poll timeouts)
//! 2. A YAML document (`from_yaml_str` / `from_file`)
//! 3. Environment variables (`apply_env_overrides` / `from_env`)
//! 4. Builder methods for runtime customization
//!
//! # Environment Variables
//! - `KAFKALINK_BOOTSTRAP_SERVERS`: broker list
//! - `KAFKALINK_GROUP_ID`: consumer group id
//! - `KAFKALINK_TOPIC`: session topic
//! - `KAFKALINK_CLIENT_ID`: client id
//! - `KAFKALINK_DEBUG`: `true`/`1` enables librdkafka debugging
//! - `KAFKALINK_FLUSH_TIMEOUT_MS`, `KAFKALINK_POLL_TIMEOUT_MS`,
//!   `KAFKALINK_CLOSE_TIMEOUT_MS`: timeouts in milliseconds
//! - `KAFKALINK_BROKER_ADDRESS_FAMILY`: `v4`, `v6` or `any`
//!
//! ```rust
//! use kafkalink::SessionSettings;
//!
//! let settings = SessionSettings::from_yaml_str(
//!     "bootstrap_servers: broker1:9092\ntopic: orders\ngroup_id: billing\n",
//! )
//! .unwrap();
//! assert_eq!(settings.topic.as_deref(), Some("orders"));
//! ```

use crate::kafkalink::kafka::connection_config::{BrokerAddressFamily, BrokerConnectionConfig};
use crate::kafkalink::kafka::consumer_session::{ConsumerSession, DEFAULT_POLL_TIMEOUT_MS};
use crate::kafkalink::kafka::kafka_error::{KafkaClientError, KafkaClientResult};
use crate::kafkalink::kafka::producer_session::{
    DEFAULT_BOOTSTRAP_SERVERS, DEFAULT_CLOSE_TIMEOUT_MS, DEFAULT_FLUSH_TIMEOUT_MS, ProducerSession,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::Path;

pub const ENV_BOOTSTRAP_SERVERS: &str = "KAFKALINK_BOOTSTRAP_SERVERS";
pub const ENV_GROUP_ID: &str = "KAFKALINK_GROUP_ID";
pub const ENV_TOPIC: &str = "KAFKALINK_TOPIC";
pub const ENV_CLIENT_ID: &str = "KAFKALINK_CLIENT_ID";
pub const ENV_DEBUG: &str = "KAFKALINK_DEBUG";
pub const ENV_FLUSH_TIMEOUT_MS: &str = "KAFKALINK_FLUSH_TIMEOUT_MS";
pub const ENV_POLL_TIMEOUT_MS: &str = "KAFKALINK_POLL_TIMEOUT_MS";
pub const ENV_CLOSE_TIMEOUT_MS: &str = "KAFKALINK_CLOSE_TIMEOUT_MS";

/// Settings from which connection configurations and sessions are built
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSettings {
    /// Broker list, "host:port" or comma-separated
    pub bootstrap_servers: String,
    pub group_id: Option<String>,
    pub topic: Option<String>,
    pub client_id: Option<String>,
    pub debug: bool,
    pub flush_timeout_ms: u64,
    pub poll_timeout_ms: u64,
    pub close_timeout_ms: u64,
    /// `v4`, `v6` or `any`
    pub broker_address_family: Option<String>,
    /// Extra librdkafka properties passed through unchanged
    pub properties: HashMap<String, String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            bootstrap_servers: DEFAULT_BOOTSTRAP_SERVERS.to_string(),
            group_id: None,
            topic: None,
            client_id: None,
            debug: false,
            flush_timeout_ms: DEFAULT_FLUSH_TIMEOUT_MS,
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            close_timeout_ms: DEFAULT_CLOSE_TIMEOUT_MS,
            broker_address_family: None,
            properties: HashMap::new(),
        }
    }
}

impl SessionSettings {
    pub fn new(bootstrap_servers: impl Into<String>) -> Self {
        Self {
            bootstrap_servers: bootstrap_servers.into(),
            ..Default::default()
        }
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        Self::default().apply_env_overrides()
    }

    pub fn from_yaml_str(yaml: &str) -> KafkaClientResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| KafkaClientError::Config(format!("invalid settings document: {}", e)))
    }

    pub fn from_file(path: impl AsRef<Path>) -> KafkaClientResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            KafkaClientError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Applies `KAFKALINK_*` variables on top of the current values
    ///
    /// Unparseable numbers are ignored with a warning.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(brokers) = env::var(ENV_BOOTSTRAP_SERVERS) {
            self.bootstrap_servers = brokers;
        }
        if let Ok(group_id) = env::var(ENV_GROUP_ID) {
            self.group_id = Some(group_id);
        }
        if let Ok(topic) = env::var(ENV_TOPIC) {
            self.topic = Some(topic);
        }
        if let Ok(client_id) = env::var(ENV_CLIENT_ID) {
            self.client_id = Some(client_id);
        }
        if let Ok(debug) = env::var(ENV_DEBUG) {
            self.debug = debug.eq_ignore_ascii_case("true") || debug == "1";
        }
        if let Some(ms) = env_millis(ENV_FLUSH_TIMEOUT_MS) {
            self.flush_timeout_ms = ms;
        }
        if let Some(ms) = env_millis(ENV_POLL_TIMEOUT_MS) {
            self.poll_timeout_ms = ms;
        }
        if let Some(ms) = env_millis(ENV_CLOSE_TIMEOUT_MS) {
            self.close_timeout_ms = ms;
        }
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Assembles a connection configuration from these settings
    pub fn connection_config(&self) -> KafkaClientResult<BrokerConnectionConfig> {
        let mut config = BrokerConnectionConfig::new()
            .with_bootstrap_servers(&self.bootstrap_servers)
            .with_client_id(self.client_id.as_deref())
            .with_properties(&self.properties)
            .with_debug(self.debug);

        if let Some(group_id) = &self.group_id {
            config.set_group_id(group_id);
        }
        if let Some(family) = &self.broker_address_family {
            let parsed = BrokerAddressFamily::parse(family).ok_or_else(|| {
                KafkaClientError::Config(format!("invalid broker address family '{}'", family))
            })?;
            config.set_broker_address_family(parsed);
        }
        Ok(config)
    }

    pub fn producer_session(&self) -> KafkaClientResult<ProducerSession> {
        let topic = self.require_topic()?;
        Ok(ProducerSession::with_config(topic, self.connection_config()?)?
            .with_flush_timeout(self.flush_timeout_ms)
            .with_close_timeout(self.close_timeout_ms))
    }

    /// Builds a consumer session; a group id is mandatory
    pub fn consumer_session(&self) -> KafkaClientResult<ConsumerSession> {
        let topic = self.require_topic()?;
        if self.group_id.is_none() {
            return Err(KafkaClientError::Config(
                "a consumer session needs a group_id".to_string(),
            ));
        }
        Ok(ConsumerSession::with_config(topic, self.connection_config()?)?
            .with_poll_timeout(self.poll_timeout_ms))
    }

    fn require_topic(&self) -> KafkaClientResult<&str> {
        self.topic
            .as_deref()
            .ok_or_else(|| KafkaClientError::Config("no topic configured".to_string()))
    }
}

fn env_millis(name: &str) -> Option<u64> {
    let value = env::var(name).ok()?;
    match value.parse() {
        Ok(ms) => Some(ms),
        Err(_) => {
            log::warn!("Ignoring {}='{}', expected milliseconds", name, value);
            None
        }
    }
}
