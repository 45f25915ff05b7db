//! Producer session
//!
//! Owns one `BaseProducer` bound to a topic. Sending is synchronous: a
//! message is enqueued, the queue is flushed, whatever is still queued is
//! purged and a second flush waits out the purge. The call returns once
//! delivery was attempted; broker acknowledgment is only implied when the
//! client is configured to wait for it.

use crate::kafkalink::kafka::connection_config::BrokerConnectionConfig;
use crate::kafkalink::kafka::kafka_error::{KafkaClientError, ProducerError};
use crate::kafkalink::kafka::session_context::{DeliveryReport, SessionProducerContext};
use crate::kafkalink::kafka::utils::{add_brokers_to_client, split_broker_list};
use log::{debug, info, log, warn, Level};
use rdkafka::error::KafkaError;
use rdkafka::producer::{BaseProducer, BaseRecord, Producer, PurgeConfig};
use rdkafka::types::RDKafkaErrorCode;
use std::time::Duration;

/// Broker list used when none is given
pub const DEFAULT_BOOTSTRAP_SERVERS: &str = "kafka:9092";

/// Flush timeout used by `send`
pub const DEFAULT_FLUSH_TIMEOUT_MS: u64 = 1000;

/// Upper bound for the final flush when a session is dropped
pub const DEFAULT_CLOSE_TIMEOUT_MS: u64 = 5000;

/// Producer session for one topic
pub struct ProducerSession {
    producer: BaseProducer<SessionProducerContext>,
    config: BrokerConnectionConfig,
    topic: String,
    broker_list: String,
    default_flush_timeout: Duration,
    close_timeout: Duration,
}

impl ProducerSession {
    /// Creates a session producing to `topic` through `bootstrap_servers`
    pub fn new(topic: &str, bootstrap_servers: &str) -> Result<Self, ProducerError> {
        let mut config = BrokerConnectionConfig::new();
        config.set_bootstrap_server(bootstrap_servers);
        Self::with_config(topic, config)
    }

    /// Creates a session using [`DEFAULT_BOOTSTRAP_SERVERS`]
    pub fn with_default_brokers(topic: &str) -> Result<Self, ProducerError> {
        Self::new(topic, DEFAULT_BOOTSTRAP_SERVERS)
    }

    pub fn with_config(topic: &str, config: BrokerConnectionConfig) -> Result<Self, ProducerError> {
        let broker_list = config
            .bootstrap_servers()
            .unwrap_or(DEFAULT_BOOTSTRAP_SERVERS)
            .to_string();

        let producer: BaseProducer<SessionProducerContext> = config
            .get_config()
            .create_with_context(SessionProducerContext::new())
            .map_err(KafkaClientError::ClientCreation)?;

        info!(
            "Created ProducerSession connected to {} with topic {}",
            broker_list, topic
        );

        Ok(Self {
            producer,
            config,
            topic: topic.to_string(),
            broker_list,
            default_flush_timeout: Duration::from_millis(DEFAULT_FLUSH_TIMEOUT_MS),
            close_timeout: Duration::from_millis(DEFAULT_CLOSE_TIMEOUT_MS),
        })
    }

    pub fn with_flush_timeout(mut self, timeout_ms: u64) -> Self {
        self.default_flush_timeout = Duration::from_millis(timeout_ms);
        self
    }

    pub fn with_close_timeout(mut self, timeout_ms: u64) -> Self {
        self.close_timeout = Duration::from_millis(timeout_ms);
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Routes subsequent sends to `topic`; the connection is left untouched
    pub fn set_topic(&mut self, topic: &str) -> &mut Self {
        self.topic = topic.to_string();
        self
    }

    pub fn broker_list(&self) -> &str {
        &self.broker_list
    }

    /// The session's configuration
    ///
    /// Starts as the settings the handle was created from. A debug
    /// `send_messages` enables debugging here only, so afterwards this no
    /// longer matches the live handle.
    pub fn config(&self) -> &BrokerConnectionConfig {
        &self.config
    }

    /// `send_messages` with the session flush timeout and no debug output
    pub fn send(&mut self, message: &[u8]) -> Result<(), ProducerError> {
        let timeout_ms = self.default_flush_timeout.as_millis() as u64;
        self.send_messages(message, timeout_ms, false)
    }

    /// Sends `message` to the session topic: enqueue, flush, purge, flush
    ///
    /// With `debug` the session configuration gets librdkafka debugging enabled
    /// and every step is logged at info. The live handle keeps the settings
    /// it was created with.
    ///
    /// A flush that times out is logged and the sequence moves on; any other
    /// flush failure, or a refused enqueue, is returned with the client's
    /// error text.
    pub fn send_messages(
        &mut self,
        message: &[u8],
        flush_timeout_ms: u64,
        debug: bool,
    ) -> Result<(), ProducerError> {
        if debug {
            self.config.enable_debug();
            self.producer.context().set_verbose(true);
        }
        let level = self.step_level();
        let timeout = Duration::from_millis(flush_timeout_ms);

        let added = self.add_brokers(&self.broker_list)?;
        log!(level, "Re-applied {} broker(s) from '{}'", added, self.broker_list);

        self.enqueue(message)?;
        log!(level, "Enqueued {} byte(s) for topic '{}'", message.len(), self.topic);

        self.flush_step(timeout, "first flush")?;

        self.purge();
        log!(level, "Purged send queue, {} message(s) left in flight", self.queue_depth());

        self.flush_step(timeout, "second flush")?;
        Ok(())
    }

    /// Enqueues `message` on the session topic without waiting for delivery
    ///
    /// The client picks the partition and no key is attached.
    pub fn enqueue(&self, message: &[u8]) -> Result<(), ProducerError> {
        let record: BaseRecord<'_, (), [u8]> = BaseRecord::to(&self.topic).payload(message);
        self.producer
            .send(record)
            .map_err(|(source, _)| KafkaClientError::Enqueue {
                topic: self.topic.clone(),
                source,
            })
    }

    /// Blocks until the send queue is empty or `timeout_ms` elapsed
    ///
    /// Returns true when the queue fully drained.
    pub fn flush(&self, timeout_ms: u64) -> bool {
        match self.producer.flush(Duration::from_millis(timeout_ms)) {
            Ok(()) => true,
            Err(e) => {
                debug!("Flush did not drain the queue: {}", e);
                false
            }
        }
    }

    /// Discards queued messages that were not sent yet
    ///
    /// Requests already in flight to the broker are not cancelled.
    pub fn purge(&self) {
        self.producer.purge(PurgeConfig::default().queue());
    }

    /// Appends brokers to the live handle, returning how many were added
    ///
    /// Additive: brokers known from earlier calls or from the bootstrap list
    /// stay usable.
    pub fn add_brokers(&self, broker_list: &str) -> Result<usize, ProducerError> {
        if split_broker_list(broker_list).is_empty() {
            return Ok(0);
        }
        let added = add_brokers_to_client(self.producer.client(), broker_list)?;
        debug!("Added {} broker(s) from '{}' to producer", added, broker_list);
        Ok(added)
    }

    /// Messages queued locally or awaiting acknowledgment
    pub fn queue_depth(&self) -> usize {
        usize::try_from(self.producer.in_flight_count()).unwrap_or(0)
    }

    pub fn last_delivery(&self) -> Option<DeliveryReport> {
        self.producer.context().last_delivery()
    }

    fn step_level(&self) -> Level {
        if self.producer.context().is_verbose() {
            Level::Info
        } else {
            Level::Debug
        }
    }

    fn flush_step(&self, timeout: Duration, step: &str) -> Result<(), ProducerError> {
        match self.producer.flush(timeout) {
            Ok(()) => {
                log!(self.step_level(), "{} drained the send queue", step);
                Ok(())
            }
            Err(e) if is_flush_timeout(&e) => {
                warn!(
                    "{} timed out after {:?} with {} message(s) pending",
                    step,
                    timeout,
                    self.queue_depth()
                );
                Ok(())
            }
            Err(e) => Err(KafkaClientError::Flush(e)),
        }
    }
}

fn is_flush_timeout(err: &KafkaError) -> bool {
    matches!(err.rdkafka_error_code(), Some(RDKafkaErrorCode::OperationTimedOut))
}

impl Drop for ProducerSession {
    fn drop(&mut self) {
        let pending = self.queue_depth();
        if pending > 0 {
            debug!(
                "ProducerSession: Dropping with {} pending message(s), final flush",
                pending
            );
            if let Err(e) = self.producer.flush(self.close_timeout) {
                warn!("ProducerSession: Final flush failed: {}", e);
            }
        }
    }
}
