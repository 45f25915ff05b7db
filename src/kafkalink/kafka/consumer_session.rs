//! Consumer session
//!
//! Owns one `BaseConsumer` bound to a topic and a group id, and offers two
//! ways of reading:
//!
//! - **Direct fetch**: assign one explicit topic/partition/offset and poll a
//!   single message. No group-managed offsets are used, the caller supplies
//!   the next offset on every call.
//! - **Low-level queue**: attach topics to one shared queue from their
//!   earliest offset and poll it.
//!
//! Every poll is classified into a message, "no data yet", "end of
//! partition" or a hard error. The `*_outcome` methods expose that
//! classification as a [`PollOutcome`]; the payload-returning methods report
//! everything but a message as an error.

use crate::kafkalink::kafka::connection_config::BrokerConnectionConfig;
use crate::kafkalink::kafka::kafka_error::{ConsumerError, KafkaClientError};
use crate::kafkalink::kafka::message::{Message, MessageErrorCode, PollOutcome};
use crate::kafkalink::kafka::session_context::SessionConsumerContext;
use crate::kafkalink::kafka::shared_queue::SharedQueue;
use crate::kafkalink::kafka::utils::{
    add_brokers_to_client, poll_skipping_client_events, split_broker_list,
};
use log::{debug, info, warn};
use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::error::KafkaResult;
use rdkafka::{Offset, TopicPartitionList};
use std::time::Duration;

/// Partition every topic is attached at by `low_level_consuming`
///
/// The `partition` argument of the low-level operations does not change it.
pub const LOW_LEVEL_ATTACH_PARTITION: i32 = 0;

/// Poll timeout used by `fetch_at` unless the session overrides it
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 1000;

/// Consumer session for one topic and group
pub struct ConsumerSession {
    consumer: BaseConsumer<SessionConsumerContext>,
    config: BrokerConnectionConfig,
    topic: String,
    group_id: String,
    bootstrap_servers: String,
    default_poll_timeout: Duration,
}

impl ConsumerSession {
    /// Creates a session connected to `host:port` in consumer group `group_id`
    pub fn new(topic: &str, group_id: &str, host: &str, port: u16) -> Result<Self, ConsumerError> {
        let mut config = BrokerConnectionConfig::new();
        config
            .set_bootstrap_server(&format!("{}:{}", host, port))
            .set_group_id(group_id);
        Self::with_config(topic, config)
    }

    /// Creates a session from an explicit configuration
    ///
    /// Partition EOF reporting is switched on and auto commit off unless the
    /// configuration already says otherwise.
    pub fn with_config(topic: &str, mut config: BrokerConnectionConfig) -> Result<Self, ConsumerError> {
        config
            .set_default_property("enable.partition.eof", "true")
            .set_default_property("enable.auto.commit", "false");

        let group_id = config.group_id().unwrap_or_default().to_string();
        let bootstrap_servers = config.bootstrap_servers().unwrap_or_default().to_string();

        let consumer: BaseConsumer<SessionConsumerContext> = config
            .get_config()
            .create_with_context(SessionConsumerContext)
            .map_err(KafkaClientError::ClientCreation)?;

        info!(
            "Created ConsumerSession for topic '{}' in group '{}' via {}",
            topic, group_id, bootstrap_servers
        );

        Ok(Self {
            consumer,
            config,
            topic: topic.to_string(),
            group_id,
            bootstrap_servers,
            default_poll_timeout: Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS),
        })
    }

    pub fn with_poll_timeout(mut self, timeout_ms: u64) -> Self {
        self.default_poll_timeout = Duration::from_millis(timeout_ms);
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn set_topic(&mut self, topic: &str) -> &mut Self {
        self.topic = topic.to_string();
        self
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn bootstrap_servers(&self) -> &str {
        &self.bootstrap_servers
    }

    /// The configuration snapshot the handle was created from
    pub fn config(&self) -> &BrokerConnectionConfig {
        &self.config
    }

    /// Fetches the payload of the message at `topic`/`partition`/`offset`
    ///
    /// Timeouts and end of partition are reported as
    /// [`KafkaClientError::NoMessage`] and [`KafkaClientError::EndOfPartition`].
    pub fn fetch_messages(
        &self,
        topic: &str,
        partition: i32,
        offset: i64,
        timeout_ms: u64,
    ) -> Result<Vec<u8>, ConsumerError> {
        outcome_into_payload(self.fetch_outcome(topic, partition, offset, timeout_ms)?)
    }

    /// Same as `fetch_messages` on the session topic with the default timeout
    pub fn fetch_at(&self, partition: i32, offset: i64) -> Result<Vec<u8>, ConsumerError> {
        let timeout_ms = self.default_poll_timeout.as_millis() as u64;
        self.fetch_messages(&self.topic, partition, offset, timeout_ms)
    }

    /// Fetches a single message and returns the classified poll outcome
    pub fn fetch_outcome(
        &self,
        topic: &str,
        partition: i32,
        offset: i64,
        timeout_ms: u64,
    ) -> Result<PollOutcome, ConsumerError> {
        let mut assignment = TopicPartitionList::new();
        assignment
            .add_partition_offset(topic, partition, Offset::Offset(offset))
            .map_err(|e| KafkaClientError::from_broker(&e))?;
        self.consumer
            .assign(&assignment)
            .map_err(|e| KafkaClientError::from_broker(&e))?;

        debug!(
            "Fetching {} [{}] at offset {} (timeout {}ms)",
            topic, partition, offset, timeout_ms
        );

        let polled = poll_skipping_client_events(
            |remaining| self.consumer.poll(remaining),
            Duration::from_millis(timeout_ms),
        );
        let outcome = classify_poll(polled, topic, partition, offset)?;
        Ok(self.with_reached_offset(outcome, offset))
    }

    /// Drains the shared low-level queue, returning the first topic's payload
    ///
    /// The first topic is attached at partition [`LOW_LEVEL_ATTACH_PARTITION`]
    /// from the beginning and the queue is polled for one result. That result is
    /// returned whatever it is, so the remaining topics are never attached in
    /// this call and nothing carries over to the next one.
    pub fn low_level_consuming<S: AsRef<str>>(
        &self,
        topics: &[S],
        partition: i32,
        timeout_ms: u64,
    ) -> Result<Vec<u8>, ConsumerError> {
        outcome_into_payload(self.low_level_outcome(topics, partition, timeout_ms)?)
    }

    /// Tagged variant of `low_level_consuming`
    pub fn low_level_outcome<S: AsRef<str>>(
        &self,
        topics: &[S],
        partition: i32,
        timeout_ms: u64,
    ) -> Result<PollOutcome, ConsumerError> {
        if partition != LOW_LEVEL_ATTACH_PARTITION {
            debug!(
                "Requested partition {} ignored, low-level queue attaches partition {}",
                partition, LOW_LEVEL_ATTACH_PARTITION
            );
        }

        // The first topic's poll result ends the call, later topics are never reached
        let Some(topic) = topics.first().map(AsRef::as_ref) else {
            warn!("low_level_consuming called without topics");
            return Err(KafkaClientError::NoMessage);
        };
        if topics.len() > 1 {
            debug!(
                "Low-level consume returns after '{}', {} later topic(s) not attached",
                topic,
                topics.len() - 1
            );
        }

        let mut queue = SharedQueue::new(&self.consumer);
        queue.attach(topic, LOW_LEVEL_ATTACH_PARTITION, Offset::Beginning)?;

        let start = Offset::Beginning.to_raw().unwrap_or_default();
        let polled = queue.poll(Duration::from_millis(timeout_ms));
        let outcome = classify_poll(polled, topic, LOW_LEVEL_ATTACH_PARTITION, start)?;
        Ok(self.with_reached_offset(outcome, start))
    }

    /// Offset the consumer stopped at when it hit the end of a partition
    ///
    /// The cached high watermark, then the consumer position, then
    /// `requested` when the client knows neither.
    fn reached_offset(&self, topic: &str, partition: i32, requested: i64) -> i64 {
        if let Ok((_, high)) = self.consumer.get_watermark_offsets(topic, partition) {
            if high >= 0 {
                return high;
            }
        }
        let position = self.consumer.position().ok().and_then(|positions| {
            let elem = positions.find_partition(topic, partition)?;
            match elem.offset() {
                Offset::Offset(n) => Some(n),
                _ => None,
            }
        });
        position.unwrap_or(requested)
    }

    fn with_reached_offset(&self, outcome: PollOutcome, requested: i64) -> PollOutcome {
        match outcome {
            PollOutcome::EndOfPartition {
                topic, partition, ..
            } => {
                let offset = self.reached_offset(&topic, partition, requested);
                PollOutcome::EndOfPartition {
                    topic,
                    partition,
                    offset,
                }
            }
            other => other,
        }
    }

    /// Appends brokers to the live handle, returning how many were added
    pub fn add_brokers(&self, broker_list: &str) -> Result<usize, ConsumerError> {
        if split_broker_list(broker_list).is_empty() {
            return Ok(0);
        }
        let added = add_brokers_to_client(self.consumer.client(), broker_list)?;
        debug!("Added {} broker(s) from '{}' to consumer", added, broker_list);
        Ok(added)
    }
}

/// Classifies the result of one poll
///
/// `offset` is the requested start offset; it only describes an end of
/// partition reported by the client. Sessions replace it with the offset
/// actually reached.
pub fn classify_poll<M: rdkafka::Message>(
    polled: Option<KafkaResult<M>>,
    topic: &str,
    partition: i32,
    offset: i64,
) -> Result<PollOutcome, ConsumerError> {
    match polled {
        None => Ok(PollOutcome::NoData),
        Some(Ok(msg)) => Ok(PollOutcome::Message(Message::from_rdkafka(&msg))),
        Some(Err(err)) => match MessageErrorCode::from_kafka_error(&err) {
            MessageErrorCode::PartitionEof => {
                let eof_partition = match err {
                    rdkafka::error::KafkaError::PartitionEOF(p) => p,
                    _ => partition,
                };
                Ok(PollOutcome::EndOfPartition {
                    topic: topic.to_string(),
                    partition: eof_partition,
                    offset,
                })
            }
            _ => Err(KafkaClientError::from_broker(&err)),
        },
    }
}

/// Collapses a poll outcome into a payload, reporting non-messages as errors
pub fn outcome_into_payload(outcome: PollOutcome) -> Result<Vec<u8>, ConsumerError> {
    match outcome {
        PollOutcome::Message(msg) => Ok(msg.into_payload()),
        PollOutcome::NoData => Err(KafkaClientError::NoMessage),
        PollOutcome::EndOfPartition {
            topic,
            partition,
            offset,
        } => Err(KafkaClientError::EndOfPartition {
            topic,
            partition,
            offset,
        }),
    }
}
