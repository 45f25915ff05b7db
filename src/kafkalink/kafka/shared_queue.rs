use crate::kafkalink::kafka::kafka_error::{KafkaClientError, KafkaClientResult};
use crate::kafkalink::kafka::utils::poll_skipping_client_events;
use log::debug;
use rdkafka::consumer::{BaseConsumer, Consumer, ConsumerContext};
use rdkafka::error::KafkaResult;
use rdkafka::message::BorrowedMessage;
use rdkafka::{Offset, TopicPartitionList};
use std::time::Duration;

/// A single poll point multiplexing several topic/partition attachments
///
/// Attachments accumulate: each `attach` re-assigns the consumer with every
/// partition attached so far, so messages from all of them arrive on the
/// consumer's main queue.
pub struct SharedQueue<'a, C: ConsumerContext + 'static> {
    consumer: &'a BaseConsumer<C>,
    attachments: TopicPartitionList,
}

impl<'a, C: ConsumerContext + 'static> SharedQueue<'a, C> {
    pub fn new(consumer: &'a BaseConsumer<C>) -> Self {
        Self {
            consumer,
            attachments: TopicPartitionList::new(),
        }
    }

    /// Starts consuming `topic`/`partition` from `offset` into this queue
    pub fn attach(&mut self, topic: &str, partition: i32, offset: Offset) -> KafkaClientResult<()> {
        self.attachments
            .add_partition_offset(topic, partition, offset)
            .map_err(|e| KafkaClientError::from_broker(&e))?;
        self.consumer
            .assign(&self.attachments)
            .map_err(|e| KafkaClientError::from_broker(&e))?;
        debug!(
            "Attached {} [{}] at {:?} to shared queue ({} attachments)",
            topic,
            partition,
            offset,
            self.attachments.count()
        );
        Ok(())
    }

    pub fn attachment_count(&self) -> usize {
        self.attachments.count()
    }

    /// Polls for the next message or partition event, waiting at most `timeout`
    ///
    /// Broker connection events of the client are skipped.
    pub fn poll(&self, timeout: Duration) -> Option<KafkaResult<BorrowedMessage<'a>>> {
        let consumer = self.consumer;
        poll_skipping_client_events(|remaining| consumer.poll(remaining), timeout)
    }
}
