use rdkafka::Message as RdKafkaMessage;
use rdkafka::error::KafkaError;

/// Classification of a poll error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageErrorCode {
    NoError,
    /// All currently available messages of the partition were consumed
    PartitionEof,
    /// Any other error, with the client's description
    Other(String),
}

impl MessageErrorCode {
    /// Maps a poll error onto the message error code
    pub fn from_kafka_error(err: &KafkaError) -> Self {
        match err {
            KafkaError::PartitionEOF(_) => MessageErrorCode::PartitionEof,
            other => MessageErrorCode::Other(other.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, MessageErrorCode::NoError)
    }
}

/// An owned message detached from the consumer that fetched it
///
/// The payload is an opaque byte blob; no deserialization happens at this
/// layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub payload: Option<Vec<u8>>,
    pub key: Option<Vec<u8>>,
    pub timestamp: Option<i64>,
}

impl Message {
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64, payload: Option<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            payload,
            key: None,
            timestamp: None,
        }
    }

    /// Copies topic, coordinates, key, payload and timestamp out of an rdkafka message
    pub fn from_rdkafka<M: RdKafkaMessage>(msg: &M) -> Self {
        Self {
            topic: msg.topic().to_string(),
            partition: msg.partition(),
            offset: msg.offset(),
            payload: msg.payload().map(<[u8]>::to_vec),
            key: msg.key().map(<[u8]>::to_vec),
            timestamp: msg.timestamp().to_millis(),
        }
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Consumes the message and returns the payload, empty when absent
    pub fn into_payload(self) -> Vec<u8> {
        self.payload.unwrap_or_default()
    }
}

/// Tagged result of a single poll
///
/// Hard errors travel on the `Err` side of the surrounding `Result`.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Message(Message),
    /// Nothing arrived within the timeout
    NoData,
    EndOfPartition {
        topic: String,
        partition: i32,
        offset: i64,
    },
}

impl PollOutcome {
    pub fn is_message(&self) -> bool {
        matches!(self, PollOutcome::Message(_))
    }

    pub fn into_message(self) -> Option<Message> {
        match self {
            PollOutcome::Message(msg) => Some(msg),
            _ => None,
        }
    }
}
