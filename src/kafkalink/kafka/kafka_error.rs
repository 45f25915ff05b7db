use rdkafka::error::KafkaError;
use rdkafka::types::RDKafkaErrorCode;

/// Unified error type for producer and consumer sessions
///
/// Every failure is surfaced once to the immediate caller. The consumer keeps
/// "nothing arrived" and "end of partition" as their own variants so that
/// callers relying on a single error channel can still tell them apart.
#[derive(Debug, thiserror::Error)]
pub enum KafkaClientError {
    /// The client handle could not be created from the configuration
    #[error("Failed to create Kafka client: {0}")]
    ClientCreation(#[source] KafkaError),

    /// A broker list could not be handed to the client
    #[error("Invalid broker list '{0}'")]
    InvalidBrokerList(String),

    /// The client refused to enqueue a message
    #[error("Failed to enqueue message for topic '{topic}': {source}")]
    Enqueue {
        topic: String,
        #[source]
        source: KafkaError,
    },

    /// Flush reported something other than a timeout
    #[error("Flush failed: {0}")]
    Flush(#[source] KafkaError),

    /// No message arrived within the poll timeout
    #[error("No message available")]
    NoMessage,

    /// The consumer reached the end of the partition
    #[error("Reached end of partition {partition} of topic '{topic}' at offset {offset}")]
    EndOfPartition {
        topic: String,
        partition: i32,
        offset: i64,
    },

    /// Any other broker or client error, text preserved
    #[error("{message}")]
    Broker {
        code: Option<RDKafkaErrorCode>,
        message: String,
    },

    /// Settings could not be loaded or were incomplete
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KafkaClientError {
    /// True for the "nothing arrived within the timeout" case
    pub fn is_no_data(&self) -> bool {
        matches!(self, KafkaClientError::NoMessage)
    }

    pub fn is_end_of_partition(&self) -> bool {
        matches!(self, KafkaClientError::EndOfPartition { .. })
    }

    /// Build a `Broker` error from the client's error, keeping its text
    pub fn from_broker(err: &KafkaError) -> Self {
        KafkaClientError::Broker {
            code: err.rdkafka_error_code(),
            message: err.to_string(),
        }
    }
}

/// Type alias for producer operations
pub type ProducerError = KafkaClientError;

/// Type alias for consumer operations
pub type ConsumerError = KafkaClientError;

pub type KafkaClientResult<T> = Result<T, KafkaClientError>;
