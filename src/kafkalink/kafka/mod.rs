pub mod connection_config;
pub mod consumer_session;
pub mod kafka_error;
pub mod message;
pub mod producer_session;
pub mod session_context;
pub mod shared_queue;
pub mod utils;

pub use connection_config::{BrokerAddressFamily, BrokerConnectionConfig};
pub use consumer_session::{ConsumerSession, LOW_LEVEL_ATTACH_PARTITION};
pub use kafka_error::{ConsumerError, KafkaClientError, KafkaClientResult, ProducerError};
pub use message::{Message, MessageErrorCode, PollOutcome};
pub use producer_session::{DEFAULT_BOOTSTRAP_SERVERS, ProducerSession};
pub use session_context::{DeliveryReport, SessionConsumerContext, SessionProducerContext};
pub use shared_queue::SharedQueue;
