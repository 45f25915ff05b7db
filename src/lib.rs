//! # kafkalink
//!
//! A small synchronous façade over `rdkafka` for applications that want to
//! push a payload to a topic or read one message back without managing
//! client handles themselves.
//!
//! ## Features
//!
//! - **Connection Configuration**: `BrokerConnectionConfig` wraps librdkafka settings with named setters
//! - **Producer Session**: enqueue, flush, purge and flush again in one `send_messages` call
//! - **Consumer Session**: direct topic/partition/offset fetches and a shared low-level queue
//! - **Tagged Poll Outcomes**: `PollOutcome` tells a message from "no data" and end of partition
//! - **Settings**: YAML documents and `KAFKALINK_*` environment variables via `SessionSettings`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kafkalink::{ConsumerSession, ProducerSession};
//!
//! fn main() -> Result<(), kafkalink::KafkaClientError> {
//!     let mut producer = ProducerSession::new("orders", "localhost:9092")?;
//!     producer.send_messages(b"order-42", 1000, false)?;
//!
//!     let consumer = ConsumerSession::new("orders", "billing", "localhost", 9092)?;
//!     let payload = consumer.fetch_messages("orders", 0, 0, 1000)?;
//!     println!("{}", String::from_utf8_lossy(&payload));
//!     Ok(())
//! }
//! ```

#![allow(clippy::needless_doctest_main)]

pub mod kafkalink;

pub use kafkalink::config::SessionSettings;
pub use kafkalink::kafka::{
    BrokerAddressFamily,
    // Configuration
    BrokerConnectionConfig,
    ConsumerError,
    // Sessions
    ConsumerSession,
    DeliveryReport,
    // Errors
    KafkaClientError,
    KafkaClientResult,
    // Messages
    Message,
    MessageErrorCode,
    PollOutcome,
    ProducerError,
    ProducerSession,
};
