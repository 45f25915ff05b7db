use crate::kafkalink::kafka::utils::convert_kafka_log_level;
use log::{debug, error, info, warn};
use rdkafka::config::RDKafkaLogLevel;
use rdkafka::consumer::ConsumerContext;
use rdkafka::error::KafkaError;
use rdkafka::message::DeliveryResult;
use rdkafka::producer::ProducerContext;
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::{ClientContext, Message};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Outcome of the most recent delivery callback
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub error: Option<KafkaError>,
}

impl DeliveryReport {
    pub fn is_delivered(&self) -> bool {
        self.error.is_none()
    }

    /// True when the message was discarded by a purge rather than failing
    pub fn is_purged(&self) -> bool {
        matches!(
            self.error.as_ref().and_then(KafkaError::rdkafka_error_code),
            Some(RDKafkaErrorCode::PurgeQueue) | Some(RDKafkaErrorCode::PurgeInflight)
        )
    }
}

/// Producer context forwarding librdkafka logs to `log` and recording deliveries
#[derive(Default)]
pub struct SessionProducerContext {
    last_delivery: Mutex<Option<DeliveryReport>>,
    verbose: AtomicBool,
}

impl SessionProducerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_delivery(&self) -> Option<DeliveryReport> {
        self.lock_last_delivery().clone()
    }

    /// Log every delivery report at info instead of debug
    pub fn set_verbose(&self, verbose: bool) {
        self.verbose.store(verbose, Ordering::Relaxed);
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }

    fn lock_last_delivery(&self) -> MutexGuard<'_, Option<DeliveryReport>> {
        // The guarded value is a plain record, a poisoned lock still holds a usable one
        self.last_delivery
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, report: DeliveryReport) {
        match &report.error {
            None if self.is_verbose() => info!(
                "Delivered message to {} [{}] at offset {}",
                report.topic, report.partition, report.offset
            ),
            None => debug!(
                "Delivered message to {} [{}] at offset {}",
                report.topic, report.partition, report.offset
            ),
            Some(err) if report.is_purged() => {
                debug!("Message for topic '{}' purged: {}", report.topic, err)
            }
            Some(err) => warn!("Delivery to topic '{}' failed: {}", report.topic, err),
        }
        *self.lock_last_delivery() = Some(report);
    }
}

impl ClientContext for SessionProducerContext {
    fn log(&self, level: RDKafkaLogLevel, fac: &str, log_message: &str) {
        log::log!(
            convert_kafka_log_level(level),
            "Kafka producer log ({}): {}",
            fac,
            log_message
        );
    }

    fn error(&self, error: KafkaError, reason: &str) {
        error!("Kafka producer client error: {:?}, reason: {}", error, reason);
    }
}

impl ProducerContext for SessionProducerContext {
    type DeliveryOpaque = ();

    fn delivery(&self, delivery_result: &DeliveryResult<'_>, _delivery_opaque: Self::DeliveryOpaque) {
        let report = match delivery_result {
            Ok(msg) => DeliveryReport {
                topic: msg.topic().to_string(),
                partition: msg.partition(),
                offset: msg.offset(),
                error: None,
            },
            Err((err, msg)) => DeliveryReport {
                topic: msg.topic().to_string(),
                partition: msg.partition(),
                offset: -1,
                error: Some(err.clone()),
            },
        };
        self.record(report);
    }
}

/// Consumer context forwarding librdkafka logs and client errors to `log`
#[derive(Default)]
pub struct SessionConsumerContext;

impl ClientContext for SessionConsumerContext {
    fn log(&self, level: RDKafkaLogLevel, fac: &str, log_message: &str) {
        log::log!(
            convert_kafka_log_level(level),
            "Kafka consumer log ({}): {}",
            fac,
            log_message
        );
    }

    fn error(&self, error: KafkaError, reason: &str) {
        error!("Kafka consumer client error: {:?}, reason: {}", error, reason);
    }
}

impl ConsumerContext for SessionConsumerContext {}
