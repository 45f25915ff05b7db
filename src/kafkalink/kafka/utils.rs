use crate::kafkalink::kafka::kafka_error::{KafkaClientError, KafkaClientResult};
use rdkafka::ClientContext;
use rdkafka::client::Client;
use rdkafka::config::RDKafkaLogLevel;
use rdkafka::error::{KafkaError, KafkaResult};
use rdkafka::types::RDKafkaErrorCode;
use std::ffi::CString;
use std::time::{Duration, Instant};

pub fn convert_kafka_log_level(kafka_level: RDKafkaLogLevel) -> log::Level {
    match kafka_level {
        RDKafkaLogLevel::Emerg | RDKafkaLogLevel::Alert | RDKafkaLogLevel::Critical => {
            log::Level::Error
        }
        RDKafkaLogLevel::Error => log::Level::Error,
        RDKafkaLogLevel::Warning => log::Level::Warn,
        RDKafkaLogLevel::Notice | RDKafkaLogLevel::Info => log::Level::Info,
        RDKafkaLogLevel::Debug => log::Level::Debug,
    }
}

/// Splits a comma-separated broker list, dropping blanks and surrounding whitespace
pub fn split_broker_list(broker_list: &str) -> Vec<&str> {
    broker_list
        .split(',')
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .collect()
}

/// Appends brokers to a live client handle
///
/// Returns the number of brokers librdkafka accepted. Brokers already known
/// to the handle are counted again, so re-applying a list is harmless.
pub fn add_brokers_to_client<C: ClientContext>(
    client: &Client<C>,
    broker_list: &str,
) -> KafkaClientResult<usize> {
    let brokers = CString::new(broker_list)
        .map_err(|_| KafkaClientError::InvalidBrokerList(broker_list.to_string()))?;

    // SAFETY: the native handle stays valid for as long as `client` is
    // borrowed, and `brokers` is a NUL-terminated string librdkafka copies.
    let added = unsafe { rdkafka::bindings::rd_kafka_brokers_add(client.native_ptr(), brokers.as_ptr()) };

    Ok(usize::try_from(added).unwrap_or(0))
}

/// True for errors describing the client's broker connections rather than a fetch
///
/// These arrive on the consumer's main queue next to messages.
pub fn is_client_event(err: &KafkaError) -> bool {
    matches!(
        err.rdkafka_error_code(),
        Some(RDKafkaErrorCode::BrokerTransportFailure)
            | Some(RDKafkaErrorCode::AllBrokersDown)
            | Some(RDKafkaErrorCode::Resolve)
    )
}

/// Polls until something other than a client event arrives or `timeout` elapsed
///
/// Client events are logged and skipped; each retry only gets the time left.
pub fn poll_skipping_client_events<M, F>(mut poll: F, timeout: Duration) -> Option<KafkaResult<M>>
where
    F: FnMut(Duration) -> Option<KafkaResult<M>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match poll(remaining) {
            Some(Err(err)) if is_client_event(&err) => {
                log::debug!("Skipping client event while polling: {}", err);
                if Instant::now() >= deadline {
                    return None;
                }
            }
            polled => return polled,
        }
    }
}
