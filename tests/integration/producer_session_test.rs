use super::*;

const FLUSH_TIMEOUT_MS: u64 = 5000;
const POLL_TIMEOUT_MS: u64 = 5000;

fn consumer_for(bootstrap_servers: &str, topic: &str) -> ConsumerSession {
    let config = BrokerConnectionConfig::new()
        .with_bootstrap_servers(bootstrap_servers)
        .with_group_id(&generate_group_id("producer-test"));
    ConsumerSession::with_config(topic, config)
        .expect("Failed to create consumer")
        .with_poll_timeout(POLL_TIMEOUT_MS)
}

#[test]
#[serial]
fn test_sent_message_is_fetched_at_offset_zero() {
    let cluster = mock_cluster(&["orders"]);
    let brokers = cluster.bootstrap_servers();

    let mut producer = ProducerSession::new("orders", &brokers).expect("Failed to create producer");
    producer
        .send_messages(b"order-42", FLUSH_TIMEOUT_MS, false)
        .expect("Failed to send message");

    let report = producer.last_delivery().expect("delivery report");
    assert!(report.is_delivered(), "delivery failed: {:?}", report.error);
    assert_eq!(report.offset, 0);

    let consumer = consumer_for(&brokers, "orders");
    let payload = consumer
        .fetch_messages("orders", 0, 0, POLL_TIMEOUT_MS)
        .expect("Failed to fetch message");
    assert_eq!(payload, b"order-42".to_vec());
}

#[test]
#[serial]
fn test_queue_is_empty_after_send() {
    let topic = generate_topic("drain");
    let cluster = mock_cluster(&[&topic]);

    let mut producer = ProducerSession::new(&topic, &cluster.bootstrap_servers())
        .expect("Failed to create producer")
        .with_flush_timeout(FLUSH_TIMEOUT_MS);
    for i in 0..3 {
        producer
            .send(format!("payload-{}", i).as_bytes())
            .expect("Failed to send message");
        assert_eq!(producer.queue_depth(), 0);
    }
}

#[test]
#[serial]
fn test_debug_send_flags_session_config() {
    let topic = generate_topic("debug");
    let cluster = mock_cluster(&[&topic]);

    let mut producer =
        ProducerSession::new(&topic, &cluster.bootstrap_servers()).expect("Failed to create producer");
    assert!(!producer.config().is_debug());

    producer
        .send_messages(b"verbose", FLUSH_TIMEOUT_MS, true)
        .expect("Failed to send message");
    assert!(producer.config().is_debug());
    assert_eq!(producer.config().get(LOG_LEVEL), Some("7"));
    assert!(producer.last_delivery().map(|r| r.is_delivered()).unwrap_or(false));
}

#[test]
#[serial]
fn test_purged_message_is_never_consumed() {
    let topic = generate_topic("purge");
    let cluster = mock_cluster(&[&topic]);
    let brokers = cluster.bootstrap_servers();

    let config = BrokerConnectionConfig::new()
        .with_bootstrap_servers(&brokers)
        .with_property("linger.ms", "60000");
    let producer = ProducerSession::with_config(&topic, config).expect("Failed to create producer");

    producer.enqueue(b"discarded").expect("Failed to enqueue");
    producer.purge();
    assert!(producer.flush(FLUSH_TIMEOUT_MS));
    assert_eq!(producer.queue_depth(), 0);
    assert!(producer.last_delivery().expect("purge report").is_purged());

    let consumer = consumer_for(&brokers, &topic);
    assert!(consumer.fetch_messages(&topic, 0, 0, 2000).is_err());
}

#[test]
#[serial]
fn test_add_brokers_reaches_cluster_after_dead_bootstrap() {
    let topic = generate_topic("add-brokers");
    let cluster = mock_cluster(&[&topic]);
    let brokers = cluster.bootstrap_servers();

    let mut producer = ProducerSession::new(&topic, UNREACHABLE_BROKER).expect("Failed to create producer");
    assert_eq!(producer.add_brokers("127.0.0.1:2,127.0.0.1:3").unwrap(), 2);
    assert!(producer.add_brokers(&brokers).unwrap() >= 1);

    producer
        .send_messages(b"via-added-broker", 10_000, false)
        .expect("Failed to send message");
    assert!(producer.last_delivery().map(|r| r.is_delivered()).unwrap_or(false));

    let consumer = consumer_for(&brokers, &topic);
    assert_eq!(
        consumer.fetch_messages(&topic, 0, 0, POLL_TIMEOUT_MS).unwrap(),
        b"via-added-broker".to_vec()
    );
}

#[test]
#[serial]
fn test_send_to_unreachable_broker_times_out_without_error() {
    init_logger();
    let mut producer = ProducerSession::new("orders", UNREACHABLE_BROKER)
        .expect("Failed to create producer")
        .with_close_timeout(100);

    let started = Instant::now();
    producer
        .send_messages(b"lost", 200, false)
        .expect("flush timeouts are not errors");
    assert!(started.elapsed() < Duration::from_secs(5));

    // The purge between the two flushes discarded the queued message
    assert!(producer.flush(1000));
    assert_eq!(producer.queue_depth(), 0);
}

#[test]
#[serial]
fn test_set_topic_redirects_sends() {
    let first = generate_topic("first");
    let second = generate_topic("second");
    let cluster = mock_cluster(&[&first, &second]);
    let brokers = cluster.bootstrap_servers();

    let mut producer = ProducerSession::new(&first, &brokers).expect("Failed to create producer");
    producer.set_topic(&second);
    producer
        .send_messages(b"redirected", FLUSH_TIMEOUT_MS, false)
        .expect("Failed to send message");

    let report = producer.last_delivery().expect("delivery report");
    assert_eq!(report.topic, second);

    let consumer = consumer_for(&brokers, &second);
    assert_eq!(consumer.fetch_at(0, 0).unwrap(), b"redirected".to_vec());
}

fn single_slot_producer(topic: &str) -> ProducerSession {
    let config = BrokerConnectionConfig::new()
        .with_bootstrap_servers(UNREACHABLE_BROKER)
        .with_property("queue.buffering.max.messages", "1");
    ProducerSession::with_config(topic, config)
        .expect("Failed to create producer")
        .with_close_timeout(100)
}

#[test]
#[serial]
fn test_enqueue_into_full_queue_is_refused() {
    init_logger();
    let producer = single_slot_producer("orders");

    producer.enqueue(b"fills-the-queue").expect("first enqueue");
    let err = producer.enqueue(b"overflow").unwrap_err();

    match &err {
        KafkaClientError::Enqueue { topic, source } => {
            assert_eq!(topic, "orders");
            assert_eq!(
                source.rdkafka_error_code(),
                Some(rdkafka::types::RDKafkaErrorCode::QueueFull)
            );
        }
        other => panic!("expected enqueue error, got {:?}", other),
    }
    assert!(err.to_string().starts_with("Failed to enqueue message for topic 'orders'"));
    assert!(err.to_string().contains("Queue full"));

    producer.purge();
    assert!(producer.flush(1000));
}

#[test]
#[serial]
fn test_send_messages_reports_refused_enqueue() {
    init_logger();
    let mut producer = single_slot_producer("orders");
    producer.enqueue(b"fills-the-queue").expect("first enqueue");

    let result = producer.send_messages(b"overflow", 200, false);
    assert!(
        matches!(result, Err(KafkaClientError::Enqueue { .. })),
        "unexpected result: {:?}",
        result
    );
    // The refused message never reached the queue
    assert_eq!(producer.queue_depth(), 1);

    producer.purge();
    assert!(producer.flush(1000));
}
