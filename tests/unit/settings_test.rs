use super::common::*;
use kafkalink::kafkalink::config::settings::{
    ENV_BOOTSTRAP_SERVERS, ENV_DEBUG, ENV_FLUSH_TIMEOUT_MS, ENV_GROUP_ID, ENV_POLL_TIMEOUT_MS,
    ENV_TOPIC,
};
use std::io::Write;

fn clear_env() {
    for name in [
        ENV_BOOTSTRAP_SERVERS,
        ENV_GROUP_ID,
        ENV_TOPIC,
        ENV_DEBUG,
        ENV_FLUSH_TIMEOUT_MS,
        ENV_POLL_TIMEOUT_MS,
    ] {
        std::env::remove_var(name);
    }
}

#[test]
#[serial]
fn test_env_overrides_defaults() {
    clear_env();
    std::env::set_var(ENV_BOOTSTRAP_SERVERS, "env-broker:9092");
    std::env::set_var(ENV_TOPIC, "orders");
    std::env::set_var(ENV_GROUP_ID, "billing");
    std::env::set_var(ENV_DEBUG, "TRUE");
    std::env::set_var(ENV_FLUSH_TIMEOUT_MS, "250");

    let settings = SessionSettings::from_env();
    clear_env();

    assert_eq!(settings.bootstrap_servers, "env-broker:9092");
    assert_eq!(settings.topic.as_deref(), Some("orders"));
    assert_eq!(settings.group_id.as_deref(), Some("billing"));
    assert!(settings.debug);
    assert_eq!(settings.flush_timeout_ms, 250);
}

#[test]
#[serial]
fn test_env_overrides_yaml_and_ignores_bad_numbers() {
    clear_env();
    std::env::set_var(ENV_BOOTSTRAP_SERVERS, "env-broker:9092");
    std::env::set_var(ENV_POLL_TIMEOUT_MS, "soon");

    let settings = SessionSettings::from_yaml_str("bootstrap_servers: yaml-broker:9092\npoll_timeout_ms: 300\n")
        .unwrap()
        .apply_env_overrides();
    clear_env();

    assert_eq!(settings.bootstrap_servers, "env-broker:9092");
    assert_eq!(settings.poll_timeout_ms, 300);
}

#[test]
fn test_from_file() {
    let path = std::env::temp_dir().join(format!("kafkalink-settings-{}.yaml", Uuid::new_v4()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "bootstrap_servers: file-broker:9092").unwrap();
    writeln!(file, "topic: payments").unwrap();
    writeln!(file, "close_timeout_ms: 750").unwrap();
    drop(file);

    let settings = SessionSettings::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(settings.bootstrap_servers, "file-broker:9092");
    assert_eq!(settings.topic.as_deref(), Some("payments"));
    assert_eq!(settings.close_timeout_ms, 750);
}

#[test]
fn test_missing_file_is_config_error() {
    let path = std::env::temp_dir().join(format!("kafkalink-missing-{}.yaml", Uuid::new_v4()));
    assert!(matches!(
        SessionSettings::from_file(&path),
        Err(KafkaClientError::Config(_))
    ));
}

#[test]
fn test_producer_session_from_settings() {
    let session = SessionSettings::new(UNREACHABLE_BROKER)
        .with_topic("orders")
        .with_property("linger.ms", "0")
        .producer_session()
        .unwrap();

    assert_eq!(session.topic(), "orders");
    assert_eq!(session.broker_list(), UNREACHABLE_BROKER);
    assert_eq!(session.config().get("linger.ms"), Some("0"));
}

#[test]
fn test_consumer_settings_keep_explicit_commit_mode() {
    let session = SessionSettings::new(UNREACHABLE_BROKER)
        .with_topic("orders")
        .with_group_id("billing")
        .with_property("enable.auto.commit", "true")
        .consumer_session()
        .unwrap();

    assert_eq!(session.config().get("enable.auto.commit"), Some("true"));
    assert_eq!(session.config().get("enable.partition.eof"), Some("true"));
}
