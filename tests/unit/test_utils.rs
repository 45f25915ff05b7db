use rdkafka::mocking::MockCluster;
use rdkafka::producer::DefaultProducerContext;
use uuid::Uuid;

/// An address nothing listens on
pub(crate) const UNREACHABLE_BROKER: &str = "127.0.0.1:1";

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Topic and group ID generators
pub(crate) fn generate_topic(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

pub(crate) fn generate_group_id(prefix: &str) -> String {
    format!("{}-group-{}", prefix, Uuid::new_v4())
}

/// Starts a single-broker mock cluster with the given single-partition topics
pub(crate) fn mock_cluster(topics: &[&str]) -> MockCluster<'static, DefaultProducerContext> {
    init_logger();
    let cluster = MockCluster::new(1).expect("Failed to start mock cluster");
    for topic in topics {
        cluster
            .create_topic(topic, 1, 1)
            .expect("Failed to create mock topic");
    }
    cluster
}
