// Integration Tests - Run against rdkafka's in-process mock cluster

pub mod producer_session_test;

// Re-export common test utilities
pub(crate) use crate::unit::common::*;
