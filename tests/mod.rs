// Test Module Organization


// Integration tests - Run against an in-process librdkafka mock cluster
pub mod integration;
