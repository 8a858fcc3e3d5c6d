//! Integration tests for Shinbun
//!
//! Exercises the aggregation pipeline end to end with scripted sources
//! and verifies the HTTP wire contract over a real loopback listener.

mod support;

#[path = "integration/aggregate_pipeline.rs"]
mod aggregate_pipeline;

#[path = "integration/wire_contract.rs"]
mod wire_contract;
