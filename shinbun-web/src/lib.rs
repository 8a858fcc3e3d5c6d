//! Web API server for Shinbun
//!
//! Thin axum surface over the aggregation core: one endpoint that
//! computes a fresh snapshot and one health probe. Data-availability
//! conditions always ride HTTP 200; the payload shape is the contract.

pub mod handlers;
pub mod server;

pub use server::{AppState, app_router, run_server};
