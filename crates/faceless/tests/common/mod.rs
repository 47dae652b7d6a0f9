//! Shared test utilities for faceless integration tests.
//!
//! This module provides:
//! - `FakeVideoApi`, a scripted in-memory backend with call counters
//! - `TestHarness` wiring a dashboard to the fake backend
//! - Builders for video projections

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{FakeVideoApi, TestHarness};
