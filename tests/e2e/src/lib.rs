//! End-to-end test support for Mnemos
//!
//! Shared harness and fixtures for the journey tests under `tests/`.

pub mod harness;
pub mod mocks;

pub use harness::{TestStoreManager, TEST_RNG_SEED};
pub use mocks::{TestDataFactory, TestScenario};
