//! Test data factories

mod fixtures;

pub use fixtures::{TestDataFactory, TestScenario};
