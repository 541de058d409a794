//! Test harness: isolated stores and engines

mod store_manager;

pub use store_manager::{TestStoreManager, TEST_RNG_SEED};
