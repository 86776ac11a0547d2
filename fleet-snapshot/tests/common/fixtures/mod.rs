//! This module provides reusable test utilities:
//! - A scriptable in-memory Fleet API
//! - A mock HTTP Fleet API server
//! - Test configuration directories
//! - In-memory test databases and temporary storage roots
//! - Common test data

// Each test binary uses a different subset of the fixtures
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod fake_fleet;
pub mod mock_fleet_server;
pub mod test_config;
pub mod test_data;
pub mod test_database;
pub mod test_storage;

// Re-export commonly used items
pub use fake_fleet::FakeFleet;
pub use mock_fleet_server::MockFleetServer;
pub use test_config::TestConfigBuilder;
pub use test_data::*;
pub use test_database::test_database;
pub use test_storage::TestStorage;
