//! Test database utilities for in-memory SQLite testing

use fleet_snapshot::Database;
use std::sync::Arc;

/// Fresh in-memory database with all tables created
pub async fn test_database() -> Arc<Database> {
    Arc::new(
        Database::in_memory()
            .await
            .expect("Failed to create test database"),
    )
}
