//! SQLite persistence adapters.

pub mod connection;
pub mod migrations;
pub mod state_repository;
pub mod task_repository;

pub use connection::{create_pool, create_test_pool, ConnectionError, PoolConfig};
pub use migrations::{all_embedded_migrations, Migrator};
pub use state_repository::{SqliteQuotaStateRepository, SqliteSafetyStateRepository};
pub use task_repository::SqliteTaskRepository;
