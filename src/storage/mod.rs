pub mod dynamodb;
pub mod error;
pub mod migration;
pub mod models;
pub mod retry;

#[cfg(test)]
pub mod memory;

pub use dynamodb::DynamoDBStore;
pub use migration::{CopyOptions, Migrator, TableCopier};
pub use retry::RetryPolicy;
