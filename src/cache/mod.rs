pub mod error;
pub mod key;
pub mod memory;
pub mod parquet;
pub mod store;
