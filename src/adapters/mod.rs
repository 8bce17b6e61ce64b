// Adapters layer: concrete table directories and booking stores.

pub mod file_store;
pub mod http_tables;
pub mod memory;

pub use file_store::JsonFileBookingStore;
pub use http_tables::HttpTableDirectory;
pub use memory::{InMemoryBookingStore, InMemoryTableDirectory};
