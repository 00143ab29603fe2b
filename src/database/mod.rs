pub mod connection;
pub mod memory;
pub mod quiz;

pub use connection::{Connection, ContentStore, ResultStore, StoreError};
pub use memory::InMemoryStore;
