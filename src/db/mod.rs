pub mod connection;
pub mod lock;
pub mod seen;

pub use lock::RunLock;
#[cfg(test)]
pub use seen::MemorySeenStore;
pub use seen::{SeenStore, SqliteSeenStore};
