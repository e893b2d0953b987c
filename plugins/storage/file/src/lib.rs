mod config;
mod storage;

pub use config::{FileStoreConfig, WriteMode};
pub use storage::FileStore;
