pub mod entry;
pub mod operations;
pub mod service;
pub mod watcher;
