//! Application services sitting between handlers and the store.

pub mod catalog;
