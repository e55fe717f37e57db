//! Compiles EasyList-family filter lists into declarative network rules and keeps
//! the committed rule set in sync with remote lists and user filters.

pub mod api;
pub mod compiler;
pub mod config;
pub mod error;
pub mod fetch;
pub mod init;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod sync;
