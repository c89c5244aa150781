//! Container lifecycle for docklite: config parsing, persisted container
//! state, and process supervision through an unprivileged sandbox helper.
pub mod config;
pub mod container;
pub mod error;
pub mod supervisor;
pub mod utils;
