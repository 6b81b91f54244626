//! Channel bridge between the egui thread and the async API client.

pub mod commands;
pub mod runtime;
