//! Core business logic module

pub mod coordinator;
pub mod error;
pub mod event_group;
pub mod types;
