//! Modules layer - Infrastructure components for external integrations
//!
//! Contains adapters for local image storage and outbound email.

pub mod mail;
pub mod storage;
