//! Transport contracts shared by coordinator adapters.
//!
//! Route constants and wire DTOs only. Keep these free of HTTP client types
//! so the mock and HTTP transports can share them.

pub mod coordinator;
