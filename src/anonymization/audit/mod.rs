//! Audit logging module
//!
//! Append-only record of every pipeline stage. Sampled values are stored as
//! SHA-256 digests only.

pub mod logger;

pub use logger::AuditLogger;
