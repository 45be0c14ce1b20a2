//! Detects author styles that a class-prefixed style framework silently
//! overrides, and offers reversible inline-style remediation.
//!
//! The usual entry points are [`scan::Scanner`] for one-off scans and
//! [`inspector::Inspector`] for a session that follows DOM mutations.

pub mod audit;
pub mod config;
pub mod dom;
pub mod error;
pub mod events;
pub mod inspector;
pub mod parser;
pub mod scan;
pub mod style;
pub mod watch;

pub use config::ScanConfig;
pub use error::{Result, ScanError};
