// # homedns-core
//
// Core library for the homedns dynamic-DNS updater.
//
// ## Architecture Overview
//
// - **IpResolver**: trait for discovering the current public IP
// - **DnsProvider**: trait for record operations against a provider API
// - **Reconciler**: bootstrap-then-poll loop that keeps one A (and
//   optionally one AAAA) record pointed at the current address
// - **Config**: immutable configuration loaded once at startup
//
// Provider and resolver implementations live in their own crates and are
// injected into the reconciler as trait objects; this crate carries no
// HTTP client of its own.

pub mod config;
pub mod error;
pub mod reconciler;
pub mod traits;

// Re-export core types for convenience
pub use config::{Config, DnsConfig};
pub use error::{Error, Result};
pub use reconciler::Reconciler;
pub use traits::{DnsProvider, DnsRecord, IpFamily, IpResolver, RecordType};
