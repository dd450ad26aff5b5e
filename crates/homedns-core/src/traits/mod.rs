//! Core traits for homedns
//!
//! - [`IpResolver`]: discover the machine's current public address
//! - [`DnsProvider`]: list/create/update records via a provider API

pub mod dns_provider;
pub mod ip_resolver;

pub use dns_provider::{DnsProvider, DnsRecord, RecordType};
pub use ip_resolver::{IpFamily, IpResolver};
