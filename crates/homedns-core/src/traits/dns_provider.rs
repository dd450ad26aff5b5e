//! DNS provider trait
//!
//! Defines the capability set the reconciler is written against:
//! list, create, update. Providers are selected once at startup and
//! injected as a trait object; the loop never branches on the concrete
//! variant.
//!
//! Providers are single-shot API wrappers. They hold no record state and
//! implement no retry logic; existence checks and drift detection belong
//! to the reconciler.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// DNS record type managed by homedns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 address record
    #[serde(rename = "A")]
    A,
    /// IPv6 address record
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Wire name of the record type ("A" / "AAAA")
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// The record type an address of this family belongs in
    pub fn for_ip(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::Aaaa,
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A DNS record as seen through the provider API
///
/// `host` is the bare sub-domain label ("home" in "home.example.com").
/// Providers whose wire format carries fully-qualified names derive it by
/// matching against the queried domain; records outside that domain are
/// never surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// Provider-assigned record id, opaque
    pub id: String,
    /// Bare sub-domain label
    pub host: String,
    /// Record type (A or AAAA)
    pub record_type: RecordType,
    /// Record value, an IP address in string form
    pub value: String,
}

/// Trait for DNS provider implementations
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every A/AAAA record in the domain's zone
    ///
    /// Callers filter the result by host and type themselves.
    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Create a record
    ///
    /// The provider gives no idempotency guarantee; callers must check
    /// existence first.
    ///
    /// # Errors
    ///
    /// `Error::Api { status, body }` on a non-success provider response.
    async fn create_record(
        &self,
        domain: &str,
        host: &str,
        record_type: RecordType,
        value: &str,
    ) -> Result<(), crate::Error>;

    /// Update an existing record by id
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if `record_id` does not belong to this
    /// provider/account; `Error::Api` on any other non-success response.
    async fn update_record(
        &self,
        record_id: &str,
        host: &str,
        record_type: RecordType,
        value: &str,
    ) -> Result<(), crate::Error>;

    /// Provider name for logging ("aliyun", "cloudflare")
    fn provider_name(&self) -> &'static str;
}
