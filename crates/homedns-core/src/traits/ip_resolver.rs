//! Public-IP resolver trait
//!
//! The reconciler asks for the current address once per poll cycle; how the
//! address is discovered (HTTP echo service, routing-table probe) is an
//! implementation detail behind [`IpResolver::resolve`].

use async_trait::async_trait;
use std::net::IpAddr;

/// Address family to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpFamily {
    V4,
    V6,
}

impl std::fmt::Display for IpFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IpFamily::V4 => write!(f, "IPv4"),
            IpFamily::V6 => write!(f, "IPv6"),
        }
    }
}

/// Trait for public-IP resolver implementations
///
/// Implementations must be thread-safe and usable across async tasks.
/// They perform a single discovery attempt per call: no retry, no caching.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Resolve the current public address for the given family
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` if the discovery mechanism times out, the
    /// echo service is unreachable, or no route exists for the family.
    async fn resolve(&self, family: IpFamily) -> Result<IpAddr, crate::Error>;
}
