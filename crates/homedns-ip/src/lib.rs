// # Public IP discovery
//
// One resolver, two mechanisms behind the same `resolve(family)` contract:
//
// - **IPv4**: HTTP GET to an external echo service; the response body is
//   the caller's public address as seen from outside. There is no
//   fallback endpoint: the echo service going away takes IPv4 discovery
//   with it.
// - **IPv6**: `connect()` an unconnected UDP socket toward a fixed global
//   IPv6 address. No datagram is ever sent; the call only forces the OS
//   routing table to select the outbound source address, which is then
//   read back with `local_addr()`. Works without any external service but
//   fails when no IPv6 route exists.
//
// No retry logic in either path; a single failure propagates to the
// caller.

use async_trait::async_trait;
use homedns_core::traits::{IpFamily, IpResolver};
use homedns_core::{Error, Result};
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::time::Duration;
use tracing::debug;

/// External "what's my IP" endpoint used for IPv4
const IPV4_ECHO_ENDPOINT: &str = "https://4.ipw.cn";

/// Well-known remote used to steer IPv6 source-address selection
const IPV6_PROBE_ADDR: &str = "[240e:928:1400:105::b]:80";

/// The echo service expects to be talked to like a browser
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/98.0.0.0 Safari/537.36";

/// HTTP timeout for the echo request
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Public IP resolver
pub struct PublicIpResolver {
    echo_endpoint: String,
    probe_addr: String,
    client: reqwest::Client,
}

impl PublicIpResolver {
    /// Create a resolver against the default echo endpoint
    pub fn new() -> Self {
        Self::with_echo_endpoint(IPV4_ECHO_ENDPOINT)
    }

    /// Create a resolver against a custom echo endpoint
    pub fn with_echo_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            echo_endpoint: endpoint.into(),
            probe_addr: IPV6_PROBE_ADDR.to_string(),
            client: reqwest::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .user_agent(BROWSER_USER_AGENT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Fetch the public IPv4 address from the echo service
    async fn resolve_v4(&self) -> Result<IpAddr> {
        let response = self
            .client
            .get(&self.echo_endpoint)
            .send()
            .await
            .map_err(|e| Error::network(format!("IP echo request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "IP echo service returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("failed to read echo response: {}", e)))?;

        let ip = parse_echo_body(&body)?;
        debug!(ip = %ip, "resolved public IPv4");
        Ok(ip)
    }

    /// Read the outbound IPv6 source address off an unconnected socket
    fn resolve_v6(&self) -> Result<IpAddr> {
        let socket = UdpSocket::bind("[::]:0")?;
        // connect() on UDP sends nothing; it only binds the route.
        socket
            .connect(&self.probe_addr)
            .map_err(|e| Error::network(format!("no IPv6 route: {}", e)))?;
        let ip = socket.local_addr()?.ip();

        if ip.is_unspecified() {
            return Err(Error::network("no global IPv6 source address selected"));
        }

        debug!(ip = %ip, "resolved public IPv6");
        Ok(ip)
    }
}

impl Default for PublicIpResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IpResolver for PublicIpResolver {
    async fn resolve(&self, family: IpFamily) -> Result<IpAddr> {
        match family {
            IpFamily::V4 => self.resolve_v4().await,
            IpFamily::V6 => self.resolve_v6(),
        }
    }
}

/// Parse the echo service's response body into an IPv4 address
fn parse_echo_body(body: &str) -> Result<IpAddr> {
    let text = body.trim();
    let ip: Ipv4Addr = text.parse().map_err(|_| {
        Error::network(format!("echo service returned an invalid IPv4 address: {:?}", text))
    })?;
    Ok(IpAddr::V4(ip))
}
