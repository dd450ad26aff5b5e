// # Cloudflare DNS provider
//
// Token-header variant: every request carries the two static
// `X-Auth-Email` / `X-Auth-Key` headers.
//
// Cloudflare scopes record operations to a zone, so the domain name is
// first mapped to its opaque zone identifier via `GET /zones`; the id is
// cached for the process lifetime. Record names in the API are fully
// qualified (`home.example.com`, never the bare `home`), so the configured
// domain is stripped off when records are surfaced; a record under any
// other domain never matches, even with the same leading label.
//
// API reference: https://developers.cloudflare.com/api/

use async_trait::async_trait;
use homedns_core::traits::{DnsProvider, DnsRecord, RecordType};
use homedns_core::{Error, Result};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// TTL sent on record creation (1 = "automatic" on Cloudflare)
const CREATE_TTL: u32 = 1;

/// TTL sent on record updates
const UPDATE_TTL: u32 = 60;

/// Cloudflare DNS provider
pub struct CloudflareProvider {
    email: String,
    api_key: String,
    client: reqwest::Client,
    /// Zone id for the managed domain, resolved on first use
    zone_id: Mutex<Option<String>>,
}

// The API key never appears in Debug output.
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("email", &self.email)
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    pub fn new(email: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            api_key: api_key.into(),
            client: reqwest::Client::builder()
                .timeout(DEFAULT_HTTP_TIMEOUT)
                .build()
                .unwrap_or_default(),
            zone_id: Mutex::new(None),
        }
    }

    /// Attach the auth headers to a request
    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("X-Auth-Email", &self.email)
            .header("X-Auth-Key", &self.api_key)
    }

    /// Resolve the zone id for a domain, caching it for the process
    async fn zone_id(&self, domain: &str) -> Result<String> {
        if let Some(id) = self.zone_id.lock().await.clone() {
            return Ok(id);
        }

        debug!(domain, "resolving Cloudflare zone id");
        let url = format!("{}/zones", CLOUDFLARE_API_BASE);
        let response = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(|e| Error::network(format!("zone list request failed: {}", e)))?;
        let body = read_success_body(response).await?;

        let zones: ZoneListResponse = serde_json::from_str(&body)?;
        let zone = zones
            .result
            .into_iter()
            .find(|z| z.name == domain)
            .ok_or_else(|| Error::not_found(format!("zone {} not found in account", domain)))?;

        debug!(domain, zone_id = %zone.id, "zone resolved");
        *self.zone_id.lock().await = Some(zone.id.clone());
        Ok(zone.id)
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>> {
        let zone_id = self.zone_id(domain).await?;

        let url = format!("{}/zones/{}/dns_records", CLOUDFLARE_API_BASE, zone_id);
        let response = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(|e| Error::network(format!("record list request failed: {}", e)))?;
        let body = read_success_body(response).await?;

        let wire: RecordListResponse = serde_json::from_str(&body)?;
        let records = wire
            .result
            .into_iter()
            .filter_map(|r| {
                let record_type = match r.record_type.as_str() {
                    "A" => RecordType::A,
                    "AAAA" => RecordType::Aaaa,
                    _ => return None,
                };
                // Names are fully qualified; match against the whole
                // domain, never a bare label.
                let host = host_label(&r.name, domain)?;
                Some(DnsRecord {
                    id: r.id,
                    host,
                    record_type,
                    value: r.content,
                })
            })
            .collect();

        Ok(records)
    }

    async fn create_record(
        &self,
        domain: &str,
        host: &str,
        record_type: RecordType,
        value: &str,
    ) -> Result<()> {
        let zone_id = self.zone_id(domain).await?;

        let url = format!("{}/zones/{}/dns_records", CLOUDFLARE_API_BASE, zone_id);
        let response = self
            .authed(self.client.post(&url))
            .json(&record_payload(host, record_type, value, CREATE_TTL))
            .send()
            .await
            .map_err(|e| Error::network(format!("record create request failed: {}", e)))?;
        read_success_body(response).await?;

        Ok(())
    }

    /// Update a record by id
    ///
    /// Relies on the zone id cached by a preceding `list_records` /
    /// `create_record` call; the reconciler always lists at startup.
    async fn update_record(
        &self,
        record_id: &str,
        host: &str,
        record_type: RecordType,
        value: &str,
    ) -> Result<()> {
        let zone_id = self
            .zone_id
            .lock()
            .await
            .clone()
            .ok_or_else(|| Error::not_found("zone id not resolved, list records first"))?;

        let url = format!(
            "{}/zones/{}/dns_records/{}",
            CLOUDFLARE_API_BASE, zone_id, record_id
        );
        let response = self
            .authed(self.client.patch(&url))
            .json(&record_payload(host, record_type, value, UPDATE_TTL))
            .send()
            .await
            .map_err(|e| Error::network(format!("record update request failed: {}", e)))?;
        read_success_body(response).await?;

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

/// Consume a response, mapping non-success statuses to errors
///
/// 404 means the zone/record does not exist (or belongs to someone else);
/// every other non-success status carries its body verbatim.
async fn read_success_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read response body".to_string());

    if status.is_success() {
        Ok(body)
    } else if status == reqwest::StatusCode::NOT_FOUND {
        Err(Error::not_found(body))
    } else {
        Err(Error::api(status.as_u16(), body))
    }
}

/// JSON payload for record create/update
fn record_payload(
    host: &str,
    record_type: RecordType,
    value: &str,
    ttl: u32,
) -> serde_json::Value {
    serde_json::json!({
        "type": record_type.as_str(),
        "name": host,
        "content": value,
        "ttl": ttl,
        "proxied": false,
    })
}

/// Extract the bare host label from a fully-qualified record name
///
/// Returns `None` for the zone apex and for names that are not directly
/// or transitively under `domain`.
fn host_label(name: &str, domain: &str) -> Option<String> {
    name.strip_suffix(domain)
        .and_then(|prefix| prefix.strip_suffix('.'))
        .filter(|label| !label.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Deserialize)]
struct ZoneListResponse {
    #[serde(default)]
    result: Vec<Zone>,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RecordListResponse {
    #[serde(default)]
    result: Vec<WireRecord>,
}

#[derive(Debug, Deserialize)]
struct WireRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
}
