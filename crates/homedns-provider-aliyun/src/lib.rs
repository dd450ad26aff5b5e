// # Aliyun (Alibaba Cloud) DNS provider
//
// Signed-request variant: every call is an RPC-style GET against the
// alidns endpoint, authenticated with an access-key/secret pair via the
// ACS3-HMAC-SHA256 header signature (see `sign`).
//
// Unlike Cloudflare there is no zone-resolution step; the domain name
// goes straight into each request, and record lookups come back keyed
// `RecordId` / `RR` / `Type` / `Value` with `RR` as the bare host label.
//
// API reference: https://help.aliyun.com/document_detail/29739.html

mod sign;

use async_trait::async_trait;
use homedns_core::traits::{DnsProvider, DnsRecord, RecordType};
use homedns_core::{Error, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// alidns RPC endpoint
const ALIYUN_DNS_HOST: &str = "alidns.cn-hangzhou.aliyuncs.com";

/// alidns API version
const ALIYUN_DNS_VERSION: &str = "2015-01-09";

/// Maximum records per DescribeDomainRecords page
const MAX_PAGE_SIZE: u32 = 100;

/// HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Aliyun DNS provider
pub struct AliyunProvider {
    access_key_id: String,
    access_key_secret: String,
    client: reqwest::Client,
}

// The access-key secret never appears in Debug output.
impl std::fmt::Debug for AliyunProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliyunProvider")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<REDACTED>")
            .finish()
    }
}

impl AliyunProvider {
    /// Create a new Aliyun provider from an access-key pair
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            client: reqwest::Client::builder()
                .timeout(DEFAULT_HTTP_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Issue one signed RPC call and return the success body
    async fn rpc(&self, action: &str, params: &[(&str, String)]) -> Result<String> {
        let query = sign::canonical_query_string(params);
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let nonce = uuid::Uuid::new_v4().simple().to_string();

        let ctx = sign::SignContext {
            host: ALIYUN_DNS_HOST,
            action,
            version: ALIYUN_DNS_VERSION,
            timestamp: &timestamp,
            nonce: &nonce,
        };
        let authorization =
            sign::authorization(&self.access_key_id, &self.access_key_secret, &ctx, &query);

        debug!(action, "calling alidns");
        let url = format!("https://{}/?{}", ALIYUN_DNS_HOST, query);
        let response = self
            .client
            .get(&url)
            .header("x-acs-action", action)
            .header("x-acs-version", ALIYUN_DNS_VERSION)
            .header("x-acs-date", &timestamp)
            .header("x-acs-signature-nonce", &nonce)
            .header("x-acs-content-sha256", sign::EMPTY_BODY_SHA256)
            .header("Authorization", authorization)
            .send()
            .await
            .map_err(|e| Error::network(format!("{} request failed: {}", action, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read response body".to_string());

        if status.is_success() {
            Ok(body)
        } else {
            Err(classify_api_error(status.as_u16(), body))
        }
    }
}

#[async_trait]
impl DnsProvider for AliyunProvider {
    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>> {
        let body = self
            .rpc(
                "DescribeDomainRecords",
                &[
                    ("DomainName", domain.to_string()),
                    ("PageSize", MAX_PAGE_SIZE.to_string()),
                ],
            )
            .await?;

        let wire: DescribeDomainRecordsResponse = serde_json::from_str(&body)?;
        Ok(parse_records(wire))
    }

    async fn create_record(
        &self,
        domain: &str,
        host: &str,
        record_type: RecordType,
        value: &str,
    ) -> Result<()> {
        self.rpc(
            "AddDomainRecord",
            &[
                ("DomainName", domain.to_string()),
                ("RR", host.to_string()),
                ("Type", record_type.as_str().to_string()),
                ("Value", value.to_string()),
            ],
        )
        .await?;
        Ok(())
    }

    async fn update_record(
        &self,
        record_id: &str,
        host: &str,
        record_type: RecordType,
        value: &str,
    ) -> Result<()> {
        self.rpc(
            "UpdateDomainRecord",
            &[
                ("RecordId", record_id.to_string()),
                ("RR", host.to_string()),
                ("Type", record_type.as_str().to_string()),
                ("Value", value.to_string()),
            ],
        )
        .await?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "aliyun"
    }
}

/// Map a non-success response to the right error kind
///
/// alidns reports problems through an error `Code` in the body; record-id
/// ownership failures come back as `InvalidRecordId.*` or
/// `DomainRecordNotBelongToUser` rather than a plain 404.
fn classify_api_error(status: u16, body: String) -> Error {
    if let Some(code) = error_code(&body) {
        if code.starts_with("InvalidRecordId") || code == "DomainRecordNotBelongToUser" {
            return Error::not_found(format!("{}: {}", code, body));
        }
    }
    Error::api(status, body)
}

fn error_code(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("Code")?.as_str().map(str::to_string)
}

fn parse_records(wire: DescribeDomainRecordsResponse) -> Vec<DnsRecord> {
    wire.domain_records
        .record
        .into_iter()
        .filter_map(|r| {
            let record_type = match r.record_type.as_str() {
                "A" => RecordType::A,
                "AAAA" => RecordType::Aaaa,
                _ => return None,
            };
            Some(DnsRecord {
                id: r.record_id,
                host: r.rr,
                record_type,
                value: r.value,
            })
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
struct DescribeDomainRecordsResponse {
    #[serde(rename = "DomainRecords", default)]
    domain_records: DomainRecords,
}

#[derive(Debug, Default, Deserialize)]
struct DomainRecords {
    #[serde(rename = "Record", default)]
    record: Vec<WireRecord>,
}

#[derive(Debug, Deserialize)]
struct WireRecord {
    #[serde(rename = "RecordId")]
    record_id: String,
    #[serde(rename = "RR")]
    rr: String,
    #[serde(rename = "Type")]
    record_type: String,
    #[serde(rename = "Value")]
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_list_parses_and_filters() {
        let body = r#"{
            "TotalCount": 3,
            "RequestId": "536E9CAD-DB30-4647-AC87-AA5CC38C5382",
            "DomainRecords": {
                "Record": [
                    {"RecordId": "9999985", "RR": "home", "Type": "A",
                     "Value": "203.0.113.7", "DomainName": "example.com",
                     "Line": "default", "Status": "ENABLE", "TTL": 600},
                    {"RecordId": "9999986", "RR": "home", "Type": "AAAA",
                     "Value": "2001:db8::1", "DomainName": "example.com"},
                    {"RecordId": "9999987", "RR": "@", "Type": "TXT",
                     "Value": "v=spf1 -all", "DomainName": "example.com"}
                ]
            }
        }"#;

        let wire: DescribeDomainRecordsResponse = serde_json::from_str(body).unwrap();
        let records = parse_records(wire);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "9999985");
        assert_eq!(records[0].host, "home");
        assert_eq!(records[0].record_type, RecordType::A);
        assert_eq!(records[0].value, "203.0.113.7");
        assert_eq!(records[1].record_type, RecordType::Aaaa);
    }

    #[test]
    fn empty_record_list_parses() {
        let body = r#"{"TotalCount": 0, "DomainRecords": {"Record": []}}"#;
        let wire: DescribeDomainRecordsResponse = serde_json::from_str(body).unwrap();
        assert!(parse_records(wire).is_empty());
    }

    #[test]
    fn foreign_record_id_maps_to_not_found() {
        let body = r#"{"Code": "DomainRecordNotBelongToUser", "Message": "..."}"#;
        let err = classify_api_error(400, body.to_string());
        assert!(matches!(err, Error::NotFound(_)));

        let body = r#"{"Code": "InvalidRecordId.Malformed", "Message": "..."}"#;
        let err = classify_api_error(400, body.to_string());
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn other_error_codes_stay_api_errors() {
        let body = r#"{"Code": "Throttling.User", "Message": "slow down"}"#;
        let err = classify_api_error(429, body.to_string());
        assert!(matches!(err, Error::Api { status: 429, .. }));

        // Body that is not JSON at all.
        let err = classify_api_error(502, "<html>bad gateway</html>".to_string());
        assert!(matches!(err, Error::Api { status: 502, .. }));
    }

    #[test]
    fn secret_not_exposed_in_debug() {
        let provider = AliyunProvider::new("AKIDEXAMPLE", "very-secret-value");
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("very-secret-value"));
        assert!(debug.contains("AKIDEXAMPLE"));
    }

    #[test]
    fn provider_name_is_aliyun() {
        let provider = AliyunProvider::new("AKIDEXAMPLE", "secret");
        assert_eq!(provider.provider_name(), "aliyun");
    }
}
