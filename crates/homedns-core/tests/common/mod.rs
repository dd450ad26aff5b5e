//! Test doubles and helpers for reconciler contract tests
//!
//! The doubles record every provider/resolver interaction behind atomic
//! counters so tests can assert exact call counts and ordering.

use homedns_core::config::{Config, DnsConfig};
use homedns_core::error::{Error, Result};
use homedns_core::traits::{DnsProvider, DnsRecord, IpFamily, IpResolver, RecordType};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A scripted DnsProvider backed by an in-memory record table
///
/// Cloning shares the table and all counters, so a test can hand one
/// clone to the reconciler and keep another for assertions.
#[derive(Clone)]
pub struct ScriptedDnsProvider {
    records: Arc<Mutex<Vec<DnsRecord>>>,
    next_id: Arc<AtomicUsize>,
    list_calls: Arc<AtomicUsize>,
    create_calls: Arc<AtomicUsize>,
    update_calls: Arc<AtomicUsize>,
    /// (host, type, value) per create, in call order
    created: Arc<Mutex<Vec<(String, RecordType, String)>>>,
    /// (record_id, type, value) per successful update, in call order
    updated: Arc<Mutex<Vec<(String, RecordType, String)>>>,
    /// When set, update_record fails with this HTTP status
    fail_updates_with: Arc<Mutex<Option<u16>>>,
    /// When set, create_record reports success but stores nothing
    drop_creates: Arc<AtomicBool>,
}

impl ScriptedDnsProvider {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicUsize::new(1)),
            list_calls: Arc::new(AtomicUsize::new(0)),
            create_calls: Arc::new(AtomicUsize::new(0)),
            update_calls: Arc::new(AtomicUsize::new(0)),
            created: Arc::new(Mutex::new(Vec::new())),
            updated: Arc::new(Mutex::new(Vec::new())),
            fail_updates_with: Arc::new(Mutex::new(None)),
            drop_creates: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Seed a record as if it already existed on the provider side
    pub fn with_record(self, host: &str, record_type: RecordType, value: &str) -> Self {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.records.lock().unwrap().push(DnsRecord {
            id: format!("rec-{}", id),
            host: host.to_string(),
            record_type,
            value: value.to_string(),
        });
        self
    }

    /// Make subsequent update_record calls fail with the given status
    pub fn fail_updates_with(&self, status: Option<u16>) {
        *self.fail_updates_with.lock().unwrap() = status;
    }

    /// Make subsequent create_record calls succeed without storing
    pub fn drop_creates(&self, drop: bool) {
        self.drop_creates.store(drop, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<(String, RecordType, String)> {
        self.created.lock().unwrap().clone()
    }

    pub fn updated(&self) -> Vec<(String, RecordType, String)> {
        self.updated.lock().unwrap().clone()
    }

    /// Current provider-side value of a record, if present
    pub fn value_of(&self, host: &str, record_type: RecordType) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.host == host && r.record_type == record_type)
            .map(|r| r.value.clone())
    }
}

#[async_trait::async_trait]
impl DnsProvider for ScriptedDnsProvider {
    async fn list_records(&self, _domain: &str) -> Result<Vec<DnsRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().clone())
    }

    async fn create_record(
        &self,
        _domain: &str,
        host: &str,
        record_type: RecordType,
        value: &str,
    ) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.created
            .lock()
            .unwrap()
            .push((host.to_string(), record_type, value.to_string()));

        if !self.drop_creates.load(Ordering::SeqCst) {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.records.lock().unwrap().push(DnsRecord {
                id: format!("rec-{}", id),
                host: host.to_string(),
                record_type,
                value: value.to_string(),
            });
        }
        Ok(())
    }

    async fn update_record(
        &self,
        record_id: &str,
        _host: &str,
        record_type: RecordType,
        value: &str,
    ) -> Result<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(status) = *self.fail_updates_with.lock().unwrap() {
            return Err(Error::api(status, "injected update failure"));
        }

        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| Error::not_found(format!("record {}", record_id)))?;
        record.value = value.to_string();

        self.updated
            .lock()
            .unwrap()
            .push((record_id.to_string(), record_type, value.to_string()));
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// A resolver returning fixed addresses, adjustable mid-test
#[derive(Clone)]
pub struct MockIpResolver {
    v4: Arc<Mutex<IpAddr>>,
    v6: Arc<Mutex<IpAddr>>,
    v4_calls: Arc<AtomicUsize>,
    v6_calls: Arc<AtomicUsize>,
    fail_v4: Arc<AtomicBool>,
}

impl MockIpResolver {
    pub fn new(v4: &str, v6: &str) -> Self {
        Self {
            v4: Arc::new(Mutex::new(v4.parse().unwrap())),
            v6: Arc::new(Mutex::new(v6.parse().unwrap())),
            v4_calls: Arc::new(AtomicUsize::new(0)),
            v6_calls: Arc::new(AtomicUsize::new(0)),
            fail_v4: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Simulate the public IPv4 changing
    pub fn set_v4(&self, ip: &str) {
        *self.v4.lock().unwrap() = ip.parse().unwrap();
    }

    /// Make subsequent IPv4 resolutions fail with a network error
    pub fn fail_v4(&self, fail: bool) {
        self.fail_v4.store(fail, Ordering::SeqCst);
    }

    pub fn v4_calls(&self) -> usize {
        self.v4_calls.load(Ordering::SeqCst)
    }

    pub fn v6_calls(&self) -> usize {
        self.v6_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpResolver for MockIpResolver {
    async fn resolve(&self, family: IpFamily) -> Result<IpAddr> {
        match family {
            IpFamily::V4 => {
                self.v4_calls.fetch_add(1, Ordering::SeqCst);
                if self.fail_v4.load(Ordering::SeqCst) {
                    return Err(Error::network("injected resolution failure"));
                }
                Ok(*self.v4.lock().unwrap())
            }
            IpFamily::V6 => {
                self.v6_calls.fetch_add(1, Ordering::SeqCst);
                Ok(*self.v6.lock().unwrap())
            }
        }
    }
}

/// Minimal configuration for reconciler tests
pub fn test_config(enable_ipv6: bool) -> Config {
    Config {
        domain: "example.com".to_string(),
        sub_domain: "home".to_string(),
        enable_ipv6,
        poll_interval_secs: 1,
        dns: DnsConfig::Cloudflare {
            email: "test@example.com".to_string(),
            api_key: "test-key".to_string(),
        },
    }
}
