//! Reconciliation loop
//!
//! The reconciler owns the whole record-synchronization flow:
//!
//! 1. BOOTSTRAP (once): list the domain's records, create the A record
//!    (and the AAAA record when IPv6 is enabled) if absent, then re-list
//!    and cache `{id, value}` for each tracked record.
//! 2. STEADY POLL (forever): resolve the current public address(es) and
//!    issue one `update_record` per drifted record, keeping the cache in
//!    step with what the provider was last told.
//!
//! Bootstrap errors are fatal and propagate to the caller. A failed poll
//! cycle is logged and the loop continues at the next interval; the cache
//! is only ever mutated after a successful provider call, so a failed
//! update is retried on the following cycle.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsRecord, IpFamily, IpResolver, RecordType};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Locally cached view of one remote record
///
/// `value` is the IP the provider was last known to hold; it is the
/// comparison baseline for drift detection.
#[derive(Debug, Clone)]
struct TrackedRecord {
    id: String,
    value: String,
}

impl From<&DnsRecord> for TrackedRecord {
    fn from(record: &DnsRecord) -> Self {
        Self {
            id: record.id.clone(),
            value: record.value.clone(),
        }
    }
}

/// The reconciliation loop, generic over provider and resolver
///
/// Constructed once at startup with the selected provider injected;
/// assumes exclusive ownership of the (sub_domain, domain) pair.
pub struct Reconciler {
    provider: Box<dyn DnsProvider>,
    resolver: Box<dyn IpResolver>,
    domain: String,
    sub_domain: String,
    enable_ipv6: bool,
    poll_interval: Duration,
    a_record: Option<TrackedRecord>,
    aaaa_record: Option<TrackedRecord>,
}

impl Reconciler {
    /// Create a new reconciler from a validated configuration
    pub fn new(
        provider: Box<dyn DnsProvider>,
        resolver: Box<dyn IpResolver>,
        config: &Config,
    ) -> Self {
        Self {
            provider,
            resolver,
            domain: config.domain.clone(),
            sub_domain: config.sub_domain.clone(),
            enable_ipv6: config.enable_ipv6,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            a_record: None,
            aaaa_record: None,
        }
    }

    /// Fully-qualified name of the managed records
    fn fqdn(&self) -> String {
        format!("{}.{}", self.sub_domain, self.domain)
    }

    /// Ensure the tracked records exist and cache their ids and values
    ///
    /// Run exactly once before polling. Any failure here is fatal: a
    /// record that cannot be created or found leaves nothing to update
    /// later.
    pub async fn bootstrap(&mut self) -> Result<()> {
        let records = self.provider.list_records(&self.domain).await?;

        if find_record(&records, &self.sub_domain, RecordType::A).is_none() {
            let ip = self.resolver.resolve(IpFamily::V4).await?;
            info!(
                record = %self.fqdn(),
                ip = %ip,
                "A record does not exist, creating it"
            );
            self.provider
                .create_record(&self.domain, &self.sub_domain, RecordType::A, &ip.to_string())
                .await?;
        }

        if self.enable_ipv6
            && find_record(&records, &self.sub_domain, RecordType::Aaaa).is_none()
        {
            let ip = self.resolver.resolve(IpFamily::V6).await?;
            info!(
                record = %self.fqdn(),
                ip = %ip,
                "AAAA record does not exist, creating it"
            );
            self.provider
                .create_record(
                    &self.domain,
                    &self.sub_domain,
                    RecordType::Aaaa,
                    &ip.to_string(),
                )
                .await?;
        }

        // Re-list to capture the ids and values of anything just created.
        let records = self.provider.list_records(&self.domain).await?;

        self.a_record = Some(
            find_record(&records, &self.sub_domain, RecordType::A)
                .map(TrackedRecord::from)
                .ok_or_else(|| {
                    Error::not_found(format!("no A record for {} after bootstrap", self.fqdn()))
                })?,
        );

        if self.enable_ipv6 {
            self.aaaa_record = Some(
                find_record(&records, &self.sub_domain, RecordType::Aaaa)
                    .map(TrackedRecord::from)
                    .ok_or_else(|| {
                        Error::not_found(format!(
                            "no AAAA record for {} after bootstrap",
                            self.fqdn()
                        ))
                    })?,
            );
        }

        Ok(())
    }

    /// Run one poll cycle; returns whether any record was updated
    ///
    /// Resolves the current address(es) first, then updates each drifted
    /// record. The cached value moves only after the provider accepted
    /// the update.
    pub async fn poll_once(&mut self) -> Result<bool> {
        let current_v4 = self.resolver.resolve(IpFamily::V4).await?.to_string();
        let current_v6 = if self.enable_ipv6 {
            Some(self.resolver.resolve(IpFamily::V6).await?.to_string())
        } else {
            None
        };

        let mut changed = false;

        let (a_id, a_value) = match &self.a_record {
            Some(tracked) => (tracked.id.clone(), tracked.value.clone()),
            None => return Err(Error::not_found("no tracked A record: bootstrap has not run")),
        };
        if current_v4 != a_value {
            info!(
                record = %self.fqdn(),
                old_ip = %a_value,
                new_ip = %current_v4,
                "public IPv4 changed, updating A record"
            );
            self.provider
                .update_record(&a_id, &self.sub_domain, RecordType::A, &current_v4)
                .await?;
            if let Some(tracked) = self.a_record.as_mut() {
                tracked.value = current_v4.clone();
            }
            changed = true;
        }

        if let Some(current_v6) = current_v6 {
            let (aaaa_id, aaaa_value) = match &self.aaaa_record {
                Some(tracked) => (tracked.id.clone(), tracked.value.clone()),
                None => {
                    return Err(Error::not_found(
                        "no tracked AAAA record: bootstrap has not run",
                    ));
                }
            };
            if current_v6 != aaaa_value {
                info!(
                    record = %self.fqdn(),
                    old_ip = %aaaa_value,
                    new_ip = %current_v6,
                    "public IPv6 changed, updating AAAA record"
                );
                self.provider
                    .update_record(&aaaa_id, &self.sub_domain, RecordType::Aaaa, &current_v6)
                    .await?;
                if let Some(tracked) = self.aaaa_record.as_mut() {
                    tracked.value = current_v6.clone();
                }
                changed = true;
            }
        }

        if !changed {
            debug!(record = %self.fqdn(), ip = %current_v4, "public IP unchanged");
        }

        Ok(changed)
    }

    /// Run the reconciler until a termination signal arrives
    ///
    /// # Returns
    ///
    /// - `Ok(())`: clean shutdown (SIGINT/SIGTERM)
    /// - `Err(Error)`: bootstrap failure
    pub async fn run(&mut self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Test-only entry point with a controlled shutdown signal
    ///
    /// Production code should use [`Reconciler::run`], which listens for
    /// OS signals instead of a programmatic channel.
    pub async fn run_with_shutdown(
        &mut self,
        shutdown_rx: tokio::sync::oneshot::Receiver<()>,
    ) -> Result<()> {
        self.run_internal(Some(shutdown_rx)).await
    }

    async fn run_internal(
        &mut self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        info!(
            provider = self.provider.provider_name(),
            record = %self.fqdn(),
            ipv6 = self.enable_ipv6,
            interval_secs = self.poll_interval.as_secs(),
            "starting reconciliation"
        );

        self.bootstrap().await?;
        info!("bootstrap complete, entering steady poll");

        if let Some(mut rx) = shutdown_rx {
            // Test mode: shutdown driven by the provided channel.
            loop {
                if let Err(e) = self.poll_once().await {
                    warn!(error = %e, "poll cycle failed, retrying next interval");
                }

                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    _ = &mut rx => {
                        info!("shutdown signal received");
                        break;
                    }
                }
            }
        } else {
            // Production mode: shutdown driven by SIGINT/SIGTERM.
            let shutdown = shutdown_signal();
            tokio::pin!(shutdown);

            loop {
                if let Err(e) = self.poll_once().await {
                    warn!(error = %e, "poll cycle failed, retrying next interval");
                }

                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    _ = &mut shutdown => {
                        info!("shutdown signal received");
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}

/// First record matching the configured host and type
///
/// At most one record per (host, type) pair is expected; extras are the
/// provider's problem and the first match wins.
fn find_record<'a>(
    records: &'a [DnsRecord],
    host: &str,
    record_type: RecordType,
) -> Option<&'a DnsRecord> {
    records
        .iter()
        .find(|r| r.host == host && r.record_type == record_type)
}

/// Resolve when SIGINT or SIGTERM is delivered
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler, relying on SIGINT");
            tokio::signal::ctrl_c().await.ok();
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}

/// Resolve when CTRL-C is delivered (non-Unix fallback)
#[cfg(not(unix))]
async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
}
