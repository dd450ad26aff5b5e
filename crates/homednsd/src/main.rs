// # homednsd - homedns daemon
//
// Thin integration layer only: load the configuration file, set up
// logging, select the DNS provider, hand everything to the reconciler.
// All reconciliation logic lives in homedns-core.
//
// ## Configuration
//
// - `HOMEDNS_CONFIG`: path to the YAML configuration file
//   (default: `config/config.yaml`, relative to the working directory)
// - `HOMEDNS_LOG`: log verbosity in tracing EnvFilter syntax
//   (default: `info`)
//
// Logs go to standard error and to `log/homedns.log`.

use anyhow::Result;
use homedns_core::{Config, DnsConfig, DnsProvider, Reconciler};
use homedns_ip::PublicIpResolver;
use homedns_provider_aliyun::AliyunProvider;
use homedns_provider_cloudflare::CloudflareProvider;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Default configuration file location
const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Log file location
const LOG_DIR: &str = "log";
const LOG_FILE: &str = "homedns.log";

/// Exit codes for the different termination scenarios
///
/// - 0: clean shutdown (termination signal)
/// - 1: configuration error
/// - 2: runtime error (bootstrap failure or fatal loop error)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Configuration comes first: a broken file must surface on stderr
    // before any logging machinery is involved.
    let config_path =
        std::env::var("HOMEDNS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    let _log_guard = match init_tracing() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    info!(
        config = %config_path,
        provider = config.dns.type_name(),
        record = %config.fqdn(),
        "starting homednsd"
    );

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => {
                info!("homednsd stopped cleanly");
                DaemonExitCode::CleanShutdown
            }
            Err(e) => {
                error!("fatal error: {:#}", e);
                DaemonExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Install the stderr and file log layers
///
/// The returned guard must stay alive for the process lifetime or the
/// file layer stops flushing.
fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(LOG_DIR, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("HOMEDNS_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .try_init()?;

    Ok(guard)
}

/// Build the components and run the reconciler until shutdown
async fn run_daemon(config: Config) -> Result<()> {
    // Provider selection happens exactly once; the reconciler only ever
    // sees the trait object.
    let provider: Box<dyn DnsProvider> = match &config.dns {
        DnsConfig::Aliyun {
            aliyun_access_key,
            aliyun_access_secret,
        } => Box::new(AliyunProvider::new(
            aliyun_access_key.clone(),
            aliyun_access_secret.clone(),
        )),
        DnsConfig::Cloudflare { email, api_key } => {
            Box::new(CloudflareProvider::new(email.clone(), api_key.clone()))
        }
    };

    let resolver = Box::new(PublicIpResolver::new());

    let mut reconciler = Reconciler::new(provider, resolver, &config);
    reconciler.run().await?;
    Ok(())
}
