use std::path::Path;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use vitalis_config::VitalisConfig;
use vitalis_db::bootstrap::BootstrapReport;
use vitalis_db::service::RecordService;

/// Everything a command handler needs once the store is ready.
pub struct AppContext {
    pub service: RecordService,
    pub config: VitalisConfig,
    pub report: BootstrapReport,
}

impl AppContext {
    /// Provision the store directory and run the schema bootstrap.
    ///
    /// Ctrl-C during startup cancels the bootstrap instead of killing the
    /// process mid-migration.
    pub async fn init(config: VitalisConfig) -> anyhow::Result<Self> {
        ensure_parent_dir(&config)?;

        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        let opened = RecordService::open(&config, &cancel).await;
        watcher.abort();
        let (service, report) = opened?;

        tracing::debug!(attempts = report.attempts, applied = ?report.applied, "record store ready");
        Ok(Self {
            service,
            config,
            report,
        })
    }

    /// Listing limit: `--limit` when given, otherwise the configured default.
    #[must_use]
    pub fn effective_limit(&self, flag: Option<u32>) -> u32 {
        flag.unwrap_or(self.config.general.default_limit)
    }
}

fn ensure_parent_dir(config: &VitalisConfig) -> anyhow::Result<()> {
    if config.database.is_in_memory() {
        return Ok(());
    }
    let Some(parent) = Path::new(&config.database.path).parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))
}
