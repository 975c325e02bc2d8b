use clubdesk::applicants::InMemoryStore;
use clubdesk::config::AppConfig;
use clubdesk::ecomail::{EcomailClient, SyncEngine};
use clubdesk::error::AppError;
use clubdesk::mailbox::MailboxFetcher;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Actor written to the audit ledger for every operation taken through the
/// HTTP surface. The service runs without authentication on a closed
/// network, so there is exactly one operator identity.
pub(crate) const OPERATOR: &str = "operator";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<AppConfig>,
    pub(crate) store: Arc<InMemoryStore>,
    pub(crate) sync: Arc<SyncEngine<EcomailClient>>,
    pub(crate) mailbox: Arc<MailboxFetcher>,
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

impl AppState {
    pub(crate) fn build(
        config: AppConfig,
        readiness: Arc<AtomicBool>,
        metrics: Arc<PrometheusHandle>,
    ) -> Result<Self, AppError> {
        let sync = SyncEngine::new(EcomailClient::new(&config.ecomail)?);
        let mailbox = MailboxFetcher::new(config.mailbox.clone());
        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(InMemoryStore::new()),
            sync: Arc::new(sync),
            mailbox: Arc::new(mailbox),
            readiness,
            metrics,
        })
    }
}

/// Runs a blocking call (IMAP, outbound HTTP) off the async runtime.
pub(crate) async fn run_blocking<T, F>(task: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| AppError::Server(axum::Error::new(err)))
}
