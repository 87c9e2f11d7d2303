//! Main application orchestration.
//!
//! Startup order:
//! 1. Fetch the symbol catalog (fatal on failure)
//! 2. Spawn discovery, trade sync, account and order workers
//! 3. Subscribe live prices for the configured symbols
//!
//! Every worker shares one shutdown token. `run` waits for ctrl-c or an
//! external cancel, then joins the workers and tick streams.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tradesync_store::{MemoryRepository, Repository};
use tradesync_sync::{
    spawn_worker, AccountSnapshotter, OrderSnapshotter, PriceFeed, SymbolDiscovery,
    TradeSynchronizer, Worker,
};
use tradesync_venue::{ExchangeClient, ReplayVenue, SymbolCatalog};

use crate::config::{AppConfig, VenueKind};
use crate::error::AppResult;

/// Main application.
pub struct Application {
    config: AppConfig,
    venue: Arc<dyn ExchangeClient>,
    repo: Arc<dyn Repository>,
    shutdown: CancellationToken,
}

impl Application {
    /// Build the venue and repository described by `config`.
    ///
    /// With the journal enabled, previously stored records are restored
    /// from the data directory.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let venue: Arc<dyn ExchangeClient> = match config.venue.kind {
            VenueKind::Replay => Arc::new(ReplayVenue::from_file(&config.venue.fixture_path)?),
        };

        let repo: Arc<dyn Repository> = if config.store.journal {
            let repo = MemoryRepository::open(&config.store.data_dir)?;
            info!(
                data_dir = %config.store.data_dir,
                trades = repo.trade_count(),
                "Opened journaled repository"
            );
            Arc::new(repo)
        } else {
            warn!("Journal disabled, stored records will not survive a restart");
            Arc::new(MemoryRepository::new())
        };

        Ok(Self::with_parts(config, venue, repo))
    }

    /// Assemble from an existing venue and repository.
    pub fn with_parts(
        config: AppConfig,
        venue: Arc<dyn ExchangeClient>,
        repo: Arc<dyn Repository>,
    ) -> Self {
        Self {
            config,
            venue,
            repo,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops the application when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn repository(&self) -> Arc<dyn Repository> {
        self.repo.clone()
    }

    /// Load the catalog and start every worker.
    pub async fn start(&self) -> AppResult<RunningApp> {
        let listing = self.venue.symbols().await?;
        let catalog = Arc::new(SymbolCatalog::new(listing));
        info!(
            symbols = catalog.len(),
            trading = catalog.trading().count(),
            "Loaded symbol catalog"
        );

        for symbol in &self.config.symbols {
            if catalog.get(symbol).is_none() {
                warn!(symbol = %symbol, "Configured symbol not listed by venue");
            }
        }

        let price_feed = Arc::new(PriceFeed::new(
            self.venue.clone(),
            self.repo.clone(),
            &self.config.prices,
            self.shutdown.clone(),
        ));

        let workers: Vec<Arc<dyn Worker>> = vec![
            Arc::new(SymbolDiscovery::new(
                self.venue.clone(),
                self.repo.clone(),
                catalog.clone(),
                self.config.discovery.clone(),
            )),
            Arc::new(TradeSynchronizer::new(
                self.venue.clone(),
                self.repo.clone(),
                catalog.clone(),
                self.config.trade_sync.clone(),
            )),
            Arc::new(AccountSnapshotter::new(
                self.venue.clone(),
                self.repo.clone(),
                price_feed.clone(),
                self.config.account.clone(),
            )),
            Arc::new(OrderSnapshotter::new(
                self.venue.clone(),
                self.repo.clone(),
                self.config.orders.clone(),
            )),
        ];

        let handles = workers
            .into_iter()
            .map(|worker| spawn_worker(worker, self.shutdown.clone()))
            .collect();

        price_feed.subscribe_all(&self.config.symbols).await;

        info!(
            price_subscriptions = price_feed.subscription_count(),
            "Application started"
        );

        Ok(RunningApp {
            catalog,
            price_feed,
            handles,
            shutdown: self.shutdown.clone(),
        })
    }

    /// Run until ctrl-c or until the shutdown token is cancelled.
    pub async fn run(self) -> AppResult<()> {
        let running = self.start().await?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
            },
            () = self.shutdown.cancelled() => info!("Shutdown requested"),
        }

        running.shutdown().await;
        Ok(())
    }
}

/// Handle to a started application.
pub struct RunningApp {
    catalog: Arc<SymbolCatalog>,
    price_feed: Arc<PriceFeed>,
    handles: Vec<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl RunningApp {
    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    pub fn price_feed(&self) -> &PriceFeed {
        &self.price_feed
    }

    /// Cancel every worker and tick stream and wait for them to stop.
    pub async fn shutdown(self) {
        self.shutdown.cancel();

        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Worker task failed");
            }
        }
        self.price_feed.join().await;

        info!("Shutdown complete");
    }
}
