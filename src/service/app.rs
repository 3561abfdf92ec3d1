//! Main application state and service coordination
//!
//! This module contains the production AppState that wires the engine
//! components together and owns the background maintenance tasks.

use crate::config::AppConfig;
use crate::matches::MatchLifecycle;
use crate::metrics::health::HealthServerConfig;
use crate::metrics::{HealthServer, MetricsCollector, MetricsService};
use crate::queue::QueueManager;
use crate::ranking::RankingService;
use crate::rating::EloCalculator;
use crate::season::{Season, StaticSeasonProvider};
use crate::spectate::SpectatorRegistry;
use crate::storage::{InMemoryMatchStore, InMemoryRankingStore, InMemorySpectatorStore};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Matchmaking queue
    queue_manager: Arc<QueueManager>,

    /// Match state machine and rating updates
    match_lifecycle: Arc<MatchLifecycle>,

    /// Spectator tracking
    spectator_registry: Arc<SpectatorRegistry>,

    /// Ranking queries
    ranking_service: Arc<RankingService>,

    /// Metrics service for monitoring and health checks
    metrics_service: Arc<MetricsService>,

    /// Background task handles
    background_tasks: Vec<JoinHandle<()>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,
}

impl AppState {
    /// Initialize the application with all dependencies
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing duel-arena engine");
        info!(
            "Configuration: service={}, season={}",
            config.service.name, config.matchmaking.season_name
        );

        let metrics_service = Self::initialize_metrics(&config).await?;

        let (queue_manager, match_lifecycle, spectator_registry, ranking_service) =
            Self::initialize_engine(&config, metrics_service.collector())?;

        Ok(Self {
            config,
            queue_manager,
            match_lifecycle,
            spectator_registry,
            ranking_service,
            metrics_service,
            background_tasks: Vec::new(),
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    /// Start all background services
    pub async fn start(&mut self) -> Result<(), ServiceError> {
        info!("Starting duel-arena engine");

        // Mark as running
        *self.is_running.write().await = true;

        // Start metrics service first
        self.start_metrics_service().await?;

        // Start background tasks
        self.start_background_tasks().await?;

        info!("✅ Duel-arena engine started successfully");
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&mut self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of duel-arena engine");

        // Mark as not running
        *self.is_running.write().await = false;

        // Stop background tasks (including metrics service task)
        self.stop_background_tasks().await;

        // Stop metrics service
        info!("Stopping metrics service...");
        if let Err(e) = self.metrics_service.stop().await {
            warn!("Failed to stop metrics service: {}", e);
        } else {
            info!("✅ Metrics service stopped");
        }

        // Get final statistics
        let queue_stats = self.queue_manager.get_stats().await;
        let match_stats = self.match_lifecycle.get_stats().await;
        info!(
            "Final service statistics: queue={:?}, matches={:?}",
            queue_stats, match_stats
        );
        info!("✅ Duel-arena engine shutdown completed");

        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get the matchmaking queue manager
    pub fn queue_manager(&self) -> Arc<QueueManager> {
        self.queue_manager.clone()
    }

    /// Get the match lifecycle manager
    pub fn match_lifecycle(&self) -> Arc<MatchLifecycle> {
        self.match_lifecycle.clone()
    }

    /// Get the spectator registry
    pub fn spectator_registry(&self) -> Arc<SpectatorRegistry> {
        self.spectator_registry.clone()
    }

    /// Get the ranking service
    pub fn ranking_service(&self) -> Arc<RankingService> {
        self.ranking_service.clone()
    }

    /// Get metrics service
    pub fn metrics_service(&self) -> Arc<MetricsService> {
        self.metrics_service.clone()
    }

    /// Initialize metrics service
    async fn initialize_metrics(config: &AppConfig) -> Result<Arc<MetricsService>, ServiceError> {
        info!(
            "Initializing metrics service on port {}",
            config.service.metrics_port
        );

        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let health_config = HealthServerConfig {
            port: config.service.metrics_port,
            host: "0.0.0.0".to_string(),
        };

        let health_server = Arc::new(HealthServer::new(health_config, metrics_collector.clone()));
        let metrics_service = Arc::new(MetricsService::new(metrics_collector, health_server));

        Ok(metrics_service)
    }

    /// Initialize the engine components
    #[allow(clippy::type_complexity)]
    fn initialize_engine(
        config: &AppConfig,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Result<
        (
            Arc<QueueManager>,
            Arc<MatchLifecycle>,
            Arc<SpectatorRegistry>,
            Arc<RankingService>,
        ),
        ServiceError,
    > {
        info!("Initializing engine components");

        let calculator = EloCalculator::new(config.rating.clone()).map_err(|e| {
            ServiceError::Initialization {
                message: format!("Failed to initialize rating calculator: {}", e),
            }
        })?;

        let season = Season::starting_now(config.matchmaking.season_name.clone());
        info!(season_id = %season.id, season_name = %season.name, "Opened rating season");
        let season_provider = Arc::new(StaticSeasonProvider::new(season));

        let ranking_store = Arc::new(InMemoryRankingStore::new());
        let match_store = Arc::new(InMemoryMatchStore::new());
        let spectator_store = Arc::new(InMemorySpectatorStore::new());

        let match_lifecycle = Arc::new(MatchLifecycle::new(
            match_store.clone(),
            ranking_store.clone(),
            calculator,
            metrics_collector.clone(),
        ));

        let queue_manager = Arc::new(QueueManager::new(
            season_provider.clone(),
            match_lifecycle.clone(),
            config.matchmaking.clone(),
            metrics_collector.clone(),
        ));

        let spectator_registry = Arc::new(SpectatorRegistry::new(
            spectator_store,
            match_store,
            metrics_collector,
        ));

        let ranking_service = Arc::new(RankingService::new(
            ranking_store,
            season_provider,
            config.rating.clone(),
        ));

        Ok((
            queue_manager,
            match_lifecycle,
            spectator_registry,
            ranking_service,
        ))
    }

    /// Start metrics service
    async fn start_metrics_service(&mut self) -> Result<(), ServiceError> {
        info!("Starting metrics and health endpoints");

        let metrics_service = self.metrics_service.clone();
        let port = self.config.service.metrics_port;

        // Spawn the metrics service as a background task
        let metrics_handle = tokio::spawn(async move {
            if let Err(e) = metrics_service.start().await {
                error!("Metrics service failed: {}", e);
            } else {
                info!("Metrics service task completed");
            }
        });

        self.background_tasks.push(metrics_handle);

        // Give the server a moment to start up
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        info!("✅ Metrics service started on port {}", port);
        Ok(())
    }

    /// Start background maintenance tasks
    async fn start_background_tasks(&mut self) -> Result<(), ServiceError> {
        info!("Starting background maintenance tasks...");

        // Gauge refresh task
        info!("Starting gauge refresh task (30s interval)...");
        let gauge_task = {
            let queue_manager = self.queue_manager.clone();
            let match_lifecycle = self.match_lifecycle.clone();
            let metrics_collector = self.metrics_service.collector();
            let is_running = self.is_running.clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(30));
                info!("Gauge refresh task started");

                while *is_running.read().await {
                    interval.tick().await;

                    let waiting = queue_manager.queue_depth().await;
                    metrics_collector.set_players_waiting(waiting);

                    match match_lifecycle.active_match_count() {
                        Ok(active) => {
                            debug!(waiting, active, "Refreshed gauges");
                            metrics_collector.set_active_matches(active);
                        }
                        Err(e) => {
                            warn!("Failed to count active matches for gauge refresh: {}", e);
                        }
                    }
                }

                info!("Gauge refresh task stopped");
            })
        };

        // Service health metrics task
        info!("Starting health metrics task (60s interval)...");
        let health_metrics_task = {
            let match_lifecycle = self.match_lifecycle.clone();
            let metrics_collector = self.metrics_service.collector();
            let is_running = self.is_running.clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(60));
                let start_time = tokio::time::Instant::now();
                info!("Health metrics task started");

                while *is_running.read().await {
                    interval.tick().await;

                    // Update service uptime
                    let uptime_seconds = start_time.elapsed().as_secs() as i64;
                    metrics_collector
                        .service()
                        .uptime_seconds
                        .set(uptime_seconds);

                    debug!(
                        "Updated service health metrics - uptime: {}s",
                        uptime_seconds
                    );

                    metrics_collector.update_health_status(2); // 2 = healthy

                    // Update component health
                    let store_ok = match_lifecycle.active_match_count().is_ok();
                    metrics_collector.update_component_health("match_store", store_ok);
                    metrics_collector.update_component_health("matchmaking_queue", true);
                    metrics_collector.update_component_health("metrics", true);
                }

                info!("Health metrics task stopped");
            })
        };

        self.background_tasks.push(gauge_task);
        self.background_tasks.push(health_metrics_task);

        info!("2 background maintenance tasks started successfully");
        Ok(())
    }

    /// Stop all background tasks
    async fn stop_background_tasks(&mut self) {
        let task_count = self.background_tasks.len();
        if task_count == 0 {
            info!("No background tasks to stop");
            return;
        }

        info!("Stopping {} background tasks...", task_count);

        for (i, task) in self.background_tasks.drain(..).enumerate() {
            debug!("Aborting background task {}/{}", i + 1, task_count);
            task.abort();
        }

        // Give tasks time to clean up gracefully
        info!("Waiting for background tasks to complete shutdown...");
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;

        info!("✅ All {} background tasks stopped", task_count);
    }
}
