//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the duel-arena engine:
//! queue activity, match lifecycle, rating updates, and spectator counts.

use crate::types::MatchType;
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn match_type_label(match_type: MatchType) -> &'static str {
    match match_type {
        MatchType::Arena => "arena",
        MatchType::Duel => "duel",
    }
}

/// Main metrics collector for the arena engine
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Queue-related metrics
    queue_metrics: QueueMetrics,

    /// Match lifecycle metrics
    match_metrics: MatchMetrics,

    /// Rating update metrics
    rating_metrics: RatingMetrics,

    /// Spectator metrics
    spectator_metrics: SpectatorMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Queue-related metrics
#[derive(Clone)]
pub struct QueueMetrics {
    /// Join requests by match type and outcome
    pub join_requests_total: IntCounterVec,

    /// Queue cancellations by outcome
    pub cancellations_total: IntCounterVec,

    /// Players currently waiting in the queue
    pub players_waiting: IntGauge,

    /// Join request processing time
    pub join_processing_duration: Histogram,
}

/// Match lifecycle metrics
#[derive(Clone)]
pub struct MatchMetrics {
    /// Matches created by type
    pub matches_created_total: IntCounterVec,

    /// Matches started by type
    pub matches_started_total: IntCounterVec,

    /// Results submitted by type and outcome (win/draw)
    pub results_submitted_total: IntCounterVec,

    /// Matches currently active
    pub active_matches: IntGauge,

    /// Finished match duration in seconds
    pub match_duration_seconds: HistogramVec,
}

/// Rating update metrics
#[derive(Clone)]
pub struct RatingMetrics {
    /// Total per-player rating updates applied
    pub updates_total: IntCounter,

    /// Absolute rating delta per update
    pub delta_magnitude: Histogram,

    /// Post-update rating distribution
    pub rating_distribution: Histogram,
}

/// Spectator metrics
#[derive(Clone)]
pub struct SpectatorMetrics {
    /// Spectators joined
    pub joined_total: IntCounter,

    /// Spectators left
    pub left_total: IntCounter,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let queue_metrics = QueueMetrics::new(&registry)?;
        let match_metrics = MatchMetrics::new(&registry)?;
        let rating_metrics = RatingMetrics::new(&registry)?;
        let spectator_metrics = SpectatorMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            queue_metrics,
            match_metrics,
            rating_metrics,
            spectator_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get queue metrics
    pub fn queue(&self) -> &QueueMetrics {
        &self.queue_metrics
    }

    /// Get match metrics
    pub fn matches(&self) -> &MatchMetrics {
        &self.match_metrics
    }

    /// Get rating metrics
    pub fn rating(&self) -> &RatingMetrics {
        &self.rating_metrics
    }

    /// Get spectator metrics
    pub fn spectators(&self) -> &SpectatorMetrics {
        &self.spectator_metrics
    }

    /// Record a join-queue request and its outcome
    pub fn record_join_queue(&self, match_type: MatchType, outcome: &str, duration: Duration) {
        self.queue_metrics
            .join_requests_total
            .with_label_values(&[match_type_label(match_type), outcome])
            .inc();

        self.queue_metrics
            .join_processing_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a cancel-queue request
    pub fn record_cancel_queue(&self, outcome: &str) {
        self.queue_metrics
            .cancellations_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Update the queue depth gauge
    pub fn set_players_waiting(&self, count: usize) {
        self.queue_metrics.players_waiting.set(count as i64);
    }

    /// Record a match being created
    pub fn record_match_created(&self, match_type: MatchType) {
        self.match_metrics
            .matches_created_total
            .with_label_values(&[match_type_label(match_type)])
            .inc();
    }

    /// Record a match transitioning to active
    pub fn record_match_started(&self, match_type: MatchType) {
        self.match_metrics
            .matches_started_total
            .with_label_values(&[match_type_label(match_type)])
            .inc();
    }

    /// Record a finished match and its duration
    pub fn record_match_finished(
        &self,
        match_type: MatchType,
        outcome: &str,
        duration_seconds: i64,
    ) {
        self.match_metrics
            .results_submitted_total
            .with_label_values(&[match_type_label(match_type), outcome])
            .inc();

        self.match_metrics
            .match_duration_seconds
            .with_label_values(&[match_type_label(match_type)])
            .observe(duration_seconds.max(0) as f64);
    }

    /// Update the active matches gauge
    pub fn set_active_matches(&self, count: usize) {
        self.match_metrics.active_matches.set(count as i64);
    }

    /// Record one per-player rating update
    pub fn record_rating_update(&self, delta: i32, new_rating: i32) {
        self.rating_metrics.updates_total.inc();
        self.rating_metrics
            .delta_magnitude
            .observe(f64::from(delta.abs()));
        self.rating_metrics
            .rating_distribution
            .observe(f64::from(new_rating));
    }

    /// Record a spectator joining
    pub fn record_spectator_joined(&self) {
        self.spectator_metrics.joined_total.inc();
    }

    /// Record a spectator leaving
    pub fn record_spectator_left(&self) {
        self.spectator_metrics.left_total.inc();
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("duel_arena_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "duel_arena_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("duel_arena_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            component_health,
        })
    }
}

impl QueueMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let join_requests_total = IntCounterVec::new(
            Opts::new(
                "duel_arena_join_requests_total",
                "Join-queue requests processed",
            ),
            &["match_type", "outcome"],
        )?;
        registry.register(Box::new(join_requests_total.clone()))?;

        let cancellations_total = IntCounterVec::new(
            Opts::new(
                "duel_arena_queue_cancellations_total",
                "Cancel-queue requests processed",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(cancellations_total.clone()))?;

        let players_waiting = IntGauge::new(
            "duel_arena_players_waiting",
            "Players currently waiting in the queue",
        )?;
        registry.register(Box::new(players_waiting.clone()))?;

        let join_processing_duration = Histogram::with_opts(
            HistogramOpts::new(
                "duel_arena_join_processing_duration_seconds",
                "Join-queue processing time",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(join_processing_duration.clone()))?;

        Ok(Self {
            join_requests_total,
            cancellations_total,
            players_waiting,
            join_processing_duration,
        })
    }
}

impl MatchMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let matches_created_total = IntCounterVec::new(
            Opts::new("duel_arena_matches_created_total", "Matches created"),
            &["match_type"],
        )?;
        registry.register(Box::new(matches_created_total.clone()))?;

        let matches_started_total = IntCounterVec::new(
            Opts::new("duel_arena_matches_started_total", "Matches started"),
            &["match_type"],
        )?;
        registry.register(Box::new(matches_started_total.clone()))?;

        let results_submitted_total = IntCounterVec::new(
            Opts::new("duel_arena_results_submitted_total", "Results submitted"),
            &["match_type", "outcome"],
        )?;
        registry.register(Box::new(results_submitted_total.clone()))?;

        let active_matches = IntGauge::new(
            "duel_arena_active_matches",
            "Matches currently in progress",
        )?;
        registry.register(Box::new(active_matches.clone()))?;

        let match_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "duel_arena_match_duration_seconds",
                "Finished match duration in seconds",
            )
            .buckets(vec![30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0]),
            &["match_type"],
        )?;
        registry.register(Box::new(match_duration_seconds.clone()))?;

        Ok(Self {
            matches_created_total,
            matches_started_total,
            results_submitted_total,
            active_matches,
            match_duration_seconds,
        })
    }
}

impl RatingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let updates_total = IntCounter::new(
            "duel_arena_rating_updates_total",
            "Per-player rating updates applied",
        )?;
        registry.register(Box::new(updates_total.clone()))?;

        let delta_magnitude = Histogram::with_opts(
            HistogramOpts::new(
                "duel_arena_rating_delta_magnitude",
                "Absolute rating change per update",
            )
            .buckets(vec![1.0, 5.0, 10.0, 15.0, 20.0, 30.0, 40.0]),
        )?;
        registry.register(Box::new(delta_magnitude.clone()))?;

        let rating_distribution = Histogram::with_opts(
            HistogramOpts::new(
                "duel_arena_rating_distribution",
                "Post-update rating distribution",
            )
            .buckets(vec![
                500.0, 800.0, 1000.0, 1200.0, 1400.0, 1600.0, 1800.0, 2000.0, 2400.0,
            ]),
        )?;
        registry.register(Box::new(rating_distribution.clone()))?;

        Ok(Self {
            updates_total,
            delta_magnitude,
            rating_distribution,
        })
    }
}

impl SpectatorMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let joined_total =
            IntCounter::new("duel_arena_spectators_joined_total", "Spectators joined")?;
        registry.register(Box::new(joined_total.clone()))?;

        let left_total = IntCounter::new("duel_arena_spectators_left_total", "Spectators left")?;
        registry.register(Box::new(left_total.clone()))?;

        Ok(Self {
            joined_total,
            left_total,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        let _service = collector.service();
        let _queue = collector.queue();
        let _matches = collector.matches();
        let _rating = collector.rating();
        let _spectators = collector.spectators();
    }

    #[test]
    fn test_queue_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_join_queue(MatchType::Arena, "queued", Duration::from_millis(2));
        collector.record_join_queue(MatchType::Arena, "matched", Duration::from_millis(3));
        collector.record_cancel_queue("cancelled");
        collector.set_players_waiting(1);

        assert_eq!(collector.queue().players_waiting.get(), 1);
    }

    #[test]
    fn test_match_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_match_created(MatchType::Duel);
        collector.record_match_started(MatchType::Duel);
        collector.record_match_finished(MatchType::Duel, "win", 120);
        collector.record_rating_update(20, 1020);
        collector.set_active_matches(0);

        assert_eq!(collector.rating().updates_total.get(), 1);
    }

    #[test]
    fn test_health_status_updates() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.update_health_status(2);
        collector.update_component_health("queue", true);
        collector.update_component_health("match_store", false);
    }

    #[test]
    fn test_metrics_timer() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let timer = collector.start_timer();

        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.stop();
        assert!(duration >= Duration::from_millis(10));
    }

    #[test]
    fn test_registry_gathers_metrics() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        collector.record_match_created(MatchType::Arena);

        let families = collector.registry().gather();
        assert!(families
            .iter()
            .any(|f| f.get_name().starts_with("duel_arena_")));
    }
}
