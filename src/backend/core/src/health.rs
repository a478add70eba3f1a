//! Health checks for the record store and event publisher.
//!
//! # Health Status Semantics
//!
//! - **Healthy**: component is fully operational
//! - **Degraded**: component is operational but with issues
//! - **Unhealthy**: component is not operational
//!
//! The report's overall status is the worst component status; an unhealthy
//! report maps to HTTP 503 so orchestration probes can act on it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::publisher::EventPublisher;
use crate::store::RecordStore;

// ═══════════════════════════════════════════════════════════════════════════════
// Health Status
// ═══════════════════════════════════════════════════════════════════════════════

/// Health status of a component or the entire system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Component is fully operational
    #[default]
    Healthy,
    /// Component is operational but with degraded performance
    Degraded,
    /// Component is not operational
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Combine two statuses, returning the worse one.
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Self::Unhealthy, _) | (_, Self::Unhealthy) => Self::Unhealthy,
            (Self::Degraded, _) | (_, Self::Degraded) => Self::Degraded,
            _ => Self::Healthy,
        }
    }

    /// Convert to an HTTP status code.
    pub fn to_http_status(&self) -> u16 {
        match self {
            Self::Healthy | Self::Degraded => 200,
            Self::Unhealthy => 503,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Component Health
// ═══════════════════════════════════════════════════════════════════════════════

/// Health report for an individual component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Healthy,
            message: None,
            latency_ms: None,
        }
    }

    pub fn unhealthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Unhealthy,
            message: None,
            latency_ms: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }
}

/// Aggregated system health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub components: Vec<ComponentHealth>,
}

impl HealthReport {
    pub fn new(components: Vec<ComponentHealth>) -> Self {
        let status = components
            .iter()
            .fold(HealthStatus::Healthy, |acc, c| acc.combine(c.status));
        Self {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            components,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Checkers
// ═══════════════════════════════════════════════════════════════════════════════

/// A single component health check.
#[async_trait]
pub trait HealthChecker: Send + Sync {
    fn name(&self) -> &str;
    async fn check(&self) -> ComponentHealth;
}

/// Health checker for the record store.
pub struct StoreChecker {
    store: Arc<dyn RecordStore>,
}

impl StoreChecker {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HealthChecker for StoreChecker {
    fn name(&self) -> &str {
        "record_store"
    }

    async fn check(&self) -> ComponentHealth {
        let start = Instant::now();
        match self.store.ping().await {
            Ok(()) => ComponentHealth::healthy(self.name())
                .with_message(format!("{} backend reachable", self.store.name()))
                .with_latency_ms(start.elapsed().as_millis() as u64),
            Err(e) => ComponentHealth::unhealthy(self.name()).with_message(e.user_message()),
        }
    }
}

/// Health checker for the event publisher.
pub struct PublisherChecker {
    publisher: Arc<dyn EventPublisher>,
}

impl PublisherChecker {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl HealthChecker for PublisherChecker {
    fn name(&self) -> &str {
        "event_publisher"
    }

    async fn check(&self) -> ComponentHealth {
        let start = Instant::now();
        match self.publisher.ping().await {
            Ok(()) => ComponentHealth::healthy(self.name())
                .with_message(format!("{} backend reachable", self.publisher.name()))
                .with_latency_ms(start.elapsed().as_millis() as u64),
            Err(e) => ComponentHealth::unhealthy(self.name()).with_message(e.user_message()),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Health Service
// ═══════════════════════════════════════════════════════════════════════════════

/// Runs all registered health checks with a per-check timeout.
pub struct HealthService {
    checkers: Vec<Arc<dyn HealthChecker>>,
    check_timeout: Duration,
}

impl HealthService {
    pub fn new(check_timeout: Duration) -> Self {
        Self {
            checkers: Vec::new(),
            check_timeout,
        }
    }

    pub fn register_checker(&mut self, checker: Arc<dyn HealthChecker>) {
        self.checkers.push(checker);
    }

    /// Run all health checks concurrently.
    pub async fn check_health(&self) -> HealthReport {
        let futures: Vec<_> = self
            .checkers
            .iter()
            .map(|checker| {
                let checker = checker.clone();
                let timeout = self.check_timeout;
                async move {
                    match tokio::time::timeout(timeout, checker.check()).await {
                        Ok(health) => health,
                        Err(_) => ComponentHealth::unhealthy(checker.name())
                            .with_message("health check timed out"),
                    }
                }
            })
            .collect();

        let components = futures::future::join_all(futures).await;
        HealthReport::new(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::MemoryPublisher;
    use crate::store::MemoryStore;

    #[test]
    fn test_status_combine_takes_the_worst() {
        assert_eq!(
            HealthStatus::Healthy.combine(HealthStatus::Degraded),
            HealthStatus::Degraded
        );
        assert_eq!(
            HealthStatus::Degraded.combine(HealthStatus::Unhealthy),
            HealthStatus::Unhealthy
        );
        assert_eq!(
            HealthStatus::Healthy.combine(HealthStatus::Healthy),
            HealthStatus::Healthy
        );
    }

    #[tokio::test]
    async fn test_report_aggregates_component_checks() {
        let mut service = HealthService::new(Duration::from_secs(1));
        service.register_checker(Arc::new(StoreChecker::new(Arc::new(MemoryStore::new()))));
        service.register_checker(Arc::new(PublisherChecker::new(Arc::new(
            MemoryPublisher::new(),
        ))));

        let report = service.check_health().await;
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.components.len(), 2);
        assert_eq!(report.status.to_http_status(), 200);
    }
}
