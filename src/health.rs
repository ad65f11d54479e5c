use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc, time::Instant};
use tokio::sync::RwLock;

/// Component status, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl HealthCheckResult {
    fn with_status(status: HealthStatus) -> Self {
        Self {
            status,
            message: None,
            details: None,
            duration_ms: None,
        }
    }

    pub fn healthy() -> Self {
        Self::with_status(HealthStatus::Healthy)
    }

    pub fn healthy_with_details(details: serde_json::Value) -> Self {
        Self {
            details: Some(details),
            ..Self::healthy()
        }
    }

    pub fn degraded_with_details(message: String, details: serde_json::Value) -> Self {
        Self {
            message: Some(message),
            details: Some(details),
            ..Self::with_status(HealthStatus::Degraded)
        }
    }

    pub fn unhealthy(message: String) -> Self {
        Self {
            message: Some(message),
            ..Self::with_status(HealthStatus::Unhealthy)
        }
    }

    fn timed(mut self, start: Instant) -> Self {
        self.duration_ms = Some(u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX));
        self
    }
}

/// A component that can report on itself under `GET /health?check=<name>`.
#[async_trait]
pub trait HealthChecker: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self) -> HealthCheckResult;

    /// Static description listed by `GET /health/components`.
    fn info(&self) -> Option<serde_json::Value> {
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallHealthResponse {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub checks: BTreeMap<String, HealthCheckResult>,
    pub summary: HealthSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthSummary {
    pub total_checks: usize,
    pub healthy_count: usize,
    pub degraded_count: usize,
    pub unhealthy_count: usize,
    pub total_duration_ms: u64,
}

impl HealthSummary {
    fn tally<'a>(results: impl IntoIterator<Item = &'a HealthCheckResult>) -> Self {
        results.into_iter().fold(Self::default(), |mut summary, result| {
            summary.total_checks += 1;
            summary.total_duration_ms += result.duration_ms.unwrap_or(0);
            match result.status {
                HealthStatus::Healthy => summary.healthy_count += 1,
                HealthStatus::Degraded => summary.degraded_count += 1,
                HealthStatus::Unhealthy => summary.unhealthy_count += 1,
            }
            summary
        })
    }
}

/// Registry of component health checks behind `GET /health`.
#[derive(Default)]
pub struct HealthService {
    checkers: RwLock<BTreeMap<String, Arc<dyn HealthChecker>>>,
}

impl HealthService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a checker, replacing any earlier one with the same name.
    pub async fn register(&self, checker: Arc<dyn HealthChecker>) {
        let name = checker.name().to_string();
        self.checkers.write().await.insert(name, checker);
    }

    /// Run the checks selected by `filter`: `all`, a single component name,
    /// or nothing for a bare liveness answer. Overall status is the worst
    /// component status.
    pub async fn check_health(&self, filter: Option<&str>) -> OverallHealthResponse {
        let checkers = self.checkers.read().await;

        let mut checks = BTreeMap::new();
        for (name, checker) in checkers.iter() {
            let selected = match filter {
                Some("all") => true,
                Some(wanted) => wanted == name,
                None => false,
            };
            if selected {
                let start = Instant::now();
                checks.insert(name.clone(), checker.check().await.timed(start));
            }
        }

        OverallHealthResponse {
            status: checks
                .values()
                .map(|result| result.status)
                .max()
                .unwrap_or(HealthStatus::Healthy),
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary: HealthSummary::tally(checks.values()),
            checks,
        }
    }

    /// Names of every registered checker, sorted.
    pub async fn registered_checkers(&self) -> Vec<String> {
        self.checkers.read().await.keys().cloned().collect()
    }

    /// Static `info()` of every registered component, keyed by name.
    pub async fn component_info(&self) -> BTreeMap<String, serde_json::Value> {
        self.checkers
            .read()
            .await
            .iter()
            .filter_map(|(name, checker)| checker.info().map(|info| (name.clone(), info)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StaticChecker {
        name: &'static str,
        result: HealthCheckResult,
    }

    #[async_trait]
    impl HealthChecker for StaticChecker {
        fn name(&self) -> &str {
            self.name
        }

        async fn check(&self) -> HealthCheckResult {
            self.result.clone()
        }

        fn info(&self) -> Option<serde_json::Value> {
            Some(json!({"kind": "static"}))
        }
    }

    fn checker(name: &'static str, result: HealthCheckResult) -> Arc<dyn HealthChecker> {
        Arc::new(StaticChecker { name, result })
    }

    #[tokio::test]
    async fn test_no_filter_runs_nothing() {
        let service = HealthService::new();
        service.register(checker("content", HealthCheckResult::unhealthy("x".into()))).await;

        let response = service.check_health(None).await;
        assert_eq!(response.status, HealthStatus::Healthy);
        assert_eq!(response.summary.total_checks, 0);
        assert_eq!(response.service, "portfolio-backend");
    }

    #[tokio::test]
    async fn test_worst_status_wins() {
        let service = HealthService::new();
        service.register(checker("content", HealthCheckResult::healthy())).await;
        service
            .register(checker(
                "oauth",
                HealthCheckResult::degraded_with_details("partial".into(), json!({})),
            ))
            .await;

        let response = service.check_health(Some("all")).await;
        assert_eq!(response.status, HealthStatus::Degraded);
        assert_eq!(response.summary.healthy_count, 1);
        assert_eq!(response.summary.degraded_count, 1);

        service.register(checker("smtp", HealthCheckResult::unhealthy("down".into()))).await;
        let response = service.check_health(Some("all")).await;
        assert_eq!(response.status, HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_single_component_filter() {
        let service = HealthService::new();
        service.register(checker("content", HealthCheckResult::healthy())).await;
        service.register(checker("oauth", HealthCheckResult::unhealthy("x".into()))).await;

        let response = service.check_health(Some("content")).await;
        assert_eq!(response.status, HealthStatus::Healthy);
        assert!(response.checks.contains_key("content"));
        assert!(!response.checks.contains_key("oauth"));
        assert!(response.checks["content"].duration_ms.is_some());
    }

    #[tokio::test]
    async fn test_registry_listing() {
        let service = HealthService::new();
        service.register(checker("oauth", HealthCheckResult::healthy())).await;
        service.register(checker("content", HealthCheckResult::healthy())).await;

        assert_eq!(service.registered_checkers().await, vec!["content", "oauth"]);
        assert_eq!(service.component_info().await["oauth"]["kind"], "static");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let value = serde_json::to_value(HealthCheckResult::healthy()).unwrap();
        assert_eq!(value, json!({"status": "healthy"}));
    }
}
