use super::{OAuthService, Provider};
use crate::health::{HealthCheckResult, HealthChecker};
use std::sync::Arc;

/// Reports which identity providers can complete a login.
pub struct OAuthHealthChecker {
    service: Arc<OAuthService>,
}

impl OAuthHealthChecker {
    pub fn new(service: Arc<OAuthService>) -> Self {
        Self { service }
    }
}

#[async_trait::async_trait]
impl HealthChecker for OAuthHealthChecker {
    fn name(&self) -> &str {
        "oauth"
    }

    async fn check(&self) -> HealthCheckResult {
        let configured = self.service.configured_providers();
        let missing: Vec<Provider> = Provider::ALL
            .into_iter()
            .filter(|provider| !configured.contains(provider))
            .collect();

        let details = serde_json::json!({
            "configured_providers": configured,
            "unconfigured_providers": missing,
            "pending_states": self.service.states().len(),
        });

        if configured.is_empty() {
            HealthCheckResult::degraded_with_details(
                "No OAuth providers configured".to_string(),
                details,
            )
        } else {
            HealthCheckResult::healthy_with_details(details)
        }
    }

    fn info(&self) -> Option<serde_json::Value> {
        let providers: Vec<serde_json::Value> = Provider::ALL
            .iter()
            .map(|provider| {
                serde_json::json!({
                    "name": provider,
                    "display_name": provider.display_name(),
                    "configured": self.service.is_configured(*provider),
                })
            })
            .collect();

        Some(serde_json::json!({
            "service": "OAuth Authentication",
            "providers": providers
        }))
    }
}
