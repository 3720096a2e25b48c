//! Cross-layer traits.

use async_trait::async_trait;

/// Trait for components that can report their own health.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Returns the name of this health check.
    fn name(&self) -> &str;

    /// Performs the health check.
    async fn check(&self) -> HealthStatus;
}

/// Health check status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// The component is healthy.
    Healthy,
    /// The component is unhealthy. The reason is for logs only.
    Unhealthy(String),
}

impl HealthStatus {
    /// Returns true if the status is healthy.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Returns the label reported to clients.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Healthy => "OK",
            Self::Unhealthy(_) => "ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_label() {
        assert_eq!(HealthStatus::Healthy.label(), "OK");
        let down = HealthStatus::Unhealthy("connection refused at 10.1.2.3".to_string());
        assert_eq!(down.label(), "ERROR");
        assert!(!down.is_healthy());
    }
}
