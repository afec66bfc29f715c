//! Audit trail for generation outcomes.
//!
//! Sinks observe finished results. They cannot alter them, and a sink that
//! does nothing is always valid.

use async_trait::async_trait;
use careguard_core::GenerationResult;
use tracing::{info, warn};

/// Receives every completed generation result.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, result: &GenerationResult);
}

/// Drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn record(&self, _result: &GenerationResult) {}
}

/// Logs a metadata-only summary of each result.
///
/// Patient data and care-plan text are never logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, result: &GenerationResult) {
        let sections = result.care_plan.as_ref().map_or(0, |p| p.section_count());
        if result.success {
            info!(
                target: "careguard::audit",
                provider = %result.provider_id,
                alerts = result.risk_summary.total,
                sections,
                generated_at = %result.generated_at,
                "Care plan generated"
            );
        } else {
            warn!(
                target: "careguard::audit",
                provider = %result.provider_id,
                alerts = result.risk_summary.total,
                critical = result.risk_summary.critical,
                error_kind = ?result.error_kind,
                generated_at = %result.generated_at,
                "Care plan not generated"
            );
        }
    }
}
