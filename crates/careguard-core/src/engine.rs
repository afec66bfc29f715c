//! Risk engine: runs every rule and merges their alerts.
//!
//! The merge policy is fixed:
//! 1. The result is the union of all rule outputs (duplicates collapsed)
//! 2. Alerts are ordered by level (highest first), then category, then message
//! 3. The prescription is safe iff no alert is CRITICAL
//!
//! Ordering is total, so the output does not depend on rule order or on the
//! order medications were listed.

use std::sync::Arc;

use tracing::debug;

use crate::rules::{default_rules, RiskRule, RuleTables};
use crate::types::{DoctorPrescription, RiskAlert, RiskAnalysis};

/// Screens prescriptions against an injected set of tables.
pub struct RiskEngine {
    tables: Arc<RuleTables>,
    rules: Vec<Box<dyn RiskRule>>,
}

impl RiskEngine {
    /// Engine over the built-in tables and rule set.
    pub fn new() -> Self {
        Self::with_tables(RuleTables::builtin())
    }

    /// Engine over alternate tables with the built-in rule set.
    pub fn with_tables(tables: Arc<RuleTables>) -> Self {
        Self {
            tables,
            rules: default_rules(),
        }
    }

    /// Engine over alternate tables and an explicit rule set.
    pub fn with_rules(tables: Arc<RuleTables>, rules: Vec<Box<dyn RiskRule>>) -> Self {
        Self { tables, rules }
    }

    pub fn tables(&self) -> &Arc<RuleTables> {
        &self.tables
    }

    /// Analyze one prescription.
    pub fn analyze(&self, prescription: &DoctorPrescription) -> RiskAnalysis {
        let mut alerts: Vec<RiskAlert> = Vec::new();

        for rule in &self.rules {
            let found = rule.evaluate(prescription, &self.tables);
            if !found.is_empty() {
                debug!(rule = rule.name(), alerts = found.len(), "Rule raised alerts");
            }
            alerts.extend(found);
        }

        alerts.sort_by(|a, b| {
            b.risk_level
                .cmp(&a.risk_level)
                .then_with(|| a.category.cmp(&b.category))
                .then_with(|| a.message.cmp(&b.message))
                .then_with(|| a.recommendation.cmp(&b.recommendation))
        });
        alerts.dedup();

        let analysis = RiskAnalysis::from_alerts(alerts);
        debug!(
            tables_version = %self.tables.version,
            total = analysis.summary.total,
            critical = analysis.summary.critical,
            is_safe = analysis.is_safe,
            "Risk analysis complete"
        );
        analysis
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new()
    }
}
