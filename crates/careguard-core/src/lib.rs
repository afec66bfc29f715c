//! # careguard-core
//!
//! Deterministic prescription screening engine.
//!
//! This crate answers one question before any care plan is generated:
//! is this prescription safe enough to hand to a text-generation backend?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same prescription and tables always produce the same alerts
//! 2. **No LLM calls**: All screening is rule-based
//! 3. **Order-independent**: Rules are independent; alerts are totally ordered
//! 4. **Gating**: Any CRITICAL alert makes the prescription unsafe
//!
//! ## Example
//!
//! ```rust,ignore
//! use careguard_core::{analyze, normalize_json};
//!
//! let prescription = normalize_json(&request_body)?;
//! let analysis = analyze(&prescription);
//!
//! if !analysis.is_safe {
//!     for alert in analysis.critical_alerts() {
//!         println!("BLOCKED: {}", alert.message);
//!     }
//! }
//! ```

pub mod engine;
pub mod prescription;
pub mod rules;
pub mod types;

// Re-export main types at crate root
pub use engine::RiskEngine;
pub use prescription::{
    normalize, normalize_file, normalize_json, normalize_yaml, ExtractedDocument, FieldError,
    ValidationError,
};
pub use rules::{RiskRule, RuleTableError, RuleTables};
pub use types::{
    CarePlan, CarePlanSection, ComparisonResult, DoctorPrescription, ErrorKind,
    GenerationResult, PatientInfo, PrescriptionItem, RiskAlert, RiskAnalysis, RiskLevel,
    RiskSummary, SectionPriority,
};

/// Analyze a prescription against the built-in tables.
///
/// This is the main entry point for screening. Use `RiskEngine::with_tables`
/// to screen against alternate tables.
pub fn analyze(prescription: &DoctorPrescription) -> RiskAnalysis {
    RiskEngine::new().analyze(prescription)
}
