//! Named screening heuristics.
//!
//! Each function is one clinically approximate check, kept pure so it can be
//! tested on its own. All comparisons are case-insensitive substring matches
//! against the case-folded keywords in `RuleTables`.

use super::tables::{InteractionEntry, RuleTables};

/// Case-insensitive substring test. An empty keyword never matches.
pub fn mentions(text: &str, keyword: &str) -> bool {
    !keyword.is_empty() && text.to_lowercase().contains(&keyword.to_lowercase())
}

/// Whether `text` mentions any keyword in the list.
pub fn mentions_any<S: AsRef<str>>(text: &str, keywords: &[S]) -> bool {
    first_mentioned(text, keywords).is_some()
}

/// The first keyword from the list that `text` mentions. Keywords are
/// expected in lowercase.
pub fn first_mentioned<'a, S: AsRef<str>>(text: &str, keywords: &'a [S]) -> Option<&'a str> {
    let lower = text.to_lowercase();
    keywords
        .iter()
        .map(AsRef::as_ref)
        .find(|k| !k.is_empty() && lower.contains(*k))
}

/// Match an interaction entry against two medication names.
///
/// Returns the names ordered as the entry lists its drugs, so the result is
/// the same whichever way round the pair is passed in. When both names match
/// both keywords the names are ordered alphabetically.
pub fn interaction_matches<'a>(
    entry: &InteractionEntry,
    first: &'a str,
    second: &'a str,
) -> Option<(&'a str, &'a str)> {
    let [left, right] = &entry.drugs;
    let forward = mentions(first, left) && mentions(second, right);
    let backward = mentions(second, left) && mentions(first, right);

    match (forward, backward) {
        (true, false) => Some((first, second)),
        (false, true) => Some((second, first)),
        (true, true) => Some(if first <= second {
            (first, second)
        } else {
            (second, first)
        }),
        (false, false) => None,
    }
}

/// Whether an allergy conflicts with a medication.
///
/// True when the allergy text itself appears in the medication name, or when
/// the allergy names a drug class (e.g. "Penicillin", "Sulfa drugs") whose
/// members appear in the medication name.
pub fn allergy_matches_medication(allergy: &str, medication: &str, tables: &RuleTables) -> bool {
    let allergy = allergy.trim().to_lowercase();
    if allergy.is_empty() {
        return false;
    }
    if mentions(medication, &allergy) {
        return true;
    }
    tables
        .allergy_classes
        .iter()
        .filter(|(class, _)| allergy.contains(class.as_str()))
        .any(|(_, members)| mentions_any(medication, members.as_slice()))
}

/// The elderly high-risk group a medication belongs to, if any.
pub fn elderly_risk_group<'a>(medication: &str, tables: &'a RuleTables) -> Option<&'a str> {
    tables
        .elderly_high_risk
        .iter()
        .find(|(_, keywords)| mentions_any(medication, keywords.as_slice()))
        .map(|(group, _)| group.as_str())
        .or_else(|| mentions_any(medication, &tables.nsaids).then_some("nsaids"))
}

pub fn is_elderly(age: u8, tables: &RuleTables) -> bool {
    age >= tables.elderly_age
}

/// Whether a young child's dose should be checked for weight-based dosing.
///
/// Applies under the young-child age when the dosage carries neither a
/// per-kilogram nor a volume marker.
pub fn needs_pediatric_weight_check(age: u8, dosage: &str, tables: &RuleTables) -> bool {
    age < tables.pediatric_age
        && age < tables.young_child_age
        && !mentions_any(dosage, &tables.pediatric_dose_markers)
}

pub fn is_nsaid(medication: &str, tables: &RuleTables) -> bool {
    mentions_any(medication, &tables.nsaids)
}

pub fn is_beta_blocker(medication: &str, tables: &RuleTables) -> bool {
    mentions_any(medication, &tables.beta_blockers)
}

/// Contraindicated with impaired kidney function (listed drugs plus NSAIDs).
pub fn is_ckd_contraindicated(medication: &str, tables: &RuleTables) -> bool {
    mentions_any(medication, &tables.ckd_contraindicated) || is_nsaid(medication, tables)
}

/// Whether any condition mentions one of the keywords.
pub fn has_condition<S: AsRef<str>>(conditions: &[String], keywords: &[S]) -> bool {
    conditions.iter().any(|c| mentions_any(c, keywords))
}

pub fn exceeds_polypharmacy(count: usize, tables: &RuleTables) -> bool {
    count >= tables.polypharmacy_threshold
}

/// An acetaminophen product at a per-dose strength worth a daily-limit reminder.
pub fn exceeds_acetaminophen_dose_hint(medication: &str, dosage: &str, tables: &RuleTables) -> bool {
    mentions_any(medication, &tables.acetaminophen_names)
        && mentions_any(dosage, &tables.acetaminophen_dose_markers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RiskLevel;

    fn entry(a: &str, b: &str) -> InteractionEntry {
        InteractionEntry {
            drugs: [a.to_string(), b.to_string()],
            level: RiskLevel::High,
            effect: "effect".to_string(),
            recommendation: "recommendation".to_string(),
        }
    }

    #[test]
    fn test_empty_keyword_never_matches() {
        assert!(!mentions("Amoxicillin", ""));
        assert!(!mentions_any("Amoxicillin", &["", ""]));
    }

    #[test]
    fn test_interaction_symmetric() {
        let e = entry("lisinopril", "potassium");
        assert_eq!(
            interaction_matches(&e, "Lisinopril", "Potassium Chloride"),
            Some(("Lisinopril", "Potassium Chloride"))
        );
        assert_eq!(
            interaction_matches(&e, "Potassium Chloride", "Lisinopril"),
            Some(("Lisinopril", "Potassium Chloride"))
        );
        assert_eq!(interaction_matches(&e, "Lisinopril", "Metformin"), None);
    }

    #[test]
    fn test_interaction_needs_two_medications() {
        let e = entry("warfarin", "aspirin");
        assert_eq!(interaction_matches(&e, "Warfarin", "Warfarin"), None);
    }

    #[test]
    fn test_allergy_direct_and_class() {
        let tables = RuleTables::builtin();
        assert!(allergy_matches_medication("Penicillin", "Amoxicillin", &tables));
        assert!(allergy_matches_medication("penicillin", "Penicillin VK", &tables));
        assert!(allergy_matches_medication("Sulfa drugs", "Furosemide", &tables));
        assert!(allergy_matches_medication("NSAID intolerance", "Naproxen", &tables));
        assert!(!allergy_matches_medication("Shellfish", "Amoxicillin", &tables));
        assert!(!allergy_matches_medication("  ", "Amoxicillin", &tables));
    }

    #[test]
    fn test_elderly_groups() {
        let tables = RuleTables::builtin();
        assert_eq!(elderly_risk_group("Lorazepam", &tables), Some("benzodiazepines"));
        assert_eq!(elderly_risk_group("Indomethacin", &tables), Some("nsaids"));
        assert_eq!(elderly_risk_group("Amlodipine", &tables), None);
        assert!(is_elderly(65, &tables));
        assert!(!is_elderly(64, &tables));
    }

    #[test]
    fn test_pediatric_weight_check() {
        let tables = RuleTables::builtin();
        assert!(needs_pediatric_weight_check(7, "400mg twice daily", &tables));
        assert!(!needs_pediatric_weight_check(7, "400mg (8mL of suspension) twice daily", &tables));
        assert!(!needs_pediatric_weight_check(7, "45 mg/kg/day divided", &tables));
        assert!(!needs_pediatric_weight_check(12, "400mg twice daily", &tables));
        assert!(!needs_pediatric_weight_check(15, "400mg twice daily", &tables));
    }

    #[test]
    fn test_ckd_includes_nsaids() {
        let tables = RuleTables::builtin();
        assert!(is_ckd_contraindicated("Metformin ER", &tables));
        assert!(is_ckd_contraindicated("Ibuprofen", &tables));
        assert!(is_ckd_contraindicated("IV contrast dye", &tables));
        assert!(!is_ckd_contraindicated("Amlodipine", &tables));
    }

    #[test]
    fn test_polypharmacy_threshold() {
        let tables = RuleTables::builtin();
        assert!(!exceeds_polypharmacy(4, &tables));
        assert!(exceeds_polypharmacy(5, &tables));
    }

    #[test]
    fn test_acetaminophen_hint() {
        let tables = RuleTables::builtin();
        assert!(exceeds_acetaminophen_dose_hint("Tylenol Extra Strength", "1000mg every 6 hours", &tables));
        assert!(exceeds_acetaminophen_dose_hint("Acetaminophen", "500mg as needed", &tables));
        assert!(!exceeds_acetaminophen_dose_hint("Acetaminophen", "325mg as needed", &tables));
        assert!(!exceeds_acetaminophen_dose_hint("Ibuprofen", "500mg", &tables));
    }

    #[test]
    fn test_has_condition() {
        let conditions = vec!["Chronic Kidney Disease stage 3".to_string()];
        assert!(has_condition(&conditions, &["kidney", "renal"]));
        assert!(!has_condition(&conditions, &["heart failure"]));
    }
}
