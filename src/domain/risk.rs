//! Keyword-based crisis risk assessment.
//!
//! This is the minimum detection every responder must be able to fall back
//! on: two keyword tiers, high-risk checked before moderate-risk, first
//! match wins. Remote backends may layer smarter analysis on top, but this
//! engine is the non-optional backstop - a crisis check must never be
//! skipped because a model was unreachable.

use crate::ports::{CrisisAnalysis, RiskLevel};

/// Phrases signalling immediate danger.
const HIGH_RISK_KEYWORDS: &[&str] = &[
    "suicide",
    "kill myself",
    "end my life",
    "want to die",
    "better off dead",
    "hurt myself",
    "self harm",
    "overdose",
    "pills",
    "jumping",
    "hanging",
];

/// Phrases signalling distress and hopelessness.
const MODERATE_RISK_KEYWORDS: &[&str] = &[
    "depressed",
    "hopeless",
    "worthless",
    "empty",
    "alone forever",
    "can't go on",
    "no point",
    "give up",
    "tired of living",
];

/// Assess the risk level of a single message.
pub fn assess_risk(message: &str) -> RiskLevel {
    let lower = message.to_lowercase();
    if HIGH_RISK_KEYWORDS.iter().any(|k| lower.contains(k)) {
        RiskLevel::High
    } else if MODERATE_RISK_KEYWORDS.iter().any(|k| lower.contains(k)) {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    }
}

/// Matched keywords, for the `indicators` field of an analysis.
pub fn matched_keywords(message: &str) -> Vec<String> {
    let lower = message.to_lowercase();
    HIGH_RISK_KEYWORDS
        .iter()
        .chain(MODERATE_RISK_KEYWORDS.iter())
        .filter(|k| lower.contains(*k))
        .map(|k| k.to_string())
        .collect()
}

/// Full keyword-based crisis analysis with tiered recommendations.
pub fn analyze(message: &str) -> CrisisAnalysis {
    match assess_risk(message) {
        RiskLevel::High => CrisisAnalysis {
            is_high_risk: true,
            severity: RiskLevel::High,
            indicators: vec!["Direct expression of self-harm intent".to_string()],
            recommended_actions: vec![
                "Immediate professional intervention required".to_string(),
                "Contact emergency services if necessary".to_string(),
                "Do not leave the person alone".to_string(),
            ],
        },
        RiskLevel::Moderate => CrisisAnalysis {
            is_high_risk: false,
            severity: RiskLevel::Moderate,
            indicators: vec!["Expressions of hopelessness or depression".to_string()],
            recommended_actions: vec![
                "Encourage professional support".to_string(),
                "Check in regularly".to_string(),
                "Provide crisis hotline information".to_string(),
            ],
        },
        RiskLevel::Low => CrisisAnalysis {
            is_high_risk: false,
            severity: RiskLevel::Low,
            indicators: Vec::new(),
            recommended_actions: vec![
                "Continue supportive conversation".to_string(),
                "Monitor for changes".to_string(),
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn high_risk_phrase_detected() {
        let analysis = analyze("I want to kill myself");
        assert!(analysis.is_high_risk);
        assert_eq!(analysis.severity, RiskLevel::High);
        assert!(!analysis.recommended_actions.is_empty());
    }

    #[test]
    fn moderate_risk_phrase_detected() {
        let analysis = analyze("Everything feels hopeless lately");
        assert!(!analysis.is_high_risk);
        assert_eq!(analysis.severity, RiskLevel::Moderate);
    }

    #[test]
    fn everyday_stress_is_low_risk() {
        let analysis = analyze("I'm feeling really stressed about exams");
        assert!(!analysis.is_high_risk);
        assert_eq!(analysis.severity, RiskLevel::Low);
        assert!(analysis.indicators.is_empty());
    }

    #[test]
    fn high_risk_wins_over_moderate() {
        // Contains both "hopeless" (moderate) and "end my life" (high).
        let analysis = analyze("I feel hopeless and I want to end my life");
        assert_eq!(analysis.severity, RiskLevel::High);
        assert!(analysis.is_high_risk);
    }

    #[test]
    fn detection_is_case_insensitive() {
        assert_eq!(assess_risk("I WANT TO DIE"), RiskLevel::High);
        assert_eq!(assess_risk("So Depressed today"), RiskLevel::Moderate);
    }

    #[test]
    fn matched_keywords_reports_hits() {
        let hits = matched_keywords("I'm depressed and want to give up");
        assert!(hits.contains(&"depressed".to_string()));
        assert!(hits.contains(&"give up".to_string()));
    }

    proptest! {
        #[test]
        fn embedding_a_high_risk_phrase_is_always_high(prefix in "[a-z ]{0,40}", suffix in "[a-z ]{0,40}") {
            let message = format!("{prefix} better off dead {suffix}");
            prop_assert_eq!(assess_risk(&message), RiskLevel::High);
        }

        #[test]
        fn analysis_never_panics(message in "\\PC{0,200}") {
            let analysis = analyze(&message);
            prop_assert_eq!(analysis.is_high_risk, analysis.severity == RiskLevel::High);
        }
    }
}
