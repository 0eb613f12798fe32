//! Fault rule evaluator.
//!
//! Pure, synchronous mapping from a parameter snapshot to a diagnosis
//! result. No I/O, no hidden state: the same snapshot and table always
//! produce the same result, and an all-normal snapshot is a normal outcome,
//! never an error.

pub mod thresholds;

use crate::model::{
    FaultDiagnosisResult, FaultFinding, Parameter, ParameterSnapshot, Severity, ThresholdRule,
    ThresholdTable, Violation, ALL_PARAMETERS,
};
use thresholds::{guidance, Direction, DEFAULT_THRESHOLDS};

/// Diagnoses a snapshot against the default threshold table.
pub fn diagnose(snapshot: &ParameterSnapshot) -> FaultDiagnosisResult {
    diagnose_with(snapshot, DEFAULT_THRESHOLDS)
}

/// Diagnoses a snapshot against an explicit threshold table.
///
/// Findings are produced in canonical parameter order (`ALL_PARAMETERS`),
/// not the order of the table or the feed. Parameters absent from the
/// snapshot are skipped — a rule never fires on a value it did not receive.
/// A snapshot with zero recognized parameters yields `has_fault: false`.
pub fn diagnose_with(
    snapshot: &ParameterSnapshot,
    table: &ThresholdTable,
) -> FaultDiagnosisResult {
    let mut findings = Vec::new();
    let mut recommendations = Vec::new();
    let mut recommended: Vec<Parameter> = Vec::new();

    for parameter in ALL_PARAMETERS {
        let rule = match table.iter().find(|r| r.parameter == *parameter) {
            Some(rule) => rule,
            None => continue,
        };
        let value = match snapshot.value(*parameter) {
            Some(value) => value,
            None => continue,
        };

        if let Some(finding) = check_rule(rule, value) {
            // One recommendation per distinct violated parameter, even if
            // the parameter somehow produced more than one finding.
            if !recommended.contains(parameter) {
                recommended.push(*parameter);
                let direction = match finding.violation {
                    Violation::BelowMin(_) => Direction::Low,
                    Violation::AboveMax(_) => Direction::High,
                };
                recommendations.push(guidance(*parameter, direction).recommendation.to_string());
            }
            findings.push(finding);
        }
    }

    let severity = findings
        .iter()
        .map(|f| f.severity)
        .max()
        .unwrap_or(Severity::Info);

    FaultDiagnosisResult {
        has_fault: !findings.is_empty(),
        findings,
        severity,
        recommendations,
    }
}

/// Checks one value against one rule, producing a finding on violation.
fn check_rule(rule: &ThresholdRule, value: f64) -> Option<FaultFinding> {
    if let Some(min) = rule.min {
        if value < min {
            let severity = if value < min * (1.0 - rule.escalation) {
                Severity::Critical
            } else {
                Severity::Warning
            };
            return Some(build_finding(rule.parameter, value, Violation::BelowMin(min), severity));
        }
    }

    if let Some(max) = rule.max {
        if value > max {
            let severity = if value > max * (1.0 + rule.escalation) {
                Severity::Critical
            } else {
                Severity::Warning
            };
            return Some(build_finding(rule.parameter, value, Violation::AboveMax(max), severity));
        }
    }

    None
}

fn build_finding(
    parameter: Parameter,
    value: f64,
    violation: Violation,
    severity: Severity,
) -> FaultFinding {
    let direction = match violation {
        Violation::BelowMin(_) => Direction::Low,
        Violation::AboveMax(_) => Direction::High,
    };
    let g = guidance(parameter, direction);
    FaultFinding {
        parameter,
        value,
        violation,
        severity,
        description: g.description.to_string(),
        impact: g.impact.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn snapshot(device_id: &str) -> ParameterSnapshot {
        ParameterSnapshot::empty(device_id, Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap())
    }

    /// All six governed parameters comfortably in range.
    fn normal_snapshot() -> ParameterSnapshot {
        let mut s = snapshot("RPi001");
        s.ph = Some(7.2);
        s.temperature = Some(45.0);
        s.tss = Some(40.0);
        s.cod = Some(30.0);
        s.bod = Some(19.7);
        s.hardness = Some(200.0);
        s
    }

    // --- No fault ----------------------------------------------------------

    #[test]
    fn test_all_normal_snapshot_has_no_fault() {
        let result = diagnose(&normal_snapshot());
        assert!(!result.has_fault);
        assert!(result.findings.is_empty());
        assert!(result.recommendations.is_empty());
        assert_eq!(result.severity, Severity::Info);
    }

    #[test]
    fn test_empty_snapshot_is_not_an_error() {
        // A snapshot with zero recognized parameters is a valid, all-clear
        // outcome, not a failure.
        let result = diagnose(&snapshot("RPi001"));
        assert!(!result.has_fault);
        assert!(result.findings.is_empty());
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_missing_field_skips_its_rule() {
        // BOD absent: the BOD rule must not fire on a value it never got,
        // even though 0.0 would violate nothing and None must not read as 0.
        let mut s = normal_snapshot();
        s.bod = None;
        s.cod = Some(520.0); // only COD out of range
        let result = diagnose(&s);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].parameter, Parameter::Cod);
    }

    // --- Severity escalation ------------------------------------------------

    #[test]
    fn test_violation_within_escalation_band_is_warning() {
        // TSS max is 200; 210 is above the bound but below 200 * 1.1 = 220.
        let mut s = normal_snapshot();
        s.tss = Some(210.0);
        let result = diagnose(&s);
        assert!(result.has_fault);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].severity, Severity::Warning);
        assert_eq!(result.severity, Severity::Warning);
    }

    #[test]
    fn test_violation_beyond_escalation_band_is_critical() {
        // 230 > 200 * 1.1, so the finding escalates.
        let mut s = normal_snapshot();
        s.tss = Some(230.0);
        let result = diagnose(&s);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].severity, Severity::Critical);
        assert_eq!(result.severity, Severity::Critical);
    }

    #[test]
    fn test_low_side_escalation_uses_min_times_point_nine() {
        // pH min is 6.0. 5.5 is above 6.0 * 0.9 = 5.4, so Warning; 5.3 is
        // below it, so Critical.
        let mut s = normal_snapshot();
        s.ph = Some(5.5);
        assert_eq!(diagnose(&s).findings[0].severity, Severity::Warning);
        s.ph = Some(5.3);
        assert_eq!(diagnose(&s).findings[0].severity, Severity::Critical);
    }

    #[test]
    fn test_value_exactly_at_bound_does_not_fire() {
        // The rule fires on strict inequality: 200.0 against max 200 is in
        // range, as is 6.0 against min 6.
        let mut s = normal_snapshot();
        s.tss = Some(200.0);
        s.ph = Some(6.0);
        assert!(!diagnose(&s).has_fault);
    }

    // --- Aggregation and ordering -------------------------------------------

    #[test]
    fn test_aggregate_severity_is_maximum_over_findings() {
        let mut s = normal_snapshot();
        s.tss = Some(210.0); // warning
        s.cod = Some(600.0); // critical (> 550)
        let result = diagnose(&s);
        assert_eq!(result.findings.len(), 2);
        assert_eq!(result.severity, Severity::Critical);
    }

    #[test]
    fn test_findings_follow_canonical_parameter_order() {
        // Hardness is declared after COD; regardless of which field was set
        // first, findings come out in declaration order.
        let mut s = normal_snapshot();
        s.hardness = Some(320.0);
        s.cod = Some(520.0);
        let result = diagnose(&s);
        let order: Vec<Parameter> = result.findings.iter().map(|f| f.parameter).collect();
        assert_eq!(order, vec![Parameter::Cod, Parameter::Hardness]);
    }

    #[test]
    fn test_diagnosis_is_deterministic() {
        let mut s = normal_snapshot();
        s.ph = Some(5.5);
        s.bod = Some(170.0);
        let first = diagnose(&s);
        let second = diagnose(&s);
        assert_eq!(first, second);
    }

    // --- Recommendations ----------------------------------------------------

    #[test]
    fn test_one_recommendation_per_violated_parameter() {
        let mut s = normal_snapshot();
        s.tss = Some(230.0);
        s.bod = Some(170.0);
        let result = diagnose(&s);
        assert_eq!(result.findings.len(), 2);
        assert_eq!(result.recommendations.len(), 2);
    }

    #[test]
    fn test_ph_recommendation_depends_on_direction() {
        let mut s = normal_snapshot();
        s.ph = Some(5.5);
        let low = diagnose(&s);
        s.ph = Some(9.5);
        let high = diagnose(&s);
        assert_ne!(low.recommendations, high.recommendations);
        assert!(low.recommendations[0].contains("alkaline"));
        assert!(high.recommendations[0].contains("acid"));
    }

    // --- Scenario from the plant runbook ------------------------------------

    #[test]
    fn test_acidic_snapshot_against_tightened_bounds() {
        // With the stricter discharge-permit bounds (pH 6.5-8.5), a 5.5 pH
        // reading falls below 6.5 * 0.9 = 5.85 and must read Critical with a
        // pH-specific remediation.
        let table = [crate::model::ThresholdRule {
            parameter: Parameter::Ph,
            min: Some(6.5),
            max: Some(8.5),
            escalation: 0.10,
        }];
        let mut s = snapshot("RPi001");
        s.ph = Some(5.5);
        s.temperature = Some(45.0);
        s.tss = Some(150.0);
        s.cod = Some(350.0);
        s.bod = Some(120.0);
        s.hardness = Some(200.0);

        let result = diagnose_with(&s, &table);
        assert!(result.has_fault);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].parameter, Parameter::Ph);
        assert_eq!(result.findings[0].severity, Severity::Critical);
        assert!(result.recommendations[0].contains("pH"));
    }

    #[test]
    fn test_same_snapshot_against_default_bounds_is_warning() {
        // Against the default table (pH min 6.0), 5.5 sits inside the
        // escalation band (5.4-6.0) and reads Warning.
        let mut s = snapshot("RPi001");
        s.ph = Some(5.5);
        s.temperature = Some(45.0);
        s.tss = Some(150.0);
        s.cod = Some(350.0);
        s.bod = Some(120.0);
        s.hardness = Some(200.0);
        let result = diagnose(&s);
        assert!(result.has_fault);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].severity, Severity::Warning);
    }

    // --- Result invariants ---------------------------------------------------

    #[test]
    fn test_result_invariants_hold_across_inputs() {
        let mut cases = vec![snapshot("RPi001"), normal_snapshot()];
        let mut faulty = normal_snapshot();
        faulty.ph = Some(3.0);
        faulty.cod = Some(700.0);
        cases.push(faulty);

        for case in &cases {
            let result = diagnose(case);
            assert_eq!(result.has_fault, !result.findings.is_empty());
            assert_eq!(result.has_fault, !result.recommendations.is_empty());
            let expected = result
                .findings
                .iter()
                .map(|f| f.severity)
                .max()
                .unwrap_or(Severity::Info);
            assert_eq!(result.severity, expected);
        }
    }
}
