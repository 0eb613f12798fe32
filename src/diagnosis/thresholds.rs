//! Threshold table and remediation catalog.
//!
//! The default table carries the plant's operating ranges for the six
//! governed parameters. It is process-wide constant data; what-if diagnosis
//! and tests may substitute their own table through `diagnose_with`.

use crate::model::{Parameter, ThresholdRule};

/// Fraction beyond a bound at which a finding escalates from Warning to
/// Critical: below `min * 0.9` or above `max * 1.1`.
pub const ESCALATION_FACTOR: f64 = 0.10;

/// Default operating ranges for the treatment process.
///
/// Parameters without a rule here (flow, DO, conductivity, turbidity) are
/// displayed on the dashboard but do not raise alerts.
pub static DEFAULT_THRESHOLDS: &[ThresholdRule] = &[
    ThresholdRule {
        parameter: Parameter::Ph,
        min: Some(6.0),
        max: Some(9.0),
        escalation: ESCALATION_FACTOR,
    },
    ThresholdRule {
        parameter: Parameter::Temperature,
        min: Some(30.0),
        max: Some(60.0),
        escalation: ESCALATION_FACTOR,
    },
    ThresholdRule {
        parameter: Parameter::Tss,
        min: None,
        max: Some(200.0),
        escalation: ESCALATION_FACTOR,
    },
    ThresholdRule {
        parameter: Parameter::Cod,
        min: None,
        max: Some(500.0),
        escalation: ESCALATION_FACTOR,
    },
    ThresholdRule {
        parameter: Parameter::Bod,
        min: None,
        max: Some(150.0),
        escalation: ESCALATION_FACTOR,
    },
    ThresholdRule {
        parameter: Parameter::Hardness,
        min: None,
        max: Some(300.0),
        escalation: ESCALATION_FACTOR,
    },
];

/// Direction of a threshold violation, for remediation lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Low,
    High,
}

/// Static remediation guidance for one parameter/direction pair.
pub struct Guidance {
    pub description: &'static str,
    pub impact: &'static str,
    pub recommendation: &'static str,
}

/// Looks up remediation guidance for a violated parameter.
///
/// The lookup is directional where the remediation differs by direction
/// (pH and temperature); single-bound parameters share one entry. Unknown
/// combinations fall back to generic guidance so a finding is never emitted
/// without text.
pub fn guidance(parameter: Parameter, direction: Direction) -> Guidance {
    match (parameter, direction) {
        (Parameter::Ph, Direction::Low) => Guidance {
            description: "Water is too acidic for biological treatment",
            impact: "Inhibits microbial activity and corrodes piping and tank linings",
            recommendation: "Increase alkaline dosing (lime or caustic soda) to raise pH into the 6.0-9.0 range",
        },
        (Parameter::Ph, Direction::High) => Guidance {
            description: "Water is too alkaline for biological treatment",
            impact: "Reduces disinfection efficiency and promotes scaling in downstream equipment",
            recommendation: "Increase acid dosing (CO2 or sulfuric acid) to bring pH back below 9.0",
        },
        (Parameter::Temperature, Direction::Low) => Guidance {
            description: "Process temperature is below the biological operating range",
            impact: "Slows biological degradation and reduces treatment throughput",
            recommendation: "Check heat exchanger operation and reduce cold inflow until temperature recovers",
        },
        (Parameter::Temperature, Direction::High) => Guidance {
            description: "Process temperature exceeds the biological operating range",
            impact: "Stresses the biomass and lowers dissolved oxygen saturation",
            recommendation: "Increase cooling or dilution flow and inspect aeration blowers for overheating",
        },
        (Parameter::Tss, _) => Guidance {
            description: "Total suspended solids exceed the discharge limit",
            impact: "Clouds effluent, clogs filters, and risks a permit violation",
            recommendation: "Check clarifier sludge blanket level and increase sludge wasting rate",
        },
        (Parameter::Cod, _) => Guidance {
            description: "Chemical oxygen demand exceeds the treatment capacity",
            impact: "Indicates organic overload; effluent may not meet discharge standards",
            recommendation: "Reduce influent load or extend aeration time until COD falls below 500 mg/L",
        },
        (Parameter::Bod, _) => Guidance {
            description: "Biochemical oxygen demand exceeds the treatment capacity",
            impact: "Depletes dissolved oxygen in the receiving water body",
            recommendation: "Increase aeration and verify return activated sludge flow rate",
        },
        (Parameter::Hardness, _) => Guidance {
            description: "Water hardness exceeds the process limit",
            impact: "Scales membranes and heat exchangers, raising maintenance cost",
            recommendation: "Inspect the softening stage and replenish ion-exchange media if depleted",
        },
        // Remaining parameters are display-only today. Covered here so a
        // custom threshold table can still produce a complete finding.
        (_, Direction::Low) => Guidance {
            description: "Reading is below the configured operating range",
            impact: "Process may be operating outside validated conditions",
            recommendation: "Verify the sensor calibration and review the configured threshold",
        },
        (_, Direction::High) => Guidance {
            description: "Reading is above the configured operating range",
            impact: "Process may be operating outside validated conditions",
            recommendation: "Verify the sensor calibration and review the configured threshold",
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
