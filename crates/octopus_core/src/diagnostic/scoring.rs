//! Deterministic scoring engine.
//!
//! # Responsibility
//! - Turn financial inputs and survey answers into a `DiagnosticResult`.
//!
//! # Invariants
//! - Pure: no I/O, no clock, no randomness. Equal inputs give bit-identical output.
//! - For revenue > 0 the four percentages sum to 100 (floating-point tolerance).
//! - Overall status is the most severe per-metric status.
//! - Zero revenue reports every percentage as 0 and status `Red`.
//!
//! # Policy constants
//! The weights, points and targets below are tunable business policy, not
//! values derived from data.

use super::model::{
    DiagnosticResult, DiagnosticStatus, DiagnosticSubmission, FinancialInputs, SurveyDimension,
    SurveyScores,
};
use super::profile::{profile_for, OperationalBucket};
use log::debug;
use std::cmp::Ordering;

pub const COGS_GREEN_MAX: f64 = 35.0;
pub const COGS_YELLOW_MAX: f64 = 40.0;
pub const LABOR_GREEN_MAX: f64 = 25.0;
pub const LABOR_YELLOW_MAX: f64 = 30.0;
pub const MARGIN_GREEN_MIN: f64 = 15.0;
pub const MARGIN_YELLOW_MIN: f64 = 5.0;

/// Points awarded per metric status when averaging `score_financial`.
pub const GREEN_POINTS: f64 = 100.0;
pub const YELLOW_POINTS: f64 = 60.0;
pub const RED_POINTS: f64 = 20.0;

/// Maps the 1–5 survey average onto 0–100.
pub const SURVEY_SCALE: f64 = 20.0;

/// `score_global = FINANCIAL_WEIGHT * score_financial + OPERATIONAL_WEIGHT * score_7p`.
pub const FINANCIAL_WEIGHT: f64 = 0.7;
pub const OPERATIONAL_WEIGHT: f64 = 0.3;

/// Survey answer at or above which a dimension counts as a strength.
pub const SURVEY_TARGET: u8 = 4;

/// Cost structure as percentages of revenue.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostBreakdown {
    pub cogs_pct: f64,
    pub labor_pct: f64,
    pub fixed_pct: f64,
    pub margin_pct: f64,
}

impl CostBreakdown {
    /// All zeros when revenue is zero.
    pub fn from_inputs(inputs: &FinancialInputs) -> Self {
        let inputs = inputs.sanitized();
        let revenue = inputs.monthly_revenue;
        if revenue <= 0.0 {
            return Self::default();
        }

        let share = |amount: f64| amount * 100.0 / revenue;
        let cogs_pct = share(inputs.cogs);
        let labor_pct = share(inputs.labor_cost);
        let fixed_pct = share(inputs.rent + inputs.utilities_and_fixed);
        Self {
            cogs_pct,
            labor_pct,
            fixed_pct,
            margin_pct: 100.0 - cogs_pct - labor_pct - fixed_pct,
        }
    }
}

pub fn classify_cogs(cogs_pct: f64) -> DiagnosticStatus {
    classify_ceiling(cogs_pct, COGS_GREEN_MAX, COGS_YELLOW_MAX)
}

pub fn classify_labor(labor_pct: f64) -> DiagnosticStatus {
    classify_ceiling(labor_pct, LABOR_GREEN_MAX, LABOR_YELLOW_MAX)
}

pub fn classify_margin(margin_pct: f64) -> DiagnosticStatus {
    if margin_pct >= MARGIN_GREEN_MIN {
        DiagnosticStatus::Green
    } else if margin_pct >= MARGIN_YELLOW_MIN {
        DiagnosticStatus::Yellow
    } else {
        DiagnosticStatus::Red
    }
}

fn classify_ceiling(value: f64, green_max: f64, yellow_max: f64) -> DiagnosticStatus {
    if value <= green_max {
        DiagnosticStatus::Green
    } else if value <= yellow_max {
        DiagnosticStatus::Yellow
    } else {
        DiagnosticStatus::Red
    }
}

/// Per-metric statuses in `[cogs, labor, margin]` order.
///
/// Without revenue every metric is `Red`.
pub fn metric_statuses(breakdown: &CostBreakdown, has_revenue: bool) -> [DiagnosticStatus; 3] {
    if !has_revenue {
        return [DiagnosticStatus::Red; 3];
    }
    [
        classify_cogs(breakdown.cogs_pct),
        classify_labor(breakdown.labor_pct),
        classify_margin(breakdown.margin_pct),
    ]
}

/// Most severe of `statuses`; `Green` for an empty slice.
pub fn combine_statuses(statuses: &[DiagnosticStatus]) -> DiagnosticStatus {
    statuses
        .iter()
        .copied()
        .max()
        .unwrap_or(DiagnosticStatus::Green)
}

fn status_points(status: DiagnosticStatus) -> f64 {
    match status {
        DiagnosticStatus::Green => GREEN_POINTS,
        DiagnosticStatus::Yellow => YELLOW_POINTS,
        DiagnosticStatus::Red => RED_POINTS,
    }
}

pub fn score_financial(statuses: &[DiagnosticStatus; 3]) -> f64 {
    statuses.iter().copied().map(status_points).sum::<f64>() / statuses.len() as f64
}

/// Survey average mapped to 0–100 (`average * 20`).
pub fn score_7p(survey: &SurveyScores) -> f64 {
    let (sum, count) = survey
        .iter()
        .fold((0.0, 0_u32), |(sum, count), (_, score)| {
            (sum + f64::from(score.value()), count + 1)
        });
    sum / f64::from(count) * SURVEY_SCALE
}

pub fn score_global(score_financial: f64, score_7p: f64) -> f64 {
    score_financial * FINANCIAL_WEIGHT + score_7p * OPERATIONAL_WEIGHT
}

/// Scores one submission, attaching its lead metadata.
pub fn evaluate_submission(submission: &DiagnosticSubmission) -> DiagnosticResult {
    let mut result = evaluate(&submission.financials, &submission.survey);
    result.lead = submission.lead.clone();
    result
}

/// Scores financial inputs and survey answers.
pub fn evaluate(inputs: &FinancialInputs, survey: &SurveyScores) -> DiagnosticResult {
    let inputs = inputs.sanitized();
    let has_revenue = inputs.monthly_revenue > 0.0;
    let breakdown = CostBreakdown::from_inputs(&inputs);

    let statuses = metric_statuses(&breakdown, has_revenue);
    let status = combine_statuses(&statuses);
    let financial = score_financial(&statuses);
    let operational = score_7p(survey);
    let global = score_global(financial, operational);

    let profile = profile_for(status, OperationalBucket::from_score(operational));
    let (strengths, priorities) = assess_metrics(&breakdown, has_revenue, survey);

    debug!(
        "event=diagnostic_compute module=diagnostic status=ok result={} score_global={:.1} has_revenue={}",
        status.as_str(),
        global,
        has_revenue
    );

    DiagnosticResult {
        cogs_percentage: breakdown.cogs_pct,
        labor_percentage: breakdown.labor_pct,
        fixed_percentage: breakdown.fixed_pct,
        margin_percentage: breakdown.margin_pct,
        score_financial: financial,
        score_7p: operational,
        score_global: global,
        status,
        profile_name: profile.name.to_string(),
        profile_description: profile.description.to_string(),
        strengths,
        priorities,
        monthly_revenue: inputs.monthly_revenue,
        lead: None,
    }
}

/// A metric compared against its target.
struct Assessment {
    /// Distance below target on the 0–100 scale; zero or less means on target.
    gap: f64,
    strength: String,
    priority: String,
}

/// Splits metrics into strengths (on target) and priorities (below target,
/// largest gap first). Without revenue the cost metrics cannot be judged and
/// a single revenue priority leads the list instead.
fn assess_metrics(
    breakdown: &CostBreakdown,
    has_revenue: bool,
    survey: &SurveyScores,
) -> (Vec<String>, Vec<String>) {
    let mut assessments = Vec::with_capacity(10);
    if has_revenue {
        assessments.extend(financial_assessments(breakdown));
    }
    assessments.extend(survey.iter().map(|(dimension, score)| {
        let (strength, priority) = survey_messages(dimension);
        Assessment {
            gap: f64::from(i16::from(SURVEY_TARGET) - i16::from(score.value())) * SURVEY_SCALE,
            strength: strength.to_string(),
            priority: priority.to_string(),
        }
    }));

    let (mut below, on_target): (Vec<_>, Vec<_>) =
        assessments.into_iter().partition(|item| item.gap > 0.0);
    below.sort_by(|a, b| b.gap.partial_cmp(&a.gap).unwrap_or(Ordering::Equal));

    let strengths = on_target.into_iter().map(|item| item.strength).collect();
    let mut priorities = Vec::with_capacity(below.len() + 1);
    if !has_revenue {
        priorities.push(
            "Record monthly revenue: without sales the cost structure cannot be assessed."
                .to_string(),
        );
    }
    priorities.extend(below.into_iter().map(|item| item.priority));
    (strengths, priorities)
}

fn financial_assessments(breakdown: &CostBreakdown) -> [Assessment; 3] {
    let CostBreakdown {
        cogs_pct,
        labor_pct,
        margin_pct,
        ..
    } = *breakdown;
    [
        Assessment {
            gap: cogs_pct - COGS_GREEN_MAX,
            strength: format!("Merchandise cost under control ({cogs_pct:.1}% of revenue)."),
            priority: format!(
                "Bring merchandise cost down: {cogs_pct:.1}% of revenue against a {COGS_GREEN_MAX:.0}% target."
            ),
        },
        Assessment {
            gap: labor_pct - LABOR_GREEN_MAX,
            strength: format!("Efficient staffing ({labor_pct:.1}% of revenue)."),
            priority: format!(
                "Review staff efficiency and shifts: labor is {labor_pct:.1}% of revenue against a {LABOR_GREEN_MAX:.0}% target."
            ),
        },
        Assessment {
            gap: MARGIN_GREEN_MIN - margin_pct,
            strength: format!("Healthy operating margin ({margin_pct:.1}%)."),
            priority: format!(
                "Review pricing and fixed costs: margin is {margin_pct:.1}% against a {MARGIN_GREEN_MIN:.0}% target."
            ),
        },
    ]
}

fn survey_messages(dimension: SurveyDimension) -> (&'static str, &'static str) {
    match dimension {
        SurveyDimension::Order => (
            "Clear, written operating procedures.",
            "Introduce opening and closing checklists to bring order to daily operations.",
        ),
        SurveyDimension::Technology => (
            "Sales and expenses are recorded consistently.",
            "Start recording sales and expenses in a system or spreadsheet.",
        ),
        SurveyDimension::Observation => (
            "Good habit of reviewing the numbers.",
            "Set a weekly routine for reviewing the numbers.",
        ),
        SurveyDimension::Pragmatism => (
            "Clear numeric goals.",
            "Define three clear numeric goals for the month.",
        ),
        SurveyDimension::Creativity => (
            "Creative, frequently refreshed offering.",
            "Review the menu's profitability and concept.",
        ),
        SurveyDimension::Universality => (
            "Replicable business model.",
            "Document the model so the business could be replicated.",
        ),
        SurveyDimension::Subtlety => (
            "Fast response to reviews and service details.",
            "Set up a routine for handling reviews, complaints and service details.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        classify_cogs, classify_labor, classify_margin, combine_statuses, score_7p, score_global,
        CostBreakdown,
    };
    use crate::diagnostic::model::{DiagnosticStatus, FinancialInputs, SurveyScore, SurveyScores};

    #[test]
    fn thresholds_are_inclusive_at_green_and_yellow_bounds() {
        assert_eq!(classify_cogs(35.0), DiagnosticStatus::Green);
        assert_eq!(classify_cogs(40.0), DiagnosticStatus::Yellow);
        assert_eq!(classify_cogs(40.01), DiagnosticStatus::Red);
        assert_eq!(classify_labor(25.0), DiagnosticStatus::Green);
        assert_eq!(classify_labor(30.0), DiagnosticStatus::Yellow);
        assert_eq!(classify_labor(30.5), DiagnosticStatus::Red);
        assert_eq!(classify_margin(15.0), DiagnosticStatus::Green);
        assert_eq!(classify_margin(5.0), DiagnosticStatus::Yellow);
        assert_eq!(classify_margin(4.99), DiagnosticStatus::Red);
    }

    #[test]
    fn combine_picks_most_severe() {
        use DiagnosticStatus::{Green, Red, Yellow};
        assert_eq!(combine_statuses(&[Green, Green, Green]), Green);
        assert_eq!(combine_statuses(&[Green, Yellow, Green]), Yellow);
        assert_eq!(combine_statuses(&[Yellow, Green, Red]), Red);
    }

    #[test]
    fn score_7p_maps_average_onto_hundred() {
        let all_fives = SurveyScores::uniform(SurveyScore::new(5).unwrap());
        assert_eq!(score_7p(&all_fives), 100.0);
        let all_ones = SurveyScores::uniform(SurveyScore::new(1).unwrap());
        assert_eq!(score_7p(&all_ones), 20.0);
    }

    #[test]
    fn global_score_weights_financial_above_operational() {
        assert!(score_global(100.0, 0.0) > score_global(0.0, 100.0));
        assert!((score_global(100.0, 100.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn breakdown_margin_can_go_negative() {
        let breakdown = CostBreakdown::from_inputs(&FinancialInputs {
            monthly_revenue: 1_000.0,
            cogs: 600.0,
            labor_cost: 400.0,
            rent: 200.0,
            utilities_and_fixed: 0.0,
        });
        assert!((breakdown.margin_pct + 20.0).abs() < 1e-9);
    }
}
