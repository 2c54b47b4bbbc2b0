use octopus_core::diagnostic::profile::{profile_for, OperationalBucket};
use octopus_core::diagnostic::scoring::{FINANCIAL_WEIGHT, OPERATIONAL_WEIGHT};
use octopus_core::{
    evaluate, evaluate_submission, DiagnosticStatus, DiagnosticSubmission, FinancialInputs,
    LeadContact, SurveyScore, SurveyScores,
};

const TOLERANCE: f64 = 1e-9;

fn inputs(revenue: f64, cogs: f64, labor: f64, rent: f64, utilities: f64) -> FinancialInputs {
    FinancialInputs {
        monthly_revenue: revenue,
        cogs,
        labor_cost: labor,
        rent,
        utilities_and_fixed: utilities,
    }
}

fn scenario_a() -> FinancialInputs {
    inputs(100_000.0, 30_000.0, 20_000.0, 10_000.0, 5_000.0)
}

fn mixed_survey() -> SurveyScores {
    SurveyScores::from_values([4, 3, 5, 2, 4, 4, 3]).unwrap()
}

#[test]
fn scenario_a_is_green_across_the_board() {
    let result = evaluate(&scenario_a(), &mixed_survey());

    assert!((result.cogs_percentage - 30.0).abs() < TOLERANCE);
    assert!((result.labor_percentage - 20.0).abs() < TOLERANCE);
    assert!((result.fixed_percentage - 15.0).abs() < TOLERANCE);
    assert!((result.margin_percentage - 35.0).abs() < TOLERANCE);
    assert_eq!(result.status, DiagnosticStatus::Green);
    assert_eq!(result.score_financial, 100.0);

    let expected_7p = 25.0 / 7.0 * 20.0;
    assert!((result.score_7p - expected_7p).abs() < TOLERANCE);
    let expected_global = FINANCIAL_WEIGHT * 100.0 + OPERATIONAL_WEIGHT * expected_7p;
    assert!((result.score_global - expected_global).abs() < TOLERANCE);

    let profile = profile_for(DiagnosticStatus::Green, OperationalBucket::Mid);
    assert_eq!(result.profile_name, profile.name);
    assert_eq!(result.profile_description, profile.description);
}

#[test]
fn scenario_a_lists_strengths_and_gap_ordered_priorities() {
    let result = evaluate(&scenario_a(), &mixed_survey());

    // Three cost metrics plus order, observation, creativity, universality.
    assert_eq!(result.strengths.len(), 7);
    assert!(result.strengths[0].starts_with("Merchandise cost under control"));

    // Pragmatism (2) is furthest from target; technology and subtlety tie at 3.
    assert_eq!(
        result.priorities,
        vec![
            "Define three clear numeric goals for the month.".to_string(),
            "Start recording sales and expenses in a system or spreadsheet.".to_string(),
            "Set up a routine for handling reviews, complaints and service details.".to_string(),
        ]
    );
}

#[test]
fn scenario_b_high_cogs_forces_red() {
    let mut financials = scenario_a();
    financials.cogs = 45_000.0;
    let result = evaluate(&financials, &SurveyScores::uniform(SurveyScore::new(5).unwrap()));

    assert!((result.cogs_percentage - 45.0).abs() < TOLERANCE);
    assert!((result.margin_percentage - 20.0).abs() < TOLERANCE);
    assert_eq!(result.status, DiagnosticStatus::Red);
    assert!((result.score_financial - 220.0 / 3.0).abs() < TOLERANCE);
    assert_eq!(result.profile_name, "Starving artist");
    assert_eq!(result.priorities.len(), 1);
    assert!(result.priorities[0].starts_with("Bring merchandise cost down"));
}

#[test]
fn scenario_c_zero_revenue_is_red_with_zero_percentages() {
    let financials = inputs(0.0, 12_000.0, 8_000.0, 3_000.0, 1_000.0);
    let result = evaluate(&financials, &SurveyScores::uniform(SurveyScore::new(4).unwrap()));

    assert_eq!(result.cogs_percentage, 0.0);
    assert_eq!(result.labor_percentage, 0.0);
    assert_eq!(result.fixed_percentage, 0.0);
    assert_eq!(result.margin_percentage, 0.0);
    assert_eq!(result.status, DiagnosticStatus::Red);
    assert_eq!(result.score_financial, 20.0);
    assert!(result.priorities[0].starts_with("Record monthly revenue"));
    assert_eq!(result.strengths.len(), 7);
    assert!(result
        .strengths
        .iter()
        .all(|strength| !strength.contains("% of revenue")));
}

#[test]
fn green_bounds_are_inclusive() {
    let result = evaluate(
        &inputs(100_000.0, 35_000.0, 25_000.0, 20_000.0, 5_000.0),
        &mixed_survey(),
    );
    assert!((result.margin_percentage - 15.0).abs() < TOLERANCE);
    assert_eq!(result.status, DiagnosticStatus::Green);
}

#[test]
fn yellow_labor_makes_overall_yellow() {
    let result = evaluate(
        &inputs(100_000.0, 30_000.0, 28_000.0, 10_000.0, 5_000.0),
        &mixed_survey(),
    );
    assert_eq!(result.status, DiagnosticStatus::Yellow);
    assert!((result.score_financial - (100.0 + 60.0 + 100.0) / 3.0).abs() < TOLERANCE);
}

#[test]
fn percentages_always_close_to_one_hundred() {
    let cases = [
        inputs(1.0, 0.33, 0.21, 0.17, 0.05),
        inputs(48_213.77, 17_002.1, 12_999.9, 4_500.0, 1_234.56),
        inputs(9_999_999.0, 1.0, 2.0, 3.0, 4.0),
        inputs(1_000.0, 900.0, 600.0, 300.0, 100.0),
    ];
    for financials in cases {
        let result = evaluate(&financials, &mixed_survey());
        let sum = result.cogs_percentage
            + result.labor_percentage
            + result.fixed_percentage
            + result.margin_percentage;
        assert!((sum - 100.0).abs() < 1e-6, "sum={sum} for {financials:?}");
    }
}

#[test]
fn rising_cogs_never_improves_status() {
    let survey = mixed_survey();
    let mut previous = DiagnosticStatus::Green;
    for step in 0..=30 {
        let cogs = 30_000.0 + f64::from(step) * 500.0;
        let result = evaluate(&inputs(100_000.0, cogs, 20_000.0, 10_000.0, 5_000.0), &survey);
        assert!(
            result.status >= previous,
            "status improved from {previous:?} to {:?} at cogs={cogs}",
            result.status
        );
        previous = result.status;
    }
    assert_eq!(previous, DiagnosticStatus::Red);
}

#[test]
fn identical_inputs_give_identical_output() {
    let first = evaluate(&scenario_a(), &mixed_survey());
    let second = evaluate(&scenario_a(), &mixed_survey());
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn negative_amounts_are_read_as_zero() {
    let result = evaluate(
        &inputs(100_000.0, -30_000.0, 20_000.0, 10_000.0, 5_000.0),
        &mixed_survey(),
    );
    assert_eq!(result.cogs_percentage, 0.0);
    assert!((result.margin_percentage - 65.0).abs() < TOLERANCE);
}

#[test]
fn submission_attaches_lead_and_serializes_ui_field_names() {
    let submission = DiagnosticSubmission {
        financials: scenario_a(),
        survey: mixed_survey(),
        lead: Some(LeadContact {
            contact_name: "Ana".to_string(),
            business_name: "La Esquina".to_string(),
            ..LeadContact::default()
        }),
    };
    let result = evaluate_submission(&submission);
    assert_eq!(result.lead, submission.lead);
    assert_eq!(result.monthly_revenue, 100_000.0);

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["status"], "GREEN");
    assert!(value.get("score7P").is_some());
    assert!(value.get("cogsPercentage").is_some());
    assert_eq!(value["lead"]["contactName"], "Ana");
    assert_eq!(value["lead"]["businessType"], "restaurant");
}
