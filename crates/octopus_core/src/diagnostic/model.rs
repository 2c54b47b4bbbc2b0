//! Plain input/output records exchanged with the UI layer.
//!
//! # Invariants
//! - Survey answers cover exactly the seven dimensions, each scored 1..=5.
//! - A `DiagnosticResult` is never mutated after the engine returns it.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Monthly figures in a single currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialInputs {
    pub monthly_revenue: f64,
    pub cogs: f64,
    pub labor_cost: f64,
    pub rent: f64,
    pub utilities_and_fixed: f64,
}

impl FinancialInputs {
    /// Returns a copy where negative or non-finite amounts are read as zero.
    pub fn sanitized(&self) -> Self {
        Self {
            monthly_revenue: non_negative(self.monthly_revenue),
            cogs: non_negative(self.cogs),
            labor_cost: non_negative(self.labor_cost),
            rent: non_negative(self.rent),
            utilities_and_fixed: non_negative(self.utilities_and_fixed),
        }
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// The seven operational-maturity ("7P") dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyDimension {
    Order,
    Technology,
    Observation,
    Pragmatism,
    Creativity,
    Universality,
    Subtlety,
}

impl SurveyDimension {
    pub const ALL: [SurveyDimension; 7] = [
        Self::Order,
        Self::Technology,
        Self::Observation,
        Self::Pragmatism,
        Self::Creativity,
        Self::Universality,
        Self::Subtlety,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Technology => "technology",
            Self::Observation => "observation",
            Self::Pragmatism => "pragmatism",
            Self::Creativity => "creativity",
            Self::Universality => "universality",
            Self::Subtlety => "subtlety",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreValueError(pub u8);

impl Display for ScoreValueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "survey score must be within 1..=5, got {}", self.0)
    }
}

impl Error for ScoreValueError {}

/// One survey answer in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SurveyScore(u8);

impl SurveyScore {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, ScoreValueError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ScoreValueError(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for SurveyScore {
    type Error = ScoreValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SurveyScore> for u8 {
    fn from(value: SurveyScore) -> Self {
        value.0
    }
}

/// Answers for all seven dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyScores {
    pub order: SurveyScore,
    pub technology: SurveyScore,
    pub observation: SurveyScore,
    pub pragmatism: SurveyScore,
    pub creativity: SurveyScore,
    pub universality: SurveyScore,
    pub subtlety: SurveyScore,
}

impl SurveyScores {
    /// Builds scores from raw values listed in [`SurveyDimension::ALL`] order.
    pub fn from_values(values: [u8; 7]) -> Result<Self, ScoreValueError> {
        let [order, technology, observation, pragmatism, creativity, universality, subtlety] =
            values;
        Ok(Self {
            order: SurveyScore::new(order)?,
            technology: SurveyScore::new(technology)?,
            observation: SurveyScore::new(observation)?,
            pragmatism: SurveyScore::new(pragmatism)?,
            creativity: SurveyScore::new(creativity)?,
            universality: SurveyScore::new(universality)?,
            subtlety: SurveyScore::new(subtlety)?,
        })
    }

    /// Same score on every dimension.
    pub fn uniform(score: SurveyScore) -> Self {
        Self {
            order: score,
            technology: score,
            observation: score,
            pragmatism: score,
            creativity: score,
            universality: score,
            subtlety: score,
        }
    }

    pub fn get(&self, dimension: SurveyDimension) -> SurveyScore {
        match dimension {
            SurveyDimension::Order => self.order,
            SurveyDimension::Technology => self.technology,
            SurveyDimension::Observation => self.observation,
            SurveyDimension::Pragmatism => self.pragmatism,
            SurveyDimension::Creativity => self.creativity,
            SurveyDimension::Universality => self.universality,
            SurveyDimension::Subtlety => self.subtlety,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SurveyDimension, SurveyScore)> + '_ {
        SurveyDimension::ALL
            .into_iter()
            .map(move |dimension| (dimension, self.get(dimension)))
    }
}

/// Traffic-light classification; ordered by severity (`Green < Yellow < Red`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiagnosticStatus {
    Green,
    Yellow,
    Red,
}

impl DiagnosticStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "GREEN",
            Self::Yellow => "YELLOW",
            Self::Red => "RED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GREEN" => Some(Self::Green),
            "YELLOW" => Some(Self::Yellow),
            "RED" => Some(Self::Red),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    #[default]
    Restaurant,
    Bar,
    Cafe,
    Bakery,
    DarkKitchen,
    Hotel,
    Other,
}

impl BusinessType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Restaurant => "restaurant",
            Self::Bar => "bar",
            Self::Cafe => "cafe",
            Self::Bakery => "bakery",
            Self::DarkKitchen => "dark_kitchen",
            Self::Hotel => "hotel",
            Self::Other => "other",
        }
    }

    /// Parses a stored label; unknown labels read as `Other`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "restaurant" => Self::Restaurant,
            "bar" => Self::Bar,
            "cafe" => Self::Cafe,
            "bakery" => Self::Bakery,
            "dark_kitchen" => Self::DarkKitchen,
            "hotel" => Self::Hotel,
            _ => Self::Other,
        }
    }
}

/// Who submitted the diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadContact {
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub business_name: String,
    pub city: String,
    pub business_type: BusinessType,
}

/// Everything the UI collects for one diagnostic run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticSubmission {
    pub financials: FinancialInputs,
    pub survey: SurveyScores,
    pub lead: Option<LeadContact>,
}

/// Engine output for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticResult {
    pub cogs_percentage: f64,
    pub labor_percentage: f64,
    pub fixed_percentage: f64,
    pub margin_percentage: f64,
    pub score_financial: f64,
    #[serde(rename = "score7P")]
    pub score_7p: f64,
    pub score_global: f64,
    pub status: DiagnosticStatus,
    pub profile_name: String,
    pub profile_description: String,
    pub strengths: Vec<String>,
    pub priorities: Vec<String>,
    /// Revenue the percentages were computed against.
    pub monthly_revenue: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead: Option<LeadContact>,
}
