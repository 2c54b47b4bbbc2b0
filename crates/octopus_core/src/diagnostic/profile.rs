//! Business profile lookup table keyed by `(status, 7P bucket)`.

use super::model::DiagnosticStatus;

/// Upper bound (exclusive) of the low operational bucket.
pub const LOW_BUCKET_CEILING: f64 = 50.0;
/// Upper bound (exclusive) of the middle operational bucket.
pub const MID_BUCKET_CEILING: f64 = 75.0;

/// Coarse band of the 0–100 operational score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperationalBucket {
    Low,
    Mid,
    High,
}

impl OperationalBucket {
    pub fn from_score(score_7p: f64) -> Self {
        if score_7p < LOW_BUCKET_CEILING {
            Self::Low
        } else if score_7p < MID_BUCKET_CEILING {
            Self::Mid
        } else {
            Self::High
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profile {
    pub name: &'static str,
    pub description: &'static str,
}

/// Returns the profile for a status/bucket pair. The table is total.
pub fn profile_for(status: DiagnosticStatus, bucket: OperationalBucket) -> Profile {
    use DiagnosticStatus::{Green, Red, Yellow};
    use OperationalBucket::{High, Low, Mid};

    match (status, bucket) {
        (Red, Low) => Profile {
            name: "Kitchen on fire",
            description: "Costs are eating the business and there is no routine to catch it. \
                          The problem is not sales: purchasing, portions and waste are out of control.",
        },
        (Red, Mid) => Profile {
            name: "Tied-up octopus",
            description: "There is real potential, but the business is run blind. \
                          Until the numbers are reviewed regularly, every arm stays tied.",
        },
        (Red, High) => Profile {
            name: "Starving artist",
            description: "The operation is well run and the offer probably works, \
                          but the cost structure leaves no margin. Lots of heart, too little profit.",
        },
        (Yellow, Low) => Profile {
            name: "Flying blind",
            description: "The numbers are holding for now, but without procedures and records \
                          any cost drift will go unnoticed until it hurts.",
        },
        (Yellow, Mid) => Profile {
            name: "Grey zone",
            description: "Nothing is burning, yet a few points keep holding the business back. \
                          The model still needs definition.",
        },
        (Yellow, High) => Profile {
            name: "Almost there",
            description: "The team and routines are solid; tightening one or two cost lines \
                          would move the business into healthy territory.",
        },
        (Green, Low) => Profile {
            name: "Autopilot",
            description: "The numbers are fine, but without renewing the offer and polishing \
                          the experience the business will fall behind.",
        },
        (Green, Mid) => Profile {
            name: "Solid footing",
            description: "A healthy cost structure with reasonable routines. \
                          The next step is making the operation repeatable.",
        },
        (Green, High) => Profile {
            name: "Well-oiled machine",
            description: "Healthy costs and a mature operation. \
                          Protect what works and look for room to grow.",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{profile_for, OperationalBucket};
    use crate::diagnostic::model::DiagnosticStatus;
    use std::collections::HashSet;

    #[test]
    fn buckets_split_at_fifty_and_seventy_five() {
        assert_eq!(OperationalBucket::from_score(49.9), OperationalBucket::Low);
        assert_eq!(OperationalBucket::from_score(50.0), OperationalBucket::Mid);
        assert_eq!(OperationalBucket::from_score(74.9), OperationalBucket::Mid);
        assert_eq!(OperationalBucket::from_score(75.0), OperationalBucket::High);
    }

    #[test]
    fn every_cell_has_a_distinct_profile() {
        let statuses = [
            DiagnosticStatus::Green,
            DiagnosticStatus::Yellow,
            DiagnosticStatus::Red,
        ];
        let buckets = [
            OperationalBucket::Low,
            OperationalBucket::Mid,
            OperationalBucket::High,
        ];
        let names = statuses
            .iter()
            .flat_map(|status| buckets.iter().map(move |bucket| profile_for(*status, *bucket).name))
            .collect::<HashSet<_>>();
        assert_eq!(names.len(), 9);
    }
}
